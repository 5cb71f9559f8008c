//! Vue SFC restore transformation.
//!
//! The markup surface is matched and substituted directly against the raw
//! template text, not a parsed tree, so that multiple script and
//! template blocks in one file never cross-contaminate. Script blocks run
//! through the shared TSX restore engine, and every block's replacement is
//! spliced back through one whole-file edit arena.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tracing::warn;

use crate::core::EditArena;
use crate::core::parsers::vue::{SfcBlockKind, parse_sfc};
use crate::library::LibraryCapabilityDescriptor;
use crate::locale::LocaleMap;
use crate::restore::react::ReactRestorer;
use crate::restore::{Restore, split_message};

/// Restore transformer for Vue single-file components.
pub struct VueRestorer {
    descriptor: LibraryCapabilityDescriptor,
}

fn interp_values_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*\$t\(\s*'([^']+)'\s*,\s*\{([^{}]*)\}\s*\)\s*\}\}").expect("static regex")
    })
}

fn interp_simple_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*\$t\(\s*'([^']+)'\s*\)\s*\}\}").expect("static regex"))
}

fn bound_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#":([A-Za-z][\w-]*)="\$t\(\s*'([^']+)'\s*\)""#).expect("static regex")
    })
}

fn inline_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$t\(\s*'([^']+)'\s*\)").expect("static regex"))
}

impl VueRestorer {
    pub fn new(descriptor: LibraryCapabilityDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn restore_source(
        &self,
        source: &str,
        file_path: &str,
        locale_map: &LocaleMap,
    ) -> Result<Option<String>> {
        let sfc = parse_sfc(source);
        let mut arena = EditArena::new();

        for block in &sfc.blocks {
            let restored = match block.kind {
                SfcBlockKind::Template => self.restore_template(&block.content, locale_map),
                SfcBlockKind::Script | SfcBlockKind::ScriptSetup => {
                    let engine = ReactRestorer::new(self.descriptor.clone());
                    match engine.restore_source(&block.content, file_path, locale_map) {
                        Ok(result) => result,
                        Err(err) => {
                            warn!(file = file_path, error = %err, "failed to restore script block");
                            None
                        }
                    }
                }
            };
            if let Some(new_content) = restored
                && new_content != block.content
            {
                arena.push(
                    block.content_start,
                    block.content_start + block.content.len(),
                    new_content,
                );
            }
        }

        if arena.is_empty() {
            return Ok(None);
        }
        Ok(Some(arena.apply(source)))
    }

    /// Raw-text template restore; `None` when nothing fired.
    fn restore_template(&self, content: &str, locale_map: &LocaleMap) -> Option<String> {
        // Interpolations with values first, then the simpler shapes the
        // broader patterns would otherwise swallow.
        let step1 = interp_values_re().replace_all(content, |caps: &Captures<'_>| {
            self.restore_values_interp(caps, locale_map)
        });
        let step2 = interp_simple_re().replace_all(&step1, |caps: &Captures<'_>| {
            match self.lookup_plain(&caps[1], locale_map) {
                Some(text) => text,
                None => caps[0].to_string(),
            }
        });
        let step3 = bound_attr_re().replace_all(&step2, |caps: &Captures<'_>| {
            match self.lookup_plain(&caps[2], locale_map) {
                Some(text) if !text.contains('"') => format!("{}=\"{}\"", &caps[1], text),
                _ => caps[0].to_string(),
            }
        });
        let step4 = inline_call_re().replace_all(&step3, |caps: &Captures<'_>| {
            match self.lookup_plain(&caps[1], locale_map) {
                Some(text) if !text.contains('\'') => format!("'{}'", text),
                _ => caps[0].to_string(),
            }
        });

        if step4 == content {
            None
        } else {
            Some(step4.into_owned())
        }
    }

    /// Only identifiers whose stored text has no placeholders restore
    /// through the plain patterns; placeholder messages without a values
    /// argument fail open.
    fn lookup_plain(&self, id: &str, locale_map: &LocaleMap) -> Option<String> {
        let text = locale_map.get(id)?;
        self.descriptor
            .parse_placeholders(text)
            .is_empty()
            .then(|| text.to_string())
    }

    /// `{{ $t('id', { name: expr }) }}` → `文本 {{ expr }}` reconstruction.
    fn restore_values_interp(&self, caps: &Captures<'_>, locale_map: &LocaleMap) -> String {
        let original = caps[0].to_string();
        let id = &caps[1];
        let Some(text) = locale_map.get(id) else {
            return original;
        };

        let values = parse_values_list(&caps[2]);
        let names = self.descriptor.parse_placeholders(text);
        if names.is_empty() {
            return original;
        }
        let Some(segments) = split_message(
            text,
            &names,
            self.descriptor.placeholder_open,
            self.descriptor.placeholder_close,
        ) else {
            return original;
        };

        let mut out = String::new();
        for (i, segment) in segments.iter().enumerate() {
            out.push_str(segment);
            if i < names.len() {
                let Some(expr) = values
                    .iter()
                    .find(|(name, _)| *name == names[i])
                    .map(|(_, expr)| expr.clone())
                else {
                    return original;
                };
                out.push_str(&format!("{{{{ {} }}}}", expr));
            }
        }
        out
    }
}

/// Parse `name: expr, other` object-literal text into pairs.
fn parse_values_list(list: &str) -> Vec<(String, String)> {
    list.split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            match entry.split_once(':') {
                Some((name, expr)) => Some((name.trim().to_string(), expr.trim().to_string())),
                None => Some((entry.to_string(), entry.to_string())),
            }
        })
        .collect()
}

impl Restore for VueRestorer {
    fn restore_file(
        &self,
        root: &Path,
        file: &str,
        locale_map: &LocaleMap,
    ) -> Result<Option<String>> {
        let full = root.join(file);
        let source = fs::read_to_string(&full)
            .with_context(|| format!("Failed to read source file: {}", full.display()))?;
        self.restore_source(&source, file, locale_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::LibraryKind;
    use pretty_assertions::assert_eq;

    fn restorer() -> VueRestorer {
        VueRestorer::new(LibraryCapabilityDescriptor::new(
            LibraryKind::VueI18n,
            "@/i18n",
            None,
        ))
    }

    fn locale_map(entries: &[(&str, &str)]) -> LocaleMap {
        let mut map = LocaleMap::empty("zh.json");
        for (id, text) in entries {
            map.insert(*id, *text);
        }
        map
    }

    #[test]
    fn test_restore_template_text() {
        let map = locale_map(&[("views__Home__confirm", "确认")]);
        let source = "<template>\n  <button>{{ $t('views__Home__confirm') }}</button>\n</template>\n";
        let out = restorer().restore_source(source, "Home.vue", &map).unwrap().unwrap();
        assert_eq!(out, "<template>\n  <button>确认</button>\n</template>\n");
    }

    #[test]
    fn test_restore_bound_attribute() {
        let map = locale_map(&[("a__b", "请输入")]);
        let source = r#"<template><input :placeholder="$t('a__b')"></template>"#;
        let out = restorer().restore_source(source, "Home.vue", &map).unwrap().unwrap();
        assert_eq!(out, r#"<template><input placeholder="请输入"></template>"#);
    }

    #[test]
    fn test_restore_values_interpolation() {
        let map = locale_map(&[("a__b", "你好 {name}，共 {count} 条")]);
        let source = "<template><p>{{ $t('a__b', { name: user.name, count }) }}</p></template>";
        let out = restorer().restore_source(source, "Home.vue", &map).unwrap().unwrap();
        assert_eq!(
            out,
            "<template><p>你好 {{ user.name }}，共 {{ count }} 条</p></template>"
        );
    }

    #[test]
    fn test_restore_inline_expression_call() {
        let map = locale_map(&[("a__yes", "是"), ("a__no", "否")]);
        let source = "<template><p>{{ ok ? $t('a__yes') : $t('a__no') }}</p></template>";
        let out = restorer().restore_source(source, "Home.vue", &map).unwrap().unwrap();
        assert_eq!(out, "<template><p>{{ ok ? '是' : '否' }}</p></template>");
    }

    #[test]
    fn test_unknown_id_fails_open() {
        let map = locale_map(&[]);
        let source = "<template><p>{{ $t('missing__id') }}</p></template>";
        assert!(restorer().restore_source(source, "Home.vue", &map).unwrap().is_none());
    }

    #[test]
    fn test_script_block_restored() {
        let map = locale_map(&[("views__Home__loading", "加载中")]);
        let source = "<template><p>x</p></template>\n<script setup>\nimport { useI18n } from 'vue-i18n';\nconst { t } = useI18n();\nconst msg = t('views__Home__loading');\n</script>\n";
        let out = restorer().restore_source(source, "Home.vue", &map).unwrap().unwrap();
        assert!(out.contains("const msg = '加载中';"), "got: {}", out);
        assert!(!out.contains("useI18n"), "binding and import removed, got: {}", out);
    }

    #[test]
    fn test_blocks_do_not_cross_contaminate() {
        let map = locale_map(&[("a__b", "文本")]);
        // The script mentions the same call shape inside a string; only the
        // template surface may rewrite template syntax.
        let source = "<template><p>{{ $t('a__b') }}</p></template>\n<script>\nconst tpl = \"{{ $t('a__b') }}\";\n</script>\n";
        let out = restorer().restore_source(source, "Home.vue", &map).unwrap().unwrap();
        assert!(out.contains("<p>文本</p>"));
        assert!(out.contains("const tpl = \"{{ $t('a__b') }}\";"), "got: {}", out);
    }

    #[test]
    fn test_placeholder_message_without_values_fails_open() {
        let map = locale_map(&[("a__b", "共 {count} 条")]);
        let source = "<template><p>{{ $t('a__b') }}</p></template>";
        assert!(restorer().restore_source(source, "Home.vue", &map).unwrap().is_none());
    }
}
