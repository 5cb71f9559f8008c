//! Vue SFC forward transformation.
//!
//! Template and script surfaces are rewritten independently. The template
//! is edited against raw text using the scanner's byte offsets; script
//! blocks run through the shared TSX rewrite engine with the block's
//! component kind (`setup` gets hook bindings, options-API code uses
//! `this.$t`). Block edits land in one whole-file arena so multiple
//! blocks never cross-contaminate.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use crate::core::parsers::vue::{SfcBlock, SfcBlockKind, TemplateNode, parse_sfc, scan_template};
use crate::core::{ComponentKind, EditArena, ExtractedString};
use crate::extract::placeholder_name;
use crate::extract::vue::quoted_ideographic_literals;
use crate::library::LibraryCapabilityDescriptor;
use crate::transform::Transform;
use crate::transform::imports::{ImportManager, ImportNeeds};
use crate::transform::react::ReactTransformer;
use crate::utils::contains_ideographic;

/// Forward transformer for Vue single-file components.
pub struct VueTransformer {
    descriptor: LibraryCapabilityDescriptor,
}

impl VueTransformer {
    pub fn new(descriptor: LibraryCapabilityDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn transform_source(
        &self,
        source: &str,
        file_path: &str,
        extracted: &[ExtractedString],
        include_default: bool,
    ) -> Result<Option<String>> {
        let targets: HashMap<&str, &ExtractedString> = extracted
            .iter()
            .filter(|record| record.has_id())
            .map(|record| (record.original.as_str(), record))
            .collect();
        if targets.is_empty() {
            return Ok(None);
        }

        let sfc = parse_sfc(source);
        let mut arena = EditArena::new();
        for block in &sfc.blocks {
            match block.kind {
                SfcBlockKind::Template => {
                    self.transform_template_block(block, &targets, &mut arena);
                }
                SfcBlockKind::Script | SfcBlockKind::ScriptSetup => {
                    self.transform_script_block(
                        block,
                        file_path,
                        extracted,
                        include_default,
                        &mut arena,
                    );
                }
            }
        }

        if arena.is_empty() {
            return Ok(None);
        }
        let out = arena.apply(source);
        if out == source { Ok(None) } else { Ok(Some(out)) }
    }

    fn transform_script_block(
        &self,
        block: &SfcBlock,
        file_path: &str,
        extracted: &[ExtractedString],
        include_default: bool,
        arena: &mut EditArena,
    ) {
        let kind = match block.kind {
            SfcBlockKind::ScriptSetup => ComponentKind::Setup,
            _ => ComponentKind::Options,
        };
        let engine = ReactTransformer::new(self.descriptor.clone());
        let rewritten = match engine.rewrite_source_with_kind(
            &block.content,
            file_path,
            extracted,
            include_default,
            kind,
        ) {
            Ok(rewritten) => rewritten,
            Err(err) => {
                warn!(file = file_path, error = %err, "failed to rewrite script block");
                return;
            }
        };
        if rewritten == block.content {
            return;
        }

        let finished = if kind == ComponentKind::Setup {
            match self.bind_setup_hook(&rewritten, file_path) {
                Ok(bound) => bound,
                Err(err) => {
                    warn!(file = file_path, error = %err, "failed to bind setup hook");
                    rewritten
                }
            }
        } else {
            rewritten
        };

        arena.push(
            block.content_start,
            block.content_start + block.content.len(),
            finished,
        );
    }

    /// `<script setup>` blocks bind the composition hook at the top of the
    /// block, right after the imports.
    fn bind_setup_hook(&self, content: &str, file_path: &str) -> Result<String> {
        if !content.contains(&format!("{}('", self.descriptor.binding)) {
            return Ok(content.to_string());
        }
        if content.contains(&format!("{}(", self.descriptor.hook)) {
            return Ok(content.to_string());
        }

        let manager = ImportManager::new(self.descriptor.clone());
        let needs = ImportNeeds {
            hook: true,
            ..Default::default()
        };
        let with_import = manager.add_i18n_imports(content, file_path, &needs)?;

        // The hook statement goes right below the import block.
        let hook_line = format!("\n{}", self.descriptor.hook_stmt());
        let insert_at = last_import_end(&with_import);
        let mut out = with_import;
        out.insert_str(insert_at, &hook_line);
        Ok(out)
    }

    fn transform_template_block(
        &self,
        block: &SfcBlock,
        targets: &HashMap<&str, &ExtractedString>,
        arena: &mut EditArena,
    ) {
        let nodes = scan_template(&block.content);
        let mut i = 0usize;
        while i < nodes.len() {
            match &nodes[i] {
                TemplateNode::Attribute {
                    start,
                    end,
                    name,
                    value,
                    value_start,
                    bound,
                    ..
                } => {
                    self.transform_attribute(
                        block, targets, *start, *end, name, value, *value_start, *bound, arena,
                    );
                    i += 1;
                }
                TemplateNode::Text { seg, .. } | TemplateNode::Interpolation { seg, .. } => {
                    let seg = *seg;
                    let mut j = i;
                    while j < nodes.len()
                        && matches!(
                            &nodes[j],
                            TemplateNode::Text { seg: s, .. }
                            | TemplateNode::Interpolation { seg: s, .. } if *s == seg
                        )
                    {
                        j += 1;
                    }
                    self.transform_text_run(block, targets, &nodes[i..j], arena);
                    i = j;
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn transform_attribute(
        &self,
        block: &SfcBlock,
        targets: &HashMap<&str, &ExtractedString>,
        start: usize,
        end: usize,
        name: &str,
        value: &str,
        value_start: usize,
        bound: bool,
        arena: &mut EditArena,
    ) {
        if bound {
            // Pure quoted literal inside a bound expression.
            let trimmed = value.trim();
            if trimmed.len() < 2 || !trimmed.starts_with('\'') || !trimmed.ends_with('\'') {
                return;
            }
            let inner = &trimmed[1..trimmed.len() - 1];
            let Some(record) = targets.get(inner) else {
                return;
            };
            let literal_offset = value.find('\'').unwrap_or(0);
            let at = block.content_start + value_start + literal_offset;
            arena.push(
                at,
                at + trimmed.len(),
                format!("$t('{}')", record.semantic_id),
            );
            return;
        }

        let Some(record) = targets.get(value) else {
            return;
        };
        arena.push(
            block.content_start + start,
            block.content_start + end,
            self.descriptor.template_attr_call(name, &record.semantic_id),
        );
    }

    fn transform_text_run(
        &self,
        block: &SfcBlock,
        targets: &HashMap<&str, &ExtractedString>,
        run: &[TemplateNode],
        arena: &mut EditArena,
    ) {
        let has_translated_interp = run.iter().any(|n| {
            matches!(n, TemplateNode::Interpolation { expr, .. } if expr.contains("$t("))
        });
        let interp_count = run
            .iter()
            .filter(|n| matches!(n, TemplateNode::Interpolation { .. }))
            .count();
        let has_ideographic_text = run.iter().any(
            |n| matches!(n, TemplateNode::Text { text, .. } if contains_ideographic(text)),
        );

        if interp_count > 0 && has_ideographic_text && !has_translated_interp {
            // Combined run: one $t call with a values object.
            let mut values: Vec<(String, String)> = Vec::new();
            let mut names: Vec<String> = Vec::new();
            let mut lo = usize::MAX;
            let mut hi = 0usize;
            let mut expr_index = 0usize;
            for node in run {
                match node {
                    TemplateNode::Text { start, end, text, .. } => {
                        if !text.trim().is_empty() {
                            let trim_start = text.len() - text.trim_start().len();
                            let trim_end = text.len() - text.trim_end().len();
                            lo = lo.min(start + trim_start);
                            hi = hi.max(end - trim_end);
                        }
                    }
                    TemplateNode::Interpolation { start, end, expr, .. } => {
                        let name = placeholder_name(expr, expr_index, &names);
                        names.push(name.clone());
                        values.push((name, expr.clone()));
                        expr_index += 1;
                        lo = lo.min(*start);
                        hi = hi.max(*end);
                    }
                    TemplateNode::Attribute { .. } => {}
                }
            }
            if lo >= hi {
                return;
            }
            let original = &block.content[lo..hi];
            let Some(record) = targets.get(original) else {
                return;
            };
            arena.push(
                block.content_start + lo,
                block.content_start + hi,
                self.descriptor
                    .template_text_call(&record.semantic_id, &values),
            );
            return;
        }

        for node in run {
            match node {
                TemplateNode::Text { start, text, .. } => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let key = crate::utils::collapse_markup_whitespace(trimmed);
                    let Some(record) = targets.get(key.as_str()) else {
                        continue;
                    };
                    let trim_start = text.len() - text.trim_start().len();
                    let at = block.content_start + start + trim_start;
                    arena.push(
                        at,
                        at + trimmed.len(),
                        self.descriptor.template_text_call(&record.semantic_id, &[]),
                    );
                }
                TemplateNode::Interpolation { start, expr, .. } => {
                    if expr.contains("$t(") {
                        continue;
                    }
                    for (literal, offset) in quoted_ideographic_literals(expr) {
                        let Some(record) = targets.get(literal) else {
                            continue;
                        };
                        // The scanner's expr is trimmed; locate it in the
                        // raw interpolation to keep offsets exact.
                        let interp_text = &block.content[*start..];
                        let Some(expr_offset) = interp_text.find(expr.as_str()) else {
                            continue;
                        };
                        let at = block.content_start + start + expr_offset + offset;
                        arena.push(
                            at,
                            at + literal.len() + 2,
                            format!("$t('{}')", record.semantic_id),
                        );
                    }
                }
                TemplateNode::Attribute { .. } => {}
            }
        }
    }
}

/// Offset just past the final top-level `import ...;` line.
fn last_import_end(content: &str) -> usize {
    let mut end = 0usize;
    let mut offset = 0usize;
    for line in content.split_inclusive('\n') {
        if line.trim_start().starts_with("import ") {
            end = offset + line.trim_end_matches('\n').len();
        }
        offset += line.len();
    }
    end
}

impl Transform for VueTransformer {
    fn transform_file(
        &self,
        root: &Path,
        file: &str,
        extracted: &[ExtractedString],
        include_default: bool,
    ) -> Result<Option<String>> {
        let full = root.join(file);
        let source = fs::read_to_string(&full)
            .with_context(|| format!("Failed to read source file: {}", full.display()))?;
        self.transform_source(&source, file, extracted, include_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::vue::VueExtractor;
    use crate::library::LibraryKind;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn descriptor() -> LibraryCapabilityDescriptor {
        LibraryCapabilityDescriptor::new(LibraryKind::VueI18n, "@/i18n", None)
    }

    fn transform(source: &str) -> Option<String> {
        let desc = descriptor();
        let extractor =
            VueExtractor::new(desc.clone(), &crate::config::Config::default().technical_attributes);
        let mut extracted = extractor.extract_source(source, "src/views/Home.vue").unwrap();
        let assigner =
            crate::assign::IdentifierAssigner::from_config(&crate::config::Config::default());
        let mut existing = HashSet::new();
        assigner.assign_all(&mut extracted, &mut existing, None);
        VueTransformer::new(desc)
            .transform_source(source, "src/views/Home.vue", &extracted, false)
            .unwrap()
    }

    #[test]
    fn test_template_text_rewrite() {
        let out = transform("<template>\n  <button>确认</button>\n</template>\n").unwrap();
        assert_eq!(
            out,
            "<template>\n  <button>{{ $t('views__Home__confirm') }}</button>\n</template>\n"
        );
    }

    #[test]
    fn test_static_attribute_rewrite() {
        let out = transform(r#"<template><input placeholder="请输入用户名"></template>"#).unwrap();
        assert!(out.contains(r#":placeholder="$t('views__Home__"#), "got: {}", out);
        assert!(!out.contains("请输入用户名"));
    }

    #[test]
    fn test_bound_attribute_literal_rewrite() {
        let out = transform(r#"<template><input :placeholder="'请输入'"></template>"#).unwrap();
        assert!(out.contains(r#":placeholder="$t('"#), "got: {}", out);
        assert!(!out.contains("'请输入'"));
    }

    #[test]
    fn test_mixed_run_rewrite() {
        let out =
            transform("<template><p>你好 {{ user.name }}，共 {{ count }} 条</p></template>").unwrap();
        assert!(
            out.contains("{{ $t('views__Home__t_"),
            "combined call expected, got: {}",
            out
        );
        assert!(out.contains("{ name: user.name, count }"), "got: {}", out);
    }

    #[test]
    fn test_interpolation_literal_rewrite() {
        let out = transform("<template><p>{{ ok ? '是' : '否' }}</p></template>").unwrap();
        assert!(out.contains("$t('"), "got: {}", out);
        assert!(!out.contains("'是'"));
        assert!(!out.contains("'否'"));
    }

    #[test]
    fn test_script_setup_gets_hook_binding() {
        let source = "<template><p>{{ msg }}</p></template>\n<script setup>\nconst msg = '加载中';\n</script>\n";
        let out = transform(source).unwrap();
        assert!(out.contains("import { useI18n } from 'vue-i18n';"), "got: {}", out);
        assert!(out.contains("const { t } = useI18n();"), "got: {}", out);
        assert!(out.contains("const msg = t('views__Home__loading');"), "got: {}", out);
    }

    #[test]
    fn test_options_script_uses_this() {
        let source = r#"<template><p>静态</p></template>
<script>
export default {
  methods: {
    notify() {
      return '操作成功';
    }
  }
};
</script>
"#;
        let out = transform(source).unwrap();
        assert!(out.contains("this.$t('"), "got: {}", out);
    }

    #[test]
    fn test_untranslatable_file_unchanged() {
        assert!(transform("<template><p>static text</p></template>").is_none());
    }

    #[test]
    fn test_already_translated_template_unchanged() {
        let source = "<template><p>{{ $t('views__Home__x') }}</p></template>";
        assert!(transform(source).is_none());
    }
}
