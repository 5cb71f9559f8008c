//! Semantic identifier assignment.
//!
//! Extracted strings become unique, human-legible identifiers of the form
//! `prefix__semantic`: a directory-derived prefix plus a semantic part from
//! a phrase dictionary, direct sanitization, or a short hash. An LLM batch
//! call can propose better semantic parts; local generation is always
//! available as the fallback.

pub mod assigner;
pub mod prefix;
pub mod semantic;

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

pub use assigner::IdentifierAssigner;
pub use prefix::directory_prefix;
pub use semantic::{sanitize_segment, semantic_part};

fn call_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:\$t\(|\bt\(|\bid:\s*)['"]([A-Za-z0-9_.]+)['"]"#).expect("static regex")
    })
}

/// Seed the existing-identifier set from call sites already present in a
/// source file, so a new run never generates a colliding id.
pub fn seed_ids_from_source(source: &str, out: &mut HashSet<String>) {
    for caps in call_id_re().captures_iter(source) {
        if let Some(id) = caps.get(1) {
            out.insert(id.as_str().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_from_translation_calls() {
        let mut ids = HashSet::new();
        seed_ids_from_source(
            r#"
const a = t('forms__Login__confirm');
const b = $t("views__Home__title");
const c = intl.formatMessage({ id: 'common__save' });
const unrelated = other('not an id call');
"#,
            &mut ids,
        );
        assert!(ids.contains("forms__Login__confirm"));
        assert!(ids.contains("views__Home__title"));
        assert!(ids.contains("common__save"));
        assert_eq!(ids.len(), 3);
    }
}
