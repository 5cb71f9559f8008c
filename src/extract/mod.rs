//! Text extraction.
//!
//! Framework-specific walkers that produce a flat list of
//! [`ExtractedString`](crate::core::ExtractedString) records from source
//! files. Extraction is a pure read: no file is modified, and a parse error
//! in one file is logged and skipped while other files continue.

pub mod react;
pub mod vue;

use std::path::Path;

use anyhow::Result;
use enum_dispatch::enum_dispatch;

use crate::adapter::TextExtractor;
use crate::core::ExtractedString;
use crate::extract::react::ReactExtractor;
use crate::extract::vue::VueExtractor;

/// Framework-specific extraction entry point.
#[enum_dispatch]
pub trait Extract {
    /// Extract all translatable strings from one file.
    ///
    /// `file` is the path relative to `root`, recorded verbatim in the
    /// returned records.
    fn extract_from_file(&self, root: &Path, file: &str) -> Result<Vec<ExtractedString>>;
}

/// Derive a placeholder name for an interpolated expression.
///
/// Identifiers name themselves, member chains name their last segment,
/// anything else falls back to a positional `value{n}` name. `used` keeps
/// names unique within one template record.
pub fn placeholder_name(expr_src: &str, index: usize, used: &[String]) -> String {
    let trimmed = expr_src.trim();
    let base = if is_identifier(trimmed) {
        trimmed.to_string()
    } else if let Some(last) = member_tail(trimmed) {
        last
    } else {
        format!("value{}", index + 1)
    };

    if !used.contains(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}{}", base, n);
        if !used.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// `user.profile.name` → `name`; None for anything that is not a plain
/// dotted identifier chain.
fn member_tail(text: &str) -> Option<String> {
    if text.contains('(') || text.contains('[') || text.contains(' ') {
        return None;
    }
    let last = text.rsplit('.').next()?;
    if is_identifier(last) && text.split('.').all(is_identifier) {
        Some(last.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_name_identifier() {
        assert_eq!(placeholder_name("name", 0, &[]), "name");
        assert_eq!(placeholder_name(" count ", 1, &[]), "count");
    }

    #[test]
    fn test_placeholder_name_member_chain() {
        assert_eq!(placeholder_name("user.profile.name", 0, &[]), "name");
        assert_eq!(placeholder_name("props.title", 2, &[]), "title");
    }

    #[test]
    fn test_placeholder_name_fallback() {
        assert_eq!(placeholder_name("count + 1", 0, &[]), "value1");
        assert_eq!(placeholder_name("fn()", 2, &[]), "value3");
        assert_eq!(placeholder_name("items[0]", 0, &[]), "value1");
    }

    #[test]
    fn test_placeholder_name_dedupe() {
        let used = vec!["name".to_string()];
        assert_eq!(placeholder_name("name", 0, &used), "name2");
        let used = vec!["name".to_string(), "name2".to_string()];
        assert_eq!(placeholder_name("name", 0, &used), "name3");
    }
}
