//! Restore transformation: the inverse of the forward rewrite.
//!
//! Given an identifier → text locale map, recognized translation call
//! sites are rewritten back to their original literals. Restore is total
//! and fails open: an identifier absent from the map leaves its call site
//! unchanged, and a file where no rewrite fired is returned byte-identical
//! so the caller can skip the write.

pub mod react;
pub mod registry;
pub mod vue;

use std::path::Path;

use anyhow::Result;
use enum_dispatch::enum_dispatch;

use crate::adapter::RestoreTransformer;
use crate::locale::LocaleMap;
use crate::restore::react::ReactRestorer;
use crate::restore::vue::VueRestorer;

/// Framework-specific restore transformer.
#[enum_dispatch]
pub trait Restore {
    /// Rewrite one file back to literals.
    ///
    /// Returns `None` when nothing fired.
    fn restore_file(&self, root: &Path, file: &str, locale_map: &LocaleMap)
    -> Result<Option<String>>;
}

/// Split a stored message around its placeholders, in order.
///
/// Returns the static segments interleaving `names`: `segments[0]`, then
/// the value for `names[0]`, then `segments[1]`, and so on. Returns `None`
/// when a named placeholder is missing from the text.
pub fn split_message<'a>(
    message: &'a str,
    names: &[String],
    open: &str,
    close: &str,
) -> Option<Vec<&'a str>> {
    let mut segments = Vec::with_capacity(names.len() + 1);
    let mut rest = message;
    for name in names {
        let token = format!("{}{}{}", open, name, close);
        let at = rest.find(&token)?;
        segments.push(&rest[..at]);
        rest = &rest[at + token.len()..];
    }
    segments.push(rest);
    Some(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_message() {
        let names = vec!["name".to_string(), "count".to_string()];
        let segments = split_message("你好 {name}，共 {count} 条", &names, "{", "}").unwrap();
        assert_eq!(segments, vec!["你好 ", "，共 ", " 条"]);
    }

    #[test]
    fn test_split_message_double_braces() {
        let names = vec!["count".to_string()];
        let segments = split_message("共 {{count}} 条", &names, "{{", "}}").unwrap();
        assert_eq!(segments, vec!["共 ", " 条"]);
    }

    #[test]
    fn test_split_message_missing_placeholder() {
        let names = vec!["missing".to_string()];
        assert!(split_message("no placeholder here", &names, "{", "}").is_none());
    }

    #[test]
    fn test_split_message_no_names() {
        let segments = split_message("纯文本", &[], "{", "}").unwrap();
        assert_eq!(segments, vec!["纯文本"]);
    }
}
