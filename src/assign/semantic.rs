//! Semantic-part derivation and identifier sanitization.

use std::collections::HashMap;

use crate::utils::contains_ideographic;

/// Derive the semantic part for a message text.
///
/// Resolution order:
/// 1. exact match in the common-phrase dictionary;
/// 2. text without ideographic characters sanitizes directly;
/// 3. otherwise a short base-36 hash token `t_<hash>`, so distinct inputs
///    never collide on a generic fallback token.
pub fn semantic_part(text: &str, dictionary: &HashMap<String, String>) -> String {
    let trimmed = text.trim();
    if let Some(hit) = dictionary.get(trimmed) {
        return sanitize_segment(hit, true);
    }
    if !contains_ideographic(trimmed) {
        let sanitized = sanitize_segment(trimmed, true);
        if !sanitized.is_empty() {
            return sanitized;
        }
    }
    format!("t_{}", short_hash(trimmed))
}

/// FNV-1a over the cleaned text, folded to 32 bits, rendered base-36.
fn short_hash(text: &str) -> String {
    let cleaned: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut hash: u32 = 0x811c_9dc5;
    for byte in cleaned.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    to_base36(hash)
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ascii")
}

/// Sanitize one identifier segment.
///
/// Lowercases (unless the segment is a prefix segment, which keeps its
/// original case), maps non-alphanumeric runs to underscores, collapses
/// runs of 3+ underscores to 2, trims boundary underscores, and removes
/// single interior underscores while preserving doubled ones; doubled
/// underscores demarcate the prefix and must survive sanitization.
pub fn sanitize_segment(text: &str, lowercase: bool) -> String {
    let source = if lowercase {
        text.to_lowercase()
    } else {
        text.to_string()
    };

    let mut mapped = String::with_capacity(source.len());
    for c in source.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            mapped.push(c);
        } else {
            mapped.push('_');
        }
    }

    // Collapse 3+ underscores to exactly 2.
    let mut collapsed = String::with_capacity(mapped.len());
    let mut run = 0usize;
    for c in mapped.chars() {
        if c == '_' {
            run += 1;
            if run <= 2 {
                collapsed.push('_');
            }
        } else {
            run = 0;
            collapsed.push(c);
        }
    }

    let trimmed = collapsed.trim_matches('_');

    // Remove single interior underscores; keep doubled ones.
    let bytes = trimmed.as_bytes();
    let mut out = String::with_capacity(trimmed.len());
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'_' {
            let mut j = i;
            while j < bytes.len() && bytes[j] == b'_' {
                j += 1;
            }
            if j - i >= 2 {
                out.push_str("__");
            }
            i = j;
        } else {
            out.push(bytes[i] as char);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dict() -> HashMap<String, String> {
        [("确认", "confirm"), ("保存", "save")]
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .into_iter()
            .collect()
    }

    #[test]
    fn test_dictionary_hit() {
        assert_eq!(semantic_part("确认", &dict()), "confirm");
        assert_eq!(semantic_part("  保存  ", &dict()), "save");
    }

    #[test]
    fn test_non_ideographic_sanitizes_directly() {
        assert_eq!(semantic_part("Submit now!", &dict()), "submitnow");
        assert_eq!(semantic_part("OK", &dict()), "ok");
    }

    #[test]
    fn test_ideographic_without_dictionary_hashes() {
        let id = semantic_part("保存失败", &dict());
        assert!(id.starts_with("t_"), "got {}", id);
        assert!(id.len() > 2);
        // Deterministic
        assert_eq!(id, semantic_part("保存失败", &dict()));
    }

    #[test]
    fn test_distinct_inputs_get_distinct_hashes() {
        let a = semantic_part("保存失败", &dict());
        let b = semantic_part("保存成功", &dict());
        assert_ne!(a, b);
    }

    #[test]
    fn test_punctuation_only_text_hashes() {
        let id = semantic_part("……", &dict());
        assert!(id.starts_with("t_"));
    }

    #[test]
    fn test_sanitize_lowercases_semantic() {
        assert_eq!(sanitize_segment("Confirm", true), "confirm");
        assert_eq!(sanitize_segment("Login", false), "Login");
    }

    #[test]
    fn test_sanitize_strips_symbols() {
        assert_eq!(sanitize_segment("hello-world!", true), "helloworld");
        assert_eq!(sanitize_segment("a.b.c", true), "abc");
    }

    #[test]
    fn test_sanitize_collapses_triple_underscores() {
        assert_eq!(sanitize_segment("a___b", true), "a__b");
        assert_eq!(sanitize_segment("a_____b", true), "a__b");
    }

    #[test]
    fn test_sanitize_trims_boundary_underscores() {
        assert_eq!(sanitize_segment("_abc_", true), "abc");
        assert_eq!(sanitize_segment("__abc__", true), "abc");
    }

    #[test]
    fn test_sanitize_preserves_double_removes_single() {
        assert_eq!(sanitize_segment("forms__Login__confirm", false), "forms__Login__confirm");
        assert_eq!(sanitize_segment("snake_case", true), "snakecase");
    }

    #[test]
    fn test_base36_token_shape() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
