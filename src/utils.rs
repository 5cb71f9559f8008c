//! Common utility functions shared across the codebase.

/// Checks if the text contains at least one CJK unified ideograph.
///
/// Covers the base block, extension A, and the compatibility block. Text in
/// these ranges is always considered translatable regardless of context.
///
/// # Examples
///
/// ```
/// use autoglot::utils::contains_ideographic;
///
/// assert!(contains_ideographic("确认"));
/// assert!(contains_ideographic("保存 file"));
/// assert!(!contains_ideographic("Submit"));
/// assert!(!contains_ideographic("123"));
/// assert!(!contains_ideographic(""));
/// ```
pub fn contains_ideographic(text: &str) -> bool {
    text.chars().any(is_ideographic)
}

/// Checks if a single character is a CJK unified ideograph.
pub fn is_ideographic(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
    )
}

/// Checks if the text contains at least one ASCII Latin letter.
pub fn contains_latin(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_alphabetic())
}

/// Checks if the text contains at least one Unicode alphanumeric character.
///
/// Returns false for empty strings, pure punctuation, or pure whitespace.
pub fn contains_alphanumeric(text: &str) -> bool {
    text.chars().any(|c| c.is_alphanumeric())
}

/// Checks whether a translated value passes the validity check:
/// non-empty after trimming, and at least one letter or digit in any script.
/// A translation that is nothing but punctuation did not actually translate
/// anything.
pub fn is_valid_translation(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && contains_alphanumeric(trimmed)
}

/// Normalize a file path to forward slashes.
///
/// Windows-style separators in config values or CLI arguments would
/// otherwise break the anchor-directory lookup in identifier prefixes.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Collapse a run of JSX/template whitespace the way browsers render it:
/// interior newlines plus surrounding indentation become a single space.
pub fn collapse_markup_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_ws = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_ws {
                out.push(' ');
                in_ws = true;
            }
        } else {
            out.push(c);
            in_ws = false;
        }
    }
    out.trim().to_string()
}
