//! Directory-derived identifier prefixes.

use crate::assign::semantic::sanitize_segment;
use crate::utils::normalize_path;

/// Compute the `first__second` prefix for a file path.
///
/// The path is normalized, the configured anchor directory located, and
/// the first path segment below the anchor taken as the namespace. If the
/// file's immediate directory *is* that segment, the prefix is
/// `segment__filenameWithoutExtension`; otherwise it is
/// `segment__immediateDirectory`. Prefix segments keep their original
/// case.
///
/// Files directly under the anchor fall back to the file stem alone, and
/// paths without the anchor treat their first segment as the namespace.
pub fn directory_prefix(file_path: &str, anchor_dir: &str) -> String {
    let normalized = normalize_path(file_path);
    let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return String::new();
    }

    let file_name = segments[segments.len() - 1];
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name);

    // Segments strictly below the anchor; the whole path when absent.
    let below: &[&str] = match segments.iter().position(|s| *s == anchor_dir) {
        Some(pos) => &segments[pos + 1..],
        None => &segments[..],
    };

    match below.len() {
        0 | 1 => sanitize_segment(stem, false),
        _ => {
            let first_level = below[0];
            let immediate_dir = below[below.len() - 2];
            if immediate_dir == first_level {
                format!(
                    "{}__{}",
                    sanitize_segment(first_level, false),
                    sanitize_segment(stem, false)
                )
            } else {
                format!(
                    "{}__{}",
                    sanitize_segment(first_level, false),
                    sanitize_segment(immediate_dir, false)
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_file_directly_in_first_level_dir() {
        // Immediate directory equals the first segment below the anchor.
        assert_eq!(directory_prefix("src/forms/Login.tsx", "src"), "forms__Login");
        assert_eq!(directory_prefix("src/forms/forms.ts", "src"), "forms__forms");
    }

    #[test]
    fn test_file_in_deeper_dir() {
        // Immediate directory differs from the first-level segment.
        assert_eq!(
            directory_prefix("src/forms/login/index.tsx", "src"),
            "forms__login"
        );
        assert_eq!(
            directory_prefix("src/views/user/profile/Edit.vue", "src"),
            "views__profile"
        );
    }

    #[test]
    fn test_file_directly_under_anchor() {
        assert_eq!(directory_prefix("src/App.tsx", "src"), "App");
    }

    #[test]
    fn test_anchor_absent_uses_path_as_is() {
        assert_eq!(directory_prefix("components/Button.tsx", "src"), "components__Button");
        assert_eq!(
            directory_prefix("components/forms/Field.tsx", "src"),
            "components__forms"
        );
    }

    #[test]
    fn test_windows_separators_normalized() {
        assert_eq!(directory_prefix("src\\forms\\Login.tsx", "src"), "forms__Login");
    }

    #[test]
    fn test_prefix_keeps_case_and_sanitizes() {
        assert_eq!(
            directory_prefix("src/MyForms/Sign-Up.tsx", "src"),
            "MyForms__SignUp"
        );
    }
}
