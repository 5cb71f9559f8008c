use std::fmt;

/// Syntactic surface a string was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringContext {
    /// Plain text between markup tags.
    TextNode,
    /// A markup attribute or JSX prop value.
    Attribute,
    /// A string literal in plain code.
    Code,
    /// A template literal, or combined markup text with expression children.
    Template,
}

impl fmt::Display for StringContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StringContext::TextNode => "text-node",
            StringContext::Attribute => "attribute",
            StringContext::Code => "code",
            StringContext::Template => "template",
        };
        write!(f, "{}", name)
    }
}

/// Kind of component a string was found in.
///
/// Determines which capability-injection strategy applies: hooks for
/// function/setup components, HOC wrapping for class components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentKind {
    Function,
    Class,
    /// Vue `<script setup>` block.
    Setup,
    /// Vue options-API component.
    Options,
    #[default]
    Other,
}

/// One natural-language literal discovered in a source file.
///
/// Created by an extractor; `semantic_id` is filled exactly once by the
/// identifier assigner and the record is read-only thereafter. Two records
/// with identical processed messages converge onto the same identifier but
/// are never merged.
#[derive(Debug, Clone)]
pub struct ExtractedString {
    /// The literal exactly as it appears in source.
    pub original: String,
    /// Message text after placeholder substitution, when it differs from
    /// `original` (template literals, combined markup children).
    pub processed_message: Option<String>,
    /// Stable identifier; empty until assignment.
    pub semantic_id: String,
    pub file_path: String,
    /// 1-indexed source line.
    pub line: usize,
    /// 1-indexed source column.
    pub column: usize,
    pub context: StringContext,
    pub component_kind: ComponentKind,
    pub is_template_literal: bool,
    /// Placeholder variable names, in interpolation order.
    pub template_variables: Vec<String>,
}

impl ExtractedString {
    /// The message text translations are keyed from.
    pub fn message(&self) -> &str {
        self.processed_message.as_deref().unwrap_or(&self.original)
    }

    pub fn has_id(&self) -> bool {
        !self.semantic_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExtractedString {
        ExtractedString {
            original: "你好 ${name}".to_string(),
            processed_message: Some("你好 {name}".to_string()),
            semantic_id: String::new(),
            file_path: "src/App.tsx".to_string(),
            line: 3,
            column: 10,
            context: StringContext::Template,
            component_kind: ComponentKind::Function,
            is_template_literal: true,
            template_variables: vec!["name".to_string()],
        }
    }

    #[test]
    fn test_message_prefers_processed() {
        let s = sample();
        assert_eq!(s.message(), "你好 {name}");

        let plain = ExtractedString {
            processed_message: None,
            ..sample()
        };
        assert_eq!(plain.message(), "你好 ${name}");
    }

    #[test]
    fn test_has_id() {
        let mut s = sample();
        assert!(!s.has_id());
        s.semantic_id = "app__hello".to_string();
        assert!(s.has_id());
    }

    #[test]
    fn test_context_display() {
        assert_eq!(StringContext::TextNode.to_string(), "text-node");
        assert_eq!(StringContext::Attribute.to_string(), "attribute");
        assert_eq!(StringContext::Code.to_string(), "code");
        assert_eq!(StringContext::Template.to_string(), "template");
    }
}
