//! Vue SFC text extraction.
//!
//! The template and script blocks of a file are handled separately. Script
//! blocks are plain TS and go through the same AST extraction as React code
//! (line numbers offset by the block's start line). The template surface is
//! scanned from raw text: plain text nodes, static and bound attribute
//! values, and interpolation expressions each become extraction candidates,
//! with adjacent text and interpolations combined into a single template
//! record.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::warn;

use crate::core::parsers::vue::{SfcBlock, SfcBlockKind, TemplateNode, parse_sfc, scan_template};
use crate::core::parsers::{build_line_index, offset_to_column, offset_to_line};
use crate::core::{ComponentKind, ExtractedString, StringContext};
use crate::extract::react::ReactExtractor;
use crate::extract::{Extract, placeholder_name};
use crate::library::LibraryCapabilityDescriptor;
use crate::utils::{collapse_markup_whitespace, contains_ideographic};

/// Extractor for Vue single-file components.
pub struct VueExtractor {
    descriptor: LibraryCapabilityDescriptor,
    technical_attributes: HashSet<String>,
}

fn quoted_literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"'([^'\\]+)'").expect("static regex"))
}

/// Quoted ideographic literals inside an expression, as
/// `(inner text, byte offset of the opening quote within the expression)`.
pub fn quoted_ideographic_literals(expr: &str) -> Vec<(&str, usize)> {
    quoted_literal_re()
        .captures_iter(expr)
        .filter_map(|caps| {
            let m = caps.get(1)?;
            contains_ideographic(m.as_str()).then(|| (m.as_str(), m.start() - 1))
        })
        .collect()
}

impl VueExtractor {
    pub fn new(
        descriptor: LibraryCapabilityDescriptor,
        technical_attributes: &[String],
    ) -> Self {
        Self {
            descriptor,
            technical_attributes: technical_attributes.iter().cloned().collect(),
        }
    }

    pub fn extract_source(&self, source: &str, file_path: &str) -> Result<Vec<ExtractedString>> {
        let sfc = parse_sfc(source);
        let line_index = build_line_index(source);
        let mut results = Vec::new();

        for block in &sfc.blocks {
            match block.kind {
                SfcBlockKind::Template => {
                    self.extract_template_block(block, &line_index, file_path, &mut results);
                }
                SfcBlockKind::Script | SfcBlockKind::ScriptSetup => {
                    self.extract_script_block(block, file_path, &mut results);
                }
            }
        }

        Ok(results)
    }

    fn extract_script_block(
        &self,
        block: &SfcBlock,
        file_path: &str,
        out: &mut Vec<ExtractedString>,
    ) {
        let kind = match block.kind {
            SfcBlockKind::ScriptSetup => ComponentKind::Setup,
            _ => ComponentKind::Options,
        };
        let inner = ReactExtractor::new(
            self.descriptor.clone(),
            &self.technical_attributes.iter().cloned().collect::<Vec<_>>(),
        );
        match inner.extract_source(&block.content, file_path) {
            Ok(mut records) => {
                for record in &mut records {
                    record.line += block.start_line - 1;
                    record.component_kind = kind;
                }
                out.extend(records);
            }
            Err(err) => {
                // The template surface is independent; a broken script block
                // does not abort the file.
                warn!(file = file_path, error = %err, "failed to parse script block");
            }
        }
    }

    fn extract_template_block(
        &self,
        block: &SfcBlock,
        line_index: &[usize],
        file_path: &str,
        out: &mut Vec<ExtractedString>,
    ) {
        let nodes = scan_template(&block.content);

        let mut i = 0usize;
        while i < nodes.len() {
            match &nodes[i] {
                TemplateNode::Attribute {
                    start,
                    name,
                    value,
                    value_start,
                    bound,
                    ..
                } => {
                    self.extract_attribute(
                        block, line_index, file_path, *start, name, value, *value_start, *bound,
                        out,
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
                    self.extract_text_run(block, line_index, file_path, &nodes[i..j], out);
                    i = j;
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn extract_attribute(
        &self,
        block: &SfcBlock,
        line_index: &[usize],
        file_path: &str,
        attr_start: usize,
        name: &str,
        value: &str,
        value_start: usize,
        bound: bool,
        out: &mut Vec<ExtractedString>,
    ) {
        if value.trim().is_empty() {
            return;
        }

        if bound {
            // A bound attribute value is an expression; only a pure quoted
            // literal is extractable, and `$t(...)` is already translated.
            if value.contains("$t(") {
                return;
            }
            let trimmed = value.trim();
            let is_pure_literal = trimmed.len() >= 2
                && trimmed.starts_with('\'')
                && trimmed.ends_with('\'')
                && !trimmed[1..trimmed.len() - 1].contains('\'');
            if !is_pure_literal {
                return;
            }
            let inner = &trimmed[1..trimmed.len() - 1];
            if !contains_ideographic(inner) {
                return;
            }
            let offset = block.content_start + value_start;
            out.push(self.record(
                inner.to_string(),
                None,
                file_path,
                line_index,
                offset,
                StringContext::Attribute,
                false,
                Vec::new(),
            ));
            return;
        }

        let plain_name = name.trim_start_matches(':');
        let ideographic = contains_ideographic(value);
        if self.technical_attributes.contains(plain_name) && !ideographic {
            return;
        }
        if !ideographic {
            return;
        }
        let offset = block.content_start + attr_start;
        out.push(self.record(
            value.to_string(),
            None,
            file_path,
            line_index,
            offset,
            StringContext::Attribute,
            false,
            Vec::new(),
        ));
    }

    /// Extract one run of adjacent text/interpolation children.
    fn extract_text_run(
        &self,
        block: &SfcBlock,
        line_index: &[usize],
        file_path: &str,
        run: &[TemplateNode],
        out: &mut Vec<ExtractedString>,
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
            // One combined template record for the whole run.
            let mut raw = String::new();
            let mut variables: Vec<String> = Vec::new();
            let mut lo = usize::MAX;
            let mut hi = 0usize;
            let mut expr_index = 0usize;
            for node in run {
                match node {
                    TemplateNode::Text { start, end, text, .. } => {
                        raw.push_str(text);
                        let trim_start = text.len() - text.trim_start().len();
                        let trim_end = text.len() - text.trim_end().len();
                        if !text.trim().is_empty() {
                            lo = lo.min(start + trim_start);
                            hi = hi.max(end - trim_end);
                        }
                    }
                    TemplateNode::Interpolation { start, end, expr, .. } => {
                        let name = placeholder_name(expr, expr_index, &variables);
                        raw.push_str(&self.descriptor.placeholder(&name));
                        variables.push(name);
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
            let original = block.content[lo..hi].to_string();
            let message = collapse_markup_whitespace(&raw);
            let offset = block.content_start + lo;
            out.push(self.record(
                original,
                Some(message),
                file_path,
                line_index,
                offset,
                StringContext::Template,
                false,
                variables,
            ));
            return;
        }

        // Otherwise: plain text nodes individually, plus quoted literals
        // inside untranslated interpolation expressions.
        for node in run {
            match node {
                TemplateNode::Text { start, text, .. } => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() || !contains_ideographic(trimmed) {
                        continue;
                    }
                    let trim_start = text.len() - text.trim_start().len();
                    let offset = block.content_start + start + trim_start;
                    out.push(self.record(
                        collapse_markup_whitespace(trimmed),
                        None,
                        file_path,
                        line_index,
                        offset,
                        StringContext::TextNode,
                        false,
                        Vec::new(),
                    ));
                }
                TemplateNode::Interpolation { start, expr, .. } => {
                    if expr.contains("$t(") {
                        continue;
                    }
                    for caps in quoted_literal_re().captures_iter(expr) {
                        let literal = caps.get(1).expect("literal").as_str();
                        if !contains_ideographic(literal) {
                            continue;
                        }
                        let offset = block.content_start + start;
                        out.push(self.record(
                            literal.to_string(),
                            None,
                            file_path,
                            line_index,
                            offset,
                            StringContext::Code,
                            false,
                            Vec::new(),
                        ));
                    }
                }
                TemplateNode::Attribute { .. } => {}
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &self,
        original: String,
        processed: Option<String>,
        file_path: &str,
        line_index: &[usize],
        offset: usize,
        context: StringContext,
        is_template: bool,
        variables: Vec<String>,
    ) -> ExtractedString {
        ExtractedString {
            original,
            processed_message: processed,
            semantic_id: String::new(),
            file_path: file_path.to_string(),
            line: offset_to_line(line_index, offset),
            column: offset_to_column(line_index, offset),
            context,
            component_kind: ComponentKind::Other,
            is_template_literal: is_template,
            template_variables: variables,
        }
    }
}

impl Extract for VueExtractor {
    fn extract_from_file(&self, root: &Path, file: &str) -> Result<Vec<ExtractedString>> {
        let full = root.join(file);
        let source = fs::read_to_string(&full)
            .with_context(|| format!("Failed to read source file: {}", full.display()))?;
        self.extract_source(&source, file)
    }
}
