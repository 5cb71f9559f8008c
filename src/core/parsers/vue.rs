//! Vue single-file-component parsing.
//!
//! SFC handling is split across two surfaces. `<script>` blocks are plain
//! JS/TS and go through the swc parser; the `<template>` surface is scanned
//! and edited against the raw text, because byte-exact reconstruction (and
//! keeping multiple blocks in one file from cross-contaminating) needs
//! original offsets, which a DOM-style parse does not preserve.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SfcBlockKind {
    Template,
    Script,
    /// `<script setup>`: composition API, hook bindings go at the top of
    /// the block instead of inside a setup() function.
    ScriptSetup,
}

/// One top-level block of an SFC.
#[derive(Debug, Clone)]
pub struct SfcBlock {
    pub kind: SfcBlockKind,
    /// Block content between the opening and closing tags.
    pub content: String,
    /// Byte offset of `content` within the full file.
    pub content_start: usize,
    /// 1-based line number where `content` starts.
    pub start_line: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedSfc {
    pub source: String,
    pub blocks: Vec<SfcBlock>,
}

impl ParsedSfc {
    pub fn script(&self) -> Option<&SfcBlock> {
        self.blocks
            .iter()
            .find(|b| matches!(b.kind, SfcBlockKind::Script | SfcBlockKind::ScriptSetup))
    }

    pub fn templates(&self) -> impl Iterator<Item = &SfcBlock> {
        self.blocks
            .iter()
            .filter(|b| b.kind == SfcBlockKind::Template)
    }
}

fn script_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<script\b([^>]*)>").expect("static regex"))
}

fn template_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</?template\b[^>]*>").expect("static regex"))
}

/// Split an SFC into its top-level template and script blocks.
///
/// Nested `<template #slot>` elements inside the top-level template are
/// tracked by depth so they stay part of their parent block. Blocks appear
/// in source order.
pub fn parse_sfc(source: &str) -> ParsedSfc {
    let line_index = super::build_line_index(source);
    let mut blocks = Vec::new();

    // Template blocks, depth-tracked.
    let mut depth = 0usize;
    let mut open_end = 0usize;
    for m in template_tag_re().find_iter(source) {
        let is_close = m.as_str().starts_with("</");
        if is_close {
            if depth > 0 {
                depth -= 1;
                if depth == 0 {
                    blocks.push(make_block(
                        source,
                        &line_index,
                        SfcBlockKind::Template,
                        open_end,
                        m.start(),
                    ));
                }
            }
        } else {
            if depth == 0 {
                open_end = m.end();
            }
            depth += 1;
        }
    }

    // Script blocks; no nesting to worry about.
    for m in script_open_re().captures_iter(source) {
        let whole = m.get(0).expect("match");
        let attrs = m.get(1).map(|g| g.as_str()).unwrap_or("");
        let content_start = whole.end();
        let Some(rel_close) = source[content_start..].find("</script>") else {
            continue;
        };
        let kind = if attrs.contains("setup") {
            SfcBlockKind::ScriptSetup
        } else {
            SfcBlockKind::Script
        };
        blocks.push(make_block(
            source,
            &line_index,
            kind,
            content_start,
            content_start + rel_close,
        ));
    }

    blocks.sort_by_key(|b| b.content_start);
    ParsedSfc {
        source: source.to_string(),
        blocks,
    }
}

fn make_block(
    source: &str,
    line_index: &[usize],
    kind: SfcBlockKind,
    start: usize,
    end: usize,
) -> SfcBlock {
    SfcBlock {
        kind,
        content: source[start..end].to_string(),
        content_start: start,
        start_line: super::offset_to_line(line_index, start),
    }
}

/// One scanned node of a template block.
///
/// Offsets are byte positions relative to the block content. `seg`
/// increments at every tag boundary, so consecutive text/interpolation
/// nodes with equal `seg` are children of the same markup node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
    Text {
        start: usize,
        end: usize,
        text: String,
        seg: usize,
    },
    Interpolation {
        start: usize,
        end: usize,
        expr: String,
        seg: usize,
    },
    Attribute {
        /// Span of the whole `name="value"` text.
        start: usize,
        end: usize,
        tag: String,
        name: String,
        value: String,
        /// Offset of the value inside the quotes.
        value_start: usize,
        /// True for `:`-bound, `@`-listener, and `v-` directive attributes.
        bound: bool,
        seg: usize,
    },
}

fn interpolation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("static regex"))
}

fn tag_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^</?\s*([A-Za-z][\w.-]*)").expect("static regex"))
}

fn attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([:@#A-Za-z][\w.:@-]*)\s*=\s*"([^"]*)""#).expect("static regex")
    })
}

/// Scan a template block's content into an ordered node list.
pub fn scan_template(content: &str) -> Vec<TemplateNode> {
    let mut nodes = Vec::new();
    let mut pos = 0usize;
    let mut seg = 0usize;

    while pos < content.len() {
        let Some(rel_lt) = content[pos..].find('<') else {
            scan_text_run(content, pos, content.len(), seg, &mut nodes);
            break;
        };
        let lt = pos + rel_lt;
        scan_text_run(content, pos, lt, seg, &mut nodes);

        if content[lt..].starts_with("<!--") {
            let close = content[lt..]
                .find("-->")
                .map(|i| lt + i + 3)
                .unwrap_or(content.len());
            pos = close;
            continue;
        }

        let Some(gt) = find_tag_end(content, lt) else {
            break;
        };
        let tag_text = &content[lt..=gt];
        seg += 1;

        if !tag_text.starts_with("</")
            && let Some(name_caps) = tag_name_re().captures(tag_text)
        {
            let tag_name = name_caps.get(1).expect("tag name").as_str().to_string();
            for caps in attr_re().captures_iter(tag_text) {
                let whole = caps.get(0).expect("attr match");
                let name = caps.get(1).expect("attr name").as_str();
                let value = caps.get(2).expect("attr value");
                let bound =
                    name.starts_with(':') || name.starts_with('@') || name.starts_with("v-");
                nodes.push(TemplateNode::Attribute {
                    start: lt + whole.start(),
                    end: lt + whole.end(),
                    tag: tag_name.clone(),
                    name: name.to_string(),
                    value: value.as_str().to_string(),
                    value_start: lt + value.start(),
                    bound,
                    seg,
                });
            }
        }
        pos = gt + 1;
    }

    nodes
}

/// Emit text and interpolation nodes for the run `start..end`.
fn scan_text_run(
    content: &str,
    start: usize,
    end: usize,
    seg: usize,
    nodes: &mut Vec<TemplateNode>,
) {
    if start >= end {
        return;
    }
    let run = &content[start..end];
    let mut cursor = 0usize;
    for caps in interpolation_re().captures_iter(run) {
        let whole = caps.get(0).expect("interp match");
        push_text(run, cursor, whole.start(), start, seg, nodes);
        nodes.push(TemplateNode::Interpolation {
            start: start + whole.start(),
            end: start + whole.end(),
            expr: caps.get(1).expect("interp expr").as_str().trim().to_string(),
            seg,
        });
        cursor = whole.end();
    }
    push_text(run, cursor, run.len(), start, seg, nodes);
}

fn push_text(
    run: &str,
    from: usize,
    to: usize,
    base: usize,
    seg: usize,
    nodes: &mut Vec<TemplateNode>,
) {
    if from >= to {
        return;
    }
    let raw = &run[from..to];
    if raw.trim().is_empty() {
        return;
    }
    nodes.push(TemplateNode::Text {
        start: base + from,
        end: base + to,
        text: raw.to_string(),
        seg,
    });
}

/// Find the closing `>` of the tag opening at `lt`, respecting quotes.
fn find_tag_end(content: &str, lt: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in content[lt..].char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return Some(lt + i),
            _ => {}
        }
    }
    None
}
