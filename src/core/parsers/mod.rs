//! Source parsers: TSX via swc, Vue SFC block/template scanning.

pub mod tsx;
pub mod vue;

pub use tsx::{ParsedTsx, parse_tsx_source};
pub use vue::{ParsedSfc, SfcBlock, SfcBlockKind, TemplateNode, parse_sfc, scan_template};

/// Build an index of line start byte offsets for O(log n) line lookups.
///
/// The returned vector contains byte offsets where each line starts.
/// Line 1 starts at offset 0, line 2 starts after the first '\n', etc.
pub fn build_line_index(content: &str) -> Vec<usize> {
    let mut offsets = vec![0]; // Line 1 starts at offset 0
    for (i, c) in content.char_indices() {
        if c == '\n' {
            offsets.push(i + 1);
        }
    }
    offsets
}

/// Find the 1-based line number for a byte offset using binary search.
pub fn offset_to_line(line_index: &[usize], offset: usize) -> usize {
    match line_index.binary_search(&offset) {
        Ok(line) => line + 1, // Exact match at line start
        Err(line) => line,    // Falls within this line
    }
}

/// Find the 1-based column for a byte offset, given its line.
pub fn offset_to_column(line_index: &[usize], offset: usize) -> usize {
    let line = offset_to_line(line_index, offset);
    offset - line_index[line - 1] + 1
}
