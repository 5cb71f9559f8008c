//! Pending-edit arena.
//!
//! Rewrite passes never mutate source text during traversal. They collect
//! `{start, end, text}` byte ranges into an [`EditArena`] and apply them in
//! one batch, sorted by descending start offset so earlier edits never
//! invalidate the offsets of edits later in source order.

use tracing::warn;

/// One pending replacement of the byte range `start..end` with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct EditArena {
    edits: Vec<Edit>,
}

impl EditArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, start: usize, end: usize, text: impl Into<String>) {
        debug_assert!(start <= end, "edit range reversed: {}..{}", start, end);
        self.edits.push(Edit {
            start,
            end,
            text: text.into(),
        });
    }

    /// Insert text at a single offset.
    pub fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.push(at, at, text);
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Apply all edits to `source` in one pass.
    ///
    /// Overlap resolution happens first, in source order (ties broken by
    /// submission order): an edit overlapping an already-kept one is
    /// dropped with a warning; the passes that feed the arena produce
    /// disjoint ranges, so an overlap means two rules matched the same
    /// site. The kept edits are then applied sorted by descending start
    /// offset so earlier edits never invalidate later offsets.
    pub fn apply(mut self, source: &str) -> String {
        if self.edits.is_empty() {
            return source.to_string();
        }

        let mut order: Vec<usize> = (0..self.edits.len()).collect();
        order.sort_by(|&a, &b| {
            let ea = &self.edits[a];
            let eb = &self.edits[b];
            ea.start.cmp(&eb.start).then(a.cmp(&b))
        });

        let mut kept: Vec<Edit> = Vec::with_capacity(self.edits.len());
        let mut covered_end = 0usize;
        for idx in order {
            let edit = std::mem::take(&mut self.edits[idx]);
            if edit.end > source.len() {
                warn!(start = edit.start, end = edit.end, "dropping out-of-range edit");
                continue;
            }
            if !source.is_char_boundary(edit.start) || !source.is_char_boundary(edit.end) {
                warn!(start = edit.start, end = edit.end, "dropping edit off a char boundary");
                continue;
            }
            // Insertions at the covered boundary are fine; anything
            // starting inside an already-kept range is not.
            if edit.start < covered_end {
                warn!(start = edit.start, end = edit.end, "dropping overlapping edit");
                continue;
            }
            covered_end = covered_end.max(edit.end);
            kept.push(edit);
        }

        let mut result = source.to_string();
        for edit in kept.into_iter().rev() {
            result.replace_range(edit.start..edit.end, &edit.text);
        }
        result
    }
}

impl Default for Edit {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            text: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_arena_returns_source() {
        let arena = EditArena::new();
        assert_eq!(arena.apply("unchanged"), "unchanged");
    }

    #[test]
    fn test_single_replacement() {
        let mut arena = EditArena::new();
        arena.push(4, 9, "world");
        assert_eq!(arena.apply("say hello"), "say world");
    }

    #[test]
    fn test_edits_applied_descending_offsets() {
        // Submitted in source order; replacements of different lengths must
        // not shift each other.
        let source = "aaa bbb ccc";
        let mut arena = EditArena::new();
        arena.push(0, 3, "first-long");
        arena.push(4, 7, "x");
        arena.push(8, 11, "third-longer");
        assert_eq!(arena.apply(source), "first-long x third-longer");
    }

    #[test]
    fn test_insertion() {
        let mut arena = EditArena::new();
        arena.insert(0, ">>");
        arena.insert(5, "<<");
        assert_eq!(arena.apply("hello"), ">>hello<<");
    }

    #[test]
    fn test_overlapping_edit_dropped() {
        let mut arena = EditArena::new();
        arena.push(0, 5, "AAAAA");
        arena.push(3, 8, "BBB");
        let out = arena.apply("0123456789");
        // First submission wins; the overlapping one is dropped.
        assert_eq!(out, "AAAAA56789");
    }

    #[test]
    fn test_out_of_range_edit_dropped() {
        let mut arena = EditArena::new();
        arena.push(0, 3, "ok");
        arena.push(50, 60, "nope");
        assert_eq!(arena.apply("abcdef"), "okdef");
    }

    #[test]
    fn test_multibyte_boundaries() {
        let source = "<p>确认</p>";
        let start = source.find("确认").unwrap();
        let end = start + "确认".len();
        let mut arena = EditArena::new();
        arena.push(start, end, "{t('confirm')}");
        assert_eq!(arena.apply(source), "<p>{t('confirm')}</p>");
    }

    #[test]
    fn test_non_boundary_edit_dropped() {
        let source = "确认";
        let mut arena = EditArena::new();
        arena.push(1, 2, "x"); // inside the first multi-byte char
        assert_eq!(arena.apply(source), "确认");
    }

    #[test]
    fn test_same_offset_insertions_keep_submission_order() {
        let mut arena = EditArena::new();
        arena.insert(0, "a");
        arena.insert(0, "b");
        assert_eq!(arena.apply("X"), "abX");
    }
}
