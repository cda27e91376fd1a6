//! Rope-based replica document plus the replicated side tables.
//!
//! A replica holds three pieces of state that must shift together under
//! splices: the text itself ([`Document`]), the styled-range table
//! ([`props::PropertyTable`]) and the per-user cursor table
//! ([`cursor::CursorTable`]). The shift rules live in [`shift`] and are shared
//! by all three so a splice can never move the tables out of step with the
//! text.
//!
//! Positions are `char` indices into the document and denote gaps between
//! characters: insertion happens at a position in `[0, len]`, deletion removes
//! the half-open interval `[start, end)`.

use ropey::Rope;

pub mod cursor;
pub mod props;
pub mod shift;

pub use cursor::{Cursor, CursorTable};
pub use props::{PropertyTable, Span};

/// A text replica backed by a `ropey::Rope`, indexed by char position.
#[derive(Clone, Debug, Default)]
pub struct Document {
    rope: Rope,
}

impl Document {
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    pub fn from_str(content: &str) -> Self {
        Self {
            rope: Rope::from_str(content),
        }
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Splice `text` in at `position`. Out-of-bounds positions are clamped to
    /// the end; callers validate bounds before reaching this primitive.
    pub fn insert(&mut self, position: usize, text: &str) {
        debug_assert!(position <= self.len(), "insert position out of bounds");
        let at = position.min(self.len());
        self.rope.insert(at, text);
    }

    /// Splice out the half-open interval `[start, end)`. Degenerate or
    /// out-of-bounds intervals are clamped; callers validate bounds first.
    pub fn remove(&mut self, start: usize, end: usize) {
        debug_assert!(start <= end && end <= self.len(), "remove range out of bounds");
        let end = end.min(self.len());
        let start = start.min(end);
        self.rope.remove(start..end);
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.rope.chars()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.rope == other.rope
    }
}

impl Eq for Document {}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.rope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove_splice_by_char_index() {
        let mut doc = Document::from_str("abc");
        doc.insert(1, "XY");
        assert_eq!(doc.to_string(), "aXYbc");
        doc.remove(1, 3);
        assert_eq!(doc.to_string(), "abc");
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn positions_count_chars_not_bytes() {
        let mut doc = Document::from_str("é✓");
        assert_eq!(doc.len(), 2);
        doc.insert(2, "!");
        assert_eq!(doc.to_string(), "é✓!");
    }

    #[test]
    fn remove_of_empty_interval_is_noop() {
        let mut doc = Document::from_str("abc");
        doc.remove(2, 2);
        assert_eq!(doc.to_string(), "abc");
    }
}
