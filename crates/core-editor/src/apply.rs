//! Replica state and the application primitives.
//!
//! A [`Replica`] bundles the three tables that must mutate together: the
//! text, the cursor table and the property table. The engine owns two of
//! them, `live` (optimistic) and `shadow` (server-confirmed); the primitives
//! here are replica-agnostic, so authoritative and optimistic application
//! share one code path.
//!
//! Every primitive shifts the fixed points (cursor positions and property
//! range endpoints) before splicing the text, using the gap rules in
//! `core_text::shift`.

use core_text::{CursorTable, Document, PropertyTable};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Replica {
    pub content: Document,
    pub cursors: CursorTable,
    pub properties: PropertyTable,
}

impl Replica {
    pub fn from_content(content: &str) -> Self {
        Self {
            content: Document::from_str(content),
            cursors: CursorTable::default(),
            properties: PropertyTable::default(),
        }
    }

    /// Splice `text` in at `position`, shifting cursors and range endpoints.
    pub fn apply_insert(&mut self, position: usize, text: &str) {
        let len = text.chars().count();
        if len == 0 {
            return;
        }
        self.cursors.shift_insert(position, len);
        self.properties.shift_insert(position, len);
        self.content.insert(position, text);
    }

    /// Splice out `[start, end)`, collapsing cursors and range endpoints into
    /// the gap and pruning emptied property entries.
    pub fn apply_remove(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        self.cursors.shift_remove(start, end);
        self.properties.shift_remove(start, end);
        self.content.remove(start, end);
    }

    /// Apply (property, flag) over `[start, end)`. Returns false on a shape
    /// mismatch, which every replica rejects identically.
    pub fn apply_add_property(
        &mut self,
        start: usize,
        end: usize,
        property: &str,
        flag: Option<&str>,
    ) -> bool {
        self.properties.add(start, end, property, flag)
    }

    /// Clear `property` from `[start, end)` across all its flag buckets.
    pub fn apply_remove_property(&mut self, start: usize, end: usize, property: &str) {
        self.properties.remove(start, end, property);
    }
}
