//! Styled-range property table.
//!
//! A property is a named styling directive mapped onto half-open char ranges.
//! Two shapes exist and the shape is locked by the first application:
//! * flagless: one set of disjoint ranges (`bold`, `italic`);
//! * flagged: flag string to set of disjoint ranges (`align`, keyed by
//!   flags like `align=left`).
//!
//! Invariants, enforced after every mutation:
//! * within one (property, flag) bucket all spans are disjoint, sorted by
//!   start, and non-degenerate (`start < end`);
//! * empty spans, empty flag buckets and empty property entries are pruned;
//! * adding a span that touches existing spans coalesces them into one
//!   (both-side touches collapse all three into a single span).
//!
//! A shape-mismatched application (flag on a flagless property or the
//! reverse) is rejected as a no-op; both replicas of every peer reject
//! identically so the tables stay convergent.

use std::collections::BTreeMap;

use crate::shift;

/// Half-open char range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// True when `other` lies entirely inside `self`.
    pub fn covers(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// A sorted set of disjoint spans for one (property, flag) bucket.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RangeSet {
    spans: Vec<Span>,
}

impl RangeSet {
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// True when a single existing span fully covers `span`.
    pub fn covering(&self, span: Span) -> bool {
        self.spans.iter().any(|s| s.covers(span))
    }

    /// Insert `span`, coalescing with any span it touches. The caller has
    /// already cleared overlapping coverage via [`RangeSet::remove`], so only
    /// exact touches are possible here.
    pub fn add(&mut self, span: Span) {
        debug_assert!(!span.is_empty(), "degenerate span");
        if span.is_empty() {
            return;
        }
        let mut merged = span;
        if let Some(i) = self.spans.iter().position(|s| s.end == span.start) {
            merged.start = self.spans[i].start;
            self.spans.remove(i);
        }
        if let Some(i) = self.spans.iter().position(|s| s.start == span.end) {
            merged.end = self.spans[i].end;
            self.spans.remove(i);
        }
        let at = self
            .spans
            .iter()
            .position(|s| s.start > merged.start)
            .unwrap_or(self.spans.len());
        self.spans.insert(at, merged);
    }

    /// Split every span by `[span.start, span.end)`: keep the part before the
    /// cut and the part after it, dropping anything that collapses.
    pub fn remove(&mut self, span: Span) {
        if span.is_empty() {
            return;
        }
        let mut kept = Vec::with_capacity(self.spans.len() + 1);
        for s in self.spans.drain(..) {
            let before = Span::new(s.start, s.end.min(span.start));
            let after = Span::new(s.start.max(span.end), s.end);
            if !before.is_empty() {
                kept.push(before);
            }
            if !after.is_empty() {
                kept.push(after);
            }
        }
        self.spans = kept;
    }

    /// Shift both endpoints under an insertion at `at` (strict rule; an
    /// insertion exactly at a span's end does not grow it).
    pub fn shift_insert(&mut self, at: usize, len: usize) {
        for s in &mut self.spans {
            s.start = shift::for_insert(s.start, at, len);
            s.end = shift::for_insert(s.end, at, len);
        }
    }

    /// Shift both endpoints under a removal of `[start, end)`, dropping spans
    /// that collapse.
    pub fn shift_remove(&mut self, start: usize, end: usize) {
        for s in &mut self.spans {
            s.start = shift::for_remove(s.start, start, end);
            s.end = shift::for_remove(s.end, start, end);
        }
        self.spans.retain(|s| !s.is_empty());
    }
}

/// Value of one property entry; the shape is fixed by the first application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyValue {
    Flagless(RangeSet),
    Flagged(BTreeMap<String, RangeSet>),
}

/// The full property table of one replica.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyTable {
    entries: BTreeMap<String, PropertyValue>,
}

impl PropertyTable {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply `[start, end)` to (property, flag). Existing coverage of the
    /// property inside the interval is cleared first (across every flag
    /// bucket), then the span is added to the target bucket with touch
    /// coalescing. Returns false without mutating on a shape mismatch.
    pub fn add(&mut self, start: usize, end: usize, property: &str, flag: Option<&str>) -> bool {
        let span = Span::new(start, end);
        if span.is_empty() {
            return false;
        }
        if !self.shape_allows(property, flag) {
            tracing::warn!(target: "text.props", property, ?flag, "property_shape_mismatch");
            return false;
        }
        self.remove(start, end, property);
        let value = self.entries.entry(property.to_string()).or_insert_with(|| match flag {
            None => PropertyValue::Flagless(RangeSet::default()),
            Some(_) => PropertyValue::Flagged(BTreeMap::new()),
        });
        match (value, flag) {
            (PropertyValue::Flagless(set), None) => set.add(span),
            (PropertyValue::Flagged(map), Some(f)) => {
                map.entry(f.to_string()).or_default().add(span);
            }
            // shape was checked above and remove() cannot change it
            _ => return false,
        }
        true
    }

    /// Clear `[start, end)` from every flag bucket of `property`.
    pub fn remove(&mut self, start: usize, end: usize, property: &str) {
        let span = Span::new(start, end);
        if let Some(value) = self.entries.get_mut(property) {
            match value {
                PropertyValue::Flagless(set) => set.remove(span),
                PropertyValue::Flagged(map) => {
                    for set in map.values_mut() {
                        set.remove(span);
                    }
                }
            }
        }
        self.prune();
    }

    /// True when (property, flag) would be accepted by [`PropertyTable::add`]:
    /// either the property does not exist yet or its locked shape matches the
    /// presence of `flag`.
    pub fn shape_allows(&self, property: &str, flag: Option<&str>) -> bool {
        match self.entries.get(property) {
            None => true,
            Some(PropertyValue::Flagless(_)) => flag.is_none(),
            Some(PropertyValue::Flagged(_)) => flag.is_some(),
        }
    }

    /// True when a single range of (property, flag) fully covers `[start, end)`.
    pub fn has_covering(&self, start: usize, end: usize, property: &str, flag: Option<&str>) -> bool {
        let span = Span::new(start, end);
        match (self.entries.get(property), flag) {
            (Some(PropertyValue::Flagless(set)), None) => set.covering(span),
            (Some(PropertyValue::Flagged(map)), Some(f)) => {
                map.get(f).is_some_and(|set| set.covering(span))
            }
            _ => false,
        }
    }

    pub fn shift_insert(&mut self, at: usize, len: usize) {
        for value in self.entries.values_mut() {
            match value {
                PropertyValue::Flagless(set) => set.shift_insert(at, len),
                PropertyValue::Flagged(map) => {
                    for set in map.values_mut() {
                        set.shift_insert(at, len);
                    }
                }
            }
        }
    }

    pub fn shift_remove(&mut self, start: usize, end: usize) {
        for value in self.entries.values_mut() {
            match value {
                PropertyValue::Flagless(set) => set.shift_remove(start, end),
                PropertyValue::Flagged(map) => {
                    for set in map.values_mut() {
                        set.shift_remove(start, end);
                    }
                }
            }
        }
        self.prune();
    }

    /// Every (property, flag, span) triple, in deterministic table order.
    pub fn ranges(&self) -> Vec<(&str, Option<&str>, Span)> {
        let mut out = Vec::new();
        for (property, value) in &self.entries {
            match value {
                PropertyValue::Flagless(set) => {
                    for &span in set.spans() {
                        out.push((property.as_str(), None, span));
                    }
                }
                PropertyValue::Flagged(map) => {
                    for (flag, set) in map {
                        for &span in set.spans() {
                            out.push((property.as_str(), Some(flag.as_str()), span));
                        }
                    }
                }
            }
        }
        out
    }

    fn prune(&mut self) {
        self.entries.retain(|_, value| match value {
            PropertyValue::Flagless(set) => !set.is_empty(),
            PropertyValue::Flagged(map) => {
                map.retain(|_, set| !set.is_empty());
                !map.is_empty()
            }
        });
    }
}
