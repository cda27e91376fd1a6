//! Markup emission counters.
//!
//! Atomic counters accumulated across renders; `snapshot()` copies them out
//! for tests and periodic logging. Counters are totals, not per-frame values.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RenderMetrics {
    /// Number of full markup renders executed.
    pub renders: AtomicU64,
    /// Open tags emitted (including reopens after a crossing close).
    pub tags_opened: AtomicU64,
    /// Close tags emitted (including closes forced by a crossing close).
    pub tags_closed: AtomicU64,
    /// Cursor markers emitted.
    pub cursor_markers: AtomicU64,
    /// Characters that required escaping.
    pub chars_escaped: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderMetricsSnapshot {
    pub renders: u64,
    pub tags_opened: u64,
    pub tags_closed: u64,
    pub cursor_markers: u64,
    pub chars_escaped: u64,
}

impl RenderMetrics {
    pub fn bump(field: &AtomicU64, n: u64) {
        field.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RenderMetricsSnapshot {
        RenderMetricsSnapshot {
            renders: self.renders.load(Ordering::Relaxed),
            tags_opened: self.tags_opened.load(Ordering::Relaxed),
            tags_closed: self.tags_closed.load(Ordering::Relaxed),
            cursor_markers: self.cursor_markers.load(Ordering::Relaxed),
            chars_escaped: self.chars_escaped.load(Ordering::Relaxed),
        }
    }
}
