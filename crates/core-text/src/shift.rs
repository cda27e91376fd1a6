//! Gap-model position shifting.
//!
//! Every fixed point in a replica (cursor positions, property range
//! endpoints, pending-operation coordinates) moves under text splices by the
//! rules here. Two insert rules exist on purpose: the strict rule leaves a
//! point sitting exactly at the insertion gap where it is, the end rule moves
//! it. Range *ends* use the end rule during rebase so an insertion landing
//! exactly on a styled range's right edge stays inside the range; everything
//! else uses the strict rule.

/// `p ↦ p + len if p > at else p`.
pub fn for_insert(p: usize, at: usize, len: usize) -> usize {
    if p > at { p + len } else { p }
}

/// `p ↦ p + len if p >= at else p` (range ends under rebase).
pub fn end_for_insert(p: usize, at: usize, len: usize) -> usize {
    if p >= at { p + len } else { p }
}

/// `p ↦ p - (min(end, p) - start) if p > start else p`.
///
/// Points inside the removed interval collapse onto `start`; points past it
/// shift left by the interval length.
pub fn for_remove(p: usize, start: usize, end: usize) -> usize {
    if p > start { p - (end.min(p) - start) } else { p }
}
