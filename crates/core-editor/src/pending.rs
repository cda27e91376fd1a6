//! The pending-operation queue entries and their rebase rules.
//!
//! A pending operation is a local mutation applied optimistically and not
//! yet echoed back by the server. The five kinds form one tagged enum so the
//! rebase switch stays exhaustive.
//!
//! Rebase transforms a pending operation's coordinates as if an intervening
//! remote operation had occurred before it:
//! * remote remove `[s, e)`: every coordinate moves by the gap rule
//!   `p ↦ p - (min(e, p) - s) if p > s`, each range endpoint independently;
//! * remote insert of `len` at `q`: positional coordinates (insert anchors,
//!   cursor positions, range starts) use the strict rule `p > q`; range
//!   *ends* use the non-strict rule `p ≥ q` so an insertion at a styled
//!   range's right edge stays inside it;
//! * remote property operations shift nothing; the queue is merely replayed
//!   so conflicting layer changes compose deterministically.
//!
//! A property operation whose range collapses to empty under rebase stays in
//! the queue (the server transforms the op the same way, so the echo must
//! still match) but applies as a no-op.

use core_events::{TextServerEvent, UserId};
use core_text::{cursor::LOCAL_USERNAME, shift};

use crate::apply::Replica;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingOp {
    Insert {
        position: usize,
        text: String,
    },
    Remove {
        start: usize,
        end: usize,
    },
    AddProperty {
        start: usize,
        end: usize,
        property: String,
        flag: Option<String>,
    },
    RemoveProperty {
        start: usize,
        end: usize,
        property: String,
    },
    Cursor {
        position: usize,
    },
}

/// The coordinate shift a remote operation imposes on the pending queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteShift {
    Insert { position: usize, len: usize },
    Remove { start: usize, end: usize },
    None,
}

impl RemoteShift {
    pub fn from_event(event: &TextServerEvent) -> Self {
        match event {
            TextServerEvent::AddRegion { text, position, .. } => Self::Insert {
                position: *position,
                len: text.chars().count(),
            },
            TextServerEvent::RemoveRegion { start, end, .. } => Self::Remove {
                start: *start,
                end: *end,
            },
            _ => Self::None,
        }
    }
}

impl PendingOp {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Remove { .. } => "remove",
            Self::AddProperty { .. } => "add_property",
            Self::RemoveProperty { .. } => "remove_property",
            Self::Cursor { .. } => "cursor",
        }
    }

    /// Shift this operation's coordinates past `remote`.
    pub fn rebase(&mut self, remote: &RemoteShift) {
        match *remote {
            RemoteShift::None => {}
            RemoteShift::Insert { position: q, len } => match self {
                Self::Insert { position, .. } | Self::Cursor { position } => {
                    *position = shift::for_insert(*position, q, len);
                }
                Self::Remove { start, end }
                | Self::AddProperty { start, end, .. }
                | Self::RemoveProperty { start, end, .. } => {
                    *start = shift::for_insert(*start, q, len);
                    *end = shift::end_for_insert(*end, q, len);
                }
            },
            RemoteShift::Remove { start: s, end: e } => match self {
                Self::Insert { position, .. } | Self::Cursor { position } => {
                    *position = shift::for_remove(*position, s, e);
                }
                Self::Remove { start, end }
                | Self::AddProperty { start, end, .. }
                | Self::RemoveProperty { start, end, .. } => {
                    *start = shift::for_remove(*start, s, e);
                    *end = shift::for_remove(*end, s, e);
                }
            },
        }
    }

    /// Replay this operation into `replica`. Range operations that collapsed
    /// to empty under rebase are skipped.
    pub fn apply(&self, replica: &mut Replica, userid: UserId) {
        match self {
            Self::Insert { position, text } => replica.apply_insert(*position, text),
            Self::Remove { start, end } => replica.apply_remove(*start, *end),
            Self::AddProperty {
                start,
                end,
                property,
                flag,
            } => {
                if start < end {
                    replica.apply_add_property(*start, *end, property, flag.as_deref());
                }
            }
            Self::RemoveProperty {
                start,
                end,
                property,
            } => {
                if start < end {
                    replica.apply_remove_property(*start, *end, property);
                }
            }
            Self::Cursor { position } => {
                replica.cursors.set(userid, *position, LOCAL_USERNAME);
            }
        }
    }

    /// True when a server echo carries the same operation, compared by kind
    /// and payload.
    pub fn matches(&self, event: &TextServerEvent) -> bool {
        match (self, event) {
            (
                Self::Insert { position, text },
                TextServerEvent::AddRegion {
                    text: t,
                    position: p,
                    ..
                },
            ) => position == p && text == t,
            (
                Self::Remove { start, end },
                TextServerEvent::RemoveRegion {
                    start: s, end: e, ..
                },
            ) => start == s && end == e,
            (
                Self::AddProperty {
                    start,
                    end,
                    property,
                    flag,
                },
                TextServerEvent::AddProperty {
                    start: s,
                    end: e,
                    property: p,
                    flag: f,
                    ..
                },
            ) => start == s && end == e && property == p && flag == f,
            (
                Self::RemoveProperty {
                    start,
                    end,
                    property,
                },
                TextServerEvent::RemoveProperty {
                    start: s,
                    end: e,
                    property: p,
                    ..
                },
            ) => start == s && end == e && property == p,
            (
                Self::Cursor { position },
                TextServerEvent::CursorMoved { position: p, .. },
            ) => position == p,
            _ => false,
        }
    }
}
