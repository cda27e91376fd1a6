//! Wire event types for the text and whiteboard namespaces.
//!
//! Both engines talk to the server through named events; the enums here are
//! the typed form of those frames. Serde maps each variant to its snake_case
//! event name with the payload under `data`, which is exactly the shape the
//! transport adapter frames on the wire.
//!
//! The server assigns a strictly increasing `mod_id` to every mutation event
//! and totally orders them; `last_mod_id` on outbound events is advisory (the
//! client's most recent observed sequence number).

use serde::{Deserialize, Serialize};

/// Server-assigned participant id.
pub type UserId = u64;

/// Server-assigned mutation sequence number, strictly increasing.
pub type ModId = u64;

/// Bounded capacity shared by every transport channel.
pub const EVENT_CHANNEL_CAP: usize = 8192;

/// Sink the engines emit outbound events through. Emission is
/// fire-and-forget; implementations must not block.
pub trait EventSink<E> {
    fn emit(&mut self, event: E);
}

/// Recorder sink for tests and offline use.
impl<E> EventSink<E> for Vec<E> {
    fn emit(&mut self, event: E) {
        self.push(event);
    }
}

/// Events arriving at the client on the text namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum TextServerEvent {
    Connected {
        userid: UserId,
        content: String,
        mod_id: ModId,
    },
    UserDisconnected {
        userid: UserId,
    },
    /// Transport keepalive; carries no payload.
    Ping,
    AddRegion {
        text: String,
        position: usize,
        userid: UserId,
        mod_id: ModId,
    },
    RemoveRegion {
        start: usize,
        end: usize,
        userid: UserId,
        mod_id: ModId,
    },
    AddProperty {
        start: usize,
        end: usize,
        property: String,
        flag: Option<String>,
        userid: UserId,
        mod_id: ModId,
    },
    RemoveProperty {
        start: usize,
        end: usize,
        property: String,
        userid: UserId,
        mod_id: ModId,
    },
    CursorMoved {
        position: usize,
        userid: UserId,
        username: String,
        mod_id: ModId,
    },
}

impl TextServerEvent {
    /// The originating user for mutation events; `None` for control events.
    pub fn userid(&self) -> Option<UserId> {
        match self {
            Self::AddRegion { userid, .. }
            | Self::RemoveRegion { userid, .. }
            | Self::AddProperty { userid, .. }
            | Self::RemoveProperty { userid, .. }
            | Self::CursorMoved { userid, .. } => Some(*userid),
            Self::Connected { .. } | Self::UserDisconnected { .. } | Self::Ping => None,
        }
    }

    /// The server sequence number for mutation events.
    pub fn mod_id(&self) -> Option<ModId> {
        match self {
            Self::AddRegion { mod_id, .. }
            | Self::RemoveRegion { mod_id, .. }
            | Self::AddProperty { mod_id, .. }
            | Self::RemoveProperty { mod_id, .. }
            | Self::CursorMoved { mod_id, .. } => Some(*mod_id),
            Self::Connected { .. } | Self::UserDisconnected { .. } | Self::Ping => None,
        }
    }

    pub fn is_mutation(&self) -> bool {
        self.mod_id().is_some()
    }
}

/// Events the client emits on the text namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum TextClientEvent {
    AddRegion {
        text: String,
        position: usize,
        last_mod_id: ModId,
    },
    RemoveRegion {
        start: usize,
        end: usize,
        last_mod_id: ModId,
    },
    AddProperty {
        start: usize,
        end: usize,
        property: String,
        flag: Option<String>,
        last_mod_id: ModId,
    },
    RemoveProperty {
        start: usize,
        end: usize,
        property: String,
        last_mod_id: ModId,
    },
    CursorMoved {
        position: usize,
        last_mod_id: ModId,
    },
    /// Piggyback heartbeat answering a `ping` when the observed sequence
    /// number moved without a local mutation.
    UpdateLastModId {
        last_mod_id: ModId,
    },
}

/// Whiteboard events; the namespace is symmetric, so one enum serves both
/// directions. Every operation is keyed by a globally unique element id and
/// is idempotent under the server's total order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum BoardEvent {
    Draw {
        id: String,
        d: String,
    },
    Remove {
        id: String,
    },
    Edit {
        id: String,
        d: String,
    },
    Group {
        group_id: String,
        children_ids: Vec<String>,
    },
    Ungroup {
        group_id: String,
    },
}
