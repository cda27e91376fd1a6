//! The collaborative text engine.
//!
//! One engine instance owns two replicas of the shared document: `live`, the
//! optimistic copy every local mutation hits immediately, and `shadow`, the
//! copy reflecting only server-confirmed state. Local mutations append to a
//! FIFO pending queue and are emitted to the server; the server echoes them
//! back in emission order inside its total order of mutation events.
//!
//! Invariants, holding between any two handled events:
//! * `live` diverges from `shadow` only by the contents of `pending`; once
//!   `pending` drains, `live == shadow`.
//! * `pending` is popped head-only, and only on an echo of the local peer's
//!   own operation.
//! * A remote operation discards `live` (shadow is copied back) and replays
//!   the pending queue with coordinates rebased past the remote op.
//! * Every mutation event advances `last_mod_id` and marks it dirty; local
//!   operations mark it clean by carrying it to the server.
//!
//! The engine runs in a single-threaded cooperative scheduler: handlers and
//! public operations run to completion, emission is fire-and-forget, and
//! there are no suspension points.

use std::collections::VecDeque;

use core_events::{EventSink, ModId, TextClientEvent, TextServerEvent, UserId};
use core_render::{MarkupRenderer, RenderMetricsSnapshot};
use core_text::cursor::LOCAL_USERNAME;

mod apply;
mod pending;

pub use apply::Replica;
pub use pending::{PendingOp, RemoteShift};

/// Render callback the engine drives after every locally observable change.
/// The real renderer lives outside this core; tests and the debug harness
/// plug in a `String` buffer or the discard sink `()`.
pub trait ViewSink {
    fn render(&mut self, markup: &str);
}

/// Keeps only the most recent markup.
impl ViewSink for String {
    fn render(&mut self, markup: &str) {
        self.clear();
        self.push_str(markup);
    }
}

/// Discards renders.
impl ViewSink for () {
    fn render(&mut self, _markup: &str) {}
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The server echoed an operation that does not match the pending head.
    /// The engine has stopped mutating and needs a fresh snapshot.
    #[error("server echo does not match pending head: expected {expected}, got {got}")]
    EchoMismatch { expected: String, got: String },
}

/// Engine lifecycle. `Desynced` is entered on an echo mismatch and left only
/// through a fresh `connected` snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Connected,
    Desynced,
}

pub struct TextEngine<E, V> {
    live: Replica,
    shadow: Replica,
    pending: VecDeque<PendingOp>,
    last_mod_id: ModId,
    mod_id_dirty: bool,
    userid: Option<UserId>,
    read_only: bool,
    phase: Phase,
    renderer: MarkupRenderer,
    out: E,
    view: V,
}

impl<E: EventSink<TextClientEvent>, V: ViewSink> TextEngine<E, V> {
    pub fn new(out: E, view: V) -> Self {
        Self::with_read_only(out, view, false)
    }

    pub fn with_read_only(out: E, view: V, read_only: bool) -> Self {
        Self {
            live: Replica::default(),
            shadow: Replica::default(),
            pending: VecDeque::new(),
            last_mod_id: 0,
            mod_id_dirty: false,
            userid: None,
            read_only,
            phase: Phase::Uninitialized,
            renderer: MarkupRenderer::default(),
            out,
            view,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True after an echo mismatch; the owner should reconnect to obtain the
    /// fresh snapshot that leaves `Desynced`.
    pub fn needs_resync(&self) -> bool {
        self.phase == Phase::Desynced
    }

    pub fn userid(&self) -> Option<UserId> {
        self.userid
    }

    pub fn last_mod_id(&self) -> ModId {
        self.last_mod_id
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_ops(&self) -> impl Iterator<Item = &PendingOp> {
        self.pending.iter()
    }

    pub fn live(&self) -> &Replica {
        &self.live
    }

    pub fn shadow(&self) -> &Replica {
        &self.shadow
    }

    pub fn content(&self) -> String {
        self.live.content.to_string()
    }

    pub fn server_content(&self) -> String {
        self.shadow.content.to_string()
    }

    /// Position of the local peer's cursor in the live replica.
    pub fn cursor_position(&self) -> Option<usize> {
        self.userid.and_then(|uid| self.live.cursors.position(uid))
    }

    pub fn outbound(&mut self) -> &mut E {
        &mut self.out
    }

    pub fn view(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn render_metrics(&self) -> RenderMetricsSnapshot {
        self.renderer.metrics.snapshot()
    }

    /// Render the live replica on demand (the engine also renders through
    /// the view sink after every observable change).
    pub fn render_markup(&self) -> String {
        self.renderer
            .render(&self.live.content, &self.live.properties, &self.live.cursors)
    }

    fn can_mutate(&self) -> bool {
        self.phase == Phase::Connected && !self.read_only && self.userid.is_some()
    }

    fn rerender(&mut self) {
        let markup = self.render_markup();
        self.view.render(&markup);
    }

    // ---- public operations -------------------------------------------------

    /// Insert `text` at `position` in the live replica, enqueue and emit the
    /// operation. If the local cursor sits exactly at `position` it advances
    /// past the inserted text by issuing a cursor move.
    pub fn insert(&mut self, text: &str, position: usize) {
        if !self.can_mutate() || text.is_empty() {
            return;
        }
        if position > self.live.content.len() {
            tracing::warn!(target: "editor.apply", position, len = self.live.content.len(), "insert_out_of_bounds");
            debug_assert!(false, "insert position out of bounds");
            return;
        }
        let text_len = text.chars().count();
        let cursor_at_gap = self.cursor_position() == Some(position);
        self.pending.push_back(PendingOp::Insert {
            position,
            text: text.to_string(),
        });
        self.out.emit(TextClientEvent::AddRegion {
            text: text.to_string(),
            position,
            last_mod_id: self.last_mod_id,
        });
        self.mod_id_dirty = false;
        self.live.apply_insert(position, text);
        tracing::trace!(target: "editor.apply", op = "insert", position, len = text_len, "local_edit");
        if cursor_at_gap {
            self.move_cursor(position + text_len);
        } else {
            self.rerender();
        }
    }

    /// Remove `[start, end)` from the live replica, enqueue and emit.
    pub fn remove(&mut self, start: usize, end: usize) {
        if !self.can_mutate() {
            return;
        }
        if start > end || end > self.live.content.len() {
            tracing::warn!(target: "editor.apply", start, end, len = self.live.content.len(), "remove_out_of_bounds");
            debug_assert!(false, "remove range out of bounds");
            return;
        }
        if start == end {
            return;
        }
        self.pending.push_back(PendingOp::Remove { start, end });
        self.out.emit(TextClientEvent::RemoveRegion {
            start,
            end,
            last_mod_id: self.last_mod_id,
        });
        self.mod_id_dirty = false;
        self.live.apply_remove(start, end);
        tracing::trace!(target: "editor.apply", op = "remove", start, end, "local_edit");
        self.rerender();
    }

    /// Move the local cursor, enqueue and emit.
    pub fn move_cursor(&mut self, position: usize) {
        if !self.can_mutate() {
            return;
        }
        if position > self.live.content.len() {
            tracing::warn!(target: "editor.apply", position, len = self.live.content.len(), "cursor_out_of_bounds");
            debug_assert!(false, "cursor position out of bounds");
            return;
        }
        let Some(uid) = self.userid else { return };
        self.pending.push_back(PendingOp::Cursor { position });
        self.live.cursors.set(uid, position, LOCAL_USERNAME);
        self.out.emit(TextClientEvent::CursorMoved {
            position,
            last_mod_id: self.last_mod_id,
        });
        self.mod_id_dirty = false;
        self.rerender();
    }

    /// Toggle (property, flag) over `[start, end)`: if a single existing
    /// range fully covers the interval the property is removed from it,
    /// otherwise it is added. Shape-mismatched additions are rejected.
    pub fn toggle_property(&mut self, start: usize, end: usize, property: &str, flag: Option<&str>) {
        if !self.can_mutate() {
            return;
        }
        if start > end || end > self.live.content.len() {
            tracing::warn!(target: "editor.apply", start, end, property, "property_out_of_bounds");
            debug_assert!(false, "property range out of bounds");
            return;
        }
        if start == end {
            return;
        }
        if self.live.properties.has_covering(start, end, property, flag) {
            self.pending.push_back(PendingOp::RemoveProperty {
                start,
                end,
                property: property.to_string(),
            });
            self.out.emit(TextClientEvent::RemoveProperty {
                start,
                end,
                property: property.to_string(),
                last_mod_id: self.last_mod_id,
            });
            self.mod_id_dirty = false;
            self.live.apply_remove_property(start, end, property);
            tracing::trace!(target: "editor.apply", op = "remove_property", property, start, end, "local_edit");
        } else {
            if !self.live.properties.shape_allows(property, flag) {
                return;
            }
            self.pending.push_back(PendingOp::AddProperty {
                start,
                end,
                property: property.to_string(),
                flag: flag.map(str::to_string),
            });
            self.out.emit(TextClientEvent::AddProperty {
                start,
                end,
                property: property.to_string(),
                flag: flag.map(str::to_string),
                last_mod_id: self.last_mod_id,
            });
            self.mod_id_dirty = false;
            self.live.apply_add_property(start, end, property, flag);
            tracing::trace!(target: "editor.apply", op = "add_property", property, start, end, "local_edit");
        }
        self.rerender();
    }

    // ---- inbound events ----------------------------------------------------

    /// Apply one server event. Returns `EngineError::EchoMismatch` when the
    /// echoed operation does not match the pending head; the engine is then
    /// `Desynced` and ignores everything except a fresh `connected`.
    pub fn handle(&mut self, event: TextServerEvent) -> Result<(), EngineError> {
        if self.phase != Phase::Connected {
            if let TextServerEvent::Connected {
                userid,
                content,
                mod_id,
            } = event
            {
                self.initialise(userid, &content, mod_id);
            } else {
                tracing::trace!(target: "editor", phase = ?self.phase, "event_ignored");
            }
            return Ok(());
        }
        match event {
            TextServerEvent::Connected {
                userid,
                content,
                mod_id,
            } => {
                // fresh snapshot after a transport reconnect
                self.initialise(userid, &content, mod_id);
                Ok(())
            }
            TextServerEvent::Ping => {
                if self.mod_id_dirty {
                    self.out.emit(TextClientEvent::UpdateLastModId {
                        last_mod_id: self.last_mod_id,
                    });
                    self.mod_id_dirty = false;
                }
                Ok(())
            }
            TextServerEvent::UserDisconnected { userid } => {
                self.live.cursors.remove(userid);
                self.shadow.cursors.remove(userid);
                tracing::debug!(target: "editor", userid, "user_disconnected");
                self.rerender();
                Ok(())
            }
            mutation => self.handle_mutation(mutation),
        }
    }

    fn handle_mutation(&mut self, event: TextServerEvent) -> Result<(), EngineError> {
        let Some(mod_id) = event.mod_id() else {
            return Ok(());
        };
        self.last_mod_id = mod_id;
        self.mod_id_dirty = true;
        self.apply_to_shadow(&event);

        if event.userid() == self.userid {
            let head = self.pending.pop_front();
            let matched = head.as_ref().is_some_and(|op| op.matches(&event));
            if !matched {
                self.phase = Phase::Desynced;
                tracing::error!(
                    target: "editor.echo",
                    expected = ?head,
                    got = ?event,
                    "echo_mismatch"
                );
                return Err(EngineError::EchoMismatch {
                    expected: format!("{head:?}"),
                    got: format!("{event:?}"),
                });
            }
            tracing::trace!(target: "editor.echo", mod_id, remaining = self.pending.len(), "echo_pop");
            Ok(())
        } else {
            let remote = RemoteShift::from_event(&event);
            self.live = self.shadow.clone();
            for op in &mut self.pending {
                op.rebase(&remote);
            }
            if let Some(uid) = self.userid {
                for op in &self.pending {
                    op.apply(&mut self.live, uid);
                }
            }
            tracing::trace!(target: "editor.rebase", mod_id, pending = self.pending.len(), "replayed");
            self.rerender();
            Ok(())
        }
    }

    fn apply_to_shadow(&mut self, event: &TextServerEvent) {
        match event {
            TextServerEvent::AddRegion { text, position, .. } => {
                self.shadow.apply_insert(*position, text);
            }
            TextServerEvent::RemoveRegion { start, end, .. } => {
                self.shadow.apply_remove(*start, *end);
            }
            TextServerEvent::AddProperty {
                start,
                end,
                property,
                flag,
                ..
            } => {
                self.shadow
                    .apply_add_property(*start, *end, property, flag.as_deref());
            }
            TextServerEvent::RemoveProperty {
                start,
                end,
                property,
                ..
            } => {
                self.shadow.apply_remove_property(*start, *end, property);
            }
            TextServerEvent::CursorMoved {
                position,
                userid,
                username,
                ..
            } => {
                self.shadow.cursors.set(*userid, *position, username);
            }
            TextServerEvent::Connected { .. }
            | TextServerEvent::UserDisconnected { .. }
            | TextServerEvent::Ping => {}
        }
    }

    fn initialise(&mut self, userid: UserId, content: &str, mod_id: ModId) {
        self.userid = Some(userid);
        self.shadow = Replica::from_content(content);
        if !self.read_only {
            self.shadow.cursors.insert_local(userid);
        }
        self.live = self.shadow.clone();
        self.pending.clear();
        self.last_mod_id = mod_id;
        self.mod_id_dirty = false;
        self.phase = Phase::Connected;
        tracing::info!(
            target: "editor",
            userid,
            mod_id,
            len = self.live.content.len(),
            read_only = self.read_only,
            "connected"
        );
        self.rerender();
    }
}
