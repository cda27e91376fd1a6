//! Shared test harness: an in-process server authority plus peer wrappers.
//!
//! The simulated server does what the real authority does: it totally orders
//! incoming operations with strictly increasing `mod_id`s, transforms each
//! operation past the mutation events its sender had not yet observed
//! (skipping the sender's own, which the sender already accounted for
//! optimistically), and broadcasts the result to every peer including the
//! sender.

use core_editor::{PendingOp, RemoteShift, Replica, TextEngine};
use core_events::{ModId, TextClientEvent, TextServerEvent, UserId};

pub struct ServerSim {
    mod_id: ModId,
    log: Vec<(ModId, UserId, RemoteShift)>,
}

impl ServerSim {
    pub fn new(start_mod: ModId) -> Self {
        Self {
            mod_id: start_mod,
            log: Vec::new(),
        }
    }

    pub fn mod_id(&self) -> ModId {
        self.mod_id
    }

    /// Order and transform one client operation; `None` for events that do
    /// not produce a broadcast (`update_last_mod_id`).
    pub fn submit(
        &mut self,
        userid: UserId,
        username: &str,
        event: TextClientEvent,
    ) -> Option<TextServerEvent> {
        let (mut op, last) = to_pending(event)?;
        for (mid, uid, shift) in &self.log {
            if *mid > last && *uid != userid {
                op.rebase(shift);
            }
        }
        self.mod_id += 1;
        let mod_id = self.mod_id;
        self.log.push((mod_id, userid, shift_of(&op)));
        Some(to_server_event(op, userid, username, mod_id))
    }
}

fn to_pending(event: TextClientEvent) -> Option<(PendingOp, ModId)> {
    match event {
        TextClientEvent::AddRegion {
            text,
            position,
            last_mod_id,
        } => Some((PendingOp::Insert { position, text }, last_mod_id)),
        TextClientEvent::RemoveRegion {
            start,
            end,
            last_mod_id,
        } => Some((PendingOp::Remove { start, end }, last_mod_id)),
        TextClientEvent::AddProperty {
            start,
            end,
            property,
            flag,
            last_mod_id,
        } => Some((
            PendingOp::AddProperty {
                start,
                end,
                property,
                flag,
            },
            last_mod_id,
        )),
        TextClientEvent::RemoveProperty {
            start,
            end,
            property,
            last_mod_id,
        } => Some((
            PendingOp::RemoveProperty {
                start,
                end,
                property,
            },
            last_mod_id,
        )),
        TextClientEvent::CursorMoved {
            position,
            last_mod_id,
        } => Some((PendingOp::Cursor { position }, last_mod_id)),
        TextClientEvent::UpdateLastModId { .. } => None,
    }
}

fn shift_of(op: &PendingOp) -> RemoteShift {
    match op {
        PendingOp::Insert { position, text } => RemoteShift::Insert {
            position: *position,
            len: text.chars().count(),
        },
        PendingOp::Remove { start, end } => RemoteShift::Remove {
            start: *start,
            end: *end,
        },
        _ => RemoteShift::None,
    }
}

fn to_server_event(
    op: PendingOp,
    userid: UserId,
    username: &str,
    mod_id: ModId,
) -> TextServerEvent {
    match op {
        PendingOp::Insert { position, text } => TextServerEvent::AddRegion {
            text,
            position,
            userid,
            mod_id,
        },
        PendingOp::Remove { start, end } => TextServerEvent::RemoveRegion {
            start,
            end,
            userid,
            mod_id,
        },
        PendingOp::AddProperty {
            start,
            end,
            property,
            flag,
        } => TextServerEvent::AddProperty {
            start,
            end,
            property,
            flag,
            userid,
            mod_id,
        },
        PendingOp::RemoveProperty {
            start,
            end,
            property,
        } => TextServerEvent::RemoveProperty {
            start,
            end,
            property,
            userid,
            mod_id,
        },
        PendingOp::Cursor { position } => TextServerEvent::CursorMoved {
            position,
            userid,
            username: username.to_string(),
            mod_id,
        },
    }
}

pub struct Peer {
    pub engine: TextEngine<Vec<TextClientEvent>, String>,
    pub userid: UserId,
    pub username: String,
}

impl Peer {
    pub fn connect(userid: UserId, username: &str, content: &str, mod_id: ModId) -> Self {
        let mut engine = TextEngine::new(Vec::new(), String::new());
        engine
            .handle(TextServerEvent::Connected {
                userid,
                content: content.to_string(),
                mod_id,
            })
            .unwrap();
        Self {
            engine,
            userid,
            username: username.to_string(),
        }
    }

    pub fn drain(&mut self) -> Vec<TextClientEvent> {
        std::mem::take(self.engine.outbound())
    }
}

/// Submit everything a peer has emitted, in emission order.
pub fn flush(server: &mut ServerSim, peer: &mut Peer) -> Vec<TextServerEvent> {
    let userid = peer.userid;
    let username = peer.username.clone();
    peer.drain()
        .into_iter()
        .filter_map(|ev| server.submit(userid, &username, ev))
        .collect()
}

/// Deliver a broadcast stream to every peer in server order.
pub fn deliver(peers: &mut [Peer], events: &[TextServerEvent]) {
    for event in events {
        for peer in peers.iter_mut() {
            peer.engine.handle(event.clone()).unwrap();
        }
    }
}

/// Position bounds and per-bucket disjointness (§ testable properties).
pub fn check_replica(replica: &Replica) {
    let len = replica.content.len();
    for (_, cursor) in replica.cursors.iter() {
        assert!(cursor.position <= len, "cursor out of bounds");
    }
    let mut buckets: std::collections::BTreeMap<(String, Option<String>), Vec<(usize, usize)>> =
        std::collections::BTreeMap::new();
    for (property, flag, span) in replica.properties.ranges() {
        assert!(span.start < span.end, "degenerate range");
        assert!(span.end <= len, "range out of bounds");
        buckets
            .entry((property.to_string(), flag.map(str::to_string)))
            .or_default()
            .push((span.start, span.end));
    }
    for spans in buckets.values_mut() {
        spans.sort();
        for pair in spans.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "overlapping ranges in one bucket");
        }
    }
}

/// Live state equality across peers, the convergence criterion.
pub fn assert_converged(peers: &[Peer]) {
    for peer in peers {
        assert_eq!(peer.engine.pending_len(), 0, "pending not drained");
        assert_eq!(peer.engine.live(), peer.engine.shadow());
        check_replica(peer.engine.live());
    }
    for pair in peers.windows(2) {
        assert_eq!(pair[0].engine.live().content, pair[1].engine.live().content);
        assert_eq!(
            pair[0].engine.live().properties,
            pair[1].engine.live().properties
        );
        // usernames and colours are locally decorated ("Me", palette order)
        // and a peer only learns of a cursor once its owner moves it, so
        // cross-peer agreement is on positions of commonly-known cursors
        for (id, cursor) in pair[0].engine.live().cursors.iter() {
            if let Some(other) = pair[1].engine.live().cursors.get(id) {
                assert_eq!(cursor.position, other.position, "cursor {id} diverged");
            }
        }
    }
}
