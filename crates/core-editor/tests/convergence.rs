//! Multi-peer convergence under interleaved optimistic editing.

mod common;

use common::{Peer, ServerSim, assert_converged, check_replica, deliver, flush};
use core_events::TextServerEvent;

#[test]
fn three_peers_converge_after_interleaved_edits() {
    let mut server = ServerSim::new(0);
    let mut peers = vec![
        Peer::connect(1, "alice", "the quick fox", 0),
        Peer::connect(2, "bob", "the quick fox", 0),
        Peer::connect(3, "carol", "the quick fox", 0),
    ];

    // round 1: everyone edits before anyone's op is acknowledged
    peers[0].engine.insert("brown ", 10);
    peers[1].engine.remove(0, 4);
    peers[2].engine.move_cursor(13);
    peers[2].engine.insert(" jumps", 13);

    let mut events = Vec::new();
    for peer in peers.iter_mut() {
        let (uid, name) = (peer.userid, peer.username.clone());
        for ev in peer.drain() {
            events.extend(server.submit(uid, &name, ev));
        }
    }
    deliver(&mut peers, &events);
    assert_converged(&peers);
    assert_eq!(peers[0].engine.content(), "quick brown fox jumps");

    // round 2: concurrent styling and deletion over overlapping regions
    peers[0].engine.toggle_property(0, 11, "bold", None);
    peers[1].engine.remove(6, 12);
    peers[2].engine.toggle_property(6, 15, "em", None);

    let mut events = Vec::new();
    for peer in peers.iter_mut() {
        let (uid, name) = (peer.userid, peer.username.clone());
        for ev in peer.drain() {
            events.extend(server.submit(uid, &name, ev));
        }
    }
    deliver(&mut peers, &events);
    assert_converged(&peers);
    assert_eq!(peers[0].engine.content(), "quick fox jumps");
}

#[test]
fn property_conflicts_resolve_in_server_order() {
    let mut server = ServerSim::new(0);
    let mut peers = vec![
        Peer::connect(1, "alice", "abcdefgh", 0),
        Peer::connect(2, "bob", "abcdefgh", 0),
    ];

    // conflicting flagged layers over the same region
    peers[0]
        .engine
        .toggle_property(0, 6, "align", Some("align=left"));
    peers[1]
        .engine
        .toggle_property(2, 8, "align", Some("align=right"));

    let mut events = flush(&mut server, &mut peers[0]);
    events.extend(flush(&mut server, &mut peers[1]));
    deliver(&mut peers, &events);

    assert_converged(&peers);
    // bob's layer landed second, so it owns the overlap
    let props = peers[0].engine.live().properties.clone();
    assert!(props.has_covering(2, 8, "align", Some("align=right")));
    assert!(props.has_covering(0, 2, "align", Some("align=left")));
    assert!(!props.has_covering(2, 3, "align", Some("align=left")));
}

#[test]
fn remote_removal_collapses_a_pending_property_range() {
    let mut server = ServerSim::new(0);
    let mut peers = vec![
        Peer::connect(1, "alice", "abcdefgh", 0),
        Peer::connect(2, "bob", "abcdefgh", 0),
    ];

    // bob deletes the region alice is styling, bob's op lands first
    peers[1].engine.remove(2, 7);
    peers[0].engine.toggle_property(3, 6, "bold", None);

    let mut events = flush(&mut server, &mut peers[1]);
    events.extend(flush(&mut server, &mut peers[0]));
    deliver(&mut peers, &events);

    assert_converged(&peers);
    assert_eq!(peers[0].engine.content(), "abh");
    assert!(peers[0].engine.live().properties.is_empty());
}

#[test]
fn late_joiner_snapshot_matches_the_room() {
    let mut server = ServerSim::new(0);
    let mut peers = vec![Peer::connect(1, "alice", "abc", 0)];

    peers[0].engine.insert("def", 3);
    let events = flush(&mut server, &mut peers[0]);
    deliver(&mut peers, &events);

    // the server hands the late joiner its authoritative state
    let snapshot = peers[0].engine.server_content();
    let mod_id = server.mod_id();
    peers.push(Peer::connect(2, "bob", &snapshot, mod_id));

    peers[1].engine.insert("!", 6);
    let events = flush(&mut server, &mut peers[1]);
    deliver(&mut peers, &events);

    assert_converged(&peers);
    assert_eq!(peers[0].engine.content(), "abcdef!");
}

#[test]
fn replicas_stay_bounded_under_adversarial_interleaving() {
    let mut server = ServerSim::new(0);
    let mut peers = vec![
        Peer::connect(1, "alice", "0123456789", 0),
        Peer::connect(2, "bob", "0123456789", 0),
    ];

    for round in 0..5u64 {
        let a = (round as usize) % 4;
        peers[0].engine.move_cursor(a);
        peers[0].engine.insert("ab", a);
        let len = peers[1].engine.content().chars().count();
        peers[1].engine.remove(len / 4, len / 2);
        peers[1].engine.toggle_property(0, len / 2, "bold", None);

        let mut events = flush(&mut server, &mut peers[0]);
        events.extend(flush(&mut server, &mut peers[1]));
        deliver(&mut peers, &events);

        for peer in &peers {
            check_replica(peer.engine.live());
            check_replica(peer.engine.shadow());
        }
        assert_converged(&peers);
    }
}
