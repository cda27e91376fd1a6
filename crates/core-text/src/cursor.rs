//! Per-user cursor table with palette colour assignment.
//!
//! Every participant has at most one cursor. Remote users get a colour from a
//! fixed seven-entry palette on first sight, avoiding colours already in use;
//! when the palette is exhausted a uniformly random entry is chosen. The
//! local peer renders with the sentinel colour "black" and username "Me".

use std::collections::BTreeMap;

use rand::Rng;

use crate::shift;

/// The seven remote-user colours.
pub const PALETTE: [&str; 7] = ["red", "orange", "yellow", "green", "cyan", "blue", "purple"];

/// Sentinel colour for the local peer's own cursor.
pub const LOCAL_COLOUR: &str = "black";

/// Sentinel username for the local peer's own cursor.
pub const LOCAL_USERNAME: &str = "Me";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub position: usize,
    pub username: String,
    pub colour: String,
}

/// Cursor table of one replica, keyed by user id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CursorTable {
    cursors: BTreeMap<u64, Cursor>,
}

impl CursorTable {
    /// Create the local peer's cursor at position 0 with the sentinel
    /// username and colour.
    pub fn insert_local(&mut self, userid: u64) {
        self.cursors.insert(
            userid,
            Cursor {
                position: 0,
                username: LOCAL_USERNAME.to_string(),
                colour: LOCAL_COLOUR.to_string(),
            },
        );
    }

    /// Move (or create) a user's cursor. A new remote entry is assigned a
    /// palette colour; an existing entry keeps its colour and picks up the
    /// carried username.
    pub fn set(&mut self, userid: u64, position: usize, username: &str) {
        match self.cursors.get_mut(&userid) {
            Some(cursor) => {
                cursor.position = position;
                if cursor.username != LOCAL_USERNAME {
                    cursor.username = username.to_string();
                }
            }
            None => {
                let colour = self.pick_colour();
                self.cursors.insert(
                    userid,
                    Cursor {
                        position,
                        username: username.to_string(),
                        colour,
                    },
                );
            }
        }
    }

    pub fn remove(&mut self, userid: u64) -> Option<Cursor> {
        self.cursors.remove(&userid)
    }

    pub fn get(&self, userid: u64) -> Option<&Cursor> {
        self.cursors.get(&userid)
    }

    pub fn position(&self, userid: u64) -> Option<usize> {
        self.cursors.get(&userid).map(|c| c.position)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &Cursor)> {
        self.cursors.iter().map(|(id, c)| (*id, c))
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    pub fn shift_insert(&mut self, at: usize, len: usize) {
        for cursor in self.cursors.values_mut() {
            cursor.position = shift::for_insert(cursor.position, at, len);
        }
    }

    pub fn shift_remove(&mut self, start: usize, end: usize) {
        for cursor in self.cursors.values_mut() {
            cursor.position = shift::for_remove(cursor.position, start, end);
        }
    }

    /// First palette colour not currently in use, or a uniformly random
    /// palette entry when all seven are taken.
    fn pick_colour(&self) -> String {
        for colour in PALETTE {
            if !self.cursors.values().any(|c| c.colour == colour) {
                return colour.to_string();
            }
        }
        let i = rand::thread_rng().gen_range(0..PALETTE.len());
        PALETTE[i].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_cursor_uses_sentinels() {
        let mut t = CursorTable::default();
        t.insert_local(7);
        let c = t.get(7).unwrap();
        assert_eq!(c.position, 0);
        assert_eq!(c.username, LOCAL_USERNAME);
        assert_eq!(c.colour, LOCAL_COLOUR);
    }

    #[test]
    fn remote_users_get_distinct_palette_colours() {
        let mut t = CursorTable::default();
        for uid in 0..7 {
            t.set(uid, 0, "user");
        }
        let mut seen: Vec<_> = t.iter().map(|(_, c)| c.colour.clone()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn exhausted_palette_falls_back_to_a_palette_entry() {
        let mut t = CursorTable::default();
        for uid in 0..9 {
            t.set(uid, 0, "user");
        }
        assert!(t.iter().all(|(_, c)| PALETTE.contains(&c.colour.as_str())));
    }

    #[test]
    fn moving_an_existing_cursor_keeps_its_colour() {
        let mut t = CursorTable::default();
        t.set(1, 0, "alice");
        let colour = t.get(1).unwrap().colour.clone();
        t.set(1, 5, "alice");
        assert_eq!(t.get(1).unwrap().position, 5);
        assert_eq!(t.get(1).unwrap().colour, colour);
    }

    #[test]
    fn shifts_follow_the_gap_rules() {
        let mut t = CursorTable::default();
        t.set(1, 4, "alice");
        t.shift_insert(4, 2);
        assert_eq!(t.position(1), Some(4));
        t.shift_insert(3, 2);
        assert_eq!(t.position(1), Some(6));
        t.shift_remove(1, 3);
        assert_eq!(t.position(1), Some(4));
        t.shift_remove(2, 10);
        assert_eq!(t.position(1), Some(2));
    }
}
