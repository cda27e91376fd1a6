//! The whiteboard engine.
//!
//! A replicated scene graph with last-writer-wins per element: every
//! operation is keyed by a globally unique element id and is idempotent, so
//! no rebase queue is needed. Local tool interactions mutate the scene
//! immediately and emit the corresponding event; remote events apply
//! unconditionally in the server's total order.
//!
//! Element ids are generated locally as `draw-<peer-random>-<monotonic>` and
//! are durable for the element's lifetime.

use core_events::{BoardEvent, EventSink};
use core_geom::Point;

mod path;
mod scene;
mod tools;

pub use path::PathData;
pub use scene::{Element, GroupNode, PathShape, Scene};
pub use tools::{Modifiers, Tool, regular_polygon};

use tools::Drag;

pub struct BoardEngine<E> {
    scene: Scene,
    tool: Tool,
    selection: Vec<String>,
    drag: Option<Drag>,
    peer: u32,
    next_seq: u64,
    out: E,
}

impl<E: EventSink<BoardEvent>> BoardEngine<E> {
    pub fn new(out: E) -> Self {
        Self::with_peer(out, rand::random())
    }

    /// Fixed peer tag, for deterministic ids in tests.
    pub fn with_peer(out: E, peer: u32) -> Self {
        Self {
            scene: Scene::default(),
            tool: Tool::Pen,
            selection: Vec::new(),
            drag: None,
            peer,
            next_seq: 0,
            out,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn outbound(&mut self) -> &mut E {
        &mut self.out
    }

    /// Switch tools; any in-flight drag is abandoned and the selection kept
    /// only for the selector.
    pub fn set_tool(&mut self, tool: Tool) {
        if let Tool::Shape(n) = tool {
            debug_assert!(n >= 3, "shape tool needs at least 3 sides");
        }
        self.drag = None;
        if tool != Tool::Selector {
            self.selection.clear();
        }
        self.tool = tool;
    }

    fn next_id(&mut self) -> String {
        let id = format!("draw-{}-{}", self.peer, self.next_seq);
        self.next_seq += 1;
        id
    }

    // ---- remote events -----------------------------------------------------

    /// Apply one event from the server. All five operations are idempotent;
    /// unknown ids are benign races and are silently ignored.
    pub fn apply(&mut self, event: BoardEvent) {
        match event {
            BoardEvent::Draw { id, d } => {
                self.scene.draw(&id, &d);
            }
            BoardEvent::Remove { id } => {
                self.scene.remove(&id);
                self.selection.retain(|s| *s != id);
            }
            BoardEvent::Edit { id, d } => {
                self.scene.edit(&id, &d);
            }
            BoardEvent::Group {
                group_id,
                children_ids,
            } => {
                self.scene.group(&group_id, &children_ids);
                self.selection.retain(|s| !children_ids.contains(s));
            }
            BoardEvent::Ungroup { group_id } => {
                self.scene.ungroup(&group_id);
                self.selection.retain(|s| *s != group_id);
            }
        }
    }

    // ---- pointer interaction ----------------------------------------------

    pub fn pointer_down(&mut self, p: Point, mods: Modifiers) {
        match self.tool {
            Tool::Pen => {
                self.drag = Some(Drag::Pen {
                    d: PathData::from_points(vec![p]),
                });
            }
            Tool::Shape(_) => {
                self.drag = Some(Drag::Shape { start: p });
            }
            Tool::Eraser => {
                self.drag = Some(Drag::Erase { last: p });
            }
            Tool::Selector => {
                self.select_at(p, mods);
                self.drag = Some(Drag::Move {
                    last: p,
                    moved: false,
                });
            }
        }
    }

    pub fn pointer_move(&mut self, p: Point) {
        // resolve the drag state first, then act, so the drag borrow ends
        // before the scene is touched
        let mut erase_from = None;
        let mut move_delta = None;
        match &mut self.drag {
            Some(Drag::Pen { d }) => {
                d.push(p);
            }
            Some(Drag::Shape { .. }) => {
                // the preview is recomputed by the rendering layer from the
                // drag rectangle; the scene is only touched on pointer up
            }
            Some(Drag::Erase { last }) => {
                erase_from = Some(*last);
                *last = p;
            }
            Some(Drag::Move { last, moved }) => {
                let (dx, dy) = (p.x - last.x, p.y - last.y);
                *last = p;
                if dx != 0.0 || dy != 0.0 {
                    *moved = true;
                    move_delta = Some((dx, dy));
                }
            }
            None => {}
        }
        if let Some(from) = erase_from {
            self.erase_stroke(from, p);
        }
        if let Some((dx, dy)) = move_delta {
            let ids: Vec<String> = self.selection.clone();
            for id in ids {
                self.scene.translate(&id, dx, dy);
            }
        }
    }

    pub fn pointer_up(&mut self, p: Point) {
        match self.drag.take() {
            Some(Drag::Pen { d }) => {
                if d.is_empty() {
                    return;
                }
                let id = self.next_id();
                let wire = d.to_d();
                self.scene.draw(&id, &wire);
                tracing::debug!(target: "board.tool", id, "pen_stroke");
                self.out.emit(BoardEvent::Draw { id, d: wire });
            }
            Some(Drag::Shape { start }) => {
                let Tool::Shape(n) = self.tool else { return };
                let (left, right) = (start.x.min(p.x), start.x.max(p.x));
                let (top, bottom) = (start.y.min(p.y), start.y.max(p.y));
                let polygon = regular_polygon(n, left, top, right, bottom);
                let id = self.next_id();
                let wire = polygon.to_d();
                self.scene.draw(&id, &wire);
                tracing::debug!(target: "board.tool", id, n, "shape_drawn");
                self.out.emit(BoardEvent::Draw { id, d: wire });
            }
            Some(Drag::Erase { last }) => {
                if last != p {
                    self.erase_stroke(last, p);
                }
            }
            Some(Drag::Move { moved, .. }) => {
                if moved {
                    self.emit_selection_edits();
                }
            }
            None => {}
        }
    }

    /// Toolbar action: a multi-element selection becomes a group; a single
    /// selected group is dissolved.
    pub fn group_action(&mut self) {
        if self.selection.len() >= 2 {
            let group_id = self.next_id();
            let children_ids = self.selection.clone();
            if self.scene.group(&group_id, &children_ids) {
                tracing::debug!(target: "board.tool", group_id, n = children_ids.len(), "grouped");
                self.out.emit(BoardEvent::Group {
                    group_id: group_id.clone(),
                    children_ids,
                });
                self.selection = vec![group_id];
            }
        } else if let [id] = self.selection.as_slice() {
            let id = id.clone();
            let is_group = self.scene.get(&id).is_some_and(Element::is_group);
            if is_group && self.scene.ungroup(&id) {
                tracing::debug!(target: "board.tool", group_id = %id, "ungrouped");
                self.out.emit(BoardEvent::Ungroup { group_id: id });
                self.selection.clear();
            }
        }
    }

    fn select_at(&mut self, p: Point, mods: Modifiers) {
        // topmost element under the pointer
        let hit = self
            .scene
            .top_level()
            .iter()
            .rev()
            .find(|e| {
                e.bbox()
                    .is_some_and(|(r1, r2)| core_geom::point_in_rect(p, r1, r2))
            })
            .map(|e| e.id().to_string());
        let Some(id) = hit else { return };
        if mods.toggles_selection() {
            if let Some(i) = self.selection.iter().position(|s| *s == id) {
                self.selection.remove(i);
            } else {
                self.selection.push(id);
            }
        } else if !self.selection.contains(&id) {
            self.selection.push(id);
        }
    }

    fn erase_stroke(&mut self, from: Point, to: Point) {
        let mut hit_ids = Vec::new();
        for element in self.scene.top_level() {
            let Some((r1, r2)) = element.bbox() else {
                continue;
            };
            let near = core_geom::segment_intersects_rect(from, to, r1, r2)
                || core_geom::point_in_rect(from, r1, r2)
                || core_geom::point_in_rect(to, r1, r2);
            if !near {
                continue;
            }
            let mut hit = false;
            element.for_each_path(&mut |path| {
                if !hit
                    && path
                        .d
                        .segments()
                        .any(|(a, b)| core_geom::segments_intersect(from, to, a, b))
                {
                    hit = true;
                }
            });
            if hit {
                hit_ids.push(element.id().to_string());
            }
        }
        for id in hit_ids {
            self.scene.remove(&id);
            self.selection.retain(|s| *s != id);
            tracing::debug!(target: "board.tool", id, "erased");
            self.out.emit(BoardEvent::Remove { id });
        }
    }

    fn emit_selection_edits(&mut self) {
        let mut edits = Vec::new();
        for id in &self.selection {
            if let Some(element) = self.scene.get(id) {
                element.for_each_path(&mut |path| {
                    edits.push((path.id.clone(), path.d.to_d()));
                });
            }
        }
        for (id, d) in edits {
            self.out.emit(BoardEvent::Edit { id, d });
        }
    }
}
