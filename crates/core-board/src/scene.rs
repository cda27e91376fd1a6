//! The whiteboard scene graph.
//!
//! A flat list of top-level elements, each a path or a group of child
//! elements. Elements never hold back-references; parents are derived by
//! walking down from the top level. Every mutating operation is idempotent
//! on already-consistent state: duplicate ids are ignored on `draw`, absent
//! ids are ignored everywhere else.

use core_geom::Point;

use crate::path::PathData;

#[derive(Clone, Debug, PartialEq)]
pub struct PathShape {
    pub id: String,
    pub d: PathData,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupNode {
    pub id: String,
    pub children: Vec<Element>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    Path(PathShape),
    Group(GroupNode),
}

impl Element {
    pub fn id(&self) -> &str {
        match self {
            Self::Path(p) => &p.id,
            Self::Group(g) => &g.id,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    fn contains_id(&self, id: &str) -> bool {
        match self {
            Self::Path(p) => p.id == id,
            Self::Group(g) => g.id == id || g.children.iter().any(|c| c.contains_id(id)),
        }
    }

    /// Union of all contained path bounds as (top-left, bottom-right).
    pub fn bbox(&self) -> Option<(Point, Point)> {
        match self {
            Self::Path(p) => p.d.bbox(),
            Self::Group(g) => {
                let mut acc: Option<(Point, Point)> = None;
                for child in &g.children {
                    if let Some((min, max)) = child.bbox() {
                        acc = Some(match acc {
                            None => (min, max),
                            Some((amin, amax)) => (
                                Point::new(amin.x.min(min.x), amin.y.min(min.y)),
                                Point::new(amax.x.max(max.x), amax.y.max(max.y)),
                            ),
                        });
                    }
                }
                acc
            }
        }
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        match self {
            Self::Path(p) => p.d.translate(dx, dy),
            Self::Group(g) => {
                for child in &mut g.children {
                    child.translate(dx, dy);
                }
            }
        }
    }

    /// Depth-first walk over every path under this element.
    pub fn for_each_path<F: FnMut(&PathShape)>(&self, f: &mut F) {
        match self {
            Self::Path(p) => f(p),
            Self::Group(g) => {
                for child in &g.children {
                    child.for_each_path(f);
                }
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    elements: Vec<Element>,
}

impl Scene {
    pub fn top_level(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements.iter().any(|e| e.contains_id(id))
    }

    /// All paths in the scene, depth-first.
    pub fn paths(&self) -> Vec<&PathShape> {
        fn collect<'a>(elements: &'a [Element], out: &mut Vec<&'a PathShape>) {
            for element in elements {
                match element {
                    Element::Path(p) => out.push(p),
                    Element::Group(g) => collect(&g.children, out),
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.elements, &mut out);
        out
    }

    /// Append a new path; a duplicate id or malformed `d` is ignored.
    pub fn draw(&mut self, id: &str, d: &str) -> bool {
        if self.contains(id) {
            tracing::trace!(target: "board.scene", id, "draw_duplicate_ignored");
            return false;
        }
        let Some(path) = PathData::parse(d) else {
            tracing::warn!(target: "board.scene", id, d, "draw_malformed_ignored");
            return false;
        };
        self.elements.push(Element::Path(PathShape {
            id: id.to_string(),
            d: path,
        }));
        true
    }

    /// Remove the element with `id` wherever it sits; absent ids are ignored.
    pub fn remove(&mut self, id: &str) -> bool {
        fn remove_in(elements: &mut Vec<Element>, id: &str) -> bool {
            if let Some(i) = elements.iter().position(|e| e.id() == id) {
                elements.remove(i);
                return true;
            }
            for element in elements.iter_mut() {
                if let Element::Group(g) = element {
                    if remove_in(&mut g.children, id) {
                        return true;
                    }
                }
            }
            false
        }
        remove_in(&mut self.elements, id)
    }

    /// Replace the `d` attribute of the path with `id`; absent ids and
    /// malformed data are ignored.
    pub fn edit(&mut self, id: &str, d: &str) -> bool {
        let Some(path) = PathData::parse(d) else {
            tracing::warn!(target: "board.scene", id, d, "edit_malformed_ignored");
            return false;
        };
        fn edit_in(elements: &mut [Element], id: &str, path: &PathData) -> bool {
            for element in elements.iter_mut() {
                match element {
                    Element::Path(p) if p.id == id => {
                        p.d = path.clone();
                        return true;
                    }
                    Element::Group(g) => {
                        if edit_in(&mut g.children, id, path) {
                            return true;
                        }
                    }
                    Element::Path(_) => {}
                }
            }
            false
        }
        edit_in(&mut self.elements, id, &path)
    }

    /// Create a group from the named top-level children, in the given order,
    /// and append it to the top level. A duplicate group id is ignored.
    pub fn group(&mut self, group_id: &str, children_ids: &[String]) -> bool {
        if self.contains(group_id) {
            tracing::trace!(target: "board.scene", group_id, "group_duplicate_ignored");
            return false;
        }
        let mut children = Vec::with_capacity(children_ids.len());
        for id in children_ids {
            if let Some(element) = self.take_top_level(id) {
                children.push(element);
            }
        }
        self.elements.push(Element::Group(GroupNode {
            id: group_id.to_string(),
            children,
        }));
        true
    }

    /// Move every child of the named top-level group to the top level in
    /// order, then drop the empty group. Absent ids are ignored.
    pub fn ungroup(&mut self, group_id: &str) -> bool {
        let Some(i) = self
            .elements
            .iter()
            .position(|e| e.is_group() && e.id() == group_id)
        else {
            return false;
        };
        let Element::Group(group) = self.elements.remove(i) else {
            return false;
        };
        self.elements.extend(group.children);
        true
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        fn get_in<'a>(elements: &'a [Element], id: &str) -> Option<&'a Element> {
            for element in elements {
                if element.id() == id {
                    return Some(element);
                }
                if let Element::Group(g) = element {
                    if let Some(found) = get_in(&g.children, id) {
                        return Some(found);
                    }
                }
            }
            None
        }
        get_in(&self.elements, id)
    }

    /// Translate the top-level element with `id`.
    pub fn translate(&mut self, id: &str, dx: f64, dy: f64) -> bool {
        if let Some(element) = self.elements.iter_mut().find(|e| e.id() == id) {
            element.translate(dx, dy);
            true
        } else {
            false
        }
    }

    fn take_top_level(&mut self, id: &str) -> Option<Element> {
        let i = self.elements.iter().position(|e| e.id() == id)?;
        Some(self.elements.remove(i))
    }
}
