//! Selection: click and marquee picking, group expansion and the eight
//! resize handles on the selection bounds.

use crate::camera::Camera;
use crate::element::ElementId;
use crate::geometry::union_bounds;
use crate::store::ElementStore;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Below this screen-space drag distance a marquee counts as a click.
pub const MARQUEE_CLICK_THRESHOLD: f64 = 5.0;

/// Default pick tolerance in world units for click hit-testing.
pub const DEFAULT_HIT_TOLERANCE: f64 = 4.0;

/// Corner resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// One of the eight resize handles on the selection bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleKind {
    Corner(Corner),
    Edge(Edge),
}

/// A handle with its world-space position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub kind: HandleKind,
    pub position: Point,
}

/// The eight handles for a selection bounding box: four corners plus four
/// edge midpoints.
pub fn handles(bounds: Rect) -> [Handle; 8] {
    let cx = (bounds.x0 + bounds.x1) / 2.0;
    let cy = (bounds.y0 + bounds.y1) / 2.0;
    [
        Handle {
            kind: HandleKind::Corner(Corner::TopLeft),
            position: Point::new(bounds.x0, bounds.y0),
        },
        Handle {
            kind: HandleKind::Corner(Corner::TopRight),
            position: Point::new(bounds.x1, bounds.y0),
        },
        Handle {
            kind: HandleKind::Corner(Corner::BottomLeft),
            position: Point::new(bounds.x0, bounds.y1),
        },
        Handle {
            kind: HandleKind::Corner(Corner::BottomRight),
            position: Point::new(bounds.x1, bounds.y1),
        },
        Handle {
            kind: HandleKind::Edge(Edge::Top),
            position: Point::new(cx, bounds.y0),
        },
        Handle {
            kind: HandleKind::Edge(Edge::Right),
            position: Point::new(bounds.x1, cy),
        },
        Handle {
            kind: HandleKind::Edge(Edge::Bottom),
            position: Point::new(cx, bounds.y1),
        },
        Handle {
            kind: HandleKind::Edge(Edge::Left),
            position: Point::new(bounds.x0, cy),
        },
    ]
}

/// The fixed point for a resize: the corner or edge opposite the handle.
pub fn resize_origin(bounds: Rect, handle: HandleKind) -> Point {
    let cx = (bounds.x0 + bounds.x1) / 2.0;
    let cy = (bounds.y0 + bounds.y1) / 2.0;
    match handle {
        HandleKind::Corner(Corner::TopLeft) => Point::new(bounds.x1, bounds.y1),
        HandleKind::Corner(Corner::TopRight) => Point::new(bounds.x0, bounds.y1),
        HandleKind::Corner(Corner::BottomLeft) => Point::new(bounds.x1, bounds.y0),
        HandleKind::Corner(Corner::BottomRight) => Point::new(bounds.x0, bounds.y0),
        HandleKind::Edge(Edge::Top) => Point::new(cx, bounds.y1),
        HandleKind::Edge(Edge::Bottom) => Point::new(cx, bounds.y0),
        HandleKind::Edge(Edge::Left) => Point::new(bounds.x1, cy),
        HandleKind::Edge(Edge::Right) => Point::new(bounds.x0, cy),
    }
}

/// Scale factors for dragging a handle to a world position, relative to the
/// opposite-point origin. Edge handles scale one axis only.
pub fn resize_scale(bounds: Rect, handle: HandleKind, drag: Point) -> (f64, f64) {
    let origin = resize_origin(bounds, handle);
    let handle_pos = handles(bounds)
        .iter()
        .find(|h| h.kind == handle)
        .map(|h| h.position)
        .unwrap_or(drag);

    let sx = if (handle_pos.x - origin.x).abs() > f64::EPSILON {
        (drag.x - origin.x) / (handle_pos.x - origin.x)
    } else {
        1.0
    };
    let sy = if (handle_pos.y - origin.y).abs() > f64::EPSILON {
        (drag.y - origin.y) / (handle_pos.y - origin.y)
    } else {
        1.0
    };
    match handle {
        HandleKind::Corner(_) => (sx, sy),
        HandleKind::Edge(Edge::Left) | HandleKind::Edge(Edge::Right) => (sx, 1.0),
        HandleKind::Edge(Edge::Top) | HandleKind::Edge(Edge::Bottom) => (1.0, sy),
    }
}

/// The current selection, in selection order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Selection {
    ids: Vec<ElementId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[ElementId] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.ids.contains(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn set(&mut self, ids: Vec<ElementId>) {
        self.ids = ids;
        self.ids.dedup();
    }

    pub fn insert(&mut self, id: ElementId) {
        if !self.contains(id) {
            self.ids.push(id);
        }
    }

    pub fn remove(&mut self, id: ElementId) {
        self.ids.retain(|&e| e != id);
    }

    pub fn toggle(&mut self, id: ElementId) {
        if self.contains(id) {
            self.remove(id);
        } else {
            self.ids.push(id);
        }
    }

    /// Drop ids that no longer resolve to elements. Called after deletions
    /// and history restores.
    pub fn prune(&mut self, store: &ElementStore) {
        self.ids.retain(|&id| store.contains(id));
    }
}

/// Select whatever sits under a world point. Selecting a grouped element
/// expands to the whole group. With `multi` the hit toggles in and out of
/// the selection; otherwise it replaces it. A miss clears the selection
/// unless `multi` is held.
pub fn select_at_point(
    store: &ElementStore,
    selection: &mut Selection,
    point: Point,
    multi: bool,
) -> Option<ElementId> {
    let hit = store
        .element_at_point(point, DEFAULT_HIT_TOLERANCE)
        .filter(|&id| store.get(id).is_some_and(|e| store.is_interactable(e)));
    match hit {
        Some(id) => {
            let mut members = vec![id];
            members.extend(store.group_siblings(id));
            if multi {
                if selection.contains(id) {
                    for m in members {
                        selection.remove(m);
                    }
                } else {
                    for m in members {
                        selection.insert(m);
                    }
                }
            } else {
                selection.set(members);
            }
            Some(id)
        }
        None => {
            if !multi {
                selection.clear();
            }
            None
        }
    }
}

/// Resolve a finished marquee drag given its screen-space corners. Short
/// drags degrade to a click; real drags select every interactable element
/// intersecting the world-space rect. `additive` unions with the current
/// selection instead of replacing it.
pub fn finish_marquee(
    store: &ElementStore,
    camera: &Camera,
    selection: &mut Selection,
    start_screen: Point,
    end_screen: Point,
    additive: bool,
) {
    let drag = end_screen - start_screen;
    if drag.hypot() < MARQUEE_CLICK_THRESHOLD {
        let world = camera.screen_to_world(end_screen);
        select_at_point(store, selection, world, additive);
        return;
    }

    let a = camera.screen_to_world(start_screen);
    let b = camera.screen_to_world(end_screen);
    let rect = Rect::from_points(a, b);
    let hits: Vec<ElementId> = store
        .elements_in_rect(rect)
        .into_iter()
        .filter(|&id| store.get(id).is_some_and(|e| store.is_interactable(e)))
        .collect();

    if additive {
        for id in hits {
            selection.insert(id);
        }
    } else {
        selection.set(hits);
    }
}

/// Union bounds of the selected elements.
pub fn selection_bounds(store: &ElementStore, selection: &Selection) -> Option<Rect> {
    union_bounds(
        selection
            .ids()
            .iter()
            .filter_map(|&id| store.get(id))
            .map(|e| e.bounds()),
    )
}
