//! Relationship resolver: recomputes derived geometry after commits.
//!
//! Attached text follows its host, pinned arrow endpoints track their
//! anchors, and mind-map connectors span their nodes' centers. Dependents
//! are refreshed transitively (an arrow pinned to a text that follows a
//! moved host updates in the same pass), with a visited set so reference
//! cycles cannot recurse.

use crate::element::{ArrowData, Connection, ElementId, ElementKind};
use crate::store::ElementStore;
use kurbo::{Point, Rect, Size};
use log::warn;
use std::collections::HashSet;

/// Bounding box spanned by two elements' centers.
pub fn connector_bounds(a: Rect, b: Rect) -> Rect {
    Rect::from_points(a.center(), b.center())
}

/// Refresh every element whose geometry depends on `moved`, transitively.
pub fn refresh_dependents(store: &mut ElementStore, moved: ElementId) {
    let mut dirty: HashSet<ElementId> = HashSet::from([moved]);
    let mut visited: HashSet<ElementId> = HashSet::new();

    loop {
        let mut changed = Vec::new();
        for id in store.ids_ordered().to_vec() {
            if visited.contains(&id) {
                continue;
            }
            let Some(element) = store.get(id) else {
                continue;
            };
            if !references_any(&element.kind, &dirty) {
                continue;
            }
            visited.insert(id);
            if refresh_element(store, id) {
                changed.push(id);
            }
        }
        if changed.is_empty() {
            break;
        }
        dirty.extend(changed);
    }
}

/// Refresh all derived geometry from scratch. Used after undo/redo and
/// document load, where any number of hosts may have moved.
pub fn refresh_all(store: &mut ElementStore) {
    for id in store.ids_ordered().to_vec() {
        refresh_element(store, id);
    }
}

fn references_any(kind: &ElementKind, ids: &HashSet<ElementId>) -> bool {
    match kind {
        ElementKind::Text(t) => t.attached_to.is_some_and(|h| ids.contains(&h)),
        ElementKind::Arrow(a) => {
            a.start_connection.is_some_and(|c| ids.contains(&c.element_id))
                || a.end_connection.is_some_and(|c| ids.contains(&c.element_id))
        }
        ElementKind::MindMapConnector(c) => {
            ids.contains(&c.start_node) || ids.contains(&c.end_node)
        }
        _ => false,
    }
}

/// Recompute one element's derived geometry. Returns true if it moved.
fn refresh_element(store: &mut ElementStore, id: ElementId) -> bool {
    let Some(element) = store.get(id) else {
        return false;
    };
    match &element.kind {
        ElementKind::Text(t) if t.attached_to.is_some() => refresh_attached_text(store, id),
        ElementKind::Arrow(_) => refresh_arrow(store, id),
        ElementKind::MindMapConnector(_) => refresh_mindmap_connector(store, id),
        _ => false,
    }
}

fn refresh_attached_text(store: &mut ElementStore, id: ElementId) -> bool {
    let (host, relative) = match store.get(id).map(|e| &e.kind) {
        Some(ElementKind::Text(t)) => match t.attached_to {
            Some(host) => (host, t.relative_position),
            None => return false,
        },
        _ => return false,
    };
    let Some(host_position) = store.get(host).map(|e| e.position) else {
        // Host vanished without a cascade (stale document); detach.
        if let Some(element) = store.get_mut(id) {
            if let ElementKind::Text(t) = &mut element.kind {
                t.attached_to = None;
            }
        }
        return false;
    };
    let target = host_position + relative;
    let Some(element) = store.get_mut(id) else {
        return false;
    };
    if element.position == target {
        return false;
    }
    element.position = target;
    true
}

fn refresh_arrow(store: &mut ElementStore, id: ElementId) -> bool {
    let Some(arrow) = store.get(id).and_then(|e| e.as_arrow()) else {
        return false;
    };
    if arrow.points.len() < 2 {
        return false;
    }
    let position = store.get(id).map(|e| e.position).unwrap_or(Point::ZERO);
    let mut data = arrow.clone();

    // Work on the chain in world coordinates.
    let mut chain: Vec<Point> = data
        .points
        .iter()
        .map(|p| Point::new(position.x + p.x, position.y + p.y))
        .collect();

    let mut dropped = false;
    let start_target = resolve_connection(store, &mut data.start_connection, &mut dropped);
    let end_target = resolve_connection(store, &mut data.end_connection, &mut dropped);
    if dropped {
        data.orphaned = true;
        warn!("arrow {id} orphaned: pinned endpoint no longer exists");
    } else if start_target.is_some() || end_target.is_some() {
        data.orphaned = false;
    }

    let last = chain.len() - 1;
    if let Some(target) = start_target {
        move_endpoint(&mut chain, 0, 1, target, data.elbowed);
    }
    if let Some(target) = end_target {
        move_endpoint(&mut chain, last, last - 1, target, data.elbowed);
    }

    // Re-derive position/size from the chain and re-localize the points.
    let bbox = chain_bounds(&chain);
    data.points = chain
        .iter()
        .map(|p| Point::new(p.x - bbox.x0, p.y - bbox.y0))
        .collect();

    let Some(element) = store.get_mut(id) else {
        return false;
    };
    let new_position = Point::new(bbox.x0, bbox.y0);
    let new_size = Size::new(bbox.width(), bbox.height());
    let changed = element.position != new_position || element.size != new_size;
    element.position = new_position;
    element.size = new_size;
    element.kind = ElementKind::Arrow(data);
    changed
}

/// Anchor position for a pinned endpoint; clears the connection and flags
/// `dropped` when the referenced element is gone.
fn resolve_connection(
    store: &ElementStore,
    connection: &mut Option<Connection>,
    dropped: &mut bool,
) -> Option<Point> {
    let conn = (*connection)?;
    match store.get(conn.element_id) {
        Some(host) => Some(host.anchor_position(conn.anchor)),
        None => {
            *connection = None;
            *dropped = true;
            None
        }
    }
}

/// Move a chain endpoint to `target`. For elbowed arrows the adjacent point
/// shifts along one axis so the first/last segment stays orthogonal: a
/// vertical segment keeps its verticality by matching x, otherwise y.
fn move_endpoint(
    chain: &mut [Point],
    endpoint: usize,
    neighbor: usize,
    target: Point,
    elbowed: bool,
) {
    let old = chain[endpoint];
    chain[endpoint] = target;
    if !elbowed || neighbor >= chain.len() || neighbor == endpoint {
        return;
    }
    let was_vertical = (chain[neighbor].x - old.x).abs() < 1e-9;
    if was_vertical {
        chain[neighbor].x = target.x;
    } else {
        chain[neighbor].y = target.y;
    }
}

fn chain_bounds(chain: &[Point]) -> Rect {
    let Some((first, rest)) = chain.split_first() else {
        return Rect::ZERO;
    };
    let mut bbox = Rect::from_origin_size(*first, Size::ZERO);
    for p in rest {
        bbox = bbox.union_pt(*p);
    }
    bbox
}

fn refresh_mindmap_connector(store: &mut ElementStore, id: ElementId) -> bool {
    let (start, end) = match store.get(id).map(|e| &e.kind) {
        Some(ElementKind::MindMapConnector(c)) => (c.start_node, c.end_node),
        _ => return false,
    };
    let endpoints = match (store.get(start), store.get(end)) {
        (Some(a), Some(b)) => Some((a.bounds(), b.bounds())),
        _ => None,
    };
    let Some(element) = store.get_mut(id) else {
        return false;
    };
    let ElementKind::MindMapConnector(conn) = &mut element.kind else {
        return false;
    };
    match endpoints {
        Some((a, b)) => {
            conn.orphaned = false;
            let bounds = connector_bounds(a, b);
            let new_position = Point::new(bounds.x0, bounds.y0);
            let new_size = Size::new(bounds.width(), bounds.height());
            let changed = element.position != new_position || element.size != new_size;
            element.position = new_position;
            element.size = new_size;
            changed
        }
        None => {
            if !conn.orphaned {
                conn.orphaned = true;
                warn!("mindmap connector {id} orphaned: endpoint no longer exists");
            }
            false
        }
    }
}

/// Arrows can follow at most two hosts; mind-map parents can form cycles in
/// corrupted documents. Walk the parent chain with a visited set, returning
/// the ancestor ids in order (closest first).
pub fn mindmap_ancestors(store: &ElementStore, node: ElementId) -> Vec<ElementId> {
    let mut visited = HashSet::from([node]);
    let mut ancestors = Vec::new();
    let mut current = node;
    while let Some(parent) = store.get(current).and_then(|e| match &e.kind {
        ElementKind::MindMapNode(n) => n.parent,
        _ => None,
    }) {
        if !visited.insert(parent) {
            warn!("mindmap parent cycle detected at {parent}");
            break;
        }
        ancestors.push(parent);
        current = parent;
    }
    ancestors
}

/// Convenience for building a free (unpinned) arrow whose element box is
/// derived from a world-space point chain.
pub fn arrow_from_world_points(points: &[Point], elbowed: bool) -> (Point, Size, ArrowData) {
    let bbox = chain_bounds(points);
    let local: Vec<Point> = points
        .iter()
        .map(|p| Point::new(p.x - bbox.x0, p.y - bbox.y0))
        .collect();
    (
        Point::new(bbox.x0, bbox.y0),
        Size::new(bbox.width(), bbox.height()),
        ArrowData {
            points: local,
            start_connection: None,
            end_connection: None,
            elbowed,
            orphaned: false,
        },
    )
}
