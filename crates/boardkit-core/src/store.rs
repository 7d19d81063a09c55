//! Authoritative element store: map + z-order + layers, with CRUD that
//! maintains cross-references (frame children, connector endpoints, group
//! membership) on every mutation.

use crate::element::{
    Element, ElementId, ElementKind, ElementPatch, GroupId, LayerId,
};
use crate::error::{BoardError, BoardResult};
use crate::geometry::union_bounds;
use crate::layer::Layer;
use kurbo::{Point, Rect, Size};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Offset applied to duplicated elements.
pub const DUPLICATE_OFFSET: kurbo::Vec2 = kurbo::Vec2::new(16.0, 16.0);

/// Minimum scale factor accepted by [`ElementStore::resize_elements`].
/// Degenerate scales are clamped here rather than rejected.
pub const MIN_RESIZE_SCALE: f64 = 0.1;

/// Edges/centers a selection can be aligned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignEdge {
    Left,
    Right,
    Top,
    Bottom,
    HorizontalCenter,
    VerticalCenter,
}

/// A full copy of the element map and z-order, used by undo/redo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub elements: HashMap<ElementId, Element>,
    pub z_order: Vec<ElementId>,
}

/// The authoritative map of elements plus ordering and layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementStore {
    /// All elements, keyed by id.
    elements: HashMap<ElementId, Element>,
    /// Z-order (back to front).
    z_order: Vec<ElementId>,
    /// Layer list.
    layers: Vec<Layer>,
    /// Layer new elements are appended to.
    active_layer: LayerId,
    /// Reverse index for O(1) group sibling lookup. Rebuilt on load.
    #[serde(skip)]
    group_index: HashMap<GroupId, Vec<ElementId>>,
}

impl Default for ElementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementStore {
    /// Create an empty store with a single default layer.
    pub fn new() -> Self {
        let base = Layer::new("Layer 1");
        let active = base.id;
        Self {
            elements: HashMap::new(),
            z_order: Vec::new(),
            layers: vec![base],
            active_layer: active,
            group_index: HashMap::new(),
        }
    }

    // --- snapshots ---

    /// Copy the element map and z-order for history.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            elements: self.elements.clone(),
            z_order: self.z_order.clone(),
        }
    }

    /// Restore a snapshot, rebuilding derived indices.
    pub fn restore(&mut self, snapshot: StoreSnapshot) {
        self.elements = snapshot.elements;
        self.z_order = snapshot.z_order;
        self.rebuild_group_index();
    }

    fn rebuild_group_index(&mut self) {
        self.group_index.clear();
        for (&id, element) in &self.elements {
            if let Some(group) = element.group {
                self.group_index.entry(group).or_default().push(id);
            }
        }
    }

    // --- accessors ---

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements in z-order (back to front).
    pub fn iter_ordered(&self) -> impl Iterator<Item = &Element> {
        self.z_order.iter().filter_map(|id| self.elements.get(id))
    }

    /// Element ids in z-order (back to front).
    pub fn ids_ordered(&self) -> &[ElementId] {
        &self.z_order
    }

    /// Union bounding box of all elements.
    pub fn bounds(&self) -> Option<Rect> {
        union_bounds(self.elements.values().map(|e| e.bounds()))
    }

    /// True when the element can be a target of pointer interaction:
    /// visible and unlocked, on a visible, unlocked layer.
    pub fn is_interactable(&self, element: &Element) -> bool {
        if !element.visible || element.locked {
            return false;
        }
        match self.layer(element.layer) {
            Some(layer) => layer.visible && !layer.locked,
            None => true,
        }
    }

    // --- layers ---

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn active_layer(&self) -> LayerId {
        self.active_layer
    }

    pub fn add_layer(&mut self, name: impl Into<String>) -> LayerId {
        let layer = Layer::new(name);
        let id = layer.id;
        self.layers.push(layer);
        id
    }

    /// No-op when the layer does not exist.
    pub fn set_active_layer(&mut self, id: LayerId) {
        if self.layer(id).is_some() {
            self.active_layer = id;
        }
    }

    // --- CRUD ---

    /// Add an element. A nil id is assigned a fresh one; a nil layer is
    /// assigned the active layer. The element is appended to the top of the
    /// z-order. Returns the effective id.
    pub fn add_element(&mut self, mut element: Element) -> ElementId {
        if element.id.is_nil() {
            element.id = Uuid::new_v4();
        }
        if element.layer.is_nil() {
            element.layer = self.active_layer;
        }
        let id = element.id;
        if let Some(group) = element.group {
            self.group_index.entry(group).or_default().push(id);
        }
        self.z_order.retain(|&existing| existing != id);
        self.z_order.push(id);
        self.elements.insert(id, element);
        id
    }

    /// Apply a partial update. Returns true if the element existed and the
    /// patch was applied; missing ids no-op.
    pub fn update_element(&mut self, id: ElementId, patch: &ElementPatch) -> bool {
        let Some(element) = self.elements.get_mut(&id) else {
            return false;
        };
        if let Some(position) = patch.position {
            element.position = position;
        }
        if let Some(size) = patch.size {
            element.size = Size::new(size.width.max(0.0), size.height.max(0.0));
        }
        if let Some(rotation) = patch.rotation {
            element.rotation = rotation;
        }
        if let Some(visible) = patch.visible {
            element.visible = visible;
        }
        if let Some(locked) = patch.locked {
            element.locked = locked;
        }
        if let Some(style) = &patch.style {
            element.style = style.clone();
        }
        true
    }

    /// Remove an element, cascading to z-order, group index, frame children
    /// lists, connector references and mind-map parent pointers.
    pub fn remove_element(&mut self, id: ElementId) -> Option<Element> {
        let element = self.elements.remove(&id)?;
        self.z_order.retain(|&existing| existing != id);

        if let Some(group) = element.group {
            if let Some(members) = self.group_index.get_mut(&group) {
                members.retain(|&m| m != id);
                if members.is_empty() {
                    self.group_index.remove(&group);
                }
            }
        }

        // Cascade through every element that can reference the removed id.
        for other in self.elements.values_mut() {
            match &mut other.kind {
                ElementKind::Frame(frame) => {
                    frame.children.retain(|&child| child != id);
                }
                ElementKind::Arrow(arrow) => {
                    let mut dangling = false;
                    if arrow.start_connection.map(|c| c.element_id) == Some(id) {
                        arrow.start_connection = None;
                        dangling = true;
                    }
                    if arrow.end_connection.map(|c| c.element_id) == Some(id) {
                        arrow.end_connection = None;
                        dangling = true;
                    }
                    if dangling {
                        arrow.orphaned = true;
                        warn!("arrow {} orphaned by deletion of {}", other.id, id);
                    }
                }
                ElementKind::MindMapConnector(conn) => {
                    if conn.start_node == id || conn.end_node == id {
                        conn.orphaned = true;
                        warn!(
                            "mindmap connector {} orphaned by deletion of {}",
                            other.id, id
                        );
                    }
                }
                ElementKind::MindMapNode(node) => {
                    if node.parent == Some(id) {
                        node.parent = None;
                    }
                }
                ElementKind::Text(text) => {
                    if text.attached_to == Some(id) {
                        text.attached_to = None;
                    }
                }
                _ => {}
            }
        }

        Some(element)
    }

    /// Remove several elements. Missing ids are skipped.
    pub fn remove_elements(&mut self, ids: &[ElementId]) -> usize {
        ids.iter()
            .filter(|&&id| self.remove_element(id).is_some())
            .count()
    }

    /// Clone an element at a fixed offset with a fresh id. Connections,
    /// frame children and group membership are dropped from the copy: those
    /// relations still belong to the original. Returns the new id.
    pub fn duplicate_element(&mut self, id: ElementId) -> Option<ElementId> {
        let mut copy = self.elements.get(&id)?.clone();
        copy.regenerate_id();
        copy.position += DUPLICATE_OFFSET;
        copy.group = None;
        match &mut copy.kind {
            ElementKind::Frame(frame) => frame.children.clear(),
            ElementKind::Arrow(arrow) => {
                arrow.start_connection = None;
                arrow.end_connection = None;
            }
            ElementKind::Text(text) => {
                text.attached_to = None;
            }
            ElementKind::MindMapNode(node) => {
                node.parent = None;
            }
            _ => {}
        }
        Some(self.add_element(copy))
    }

    // --- z-order ---

    pub fn bring_to_front(&mut self, id: ElementId) {
        if self.elements.contains_key(&id) {
            self.z_order.retain(|&existing| existing != id);
            self.z_order.push(id);
        }
    }

    pub fn send_to_back(&mut self, id: ElementId) {
        if self.elements.contains_key(&id) {
            self.z_order.retain(|&existing| existing != id);
            self.z_order.insert(0, id);
        }
    }

    /// Move one step toward the front. Returns false if already frontmost.
    pub fn bring_forward(&mut self, id: ElementId) -> bool {
        if let Some(pos) = self.z_order.iter().position(|&e| e == id) {
            if pos < self.z_order.len() - 1 {
                self.z_order.swap(pos, pos + 1);
                return true;
            }
        }
        false
    }

    /// Move one step toward the back. Returns false if already backmost.
    pub fn send_backward(&mut self, id: ElementId) -> bool {
        if let Some(pos) = self.z_order.iter().position(|&e| e == id) {
            if pos > 0 {
                self.z_order.swap(pos, pos - 1);
                return true;
            }
        }
        false
    }

    // --- batch transforms ---
    // All transforms skip locked and missing elements silently.

    /// Translate a single element. Returns false for locked/missing ids.
    pub fn translate_element(&mut self, id: ElementId, dx: f64, dy: f64) -> bool {
        match self.elements.get_mut(&id) {
            Some(element) if !element.locked => {
                element.position.x += dx;
                element.position.y += dy;
                true
            }
            _ => false,
        }
    }

    /// Translate elements, returning the ids that actually moved.
    pub fn translate_elements(&mut self, ids: &[ElementId], dx: f64, dy: f64) -> Vec<ElementId> {
        ids.iter()
            .copied()
            .filter(|&id| self.translate_element(id, dx, dy))
            .collect()
    }

    /// Scale elements about `origin`. Scale factors are clamped to
    /// [`MIN_RESIZE_SCALE`] so dimensions never collapse to zero or flip.
    /// Returns the ids that were resized.
    pub fn resize_elements(
        &mut self,
        ids: &[ElementId],
        scale_x: f64,
        scale_y: f64,
        origin: Point,
    ) -> Vec<ElementId> {
        let sx = scale_x.max(MIN_RESIZE_SCALE);
        let sy = scale_y.max(MIN_RESIZE_SCALE);
        let mut resized = Vec::new();
        for &id in ids {
            let Some(element) = self.elements.get_mut(&id) else {
                continue;
            };
            if element.locked {
                continue;
            }
            element.position = Point::new(
                origin.x + (element.position.x - origin.x) * sx,
                origin.y + (element.position.y - origin.y) * sy,
            );
            element.size = Size::new(element.size.width * sx, element.size.height * sy);
            scale_local_geometry(element, sx, sy);
            resized.push(id);
        }
        resized
    }

    /// Rotate elements around `origin` by `angle_deg`. Element centers orbit
    /// the origin; each element's own rotation advances by the same angle.
    pub fn rotate_elements(
        &mut self,
        ids: &[ElementId],
        angle_deg: f64,
        origin: Point,
    ) -> Vec<ElementId> {
        let angle = angle_deg.to_radians();
        let (sin, cos) = angle.sin_cos();
        let mut rotated = Vec::new();
        for &id in ids {
            let Some(element) = self.elements.get_mut(&id) else {
                continue;
            };
            if element.locked {
                continue;
            }
            let center = element.center();
            let dx = center.x - origin.x;
            let dy = center.y - origin.y;
            let new_center = Point::new(
                origin.x + dx * cos - dy * sin,
                origin.y + dx * sin + dy * cos,
            );
            element.position = Point::new(
                new_center.x - element.size.width / 2.0,
                new_center.y - element.size.height / 2.0,
            );
            element.rotation += angle;
            rotated.push(id);
        }
        rotated
    }

    /// Mirror elements around the vertical axis through the selection center.
    pub fn flip_horizontal(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        self.flip(ids, true)
    }

    /// Mirror elements around the horizontal axis through the selection center.
    pub fn flip_vertical(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        self.flip(ids, false)
    }

    fn flip(&mut self, ids: &[ElementId], horizontal: bool) -> Vec<ElementId> {
        let unlocked: Vec<ElementId> = ids
            .iter()
            .copied()
            .filter(|&id| self.elements.get(&id).is_some_and(|e| !e.locked))
            .collect();
        let Some(bounds) = union_bounds(
            unlocked
                .iter()
                .filter_map(|&id| self.elements.get(&id))
                .map(|e| e.bounds()),
        ) else {
            return Vec::new();
        };
        let center = bounds.center();
        for &id in &unlocked {
            let Some(element) = self.elements.get_mut(&id) else {
                continue;
            };
            if horizontal {
                element.position.x =
                    2.0 * center.x - (element.position.x + element.size.width);
            } else {
                element.position.y =
                    2.0 * center.y - (element.position.y + element.size.height);
            }
            mirror_local_geometry(element, horizontal);
        }
        unlocked
    }

    /// Align each unlocked member's edge or center to the selection's union
    /// bounds. A selection of fewer than two elements is a no-op.
    /// Returns the ids that moved.
    pub fn align_elements(&mut self, ids: &[ElementId], edge: AlignEdge) -> Vec<ElementId> {
        let present: Vec<ElementId> = ids
            .iter()
            .copied()
            .filter(|&id| self.elements.get(&id).is_some_and(|e| !e.locked))
            .collect();
        if present.len() < 2 {
            return Vec::new();
        }
        let Some(bounds) = union_bounds(
            present
                .iter()
                .filter_map(|&id| self.elements.get(&id))
                .map(|e| e.bounds()),
        ) else {
            return Vec::new();
        };
        let center = bounds.center();
        for &id in &present {
            let Some(element) = self.elements.get_mut(&id) else {
                continue;
            };
            match edge {
                AlignEdge::Left => element.position.x = bounds.x0,
                AlignEdge::Right => element.position.x = bounds.x1 - element.size.width,
                AlignEdge::Top => element.position.y = bounds.y0,
                AlignEdge::Bottom => element.position.y = bounds.y1 - element.size.height,
                AlignEdge::HorizontalCenter => {
                    element.position.x = center.x - element.size.width / 2.0
                }
                AlignEdge::VerticalCenter => {
                    element.position.y = center.y - element.size.height / 2.0
                }
            }
        }
        present
    }

    // --- groups ---

    /// Tag the given elements with a shared group id. Requires at least two
    /// existing elements; returns the new group id.
    pub fn group_elements(&mut self, ids: &[ElementId]) -> Option<GroupId> {
        let present: Vec<ElementId> = ids
            .iter()
            .copied()
            .filter(|&id| self.elements.contains_key(&id))
            .collect();
        if present.len() < 2 {
            return None;
        }
        let group = Uuid::new_v4();
        for &id in &present {
            // Leaving a previous group first keeps the reverse index exact.
            self.leave_group(id);
            if let Some(element) = self.elements.get_mut(&id) {
                element.group = Some(group);
            }
        }
        self.group_index.insert(group, present);
        Some(group)
    }

    /// Clear group membership for every member of `group`.
    /// Returns the number of elements released.
    pub fn ungroup_elements(&mut self, group: GroupId) -> usize {
        let Some(members) = self.group_index.remove(&group) else {
            return 0;
        };
        let mut released = 0;
        for id in members {
            if let Some(element) = self.elements.get_mut(&id) {
                element.group = None;
                released += 1;
            }
        }
        released
    }

    fn leave_group(&mut self, id: ElementId) {
        let Some(previous) = self.elements.get(&id).and_then(|e| e.group) else {
            return;
        };
        if let Some(members) = self.group_index.get_mut(&previous) {
            members.retain(|&m| m != id);
            if members.is_empty() {
                self.group_index.remove(&previous);
            }
        }
    }

    /// All members of a group, in insertion order.
    pub fn group_members(&self, group: GroupId) -> &[ElementId] {
        self.group_index
            .get(&group)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All elements sharing a group with `id`, excluding `id` itself.
    /// Symmetric: every member sees the same set.
    pub fn group_siblings(&self, id: ElementId) -> Vec<ElementId> {
        let Some(group) = self.elements.get(&id).and_then(|e| e.group) else {
            return Vec::new();
        };
        self.group_members(group)
            .iter()
            .copied()
            .filter(|&m| m != id)
            .collect()
    }

    // --- lock / visibility ---

    pub fn lock_elements(&mut self, ids: &[ElementId]) -> usize {
        self.set_locked(ids, true)
    }

    pub fn unlock_elements(&mut self, ids: &[ElementId]) -> usize {
        self.set_locked(ids, false)
    }

    fn set_locked(&mut self, ids: &[ElementId], locked: bool) -> usize {
        let mut count = 0;
        for id in ids {
            if let Some(element) = self.elements.get_mut(id) {
                element.locked = locked;
                count += 1;
            }
        }
        count
    }

    pub fn set_visible(&mut self, ids: &[ElementId], visible: bool) -> usize {
        let mut count = 0;
        for id in ids {
            if let Some(element) = self.elements.get_mut(id) {
                element.visible = visible;
                count += 1;
            }
        }
        count
    }

    // --- queries ---

    /// Topmost element whose bounds contain the point, front to back.
    pub fn element_at_point(&self, point: Point, tolerance: f64) -> Option<ElementId> {
        self.z_order.iter().rev().copied().find(|id| {
            self.elements
                .get(id)
                .is_some_and(|e| e.visible && e.bounds().inflate(tolerance, tolerance).contains(point))
        })
    }

    /// Element ids whose bounds intersect the rect, in z-order.
    pub fn elements_in_rect(&self, rect: Rect) -> Vec<ElementId> {
        self.z_order
            .iter()
            .copied()
            .filter(|id| {
                self.elements
                    .get(id)
                    .is_some_and(|e| crate::geometry::bounds_intersect(e.bounds(), rect))
            })
            .collect()
    }

    // --- serialization ---

    /// Serialize the store to JSON.
    pub fn to_json(&self) -> BoardResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a store from JSON, rebuilding derived indices and
    /// defensively repairing corrupted cross-references.
    pub fn from_json(json: &str) -> BoardResult<Self> {
        let mut store: ElementStore = serde_json::from_str(json)?;
        if store.layers.is_empty() {
            return Err(BoardError::CorruptDocument("no layers".into()));
        }
        if store.layer(store.active_layer).is_none() {
            store.active_layer = store.layers[0].id;
        }
        store.rebuild_group_index();
        store.sanitize();
        Ok(store)
    }

    /// Repair invalid persisted state: frame children must reference
    /// existing, non-frame, non-self elements; connectors with missing
    /// endpoints are orphaned. Never errors; bad references are dropped.
    fn sanitize(&mut self) {
        let frame_ids: Vec<ElementId> = self
            .elements
            .values()
            .filter(|e| e.is_frame())
            .map(|e| e.id)
            .collect();
        let existing: std::collections::HashSet<ElementId> =
            self.elements.keys().copied().collect();

        for frame_id in frame_ids {
            let Some(frame) = self
                .elements
                .get_mut(&frame_id)
                .and_then(|e| e.as_frame_mut())
            else {
                continue;
            };
            let before = frame.children.len();
            frame
                .children
                .retain(|child| *child != frame_id && existing.contains(child));
            if frame.children.len() != before {
                warn!(
                    "frame {} dropped {} invalid child reference(s) on load",
                    frame_id,
                    before - frame.children.len()
                );
            }
        }

        for element in self.elements.values_mut() {
            match &mut element.kind {
                ElementKind::MindMapConnector(conn) => {
                    if !existing.contains(&conn.start_node) || !existing.contains(&conn.end_node) {
                        conn.orphaned = true;
                    }
                }
                ElementKind::Arrow(arrow) => {
                    if let Some(c) = arrow.start_connection {
                        if !existing.contains(&c.element_id) {
                            arrow.start_connection = None;
                            arrow.orphaned = true;
                        }
                    }
                    if let Some(c) = arrow.end_connection {
                        if !existing.contains(&c.element_id) {
                            arrow.end_connection = None;
                            arrow.orphaned = true;
                        }
                    }
                }
                _ => {}
            }
        }

        // A frame listing another frame as a child would recurse; the
        // retain above already removed those, but nested frame children
        // from older documents are demoted here too.
        let nested: Vec<(ElementId, ElementId)> = self
            .elements
            .values()
            .filter_map(|e| e.as_frame().map(|f| (e.id, f.children.clone())))
            .flat_map(|(fid, children)| {
                children
                    .into_iter()
                    .filter(|c| self.elements.get(c).is_some_and(|e| e.is_frame()))
                    .map(move |c| (fid, c))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (frame_id, child) in nested {
            if let Some(frame) = self
                .elements
                .get_mut(&frame_id)
                .and_then(|e| e.as_frame_mut())
            {
                frame.children.retain(|&c| c != child);
                warn!("frame {frame_id} dropped nested frame child {child}");
            }
        }
    }
}

/// Scale variant-local geometry (arrow point chains) with the element.
fn scale_local_geometry(element: &mut Element, sx: f64, sy: f64) {
    if let ElementKind::Arrow(arrow) = &mut element.kind {
        for p in &mut arrow.points {
            p.x *= sx;
            p.y *= sy;
        }
    }
}

/// Mirror variant-local geometry within the element's own box.
fn mirror_local_geometry(element: &mut Element, horizontal: bool) {
    if let ElementKind::Arrow(arrow) = &mut element.kind {
        for p in &mut arrow.points {
            if horizontal {
                p.x = element.size.width - p.x;
            } else {
                p.y = element.size.height - p.y;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{
        ArrowData, Connection, FrameData, MindMapConnectorData, ShapeData,
    };
    use crate::geometry::Anchor;

    fn shape(x: f64, y: f64, w: f64, h: f64) -> Element {
        Element::new(
            ElementKind::Shape(ShapeData::default()),
            Point::new(x, y),
            Size::new(w, h),
        )
    }

    #[test]
    fn test_add_assigns_layer_and_zorder() {
        let mut store = ElementStore::new();
        let id = store.add_element(shape(0.0, 0.0, 10.0, 10.0));
        let element = store.get(id).unwrap();
        assert_eq!(element.layer, store.active_layer());
        assert_eq!(store.ids_ordered(), &[id]);
    }

    #[test]
    fn test_update_missing_is_noop() {
        let mut store = ElementStore::new();
        let patch = ElementPatch {
            position: Some(Point::new(5.0, 5.0)),
            ..Default::default()
        };
        assert!(!store.update_element(Uuid::new_v4(), &patch));
    }

    #[test]
    fn test_remove_prunes_frame_children() {
        let mut store = ElementStore::new();
        let child = store.add_element(shape(10.0, 10.0, 20.0, 20.0));
        let mut frame = Element::new(
            ElementKind::Frame(FrameData {
                name: "f".into(),
                children: vec![child],
            }),
            Point::ZERO,
            Size::new(100.0, 100.0),
        );
        frame.id = Uuid::new_v4();
        let frame_id = store.add_element(frame);

        store.remove_element(child);
        assert!(store.get(frame_id).unwrap().as_frame().unwrap().children.is_empty());
    }

    #[test]
    fn test_remove_orphans_connectors() {
        let mut store = ElementStore::new();
        let a = store.add_element(shape(0.0, 0.0, 100.0, 100.0));
        let b = store.add_element(shape(300.0, 0.0, 100.0, 100.0));

        let arrow = Element::new(
            ElementKind::Arrow(ArrowData {
                points: vec![Point::ZERO, Point::new(200.0, 0.0)],
                start_connection: Some(Connection {
                    element_id: a,
                    anchor: Anchor::Right,
                }),
                end_connection: Some(Connection {
                    element_id: b,
                    anchor: Anchor::Left,
                }),
                ..Default::default()
            }),
            Point::new(100.0, 50.0),
            Size::new(200.0, 0.0),
        );
        let arrow_id = store.add_element(arrow);

        let conn = Element::new(
            ElementKind::MindMapConnector(MindMapConnectorData {
                start_node: a,
                end_node: b,
                orphaned: false,
            }),
            Point::ZERO,
            Size::ZERO,
        );
        let conn_id = store.add_element(conn);

        store.remove_element(a);

        let arrow = store.get(arrow_id).unwrap().as_arrow().unwrap();
        assert!(arrow.orphaned);
        assert!(arrow.start_connection.is_none());
        assert!(arrow.end_connection.is_some());

        match &store.get(conn_id).unwrap().kind {
            ElementKind::MindMapConnector(c) => assert!(c.orphaned),
            _ => panic!("expected connector"),
        }
    }

    #[test]
    fn test_duplicate_offsets_and_strips_relations() {
        let mut store = ElementStore::new();
        let a = store.add_element(shape(0.0, 0.0, 10.0, 10.0));
        let b = store.add_element(shape(20.0, 0.0, 10.0, 10.0));
        store.group_elements(&[a, b]);

        let copy = store.duplicate_element(a).unwrap();
        assert_ne!(copy, a);
        let copied = store.get(copy).unwrap();
        assert_eq!(copied.position, Point::new(16.0, 16.0));
        assert!(copied.group.is_none());
    }

    #[test]
    fn test_locked_elements_skip_transforms() {
        let mut store = ElementStore::new();
        let id = store.add_element(shape(0.0, 0.0, 10.0, 10.0));
        store.lock_elements(&[id]);

        assert!(store.translate_elements(&[id], 5.0, 5.0).is_empty());
        assert_eq!(store.get(id).unwrap().position, Point::ZERO);

        assert!(store
            .resize_elements(&[id], 2.0, 2.0, Point::ZERO)
            .is_empty());
        assert_eq!(store.get(id).unwrap().size, Size::new(10.0, 10.0));
    }

    #[test]
    fn test_lock_and_visibility_count_existing_only() {
        let mut store = ElementStore::new();
        let a = store.add_element(shape(0.0, 0.0, 10.0, 10.0));
        let missing = Uuid::new_v4();

        assert_eq!(store.lock_elements(&[a, missing]), 1);
        assert!(store.get(a).unwrap().locked);
        assert_eq!(store.unlock_elements(&[a, missing]), 1);
        assert!(!store.get(a).unwrap().locked);

        assert_eq!(store.set_visible(&[a, missing], false), 1);
        assert!(!store.get(a).unwrap().visible);
    }

    #[test]
    fn test_resize_clamps_degenerate_scale() {
        let mut store = ElementStore::new();
        let id = store.add_element(shape(0.0, 0.0, 100.0, 100.0));
        store.resize_elements(&[id], 0.0, -2.0, Point::ZERO);
        let element = store.get(id).unwrap();
        assert!((element.size.width - 10.0).abs() < 1e-9);
        assert!((element.size.height - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_resize_about_origin() {
        let mut store = ElementStore::new();
        let id = store.add_element(shape(10.0, 10.0, 20.0, 20.0));
        store.resize_elements(&[id], 2.0, 2.0, Point::ZERO);
        let element = store.get(id).unwrap();
        assert_eq!(element.position, Point::new(20.0, 20.0));
        assert_eq!(element.size, Size::new(40.0, 40.0));
    }

    #[test]
    fn test_align_left() {
        let mut store = ElementStore::new();
        let a = store.add_element(shape(0.0, 0.0, 10.0, 10.0));
        let b = store.add_element(shape(50.0, 30.0, 10.0, 10.0));
        store.align_elements(&[a, b], AlignEdge::Left);
        assert_eq!(store.get(a).unwrap().position.x, 0.0);
        assert_eq!(store.get(b).unwrap().position.x, 0.0);
    }

    #[test]
    fn test_align_single_is_noop() {
        let mut store = ElementStore::new();
        let a = store.add_element(shape(5.0, 5.0, 10.0, 10.0));
        assert!(store.align_elements(&[a], AlignEdge::Left).is_empty());
        assert_eq!(store.get(a).unwrap().position, Point::new(5.0, 5.0));
    }

    #[test]
    fn test_group_symmetry() {
        let mut store = ElementStore::new();
        let a = store.add_element(shape(0.0, 0.0, 10.0, 10.0));
        let b = store.add_element(shape(20.0, 0.0, 10.0, 10.0));
        let c = store.add_element(shape(40.0, 0.0, 10.0, 10.0));
        store.group_elements(&[a, b, c]).unwrap();

        let mut from_a = store.group_siblings(a);
        let mut expect_a = vec![b, c];
        from_a.sort();
        expect_a.sort();
        assert_eq!(from_a, expect_a);

        let mut from_c = store.group_siblings(c);
        let mut expect_c = vec![a, b];
        from_c.sort();
        expect_c.sort();
        assert_eq!(from_c, expect_c);
    }

    #[test]
    fn test_ungroup() {
        let mut store = ElementStore::new();
        let a = store.add_element(shape(0.0, 0.0, 10.0, 10.0));
        let b = store.add_element(shape(20.0, 0.0, 10.0, 10.0));
        let group = store.group_elements(&[a, b]).unwrap();
        assert_eq!(store.ungroup_elements(group), 2);
        assert!(store.group_siblings(a).is_empty());
        assert!(store.get(a).unwrap().group.is_none());
    }

    #[test]
    fn test_group_requires_two() {
        let mut store = ElementStore::new();
        let a = store.add_element(shape(0.0, 0.0, 10.0, 10.0));
        assert!(store.group_elements(&[a]).is_none());
        assert!(store.group_elements(&[a, Uuid::new_v4()]).is_none());
    }

    #[test]
    fn test_z_order_ops() {
        let mut store = ElementStore::new();
        let a = store.add_element(shape(0.0, 0.0, 10.0, 10.0));
        let b = store.add_element(shape(5.0, 5.0, 10.0, 10.0));

        assert_eq!(store.ids_ordered(), &[a, b]);
        store.bring_to_front(a);
        assert_eq!(store.ids_ordered(), &[b, a]);
        store.send_to_back(a);
        assert_eq!(store.ids_ordered(), &[a, b]);
        assert!(store.bring_forward(a));
        assert_eq!(store.ids_ordered(), &[b, a]);
        assert!(!store.bring_forward(a));
    }

    #[test]
    fn test_element_at_point_front_first() {
        let mut store = ElementStore::new();
        let back = store.add_element(shape(0.0, 0.0, 100.0, 100.0));
        let front = store.add_element(shape(50.0, 50.0, 100.0, 100.0));

        assert_eq!(
            store.element_at_point(Point::new(75.0, 75.0), 0.0),
            Some(front)
        );
        assert_eq!(
            store.element_at_point(Point::new(25.0, 25.0), 0.0),
            Some(back)
        );
    }

    #[test]
    fn test_json_roundtrip_rebuilds_group_index() {
        let mut store = ElementStore::new();
        let a = store.add_element(shape(0.0, 0.0, 10.0, 10.0));
        let b = store.add_element(shape(20.0, 0.0, 10.0, 10.0));
        store.group_elements(&[a, b]).unwrap();

        let json = store.to_json().unwrap();
        let restored = ElementStore::from_json(&json).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.group_siblings(a), vec![b]);
    }

    #[test]
    fn test_from_json_breaks_self_child_frame() {
        let mut store = ElementStore::new();
        let mut frame = Element::new(
            ElementKind::Frame(FrameData::default()),
            Point::ZERO,
            Size::new(100.0, 100.0),
        );
        let frame_id = frame.id;
        if let ElementKind::Frame(f) = &mut frame.kind {
            f.children.push(frame_id); // corrupt: frame lists itself
        }
        store.add_element(frame);

        let json = store.to_json().unwrap();
        let restored = ElementStore::from_json(&json).unwrap();
        assert!(restored
            .get(frame_id)
            .unwrap()
            .as_frame()
            .unwrap()
            .children
            .is_empty());
    }
}
