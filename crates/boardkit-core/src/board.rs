//! Board controller: owns the store, camera, selection, history and
//! gesture state, and exposes the editing operations as committed
//! mutations.
//!
//! Every committed mutation pushes exactly one history entry (drags push at
//! gesture completion, never per frame) and then lets the relationship
//! resolver refresh derived geometry. Operations on missing ids no-op
//! silently; user-visible outcomes are reported through the notice queue.

use crate::camera::Camera;
use crate::element::{Element, ElementId, ElementPatch, GroupId};
use crate::error::BoardResult;
use crate::frame::{self, FrameConfig};
use crate::gesture::{GestureCoordinator, GestureKind, GestureToken};
use crate::history::HistoryManager;
use crate::resolver;
use crate::selection::{
    self, finish_marquee, selection_bounds, HandleKind, Selection,
};
use crate::snap::{compute_snap, SnapConfig, SnapLine};
use crate::store::{AlignEdge, ElementStore, StoreSnapshot};
use kurbo::{Point, Rect, Size, Vec2};
use log::info;

/// User-visible outcomes of committed operations, drained by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    ElementsDeleted(usize),
    ElementsDuplicated(usize),
    ElementsGrouped(usize),
    ElementsUngrouped(usize),
    FrameCreated(ElementId),
    ElementsLocked(usize),
    ElementsUnlocked(usize),
}

/// The live pointer drag, if any.
enum ActiveDrag {
    Move {
        token: GestureToken,
        original: StoreSnapshot,
        start: Point,
        moved: bool,
        guides: Vec<SnapLine>,
    },
    Resize {
        token: GestureToken,
        original: StoreSnapshot,
        bounds: Rect,
        handle: HandleKind,
        moved: bool,
    },
    Marquee {
        token: GestureToken,
        start_screen: Point,
    },
}

/// The whiteboard editing engine.
pub struct Board {
    store: ElementStore,
    camera: Camera,
    selection: Selection,
    history: HistoryManager,
    gestures: GestureCoordinator,
    pub snap_config: SnapConfig,
    pub frame_config: FrameConfig,
    viewport: Size,
    notices: Vec<Notice>,
    drag: Option<ActiveDrag>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            store: ElementStore::new(),
            camera: Camera::new(),
            selection: Selection::new(),
            history: HistoryManager::new(),
            gestures: GestureCoordinator::new(),
            snap_config: SnapConfig::default(),
            frame_config: FrameConfig::default(),
            viewport: Size::new(1280.0, 800.0),
            notices: Vec::new(),
            drag: None,
        }
    }

    // --- accessors ---

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Guides computed for the current drag frame, for rendering.
    pub fn snap_guides(&self) -> &[SnapLine] {
        match &self.drag {
            Some(ActiveDrag::Move { guides, .. }) => guides,
            _ => &[],
        }
    }

    /// Drain pending notices in order.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // --- element CRUD (one-shot commits) ---

    pub fn add_element(&mut self, element: Element) -> ElementId {
        let name = element.kind.name();
        self.history
            .push(self.store.snapshot(), format!("Add {name}"));
        let id = self.store.add_element(element);
        resolver::refresh_dependents(&mut self.store, id);
        id
    }

    /// Apply a partial update; missing ids no-op without touching history.
    pub fn update_element(&mut self, id: ElementId, patch: ElementPatch) {
        if !self.store.contains(id) {
            return;
        }
        self.history.push(self.store.snapshot(), "Edit element");
        let geometry = patch.touches_geometry();
        self.store.update_element(id, &patch);
        if geometry {
            resolver::refresh_dependents(&mut self.store, id);
        }
    }

    pub fn delete_elements(&mut self, ids: &[ElementId]) {
        let existing: Vec<ElementId> = ids
            .iter()
            .copied()
            .filter(|&id| self.store.contains(id))
            .collect();
        if existing.is_empty() {
            return;
        }
        self.history.push(
            self.store.snapshot(),
            format!("Delete {} element(s)", existing.len()),
        );
        let removed = self.store.remove_elements(&existing);
        self.selection.prune(&self.store);
        self.notices.push(Notice::ElementsDeleted(removed));
    }

    pub fn delete_selected(&mut self) {
        let ids = self.selection.ids().to_vec();
        self.delete_elements(&ids);
    }

    /// Duplicate the selection and select the copies.
    pub fn duplicate_selected(&mut self) -> Vec<ElementId> {
        let ids = self.selection.ids().to_vec();
        if ids.is_empty() {
            return Vec::new();
        }
        self.history.push(
            self.store.snapshot(),
            format!("Duplicate {} element(s)", ids.len()),
        );
        let copies: Vec<ElementId> = ids
            .iter()
            .filter_map(|&id| self.store.duplicate_element(id))
            .collect();
        if copies.is_empty() {
            return copies;
        }
        self.selection.set(copies.clone());
        self.notices.push(Notice::ElementsDuplicated(copies.len()));
        copies
    }

    // --- selection transforms (one-shot commits) ---

    /// Nudge the selection, routing frames so their children follow, then
    /// re-home dropped elements.
    pub fn move_selected_by(&mut self, dx: f64, dy: f64) {
        let ids = self.selection.ids().to_vec();
        if ids.is_empty() {
            return;
        }
        self.history.push(
            self.store.snapshot(),
            format!("Move {} element(s)", ids.len()),
        );
        let moved = self.translate_routed(&ids, dx, dy);
        for &id in &moved {
            resolver::refresh_dependents(&mut self.store, id);
        }
        frame::reassign_dropped(&mut self.store, &moved, &self.frame_config);
    }

    pub fn align_selected(&mut self, edge: AlignEdge) {
        let ids = self.selection.ids().to_vec();
        if ids.len() < 2 {
            return;
        }
        self.history.push(self.store.snapshot(), "Align elements");
        let moved = self.store.align_elements(&ids, edge);
        for &id in &moved {
            resolver::refresh_dependents(&mut self.store, id);
        }
    }

    pub fn rotate_selected(&mut self, angle_deg: f64) {
        let ids = self.selection.ids().to_vec();
        let Some(bounds) = selection_bounds(&self.store, &self.selection) else {
            return;
        };
        self.history.push(self.store.snapshot(), "Rotate elements");
        let moved = self.store.rotate_elements(&ids, angle_deg, bounds.center());
        for &id in &moved {
            resolver::refresh_dependents(&mut self.store, id);
        }
    }

    pub fn flip_selected_horizontal(&mut self) {
        self.flip_selected(true);
    }

    pub fn flip_selected_vertical(&mut self) {
        self.flip_selected(false);
    }

    fn flip_selected(&mut self, horizontal: bool) {
        let ids = self.selection.ids().to_vec();
        if ids.is_empty() {
            return;
        }
        self.history.push(self.store.snapshot(), "Flip elements");
        let moved = if horizontal {
            self.store.flip_horizontal(&ids)
        } else {
            self.store.flip_vertical(&ids)
        };
        for &id in &moved {
            resolver::refresh_dependents(&mut self.store, id);
        }
    }

    pub fn group_selected(&mut self) -> Option<GroupId> {
        let ids = self.selection.ids().to_vec();
        if ids.len() < 2 {
            return None;
        }
        self.history.push(
            self.store.snapshot(),
            format!("Group {} elements", ids.len()),
        );
        let group = self.store.group_elements(&ids)?;
        self.notices.push(Notice::ElementsGrouped(ids.len()));
        Some(group)
    }

    pub fn ungroup_selected(&mut self) {
        let groups: Vec<GroupId> = {
            let mut seen = Vec::new();
            for &id in self.selection.ids() {
                if let Some(group) = self.store.get(id).and_then(|e| e.group) {
                    if !seen.contains(&group) {
                        seen.push(group);
                    }
                }
            }
            seen
        };
        if groups.is_empty() {
            return;
        }
        self.history.push(self.store.snapshot(), "Ungroup elements");
        let mut released = 0;
        for group in groups {
            released += self.store.ungroup_elements(group);
        }
        self.notices.push(Notice::ElementsUngrouped(released));
    }

    pub fn lock_selected(&mut self) {
        let ids = self.selection.ids().to_vec();
        if ids.is_empty() {
            return;
        }
        self.history.push(self.store.snapshot(), "Lock elements");
        let count = self.store.lock_elements(&ids);
        self.notices.push(Notice::ElementsLocked(count));
    }

    pub fn unlock_elements(&mut self, ids: &[ElementId]) {
        if ids.is_empty() {
            return;
        }
        self.history.push(self.store.snapshot(), "Unlock elements");
        let count = self.store.unlock_elements(ids);
        self.notices.push(Notice::ElementsUnlocked(count));
    }

    pub fn bring_selected_to_front(&mut self) {
        let ids = self.selection.ids().to_vec();
        if ids.is_empty() {
            return;
        }
        self.history.push(self.store.snapshot(), "Reorder elements");
        for id in ids {
            self.store.bring_to_front(id);
        }
    }

    pub fn send_selected_to_back(&mut self) {
        let ids = self.selection.ids().to_vec();
        if ids.is_empty() {
            return;
        }
        self.history.push(self.store.snapshot(), "Reorder elements");
        for id in ids.into_iter().rev() {
            self.store.send_to_back(id);
        }
    }

    // --- frames ---

    /// Wrap the current selection in a new frame and select it.
    pub fn create_frame_from_selection(&mut self, name: impl Into<String>) -> Option<ElementId> {
        let ids = self.selection.ids().to_vec();
        if ids.is_empty() {
            return None;
        }
        self.history.push(self.store.snapshot(), "Create frame");
        let frame_id =
            frame::create_frame_from_selection(&mut self.store, &ids, name, &self.frame_config)?;
        self.selection.set(vec![frame_id]);
        self.notices.push(Notice::FrameCreated(frame_id));
        Some(frame_id)
    }

    pub fn add_to_frame(&mut self, frame_id: ElementId, child: ElementId) {
        let snapshot = self.store.snapshot();
        if frame::add_child(&mut self.store, frame_id, child) {
            self.history.push(snapshot, "Add to frame");
        }
    }

    pub fn remove_from_frame(&mut self, frame_id: ElementId, child: ElementId) {
        let snapshot = self.store.snapshot();
        if frame::detach_child(&mut self.store, frame_id, child) {
            self.history.push(snapshot, "Remove from frame");
        }
    }

    // --- selection ---

    /// Click-select at a screen point. Grouped elements select as a unit.
    pub fn click_select(&mut self, screen_point: Point, multi: bool) -> Option<ElementId> {
        let world = self.camera.screen_to_world(screen_point);
        selection::select_at_point(&self.store, &mut self.selection, world, multi)
    }

    pub fn select_all(&mut self) {
        let ids: Vec<ElementId> = self
            .store
            .iter_ordered()
            .filter(|e| self.store.is_interactable(e))
            .map(|e| e.id)
            .collect();
        self.selection.set(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// World-space bounds of the selection, for drawing handles.
    pub fn selection_bounds(&self) -> Option<Rect> {
        selection_bounds(&self.store, &self.selection)
    }

    // --- move gesture ---

    /// Begin dragging the selection. Fails when the selection is empty or
    /// another gesture is live.
    pub fn begin_move(&mut self, start_world: Point) -> bool {
        if self.selection.is_empty() || self.drag.is_some() {
            return false;
        }
        let Some(token) = self.gestures.try_begin(GestureKind::BoundsDrag) else {
            return false;
        };
        self.drag = Some(ActiveDrag::Move {
            token,
            original: self.store.snapshot(),
            start: start_world,
            moved: false,
            guides: Vec::new(),
        });
        true
    }

    /// Advance the drag to a new pointer position. Applies the cumulative
    /// delta to the pre-drag state so intermediate frames never accumulate
    /// error, snaps against stationary elements, and refreshes dependents.
    /// No history is written here.
    pub fn update_move(&mut self, current_world: Point) {
        let (original, start) = match &self.drag {
            Some(ActiveDrag::Move {
                original, start, ..
            }) => (original.clone(), *start),
            _ => return,
        };
        self.store.restore(original);

        let ids = self.selection.ids().to_vec();
        let moving = self.expand_with_frame_children(&ids);
        let Some(bounds) = selection_bounds(&self.store, &self.selection) else {
            return;
        };

        let delta = current_world - start;
        let proposed = bounds + delta;
        let targets: Vec<Rect> = self
            .store
            .iter_ordered()
            .filter(|e| !moving.contains(&e.id) && self.store.is_interactable(e))
            .map(|e| e.bounds())
            .collect();
        let outcome = compute_snap(proposed, &targets, self.camera.zoom, &self.snap_config);
        let snapped = outcome.bounds.origin() - bounds.origin();

        let moved = self.translate_routed(&ids, snapped.x, snapped.y);
        for &id in &moved {
            resolver::refresh_dependents(&mut self.store, id);
        }

        if let Some(ActiveDrag::Move { moved: m, guides, .. }) = &mut self.drag {
            *m = snapped.hypot() > 0.0;
            *guides = outcome.guides;
        }
    }

    /// Commit the drag: one history entry against the pre-drag state, then
    /// re-home dropped elements. A drag that never moved commits nothing.
    pub fn end_move(&mut self) {
        if !matches!(self.drag, Some(ActiveDrag::Move { .. })) {
            return;
        }
        let Some(ActiveDrag::Move {
            token,
            original,
            moved,
            ..
        }) = self.drag.take()
        else {
            return;
        };
        self.gestures.release(token);
        if !moved {
            return;
        }
        let ids = self.selection.ids().to_vec();
        self.history
            .push(original, format!("Move {} element(s)", ids.len()));
        let landed = self.expand_with_frame_children(&ids);
        frame::reassign_dropped(&mut self.store, &landed, &self.frame_config);
        info!("move committed: {} element(s)", ids.len());
    }

    /// Abort the drag and restore the pre-drag state. No history entry.
    pub fn cancel_move(&mut self) {
        if !matches!(self.drag, Some(ActiveDrag::Move { .. })) {
            return;
        }
        let Some(ActiveDrag::Move {
            token, original, ..
        }) = self.drag.take()
        else {
            return;
        };
        self.gestures.release(token);
        self.store.restore(original);
    }

    // --- resize gesture ---

    pub fn begin_resize(&mut self, handle: HandleKind) -> bool {
        if self.drag.is_some() {
            return false;
        }
        let Some(bounds) = selection_bounds(&self.store, &self.selection) else {
            return false;
        };
        let Some(token) = self.gestures.try_begin(GestureKind::ResizeHandle) else {
            return false;
        };
        self.drag = Some(ActiveDrag::Resize {
            token,
            original: self.store.snapshot(),
            bounds,
            handle,
            moved: false,
        });
        true
    }

    /// Drag a resize handle to a world position, scaling the selection
    /// about the opposite point.
    pub fn update_resize(&mut self, current_world: Point) {
        let (original, bounds, handle) = match &self.drag {
            Some(ActiveDrag::Resize {
                original,
                bounds,
                handle,
                ..
            }) => (original.clone(), *bounds, *handle),
            _ => return,
        };
        self.store.restore(original);

        let (sx, sy) = selection::resize_scale(bounds, handle, current_world);
        let origin = selection::resize_origin(bounds, handle);
        let ids = self.selection.ids().to_vec();
        let targets = self.expand_with_frame_children(&ids);
        let resized = self.store.resize_elements(&targets, sx, sy, origin);
        for &id in &resized {
            resolver::refresh_dependents(&mut self.store, id);
        }
        if let Some(ActiveDrag::Resize { moved, .. }) = &mut self.drag {
            *moved = (sx - 1.0).abs() > f64::EPSILON || (sy - 1.0).abs() > f64::EPSILON;
        }
    }

    pub fn end_resize(&mut self) {
        if !matches!(self.drag, Some(ActiveDrag::Resize { .. })) {
            return;
        }
        let Some(ActiveDrag::Resize {
            token,
            original,
            moved,
            ..
        }) = self.drag.take()
        else {
            return;
        };
        self.gestures.release(token);
        if moved {
            self.history.push(original, "Resize elements");
        }
    }

    pub fn cancel_resize(&mut self) {
        if !matches!(self.drag, Some(ActiveDrag::Resize { .. })) {
            return;
        }
        let Some(ActiveDrag::Resize {
            token, original, ..
        }) = self.drag.take()
        else {
            return;
        };
        self.gestures.release(token);
        self.store.restore(original);
    }

    // --- marquee gesture ---

    pub fn begin_marquee(&mut self, start_screen: Point) -> bool {
        if self.drag.is_some() {
            return false;
        }
        let Some(token) = self.gestures.try_begin(GestureKind::Marquee) else {
            return false;
        };
        self.drag = Some(ActiveDrag::Marquee {
            token,
            start_screen,
        });
        true
    }

    /// Finish the marquee. Short drags degrade to a click-select.
    pub fn end_marquee(&mut self, end_screen: Point, additive: bool) {
        if !matches!(self.drag, Some(ActiveDrag::Marquee { .. })) {
            return;
        }
        let Some(ActiveDrag::Marquee {
            token,
            start_screen,
        }) = self.drag.take()
        else {
            return;
        };
        self.gestures.release(token);
        finish_marquee(
            &self.store,
            &self.camera,
            &mut self.selection,
            start_screen,
            end_screen,
            additive,
        );
    }

    pub fn cancel_marquee(&mut self) {
        if !matches!(self.drag, Some(ActiveDrag::Marquee { .. })) {
            return;
        }
        if let Some(ActiveDrag::Marquee { token, .. }) = self.drag.take() {
            self.gestures.release(token);
        }
    }

    // --- history ---

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo(self.store.snapshot()) else {
            return false;
        };
        self.store.restore(snapshot);
        self.selection.prune(&self.store);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo(self.store.snapshot()) else {
            return false;
        };
        self.store.restore(snapshot);
        self.selection.prune(&self.store);
        true
    }

    // --- camera ---

    pub fn pan(&mut self, delta: Vec2) {
        self.camera.pan(delta);
    }

    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        self.camera.zoom_at(screen_point, factor);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.camera.set_zoom(zoom);
    }

    /// Fit the camera to all content, or reset when the board is empty.
    pub fn zoom_to_fit(&mut self, padding: f64) {
        match self.store.bounds() {
            Some(bounds) => self.camera.fit_to_bounds(bounds, self.viewport, padding),
            None => self.camera.reset(),
        }
    }

    // --- persistence ---

    pub fn to_json(&self) -> BoardResult<String> {
        self.store.to_json()
    }

    /// Load a document, replacing the store and clearing selection and
    /// history. Derived geometry is recomputed from the loaded hosts.
    pub fn load_json(&mut self, json: &str) -> BoardResult<()> {
        let mut store = ElementStore::from_json(json)?;
        resolver::refresh_all(&mut store);
        self.store = store;
        self.selection.clear();
        self.history.clear();
        self.drag = None;
        self.gestures.abort();
        Ok(())
    }

    // --- internals ---

    /// Translate, routing frames through `move_frame` so explicit children
    /// travel with them. Returns everything that moved.
    fn translate_routed(&mut self, ids: &[ElementId], dx: f64, dy: f64) -> Vec<ElementId> {
        let mut moved = Vec::new();
        for &id in ids {
            if self.store.get(id).is_some_and(|e| e.is_frame()) {
                moved.extend(frame::move_frame(&mut self.store, id, dx, dy));
            } else if self.store.translate_element(id, dx, dy) {
                moved.push(id);
            }
        }
        moved
    }

    /// The ids plus explicit children of any frames among them.
    fn expand_with_frame_children(&self, ids: &[ElementId]) -> Vec<ElementId> {
        let mut result = ids.to_vec();
        for &id in ids {
            if let Some(children) = self
                .store
                .get(id)
                .and_then(|e| e.as_frame())
                .map(|f| f.children.clone())
            {
                for child in children {
                    if !result.contains(&child) {
                        result.push(child);
                    }
                }
            }
        }
        result
    }
}
