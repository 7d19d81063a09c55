//! Frame containment: explicit child lists, spatial membership tests and
//! the drop-reassignment rule for drags.
//!
//! Frames never nest and never own their children's lifetime; deleting a
//! frame releases its children, deleting a child prunes the list (the store
//! handles both cascades).

use crate::element::{ElementId, ElementKind};
use crate::geometry::{overlap_area, point_in_bounds, union_bounds};
use crate::store::ElementStore;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How frame membership is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContainmentMode {
    /// Only the explicit child list counts.
    Explicit,
    /// Only the spatial test counts.
    Spatial,
    /// Explicit children plus spatial matches.
    #[default]
    Hybrid,
}

/// Tunables for frame behavior.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrameConfig {
    pub mode: ContainmentMode,
    /// Fraction of an element's area that must overlap the frame for the
    /// spatial test to pass (center containment also passes).
    pub hybrid_overlap_ratio: f64,
    /// Padding added around a selection when wrapping it in a new frame.
    pub selection_padding: f64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            mode: ContainmentMode::Hybrid,
            hybrid_overlap_ratio: 0.5,
            selection_padding: 24.0,
        }
    }
}

/// Center-point membership test: the element's center lies inside the
/// frame. This is the test for `Spatial` mode and for drop reassignment.
/// Containment follows `Rect::contains` (half-open), so a center exactly
/// on the frame's right or bottom edge is outside.
pub fn center_contained(frame_bounds: Rect, element_bounds: Rect) -> bool {
    point_in_bounds(element_bounds.center(), frame_bounds)
}

/// Hybrid membership test: the center is inside, or at least `ratio` of
/// the element's area overlaps the frame.
pub fn qualifies_spatially(frame_bounds: Rect, element_bounds: Rect, ratio: f64) -> bool {
    if center_contained(frame_bounds, element_bounds) {
        return true;
    }
    let area = element_bounds.area();
    area > 0.0 && overlap_area(frame_bounds, element_bounds) / area >= ratio
}

/// The frame that currently lists `child` explicitly, if any.
pub fn owning_frame(store: &ElementStore, child: ElementId) -> Option<ElementId> {
    store
        .iter_ordered()
        .find(|e| e.as_frame().is_some_and(|f| f.children.contains(&child)))
        .map(|e| e.id)
}

/// Add a child to a frame's explicit list. Rejects missing ids, frames as
/// children and self-containment. A child belongs to at most one frame, so
/// any previous owner releases it first. Returns true when added.
pub fn add_child(store: &mut ElementStore, frame_id: ElementId, child: ElementId) -> bool {
    if frame_id == child {
        return false;
    }
    let child_ok = store.get(child).is_some_and(|e| !e.is_frame());
    if !child_ok || store.get(frame_id).and_then(|e| e.as_frame()).is_none() {
        return false;
    }
    if let Some(previous) = owning_frame(store, child) {
        if previous == frame_id {
            return false;
        }
        detach_child(store, previous, child);
    }
    if let Some(frame) = store.get_mut(frame_id).and_then(|e| e.as_frame_mut()) {
        frame.children.push(child);
        true
    } else {
        false
    }
}

/// Remove a child from a frame's explicit list. Returns true when removed.
pub fn detach_child(store: &mut ElementStore, frame_id: ElementId, child: ElementId) -> bool {
    let Some(frame) = store.get_mut(frame_id).and_then(|e| e.as_frame_mut()) else {
        return false;
    };
    let before = frame.children.len();
    frame.children.retain(|&c| c != child);
    frame.children.len() != before
}

/// Elements the frame currently contains under the configured mode.
/// Frames are never contained by other frames.
pub fn contained_elements(
    store: &ElementStore,
    frame_id: ElementId,
    config: &FrameConfig,
) -> Vec<ElementId> {
    let Some(frame) = store.get(frame_id) else {
        return Vec::new();
    };
    let Some(data) = frame.as_frame() else {
        return Vec::new();
    };
    let frame_bounds = frame.bounds();

    let mut seen: HashSet<ElementId> = HashSet::new();
    let mut result = Vec::new();

    if config.mode != ContainmentMode::Spatial {
        for &child in &data.children {
            if child != frame_id && store.contains(child) && seen.insert(child) {
                result.push(child);
            }
        }
    }
    if config.mode != ContainmentMode::Explicit {
        for element in store.iter_ordered() {
            if element.id == frame_id || element.is_frame() {
                continue;
            }
            let bounds = element.bounds();
            let inside = match config.mode {
                ContainmentMode::Spatial => center_contained(frame_bounds, bounds),
                _ => qualifies_spatially(frame_bounds, bounds, config.hybrid_overlap_ratio),
            };
            if inside && seen.insert(element.id) {
                result.push(element.id);
            }
        }
    }
    result
}

/// Translate a frame and its explicit children by the same delta. Locked
/// children stay put; a locked frame is a no-op. Returns the moved ids.
pub fn move_frame(
    store: &mut ElementStore,
    frame_id: ElementId,
    dx: f64,
    dy: f64,
) -> Vec<ElementId> {
    let children: Vec<ElementId> = match store.get(frame_id) {
        Some(e) if !e.locked => e.as_frame().map(|f| f.children.clone()).unwrap_or_default(),
        _ => return Vec::new(),
    };
    let mut moved = Vec::new();
    if store.translate_element(frame_id, dx, dy) {
        moved.push(frame_id);
    } else {
        return moved;
    }
    let mut visited: HashSet<ElementId> = HashSet::from([frame_id]);
    for child in children {
        if !visited.insert(child) {
            continue;
        }
        // Children are never frames, but stale documents get a guard.
        if store.get(child).is_some_and(|e| e.is_frame()) {
            continue;
        }
        if store.translate_element(child, dx, dy) {
            moved.push(child);
        }
    }
    moved
}

/// Scale a frame about its own top-left corner, carrying explicit children
/// proportionally. Returns the affected ids.
pub fn resize_frame(
    store: &mut ElementStore,
    frame_id: ElementId,
    scale_x: f64,
    scale_y: f64,
) -> Vec<ElementId> {
    let (origin, children) = match store.get(frame_id) {
        Some(e) if !e.locked => (
            e.position,
            e.as_frame().map(|f| f.children.clone()).unwrap_or_default(),
        ),
        _ => return Vec::new(),
    };
    let mut targets = vec![frame_id];
    targets.extend(children);
    store.resize_elements(&targets, scale_x, scale_y, origin)
}

/// Wrap a selection in a new frame sized to its union bounds plus padding.
/// Frames in the selection are skipped (frames never nest). Returns the new
/// frame's id, or None when nothing in the selection qualifies.
pub fn create_frame_from_selection(
    store: &mut ElementStore,
    ids: &[ElementId],
    name: impl Into<String>,
    config: &FrameConfig,
) -> Option<ElementId> {
    let children: Vec<ElementId> = ids
        .iter()
        .copied()
        .filter(|&id| store.get(id).is_some_and(|e| !e.is_frame()))
        .collect();
    let bounds = union_bounds(
        children
            .iter()
            .filter_map(|&id| store.get(id))
            .map(|e| e.bounds()),
    )?
    .inflate(config.selection_padding, config.selection_padding);

    // Release the children from any previous owner.
    for &child in &children {
        if let Some(previous) = owning_frame(store, child) {
            detach_child(store, previous, child);
        }
    }

    let frame = crate::element::Element::new(
        ElementKind::Frame(crate::element::FrameData {
            name: name.into(),
            children,
        }),
        Point::new(bounds.x0, bounds.y0),
        Size::new(bounds.width(), bounds.height()),
    );
    let frame_id = store.add_element(frame);
    // Frames render behind their contents.
    store.send_to_back(frame_id);
    Some(frame_id)
}

/// After a drag commits, each moved non-frame element is re-homed: it joins
/// the topmost frame containing its center point, or leaves its frame when
/// its center landed outside every frame.
pub fn reassign_dropped(store: &mut ElementStore, moved: &[ElementId], config: &FrameConfig) {
    // Explicit mode never auto-assigns; membership changes only through
    // add_child/detach_child.
    if config.mode == ContainmentMode::Explicit {
        return;
    }
    let frames: Vec<(ElementId, Rect)> = store
        .iter_ordered()
        .filter(|e| e.is_frame())
        .map(|e| (e.id, e.bounds()))
        .collect();

    for &id in moved {
        let Some(element) = store.get(id) else {
            continue;
        };
        if element.is_frame() {
            continue;
        }
        let bounds = element.bounds();
        // Topmost frame wins when several overlap.
        let target = frames
            .iter()
            .rev()
            .find(|(fid, fbounds)| *fid != id && center_contained(*fbounds, bounds))
            .map(|(fid, _)| *fid);

        match target {
            Some(frame_id) => {
                add_child(store, frame_id, id);
            }
            None => {
                if let Some(previous) = owning_frame(store, id) {
                    detach_child(store, previous, id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, FrameData, ShapeData};

    fn shape(store: &mut ElementStore, x: f64, y: f64, w: f64, h: f64) -> ElementId {
        store.add_element(Element::new(
            ElementKind::Shape(ShapeData::default()),
            Point::new(x, y),
            Size::new(w, h),
        ))
    }

    fn frame(store: &mut ElementStore, x: f64, y: f64, w: f64, h: f64) -> ElementId {
        store.add_element(Element::new(
            ElementKind::Frame(FrameData::default()),
            Point::new(x, y),
            Size::new(w, h),
        ))
    }

    #[test]
    fn test_hybrid_test_center_or_overlap() {
        let f = Rect::new(0.0, 0.0, 200.0, 200.0);
        // Center inside, under half the area overlapping: passes.
        assert!(qualifies_spatially(f, Rect::new(150.0, 150.0, 240.0, 240.0), 0.5));
        // Center not contained but half the area inside: passes.
        assert!(qualifies_spatially(f, Rect::new(100.0, 80.0, 300.0, 120.0), 0.5));
        // Barely touching: fails.
        assert!(!qualifies_spatially(f, Rect::new(190.0, 190.0, 390.0, 390.0), 0.5));
    }

    #[test]
    fn test_center_test_is_half_open() {
        let f = Rect::new(0.0, 0.0, 200.0, 200.0);
        // Center strictly inside.
        assert!(center_contained(f, Rect::new(150.0, 150.0, 240.0, 240.0)));
        // Center exactly on the right edge: outside.
        assert!(!center_contained(f, Rect::new(100.0, 80.0, 300.0, 120.0)));
        // Center exactly on the bottom-right corner: outside.
        assert!(!center_contained(f, Rect::new(150.0, 150.0, 250.0, 250.0)));
    }

    #[test]
    fn test_add_child_rejects_frames_and_self() {
        let mut store = ElementStore::new();
        let f1 = frame(&mut store, 0.0, 0.0, 100.0, 100.0);
        let f2 = frame(&mut store, 200.0, 0.0, 100.0, 100.0);
        let s = shape(&mut store, 10.0, 10.0, 20.0, 20.0);

        assert!(!add_child(&mut store, f1, f1));
        assert!(!add_child(&mut store, f1, f2));
        assert!(add_child(&mut store, f1, s));
    }

    #[test]
    fn test_single_owner() {
        let mut store = ElementStore::new();
        let f1 = frame(&mut store, 0.0, 0.0, 100.0, 100.0);
        let f2 = frame(&mut store, 200.0, 0.0, 100.0, 100.0);
        let s = shape(&mut store, 10.0, 10.0, 20.0, 20.0);

        add_child(&mut store, f1, s);
        add_child(&mut store, f2, s);

        assert_eq!(owning_frame(&store, s), Some(f2));
        assert!(!store.get(f1).unwrap().as_frame().unwrap().children.contains(&s));
    }

    #[test]
    fn test_move_frame_carries_children() {
        let mut store = ElementStore::new();
        let f = frame(&mut store, 0.0, 0.0, 200.0, 200.0);
        let s = shape(&mut store, 50.0, 50.0, 20.0, 20.0);
        add_child(&mut store, f, s);

        let moved = move_frame(&mut store, f, 10.0, 20.0);
        assert_eq!(moved.len(), 2);
        assert_eq!(store.get(f).unwrap().position, Point::new(10.0, 20.0));
        assert_eq!(store.get(s).unwrap().position, Point::new(60.0, 70.0));
    }

    #[test]
    fn test_move_frame_skips_locked_child() {
        let mut store = ElementStore::new();
        let f = frame(&mut store, 0.0, 0.0, 200.0, 200.0);
        let s = shape(&mut store, 50.0, 50.0, 20.0, 20.0);
        add_child(&mut store, f, s);
        store.lock_elements(&[s]);

        move_frame(&mut store, f, 10.0, 0.0);
        assert_eq!(store.get(s).unwrap().position, Point::new(50.0, 50.0));
    }

    #[test]
    fn test_resize_frame_scales_children() {
        let mut store = ElementStore::new();
        let f = frame(&mut store, 100.0, 100.0, 200.0, 200.0);
        let s = shape(&mut store, 150.0, 150.0, 50.0, 50.0);
        add_child(&mut store, f, s);

        resize_frame(&mut store, f, 2.0, 2.0);
        assert_eq!(store.get(f).unwrap().size, Size::new(400.0, 400.0));
        assert_eq!(store.get(s).unwrap().position, Point::new(200.0, 200.0));
        assert_eq!(store.get(s).unwrap().size, Size::new(100.0, 100.0));
    }

    #[test]
    fn test_create_frame_from_selection_pads_bounds() {
        let mut store = ElementStore::new();
        let a = shape(&mut store, 0.0, 0.0, 100.0, 100.0);
        let b = shape(&mut store, 100.0, 100.0, 100.0, 100.0);

        let config = FrameConfig::default();
        let f = create_frame_from_selection(&mut store, &[a, b], "Frame 1", &config).unwrap();

        let element = store.get(f).unwrap();
        assert_eq!(element.position, Point::new(-24.0, -24.0));
        assert_eq!(element.size, Size::new(248.0, 248.0));
        assert_eq!(element.as_frame().unwrap().children.len(), 2);
        // Frame goes behind its contents.
        assert_eq!(store.ids_ordered()[0], f);
    }

    #[test]
    fn test_create_frame_skips_frames() {
        let mut store = ElementStore::new();
        let f1 = frame(&mut store, 0.0, 0.0, 100.0, 100.0);
        let config = FrameConfig::default();
        assert!(create_frame_from_selection(&mut store, &[f1], "x", &config).is_none());
    }

    #[test]
    fn test_reassign_dropped_in_and_out() {
        let mut store = ElementStore::new();
        let f = frame(&mut store, 0.0, 0.0, 200.0, 200.0);
        let s = shape(&mut store, 500.0, 500.0, 20.0, 20.0);
        let config = FrameConfig::default();

        // Dropped inside: joins the frame.
        store.translate_elements(&[s], -450.0, -450.0);
        reassign_dropped(&mut store, &[s], &config);
        assert_eq!(owning_frame(&store, s), Some(f));

        // Dropped outside: leaves it.
        store.translate_elements(&[s], 600.0, 0.0);
        reassign_dropped(&mut store, &[s], &config);
        assert_eq!(owning_frame(&store, s), None);
    }

    #[test]
    fn test_reassign_topmost_frame_wins() {
        let mut store = ElementStore::new();
        let back = frame(&mut store, 0.0, 0.0, 300.0, 300.0);
        let front = frame(&mut store, 100.0, 100.0, 300.0, 300.0);
        let s = shape(&mut store, 150.0, 150.0, 20.0, 20.0);
        let config = FrameConfig::default();

        reassign_dropped(&mut store, &[s], &config);
        assert_eq!(owning_frame(&store, s), Some(front));
        let _ = back;
    }

    #[test]
    fn test_spatial_mode_is_center_only() {
        let mut store = ElementStore::new();
        let f = frame(&mut store, 0.0, 0.0, 200.0, 200.0);
        // Half the area overlaps the frame, but the center (200, 100) sits
        // on the frame's right edge, outside under half-open containment.
        let straddling = shape(&mut store, 100.0, 80.0, 200.0, 40.0);
        let inside = shape(&mut store, 50.0, 50.0, 20.0, 20.0);

        let spatial = FrameConfig {
            mode: ContainmentMode::Spatial,
            ..FrameConfig::default()
        };
        let contained = contained_elements(&store, f, &spatial);
        assert!(!contained.contains(&straddling));
        assert!(contained.contains(&inside));

        // Hybrid still admits it through the overlap-ratio arm.
        let hybrid = FrameConfig::default();
        assert!(contained_elements(&store, f, &hybrid).contains(&straddling));
    }

    #[test]
    fn test_reassign_requires_center_inside() {
        let mut store = ElementStore::new();
        let f = frame(&mut store, 0.0, 0.0, 200.0, 200.0);
        let straddling = shape(&mut store, 100.0, 80.0, 200.0, 40.0);
        let config = FrameConfig::default();

        // 50% overlap is not enough for drop adoption; the center must land
        // inside the frame.
        reassign_dropped(&mut store, &[straddling], &config);
        assert_eq!(owning_frame(&store, straddling), None);

        store.translate_elements(&[straddling], -60.0, 0.0);
        reassign_dropped(&mut store, &[straddling], &config);
        assert_eq!(owning_frame(&store, straddling), Some(f));
    }

    #[test]
    fn test_reassign_noop_in_explicit_mode() {
        let mut store = ElementStore::new();
        let f = frame(&mut store, 0.0, 0.0, 200.0, 200.0);
        let s = shape(&mut store, 50.0, 50.0, 20.0, 20.0);
        let config = FrameConfig {
            mode: ContainmentMode::Explicit,
            ..FrameConfig::default()
        };

        reassign_dropped(&mut store, &[s], &config);
        assert_eq!(owning_frame(&store, s), None);
        let _ = f;
    }

    #[test]
    fn test_contained_elements_hybrid() {
        let mut store = ElementStore::new();
        let f = frame(&mut store, 0.0, 0.0, 200.0, 200.0);
        let explicit = shape(&mut store, 500.0, 500.0, 20.0, 20.0);
        let spatial = shape(&mut store, 50.0, 50.0, 20.0, 20.0);
        let outside = shape(&mut store, 900.0, 900.0, 20.0, 20.0);
        add_child(&mut store, f, explicit);

        let config = FrameConfig::default();
        let contained = contained_elements(&store, f, &config);
        assert!(contained.contains(&explicit));
        assert!(contained.contains(&spatial));
        assert!(!contained.contains(&outside));

        let explicit_only = FrameConfig {
            mode: ContainmentMode::Explicit,
            ..config
        };
        assert_eq!(contained_elements(&store, f, &explicit_only), vec![explicit]);
    }
}
