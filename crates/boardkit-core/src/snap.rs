//! Snap engine: grid, edge, center and equal-spacing alignment for drags.
//!
//! Snapping works on world-space bounds but the activation threshold is a
//! screen-space distance, so it divides by the camera zoom. The two axes
//! snap independently; each axis takes its closest candidate within the
//! threshold or leaves the proposal untouched.

use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Default activation distance in screen pixels.
pub const DEFAULT_SNAP_THRESHOLD: f64 = 8.0;
/// Default grid cell size in world units.
pub const DEFAULT_GRID_SIZE: f64 = 20.0;

/// Direction a guide line runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// A vertical line at some x.
    Vertical,
    /// A horizontal line at some y.
    Horizontal,
}

/// What produced a guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapLineKind {
    Grid,
    Edge,
    Center,
    /// Equal spacing relative to a pair of neighbors.
    Distribution,
}

/// A transient alignment guide, in world coordinates. Valid only for the
/// drag frame it was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapLine {
    pub orientation: Orientation,
    /// Position along the snapping axis (x for vertical lines).
    pub position: f64,
    /// Extent along the line, for rendering.
    pub start: f64,
    pub end: f64,
    pub kind: SnapLineKind,
}

/// Tunables for the snap engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SnapConfig {
    /// Master switch; when false the engine is an identity function.
    pub enabled: bool,
    /// Snap to grid intersections as well as other elements.
    pub snap_to_grid: bool,
    pub grid_size: f64,
    /// Activation distance in screen pixels.
    pub threshold: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            snap_to_grid: false,
            grid_size: DEFAULT_GRID_SIZE,
            threshold: DEFAULT_SNAP_THRESHOLD,
        }
    }
}

/// Result of a snap computation: the (possibly adjusted) bounds and the
/// guides to draw.
#[derive(Debug, Clone, Default)]
pub struct SnapOutcome {
    pub bounds: Rect,
    pub guides: Vec<SnapLine>,
}

/// One alignment opportunity on a single axis.
struct Candidate {
    /// Correction to apply to the moving bounds on this axis.
    delta: f64,
    /// Guide position along the snapping axis.
    guide: f64,
    /// Guide extent along the cross axis.
    span: (f64, f64),
    kind: SnapLineKind,
}

/// Snap proposed bounds against target bounds (the stationary elements).
/// `zoom` converts the screen-space threshold into world units.
pub fn compute_snap(
    proposed: Rect,
    targets: &[Rect],
    zoom: f64,
    config: &SnapConfig,
) -> SnapOutcome {
    if !config.enabled {
        return SnapOutcome {
            bounds: proposed,
            guides: Vec::new(),
        };
    }
    let zoom = if zoom > 0.0 { zoom } else { 1.0 };
    let threshold = config.threshold / zoom;

    let x_candidates = axis_candidates(proposed, targets, config, true);
    let y_candidates = axis_candidates(proposed, targets, config, false);

    let mut bounds = proposed;
    let mut guides = Vec::new();

    if let Some(best) = closest(x_candidates, threshold) {
        bounds = bounds.with_origin((bounds.x0 + best.delta, bounds.y0));
        guides.push(SnapLine {
            orientation: Orientation::Vertical,
            position: best.guide,
            start: best.span.0.min(bounds.y0),
            end: best.span.1.max(bounds.y1),
            kind: best.kind,
        });
    }
    if let Some(best) = closest(y_candidates, threshold) {
        bounds = bounds.with_origin((bounds.x0, bounds.y0 + best.delta));
        guides.push(SnapLine {
            orientation: Orientation::Horizontal,
            position: best.guide,
            start: best.span.0.min(bounds.x0),
            end: best.span.1.max(bounds.x1),
            kind: best.kind,
        });
    }

    SnapOutcome { bounds, guides }
}

fn closest(candidates: Vec<Candidate>, threshold: f64) -> Option<Candidate> {
    candidates
        .into_iter()
        .filter(|c| c.delta.abs() <= threshold)
        .min_by(|a, b| a.delta.abs().total_cmp(&b.delta.abs()))
}

/// All candidates on one axis. `horizontal_axis` selects x (vertical
/// guides) versus y (horizontal guides).
fn axis_candidates(
    proposed: Rect,
    targets: &[Rect],
    config: &SnapConfig,
    horizontal_axis: bool,
) -> Vec<Candidate> {
    let (lo, hi, cross_lo, cross_hi) = if horizontal_axis {
        (proposed.x0, proposed.x1, proposed.y0, proposed.y1)
    } else {
        (proposed.y0, proposed.y1, proposed.x0, proposed.x1)
    };
    let mid = (lo + hi) / 2.0;
    let extent = hi - lo;
    // Moving reference values: leading edge, center, trailing edge.
    let moving = [lo, mid, hi];

    let mut candidates = Vec::new();

    for target in targets {
        let (t_lo, t_hi, t_cross_lo, t_cross_hi) = if horizontal_axis {
            (target.x0, target.x1, target.y0, target.y1)
        } else {
            (target.y0, target.y1, target.x0, target.x1)
        };
        let t_mid = (t_lo + t_hi) / 2.0;
        let span = (t_cross_lo.min(cross_lo), t_cross_hi.max(cross_hi));

        for &m in &moving {
            for (value, kind) in [
                (t_lo, SnapLineKind::Edge),
                (t_hi, SnapLineKind::Edge),
                (t_mid, SnapLineKind::Center),
            ] {
                // Center values only pair with the moving center.
                if kind == SnapLineKind::Center && m != mid {
                    continue;
                }
                candidates.push(Candidate {
                    delta: value - m,
                    guide: value,
                    span,
                    kind,
                });
            }
        }
    }

    if config.snap_to_grid && config.grid_size > 0.0 {
        for &m in &moving {
            let nearest = (m / config.grid_size).round() * config.grid_size;
            candidates.push(Candidate {
                delta: nearest - m,
                guide: nearest,
                span: (cross_lo, cross_hi),
                kind: SnapLineKind::Grid,
            });
        }
    }

    // Equal-spacing: place the moving bounds so its gap to a neighbor
    // matches the gap between a pair of existing neighbors.
    for (i, a) in targets.iter().enumerate() {
        for b in targets.iter().skip(i + 1) {
            let pair = if horizontal_axis {
                order(a.x1, b.x0, a.x0, b.x1)
            } else {
                order(a.y1, b.y0, a.y0, b.y1)
            };
            let Some((first_hi, second_lo, first_lo, second_hi)) = pair else {
                continue;
            };
            let gap = second_lo - first_hi;
            if gap <= 0.0 {
                continue;
            }
            let span = if horizontal_axis {
                (a.y0.min(b.y0), a.y1.max(b.y1))
            } else {
                (a.x0.min(b.x0), a.x1.max(b.x1))
            };
            // After the pair, before it, or centered in the gap.
            let after = second_hi + gap;
            let before = first_lo - gap - extent;
            for leading in [after, before] {
                candidates.push(Candidate {
                    delta: leading - lo,
                    guide: leading,
                    span,
                    kind: SnapLineKind::Distribution,
                });
            }
            if gap > extent {
                let centered = first_hi + (gap - extent) / 2.0;
                candidates.push(Candidate {
                    delta: centered - lo,
                    guide: centered,
                    span,
                    kind: SnapLineKind::Distribution,
                });
            }
        }
    }

    candidates
}

/// Order a pair of intervals along an axis, returning
/// (first_hi, second_lo, first_lo, second_hi) or None when they overlap.
fn order(a_hi: f64, b_lo: f64, a_lo: f64, b_hi: f64) -> Option<(f64, f64, f64, f64)> {
    if a_hi <= b_lo {
        Some((a_hi, b_lo, a_lo, b_hi))
    } else if b_hi <= a_lo {
        Some((b_hi, a_lo, b_lo, a_hi))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::new(x, y, x + w, y + h)
    }

    #[test]
    fn test_edge_snap_within_threshold() {
        let config = SnapConfig::default();
        let targets = [rect(100.0, 0.0, 50.0, 50.0)];
        let outcome = compute_snap(rect(103.0, 200.0, 50.0, 50.0), &targets, 1.0, &config);

        assert_eq!(outcome.bounds.x0, 100.0);
        assert_eq!(outcome.bounds.y0, 200.0); // y untouched
        assert_eq!(outcome.guides.len(), 1);
        let guide = outcome.guides[0];
        assert_eq!(guide.orientation, Orientation::Vertical);
        assert_eq!(guide.position, 100.0);
        assert_eq!(guide.kind, SnapLineKind::Edge);
    }

    #[test]
    fn test_no_snap_outside_threshold() {
        let config = SnapConfig::default();
        let targets = [rect(100.0, 0.0, 50.0, 50.0)];
        // Every moving value (left 162, center 182, right 202) is more than
        // the 8-unit threshold from every target edge and center.
        let outcome = compute_snap(rect(162.0, 200.0, 40.0, 50.0), &targets, 1.0, &config);
        assert_eq!(outcome.bounds.x0, 162.0);
    }

    #[test]
    fn test_threshold_scales_with_zoom() {
        let config = SnapConfig::default();
        let targets = [rect(100.0, 0.0, 50.0, 50.0)];

        // Same width as the target, so every moving value is exactly 12
        // from its counterpart. Zoomed out, 8px on screen is 16 world
        // units: 12 away snaps.
        let outcome = compute_snap(rect(112.0, 0.0, 50.0, 50.0), &targets, 0.5, &config);
        assert_eq!(outcome.bounds.x0, 100.0);

        // Zoomed in, 8px is 4 world units: 6 away does not snap.
        let outcome = compute_snap(rect(106.0, 0.0, 50.0, 50.0), &targets, 2.0, &config);
        assert_eq!(outcome.bounds.x0, 106.0);
    }

    #[test]
    fn test_axes_snap_independently() {
        let config = SnapConfig::default();
        let targets = [rect(100.0, 300.0, 50.0, 50.0)];
        let outcome = compute_snap(rect(103.0, 296.0, 50.0, 50.0), &targets, 1.0, &config);
        // x snaps to the left edge, y snaps to the top edge, separately.
        assert_eq!(outcome.bounds.x0, 100.0);
        assert_eq!(outcome.bounds.y0, 300.0);
        assert_eq!(outcome.guides.len(), 2);
    }

    #[test]
    fn test_center_snap() {
        let config = SnapConfig::default();
        let targets = [rect(100.0, 0.0, 100.0, 100.0)]; // center x = 150
        let outcome = compute_snap(rect(127.0, 300.0, 40.0, 40.0), &targets, 1.0, &config);
        // Moving center 147 snaps to 150.
        assert_eq!(outcome.bounds.x0 + 20.0, 150.0);
        assert_eq!(outcome.guides[0].kind, SnapLineKind::Center);
    }

    #[test]
    fn test_grid_snap_without_targets() {
        let config = SnapConfig {
            snap_to_grid: true,
            ..SnapConfig::default()
        };
        let outcome = compute_snap(rect(17.0, 43.0, 40.0, 40.0), &[], 1.0, &config);
        assert_eq!(outcome.bounds.x0, 20.0);
        assert_eq!(outcome.bounds.y0, 40.0);
        assert!(outcome
            .guides
            .iter()
            .all(|g| g.kind == SnapLineKind::Grid));
    }

    #[test]
    fn test_distribution_snap() {
        let config = SnapConfig::default();
        // Two targets with a 100-unit gap; dropping a third after them at
        // the same gap should land its left edge at 400.
        let targets = [rect(0.0, 0.0, 100.0, 50.0), rect(200.0, 0.0, 100.0, 50.0)];
        let outcome = compute_snap(rect(405.0, 0.0, 100.0, 50.0), &targets, 1.0, &config);
        assert_eq!(outcome.bounds.x0, 400.0);
        assert!(outcome
            .guides
            .iter()
            .any(|g| g.kind == SnapLineKind::Distribution));
    }

    #[test]
    fn test_disabled_is_identity() {
        let config = SnapConfig {
            enabled: false,
            ..SnapConfig::default()
        };
        let targets = [rect(100.0, 0.0, 50.0, 50.0)];
        let proposed = rect(101.0, 1.0, 40.0, 40.0);
        let outcome = compute_snap(proposed, &targets, 1.0, &config);
        assert_eq!(outcome.bounds, proposed);
        assert!(outcome.guides.is_empty());
    }
}
