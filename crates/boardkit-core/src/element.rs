//! Element definitions for the canvas.

use crate::geometry::Anchor;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;
/// Identifier shared by members of a group.
pub type GroupId = Uuid;
/// Identifier for layers.
pub type LayerId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

/// Style properties shared by all elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementStyle {
    /// Stroke color.
    pub stroke_color: Color,
    /// Stroke width in world units.
    pub stroke_width: f64,
    /// Fill color (None = no fill).
    pub fill_color: Option<Color>,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            stroke_color: Color::black(),
            stroke_width: 2.0,
            fill_color: None,
            opacity: 1.0,
        }
    }
}

/// Geometric form for plain shape elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShapeForm {
    #[default]
    Rectangle,
    Ellipse,
    Diamond,
}

/// Payload for plain shapes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShapeData {
    pub form: ShapeForm,
    /// Corner radius for rounded rectangles.
    #[serde(default)]
    pub corner_radius: f64,
}

/// Payload for text elements.
///
/// A text element may be attached to a host element, in which case it
/// follows the host at a fixed world-space offset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextData {
    pub content: String,
    pub font_size: f64,
    /// Host element this text follows, if any.
    #[serde(default)]
    pub attached_to: Option<ElementId>,
    /// Offset from the host's position while attached.
    #[serde(default)]
    pub relative_position: Vec2,
}

/// Payload for image elements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageData {
    /// Natural pixel width of the source image.
    pub source_width: u32,
    /// Natural pixel height of the source image.
    pub source_height: u32,
}

/// Payload for sticky notes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StickyData {
    pub text: String,
}

/// Payload for file cards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileData {
    pub name: String,
}

/// Payload for frames.
///
/// Children are held by reference; a frame groups elements spatially but
/// never owns their lifetime. Frames cannot contain other frames.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameData {
    pub name: String,
    pub children: Vec<ElementId>,
}

/// A pinned arrow endpoint: an element plus the anchor on its boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub element_id: ElementId,
    pub anchor: Anchor,
}

/// Payload for arrows.
///
/// `points` are stored relative to the element's position; the element's
/// position/size are derived from the point chain whenever an endpoint is
/// re-anchored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArrowData {
    /// Segment chain in element-local coordinates (at least 2 points).
    pub points: Vec<Point>,
    /// Pinned start endpoint, if any.
    #[serde(default)]
    pub start_connection: Option<Connection>,
    /// Pinned end endpoint, if any.
    #[serde(default)]
    pub end_connection: Option<Connection>,
    /// Orthogonal elbow routing: interior angles stay right angles.
    #[serde(default)]
    pub elbowed: bool,
    /// Set when a pinned endpoint element no longer exists.
    #[serde(default)]
    pub orphaned: bool,
}

/// Payload for mind-map nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MindMapNodeData {
    pub label: String,
    /// Parent node in the mind-map tree. Never trusted without a cycle guard.
    #[serde(default)]
    pub parent: Option<ElementId>,
}

/// Payload for mind-map connectors (two-point beziers, no elbow routing).
///
/// Position and size are derived from the two referenced nodes' bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MindMapConnectorData {
    pub start_node: ElementId,
    pub end_node: ElementId,
    /// Set when a referenced node no longer exists.
    #[serde(default)]
    pub orphaned: bool,
}

/// Closed set of element variants. Each variant carries its own payload so
/// required fields are statically known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ElementKind {
    Shape(ShapeData),
    Text(TextData),
    Image(ImageData),
    Sticky(StickyData),
    File(FileData),
    Frame(FrameData),
    Arrow(ArrowData),
    MindMapNode(MindMapNodeData),
    MindMapConnector(MindMapConnectorData),
}

impl ElementKind {
    /// Short name for logging and history descriptions.
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Shape(_) => "shape",
            ElementKind::Text(_) => "text",
            ElementKind::Image(_) => "image",
            ElementKind::Sticky(_) => "sticky",
            ElementKind::File(_) => "file",
            ElementKind::Frame(_) => "frame",
            ElementKind::Arrow(_) => "arrow",
            ElementKind::MindMapNode(_) => "mindmap node",
            ElementKind::MindMapConnector(_) => "mindmap connector",
        }
    }
}

/// A positioned element on the canvas.
///
/// Position and size are always in world space. Connector variants derive
/// their position/size from referenced elements and are recomputed by the
/// relationship resolver after every commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    /// Top-left corner in world coordinates.
    pub position: Point,
    /// Extent in world units.
    pub size: Size,
    /// Rotation in radians around the element center.
    #[serde(default)]
    pub rotation: f64,
    pub style: ElementStyle,
    pub visible: bool,
    pub locked: bool,
    /// Layer this element belongs to.
    pub layer: LayerId,
    /// Group back-reference; membership is a property on members, not an
    /// owning entity.
    #[serde(default)]
    pub group: Option<GroupId>,
}

impl Element {
    /// Create a new element. The store assigns the layer on insertion when
    /// the layer id is nil.
    pub fn new(kind: ElementKind, position: Point, size: Size) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            position,
            size,
            rotation: 0.0,
            style: ElementStyle::default(),
            visible: true,
            locked: false,
            layer: Uuid::nil(),
            group: None,
        }
    }

    /// Bounding box in world coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Center point in world coordinates.
    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// World-space position of an anchor on this element's boundary.
    pub fn anchor_position(&self, anchor: Anchor) -> Point {
        crate::geometry::anchor_position(self.bounds(), anchor)
    }

    pub fn is_frame(&self) -> bool {
        matches!(self.kind, ElementKind::Frame(_))
    }

    /// True for variants whose geometry is derived from other elements.
    pub fn is_connector(&self) -> bool {
        matches!(
            self.kind,
            ElementKind::Arrow(_) | ElementKind::MindMapConnector(_)
        )
    }

    pub fn as_frame(&self) -> Option<&FrameData> {
        match &self.kind {
            ElementKind::Frame(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_frame_mut(&mut self) -> Option<&mut FrameData> {
        match &mut self.kind {
            ElementKind::Frame(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_arrow(&self) -> Option<&ArrowData> {
        match &self.kind {
            ElementKind::Arrow(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_arrow_mut(&mut self) -> Option<&mut ArrowData> {
        match &mut self.kind {
            ElementKind::Arrow(a) => Some(a),
            _ => None,
        }
    }

    /// Regenerate the element's id. Used when duplicating or pasting so
    /// copies stay unique.
    pub fn regenerate_id(&mut self) {
        self.id = Uuid::new_v4();
    }
}

/// Partial update for [`Element`]. Unset fields leave the element unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementPatch {
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub rotation: Option<f64>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub style: Option<ElementStyle>,
}

impl ElementPatch {
    /// True when the patch changes position or size, which requires the
    /// relationship resolver to re-run.
    pub fn touches_geometry(&self) -> bool {
        self.position.is_some() || self.size.is_some()
    }
}
