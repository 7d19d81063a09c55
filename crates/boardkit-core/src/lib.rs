//! BoardKit Core Library
//!
//! Platform-agnostic geometry and state engine for an infinite-canvas
//! whiteboard: element store, coordinate transforms, connector resolution,
//! frame containment, snapping, selection and undo/redo.

pub mod board;
pub mod camera;
pub mod element;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod gesture;
pub mod history;
pub mod layer;
pub mod resolver;
pub mod selection;
pub mod snap;
pub mod store;

pub use board::{Board, Notice};
pub use camera::Camera;
pub use element::{
    Element, ElementId, ElementKind, ElementPatch, ElementStyle, GroupId, LayerId,
};
pub use error::{BoardError, BoardResult};
pub use frame::{ContainmentMode, FrameConfig};
pub use geometry::Anchor;
pub use gesture::{GestureCoordinator, GestureKind, GestureToken};
pub use history::{HistoryManager, MAX_UNDO_HISTORY};
pub use layer::Layer;
pub use selection::{Corner, Edge, Handle, HandleKind, Selection, MARQUEE_CLICK_THRESHOLD};
pub use snap::{SnapConfig, SnapLine, SnapLineKind, DEFAULT_GRID_SIZE, DEFAULT_SNAP_THRESHOLD};
pub use store::{AlignEdge, ElementStore, StoreSnapshot};
