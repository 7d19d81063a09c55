//! Layers: named groupings of elements with shared visibility/lock state.

use crate::element::LayerId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A drawing layer. Z-ordering stays global; layers only contribute
/// visibility and lock filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            visible: true,
            locked: false,
        }
    }
}
