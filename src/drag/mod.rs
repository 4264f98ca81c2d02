//! Drag gesture support

pub mod ghost;
pub mod scene;

pub use ghost::{DragDocument, DragMode, GhostImageSpec, GhostImages};
pub use scene::{NodeId, SceneDocument};
