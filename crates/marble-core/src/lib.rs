pub mod id;
pub mod model;
pub mod task;
pub mod transform;
pub mod waitlist;

pub use id::{CanvasId, ConnectionId, NodeId};
pub use model::*;
pub use task::{TaskItem, TaskList};
pub use transform::{MAX_ZOOM, MIN_ZOOM, ViewTransform, clamp_zoom};

// Re-export kurbo geometry so downstream crates don't need a direct dependency
pub use kurbo::{Point, Vec2};
