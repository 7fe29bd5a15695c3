//! Scene (draw stream) types.
//!
//! Responsibilities:
//! - store renderer-agnostic draw commands
//! - provide deterministic ordering (z-index + insertion order)
//! - expose a [`Canvas`] with transform/clip state for nodes that record into the list

mod canvas;
mod cmd;
mod key;
mod list;

pub mod shapes;

pub use canvas::Canvas;
pub use cmd::DrawCmd;
pub use key::{SortKey, ZIndex};
pub use list::{DrawItem, DrawList};
pub use shapes::{ImageCmd, RectCmd};
