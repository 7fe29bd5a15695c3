//! Drawbridge engine crate.
//!
//! Bridges externally owned immediate-mode GPU renderers ("functors") into a
//! retained draw list. Each bridged node owns an offscreen surface, invokes
//! its functor through a trampoline that guards the pipeline's GPU state, and
//! records the resulting surface as an image command.

pub mod coords;
pub mod device;
pub mod functor;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;
