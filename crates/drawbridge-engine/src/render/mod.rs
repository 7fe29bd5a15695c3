//! Pipeline-side render state.
//!
//! The recording pipeline tracks which target is bound, which scissor is active
//! and whether a command recording is open. Foreign code invoked during a frame
//! may touch the same native state, so the tracked snapshot is what gets
//! validated and restored around every functor call.

mod ctx;
mod state;

pub use ctx::{GpuHandles, RenderCtx};
pub use state::{GpuState, ScissorRect, StateDiff};
