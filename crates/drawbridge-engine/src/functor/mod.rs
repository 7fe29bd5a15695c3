//! Functor bridging.
//!
//! A functor is externally owned drawing logic that issues native GPU commands
//! instead of recording into a [`DrawList`](crate::scene::DrawList). The bridge
//! lets it participate in a recorded frame anyway:
//!
//! - [`OffscreenSurfaceManager`] keeps a render-target surface sized to the
//!   node's visible bounds, reallocating only when size or format change
//! - [`Trampoline`] calls into the functor with a narrow [`InvocationContext`]
//!   and puts pipeline GPU state back the way it was afterwards
//! - [`BridgingDrawable`] is the node in the frame: a sync phase, then a draw
//!   phase that fills the surface and records it as an image command
//!
//! Threading: the sync and draw phases may run on different threads. The
//! pipeline guarantees that a frame's sync completes before its draw starts;
//! nothing here locks to enforce that. Only the shared [`FunctorRef`] is
//! touched by both the pipeline and the functor's owner, and it is atomic.

mod config;
mod context;
mod drawable;
mod error;
mod handle;
mod surface;
mod trampoline;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::BridgeConfig;
pub use context::{InvocationContext, InvocationParams, TargetInfo};
pub use drawable::{BridgeStats, BridgingDrawable, DrawOutcome, NodeState, SkipReason};
pub use error::{AllocError, BridgeError, FunctorError};
pub use handle::{Functor, FunctorRef, FunctorRequest, LifecycleListener};
pub use surface::{
    OffscreenSurface, OffscreenSurfaceManager, SurfaceAllocator, SurfaceDescriptor, SurfaceId,
};
pub use trampoline::{FunctorInvoker, InvokeReport, Trampoline};
