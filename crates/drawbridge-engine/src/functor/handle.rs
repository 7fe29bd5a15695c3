use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{FunctorError, InvocationContext};

/// Request code passed to a functor on every call.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FunctorRequest {
    /// CPU-side preparation before the frame is recorded. No target is bound.
    Sync,
    /// Render natively into the bound offscreen target.
    Draw,
    /// The GPU context is going away; free any native resources.
    ContextDestroyed,
}

impl fmt::Display for FunctorRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FunctorRequest::Sync => "sync",
            FunctorRequest::Draw => "draw",
            FunctorRequest::ContextDestroyed => "context-destroyed",
        })
    }
}

/// Externally owned drawing logic that talks to the GPU directly.
///
/// Contract: return without leaving a native command recording open, and
/// leave the state in [`InvocationContext::state`] as it was handed over.
/// Violations are repaired by the trampoline but still logged.
pub trait Functor: Send + Sync {
    fn invoke(
        &self,
        request: FunctorRequest,
        ctx: &mut InvocationContext<'_>,
    ) -> Result<(), FunctorError>;
}

/// Reference-lifetime hooks of the functor's external owner.
///
/// A node calls `on_functor_referenced` once when it starts holding the
/// functor and `on_functor_dereferenced` once when it stops. The owner may
/// tear the functor down when its own count reaches zero.
pub trait LifecycleListener: Send + Sync {
    fn on_functor_referenced(&self);
    fn on_functor_dereferenced(&self);
}

/// Shared handle to a functor.
///
/// The owner marks the handle destroyed once it tears the functor down; from
/// then on the bridge never calls into it, even though the handle itself may
/// still be alive inside nodes that have not been destroyed yet.
pub struct FunctorRef {
    functor: Arc<dyn Functor>,
    destroyed: AtomicBool,
}

impl FunctorRef {
    pub fn new(functor: Arc<dyn Functor>) -> Arc<Self> {
        Arc::new(Self {
            functor,
            destroyed: AtomicBool::new(false),
        })
    }

    /// Called by the owner when the functor is torn down.
    pub fn mark_destroyed(&self) {
        if !self.destroyed.swap(true, Ordering::AcqRel) {
            log::debug!("functor marked destroyed by owner");
        }
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// The functor, unless its owner already destroyed it.
    #[inline]
    pub fn get(&self) -> Option<&dyn Functor> {
        if self.is_destroyed() {
            None
        } else {
            Some(&*self.functor)
        }
    }
}

impl fmt::Debug for FunctorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctorRef")
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}
