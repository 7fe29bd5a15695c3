use thiserror::Error;

use crate::render::StateDiff;

use super::{FunctorRequest, SurfaceDescriptor};

/// Failure reported by a [`SurfaceAllocator`](super::SurfaceAllocator).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    #[error("surface has zero area")]
    EmptySize,
    #[error("surface dimension {requested} exceeds device limit {limit}")]
    ExceedsLimit { requested: u32, limit: u32 },
    #[error("out of GPU memory")]
    OutOfMemory,
    #[error("GPU device lost")]
    DeviceLost,
    #[error("surface rejected by the device: {0}")]
    Rejected(String),
    #[error("internal device error: {0}")]
    Internal(String),
}

/// Failure raised from inside a functor call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunctorError {
    #[error("functor reported failure: {0}")]
    Failed(String),
    #[error("device error while functor was drawing: {0}")]
    Device(String),
    #[error("functor panicked: {0}")]
    Panicked(String),
    #[error("functor already destroyed by its owner")]
    Destroyed,
}

/// Errors surfaced by the bridge. None of them are fatal to the pipeline:
/// each one costs at most the affected node's output for one frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    /// The offscreen surface could not be allocated; the draw is skipped and
    /// retried on the next frame.
    #[error("offscreen surface {descriptor} unavailable: {source}")]
    ResourceUnavailable {
        descriptor: SurfaceDescriptor,
        source: AllocError,
    },

    /// The functor failed; only this node's output is dropped.
    #[error("functor {request} request failed: {source}")]
    FunctorInvocationFailed {
        request: FunctorRequest,
        source: FunctorError,
    },

    /// The functor left pipeline-owned GPU state altered. Reported after the
    /// state has already been restored.
    #[error("functor altered pipeline GPU state ({diff}); restored")]
    StateCorruption { diff: StateDiff },
}

impl BridgeError {
    #[inline]
    pub fn is_resource_unavailable(&self) -> bool {
        matches!(self, BridgeError::ResourceUnavailable { .. })
    }

    #[inline]
    pub fn is_invocation_failure(&self) -> bool {
        matches!(self, BridgeError::FunctorInvocationFailed { .. })
    }
}
