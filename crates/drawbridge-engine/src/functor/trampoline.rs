use core::fmt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::render::{GpuState, StateDiff};

use super::{
    BridgeError, FunctorError, FunctorRef, FunctorRequest, InvocationContext, InvocationParams,
};

/// Result of a successful functor call.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct InvokeReport {
    /// Set when the functor left native state altered and it had to be restored.
    pub restored: Option<StateDiff>,
}

/// Seam through which a node calls its functor.
pub trait FunctorInvoker: Send + Sync + fmt::Debug {
    /// Invokes `functor` for `request`.
    ///
    /// `state` is the pipeline's native GPU state. It must hold the same value
    /// on return as on entry, whatever the functor did.
    fn invoke(
        &self,
        functor: &FunctorRef,
        request: FunctorRequest,
        params: InvocationParams<'_>,
        state: &mut GpuState,
    ) -> Result<InvokeReport, BridgeError>;
}

/// The default invoker. Stateless; every call stands alone.
///
/// Around each call it:
/// 1. snapshots the pipeline's expected [`GpuState`],
/// 2. binds the call's target and scissor (the minimal native context),
/// 3. runs the functor, catching panics,
/// 4. compares the live state with what it handed over, logs any difference
///    as [`BridgeError::StateCorruption`], and restores the snapshot.
#[derive(Debug, Copy, Clone, Default)]
pub struct Trampoline;

impl Trampoline {
    /// Static entry point; see [`Trampoline`].
    pub fn invoke_functor(
        functor: &FunctorRef,
        request: FunctorRequest,
        params: InvocationParams<'_>,
        state: &mut GpuState,
    ) -> Result<InvokeReport, BridgeError> {
        let Some(f) = functor.get() else {
            return Err(BridgeError::FunctorInvocationFailed {
                request,
                source: FunctorError::Destroyed,
            });
        };

        let expected = *state;
        let handed_over = GpuState {
            bound_target: params.target.map(|t| t.id),
            scissor: params.clip,
            recording: expected.recording,
        };
        *state = handed_over;

        let outcome = {
            let mut ctx = InvocationContext::new(params, state);
            panic::catch_unwind(AssertUnwindSafe(|| f.invoke(request, &mut ctx)))
        };

        let diff = state.diff(&handed_over);
        *state = expected;

        let restored = if diff.is_clean() {
            None
        } else {
            log::warn!("{}", BridgeError::StateCorruption { diff });
            Some(diff)
        };

        match outcome {
            Ok(Ok(())) => Ok(InvokeReport { restored }),
            Ok(Err(source)) => Err(BridgeError::FunctorInvocationFailed { request, source }),
            Err(payload) => Err(BridgeError::FunctorInvocationFailed {
                request,
                source: FunctorError::Panicked(panic_message(payload.as_ref())),
            }),
        }
    }
}

impl FunctorInvoker for Trampoline {
    fn invoke(
        &self,
        functor: &FunctorRef,
        request: FunctorRequest,
        params: InvocationParams<'_>,
        state: &mut GpuState,
    ) -> Result<InvokeReport, BridgeError> {
        Self::invoke_functor(functor, request, params, state)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::coords::PixelSize;
    use crate::functor::test_support::{Behavior, EventLog, RecordingFunctor};
    use crate::functor::{SurfaceDescriptor, SurfaceId, TargetInfo};
    use crate::render::ScissorRect;

    fn functor(behavior: Behavior) -> (Arc<FunctorRef>, Arc<RecordingFunctor>) {
        let f = Arc::new(RecordingFunctor::new(EventLog::default(), behavior));
        (FunctorRef::new(f.clone()), f)
    }

    fn draw_params() -> InvocationParams<'static> {
        InvocationParams {
            target: Some(TargetInfo {
                id: SurfaceId(42),
                descriptor: SurfaceDescriptor::new(
                    PixelSize::new(8, 8),
                    wgpu::TextureFormat::Rgba8Unorm,
                ),
                view: None,
            }),
            clip: Some(ScissorRect::new(0, 0, 8, 8)),
            ..InvocationParams::default()
        }
    }

    fn pipeline_state() -> GpuState {
        GpuState {
            bound_target: Some(SurfaceId(1)),
            scissor: None,
            recording: true,
        }
    }

    #[test]
    fn functor_sees_bound_target_and_pipeline_state_returns() {
        let (handle, f) = functor(Behavior::Succeed);
        let mut state = pipeline_state();

        let report =
            Trampoline::invoke_functor(&handle, FunctorRequest::Draw, draw_params(), &mut state)
                .unwrap();

        assert_eq!(report.restored, None);
        assert_eq!(state, pipeline_state());
        let seen = f.last_seen_state().unwrap();
        assert_eq!(seen.bound_target, Some(SurfaceId(42)));
        assert_eq!(seen.scissor, Some(ScissorRect::new(0, 0, 8, 8)));
    }

    #[test]
    fn altered_state_is_restored_and_reported() {
        let (handle, _) = functor(Behavior::CorruptState);
        let mut state = pipeline_state();

        let report =
            Trampoline::invoke_functor(&handle, FunctorRequest::Draw, draw_params(), &mut state)
                .unwrap();

        let diff = report.restored.unwrap();
        assert!(diff.bound_target && diff.recording);
        assert_eq!(state, pipeline_state());
    }

    #[test]
    fn functor_error_becomes_invocation_failure() {
        let (handle, _) = functor(Behavior::Fail);
        let mut state = pipeline_state();

        let err =
            Trampoline::invoke_functor(&handle, FunctorRequest::Sync, InvocationParams::detached(), &mut state)
                .unwrap_err();

        assert!(matches!(
            err,
            BridgeError::FunctorInvocationFailed { request: FunctorRequest::Sync, source: FunctorError::Failed(_) }
        ));
        assert_eq!(state, pipeline_state());
    }

    #[test]
    fn panic_is_contained_and_state_restored() {
        let (handle, _) = functor(Behavior::Panic);
        let mut state = pipeline_state();

        let err =
            Trampoline::invoke_functor(&handle, FunctorRequest::Draw, draw_params(), &mut state)
                .unwrap_err();

        match err {
            BridgeError::FunctorInvocationFailed { source: FunctorError::Panicked(msg), .. } => {
                assert!(msg.contains("functor exploded"), "message was {msg:?}");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(state, pipeline_state());
    }

    #[test]
    fn destroyed_functor_is_never_called() {
        let (handle, f) = functor(Behavior::Succeed);
        handle.mark_destroyed();
        let mut state = pipeline_state();

        let err =
            Trampoline::invoke_functor(&handle, FunctorRequest::Draw, draw_params(), &mut state)
                .unwrap_err();

        assert!(matches!(
            err,
            BridgeError::FunctorInvocationFailed { source: FunctorError::Destroyed, .. }
        ));
        assert_eq!(f.calls(), 0);
    }

    #[test]
    fn trait_object_dispatch_matches_static_entry() {
        let (handle, f) = functor(Behavior::Succeed);
        let invoker: &dyn FunctorInvoker = &Trampoline;
        let mut state = GpuState::default();

        invoker
            .invoke(&handle, FunctorRequest::Sync, InvocationParams::detached(), &mut state)
            .unwrap();
        assert_eq!(f.calls(), 1);
    }
}
