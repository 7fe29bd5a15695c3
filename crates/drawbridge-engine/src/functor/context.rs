use crate::coords::Transform;
use crate::render::{GpuHandles, GpuState, ScissorRect};

use super::{SurfaceDescriptor, SurfaceId};

/// The offscreen target a functor draws into.
#[derive(Debug, Copy, Clone)]
pub struct TargetInfo<'a> {
    pub id: SurfaceId,
    pub descriptor: SurfaceDescriptor,
    /// Texture view to attach, when the surface is wgpu-backed.
    pub view: Option<&'a wgpu::TextureView>,
}

/// Everything the caller decides about one functor call.
#[derive(Debug, Copy, Clone, Default)]
pub struct InvocationParams<'a> {
    /// `None` for requests that do not draw.
    pub target: Option<TargetInfo<'a>>,
    /// Maps the functor's local coordinates to target pixels.
    pub transform: Transform,
    /// Clip in target pixels.
    pub clip: Option<ScissorRect>,
    pub gpu: Option<GpuHandles<'a>>,
}

impl<'a> InvocationParams<'a> {
    /// Parameters for a request with no target and no device.
    #[inline]
    pub fn detached() -> Self {
        Self::default()
    }
}

/// What a functor can see and touch while it runs.
///
/// Built by the trampoline for the duration of one call. The functor gets
/// read access to the call parameters and write access to the live native
/// state, nothing else of the pipeline.
#[derive(Debug)]
pub struct InvocationContext<'a> {
    params: InvocationParams<'a>,
    state: &'a mut GpuState,
}

impl<'a> InvocationContext<'a> {
    pub(crate) fn new(params: InvocationParams<'a>, state: &'a mut GpuState) -> Self {
        Self { params, state }
    }

    #[inline]
    pub fn target(&self) -> Option<&TargetInfo<'a>> {
        self.params.target.as_ref()
    }

    #[inline]
    pub fn transform(&self) -> Transform {
        self.params.transform
    }

    #[inline]
    pub fn clip(&self) -> Option<ScissorRect> {
        self.params.clip
    }

    #[inline]
    pub fn gpu(&self) -> Option<GpuHandles<'a>> {
        self.params.gpu
    }

    /// Live native state. Whatever is changed here must be undone before returning.
    #[inline]
    pub fn state(&mut self) -> &mut GpuState {
        self.state
    }
}
