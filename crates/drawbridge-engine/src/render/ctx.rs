use super::GpuState;

/// Device/queue handles passed through to foreign code.
///
/// The bridge never issues commands on these itself; it only forwards them.
#[derive(Debug, Copy, Clone)]
pub struct GpuHandles<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
}

impl<'a> GpuHandles<'a> {
    #[inline]
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> Self {
        Self { device, queue }
    }
}

/// Per-frame pipeline context handed to nodes during the draw phase.
///
/// `gpu` is `None` when recording without a live device (tests, dry runs).
#[derive(Debug)]
pub struct RenderCtx<'a> {
    pub gpu: Option<GpuHandles<'a>>,
    pub state: &'a mut GpuState,
    pub frame_index: u64,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(gpu: Option<GpuHandles<'a>>, state: &'a mut GpuState, frame_index: u64) -> Self {
        Self {
            gpu,
            state,
            frame_index,
        }
    }

    /// Context without a device.
    #[inline]
    pub fn headless(state: &'a mut GpuState, frame_index: u64) -> Self {
        Self::new(None, state, frame_index)
    }
}
