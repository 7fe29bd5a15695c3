use super::SurfaceDescriptor;

/// Per-node bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Frames an unused offscreen surface is kept before [`trim`] frees it.
    ///
    /// Short enough to hand memory back quickly when a node stops being drawn
    /// (scrolled away, occluded), long enough to ride out a frame or two of
    /// skipped draws without reallocating.
    ///
    /// [`trim`]: super::BridgingDrawable::trim
    pub surface_idle_frames: u64,

    /// Usage flags of allocated surfaces. Render-target and sampling usage are
    /// always added.
    pub surface_usage: wgpu::TextureUsages,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            surface_idle_frames: 3,
            surface_usage: SurfaceDescriptor::DEFAULT_USAGE,
        }
    }
}
