//! GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue (headless)
//! - allocating wgpu textures as offscreen surfaces for functors

mod gpu;
mod init;
mod texture;

pub use gpu::GpuContext;
pub use init::GpuInit;
pub use texture::{WgpuSurface, WgpuSurfaceAllocator};
