use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};

use crate::render::GpuHandles;

use super::{GpuInit, WgpuSurfaceAllocator};

/// Owns wgpu core objects for offscreen work.
///
/// No window and no swapchain: frames are recorded into draw lists and
/// functors render into offscreen surfaces allocated from this device.
pub struct GpuContext {
    /// Logical device, shared with surface allocators.
    device: Arc<wgpu::Device>,

    /// Command queue.
    queue: wgpu::Queue,

    /// Raised by the device-lost callback.
    lost: Arc<AtomicBool>,
}

impl GpuContext {
    /// Creates a headless GPU context.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(init: GpuInit) -> Result<Self> {
        let GpuInit {
            backends,
            power_preference,
            force_fallback_adapter,
            required_features,
            required_limits,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("drawbridge device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let info = adapter.get_info();
        log::info!("GPU context ready: {} ({:?})", info.name, info.backend);

        let lost = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            flag.store(true, Ordering::Release);
            log::error!("GPU device lost ({reason:?}): {message}");
        });

        Ok(Self {
            device: Arc::new(device),
            queue,
            lost,
        })
    }

    /// Blocking variant of [`new`](Self::new).
    pub fn new_blocking(init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::new(init))
    }

    /// Whether the device has been reported lost.
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    /// Device/queue handles to forward to functors.
    pub fn handles(&self) -> GpuHandles<'_> {
        GpuHandles::new(&self.device, &self.queue)
    }

    /// Surface allocator drawing textures from this device.
    pub fn surface_allocator(&self) -> WgpuSurfaceAllocator {
        WgpuSurfaceAllocator::new(Arc::clone(&self.device), Arc::clone(&self.lost))
    }
}
