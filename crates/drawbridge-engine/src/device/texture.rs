use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::coords::PixelSize;
use crate::functor::{AllocError, OffscreenSurface, SurfaceAllocator, SurfaceDescriptor, SurfaceId};

/// [`SurfaceAllocator`] backed by wgpu textures.
///
/// Texture creation runs inside wgpu error scopes, so device-side failures come
/// back as [`AllocError`] instead of reaching the uncaptured-error handler.
pub struct WgpuSurfaceAllocator {
    device: Arc<wgpu::Device>,
    device_lost: Arc<AtomicBool>,
    max_dimension: u32,
}

impl WgpuSurfaceAllocator {
    /// `device_lost` is raised by whoever owns the device's lost callback.
    pub fn new(device: Arc<wgpu::Device>, device_lost: Arc<AtomicBool>) -> Self {
        let max_dimension = device.limits().max_texture_dimension_2d;
        Self {
            device,
            device_lost,
            max_dimension,
        }
    }
}

impl fmt::Debug for WgpuSurfaceAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WgpuSurfaceAllocator")
            .field("max_dimension", &self.max_dimension)
            .finish_non_exhaustive()
    }
}

impl SurfaceAllocator for WgpuSurfaceAllocator {
    fn allocate(&self, desc: &SurfaceDescriptor) -> Result<Box<dyn OffscreenSurface>, AllocError> {
        if self.device_lost.load(Ordering::Acquire) {
            return Err(AllocError::DeviceLost);
        }
        check_extent(desc.size, self.max_dimension)?;

        // Scopes are a per-thread stack: pushed outermost first, popped innermost first.
        let oom = self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let internal = self.device.push_error_scope(wgpu::ErrorFilter::Internal);
        let validation = self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("drawbridge offscreen surface"),
            size: wgpu::Extent3d {
                width: desc.size.width,
                height: desc.size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage: desc.usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let pending = [validation.pop(), internal.pop(), oom.pop()];
        for captured in pending {
            if let Some(err) = pollster::block_on(captured) {
                log::warn!("offscreen texture creation failed ({desc}): {err}");
                return Err(alloc_error_from(err));
            }
        }

        Ok(Box::new(WgpuSurface {
            id: SurfaceId::next(),
            descriptor: *desc,
            texture,
            view,
        }))
    }
}

/// Validates a surface extent against the device's 2D texture limit.
fn check_extent(size: PixelSize, max_dimension: u32) -> Result<(), AllocError> {
    if size.is_empty() {
        return Err(AllocError::EmptySize);
    }
    let requested = size.width.max(size.height);
    if requested > max_dimension {
        return Err(AllocError::ExceedsLimit {
            requested,
            limit: max_dimension,
        });
    }
    Ok(())
}

fn alloc_error_from(err: wgpu::Error) -> AllocError {
    match err {
        wgpu::Error::OutOfMemory { .. } => AllocError::OutOfMemory,
        wgpu::Error::Validation { description, .. } => AllocError::Rejected(description),
        wgpu::Error::Internal { description, .. } => AllocError::Internal(description),
    }
}

/// A wgpu texture used as an offscreen surface. The texture is destroyed on drop.
#[derive(Debug)]
pub struct WgpuSurface {
    id: SurfaceId,
    descriptor: SurfaceDescriptor,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl OffscreenSurface for WgpuSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn descriptor(&self) -> &SurfaceDescriptor {
        &self.descriptor
    }

    fn view(&self) -> Option<&wgpu::TextureView> {
        Some(&self.view)
    }
}

impl Drop for WgpuSurface {
    fn drop(&mut self) {
        // Frees GPU memory now instead of whenever the last handle goes away.
        self.texture.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{GpuContext, GpuInit};

    #[test]
    fn zero_extent_is_rejected() {
        assert_eq!(check_extent(PixelSize::new(0, 10), 8192), Err(AllocError::EmptySize));
    }

    #[test]
    fn extent_over_limit_is_rejected() {
        assert_eq!(
            check_extent(PixelSize::new(100, 9000), 8192),
            Err(AllocError::ExceedsLimit { requested: 9000, limit: 8192 })
        );
    }

    #[test]
    fn extent_at_limit_is_accepted() {
        assert_eq!(check_extent(PixelSize::new(8192, 1), 8192), Ok(()));
    }

    #[test]
    fn device_errors_map_to_alloc_errors() {
        let oom = wgpu::Error::OutOfMemory { source: Box::new(fmt::Error) };
        assert_eq!(alloc_error_from(oom), AllocError::OutOfMemory);

        let invalid = wgpu::Error::Validation {
            source: Box::new(fmt::Error),
            description: "format is not renderable".into(),
        };
        assert_eq!(
            alloc_error_from(invalid),
            AllocError::Rejected("format is not renderable".into())
        );
    }

    /// Needs a real adapter; returns early on machines without one.
    fn gpu() -> Option<GpuContext> {
        match GpuContext::new_blocking(GpuInit::default()) {
            Ok(gpu) => Some(gpu),
            Err(err) => {
                eprintln!("no GPU adapter, skipping: {err:#}");
                None
            }
        }
    }

    #[test]
    fn non_renderable_format_is_an_error_not_a_panic() {
        let Some(gpu) = gpu() else { return };
        let allocator = gpu.surface_allocator();
        let desc = SurfaceDescriptor::new(PixelSize::new(64, 64), wgpu::TextureFormat::Rgb9e5Ufloat);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            allocator.allocate(&desc).map(|s| s.id())
        }));

        match result {
            Ok(Err(AllocError::Rejected(_))) => {}
            other => panic!("expected a rejected allocation, got {other:?}"),
        }
    }

    #[test]
    fn renderable_surface_allocates_with_view() {
        let Some(gpu) = gpu() else { return };
        let allocator = gpu.surface_allocator();
        let desc = SurfaceDescriptor::new(PixelSize::new(32, 16), wgpu::TextureFormat::Rgba8Unorm);

        let surface = allocator.allocate(&desc).unwrap();
        assert_eq!(*surface.descriptor(), desc);
        assert!(surface.view().is_some());
    }
}
