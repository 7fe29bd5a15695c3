use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::coords::PixelSize;

use super::{AllocError, BridgeError};

/// Opaque identity of an offscreen surface.
///
/// Ids are process-unique, so an image command can never alias a surface that
/// replaced the one it was recorded against.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(pub u64);

impl SurfaceId {
    /// Allocates a fresh id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Size/format metadata of a surface.
///
/// Cached next to the surface so staleness is a value comparison, not a GPU query.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SurfaceDescriptor {
    pub size: PixelSize,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
}

impl SurfaceDescriptor {
    /// Render target for the functor, sampled later by the compositor.
    pub const DEFAULT_USAGE: wgpu::TextureUsages =
        wgpu::TextureUsages::RENDER_ATTACHMENT.union(wgpu::TextureUsages::TEXTURE_BINDING);

    #[inline]
    pub fn new(size: PixelSize, format: wgpu::TextureFormat) -> Self {
        Self {
            size,
            format,
            usage: Self::DEFAULT_USAGE,
        }
    }

    #[inline]
    pub fn with_usage(mut self, usage: wgpu::TextureUsages) -> Self {
        self.usage = usage;
        self
    }
}

impl fmt::Display for SurfaceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} {:?}", self.size.width, self.size.height, self.format)
    }
}

/// A GPU-backed pixel surface. Dropping it frees the GPU memory.
pub trait OffscreenSurface: fmt::Debug + Send {
    fn id(&self) -> SurfaceId;

    fn descriptor(&self) -> &SurfaceDescriptor;

    /// Render-target view, when the surface is backed by a wgpu texture.
    fn view(&self) -> Option<&wgpu::TextureView> {
        None
    }
}

/// Graphics-memory service the bridge draws surfaces from.
///
/// Implementations may fail for any reason (memory exhaustion, lost device,
/// limits); the bridge treats every failure as "no surface this frame".
pub trait SurfaceAllocator: Send + Sync {
    fn allocate(&self, desc: &SurfaceDescriptor) -> Result<Box<dyn OffscreenSurface>, AllocError>;
}

/// Owns a node's offscreen surface and its cached descriptor.
///
/// The surface is allocated lazily, reused while requests keep matching the
/// cached descriptor, and released deterministically: on [`release`](Self::release),
/// before a replacement is allocated, when idle for too long, and on drop.
pub struct OffscreenSurfaceManager {
    allocator: Arc<dyn SurfaceAllocator>,
    usage: wgpu::TextureUsages,

    surface: Option<Box<dyn OffscreenSurface>>,
    descriptor: Option<SurfaceDescriptor>,

    last_used_frame: u64,
    allocations: u64,
}

impl OffscreenSurfaceManager {
    pub fn new(allocator: Arc<dyn SurfaceAllocator>) -> Self {
        Self::with_usage(allocator, SurfaceDescriptor::DEFAULT_USAGE)
    }

    /// Extra usage flags are added to [`SurfaceDescriptor::DEFAULT_USAGE`],
    /// never substituted for it.
    pub fn with_usage(allocator: Arc<dyn SurfaceAllocator>, usage: wgpu::TextureUsages) -> Self {
        Self {
            allocator,
            usage: usage | SurfaceDescriptor::DEFAULT_USAGE,
            surface: None,
            descriptor: None,
            last_used_frame: 0,
            allocations: 0,
        }
    }

    /// Returns a surface matching `size` and `format`, allocating one if the
    /// current surface is missing or stale, and marks it used in `frame_index`.
    ///
    /// On failure no surface is held afterwards; the next call retries.
    pub fn ensure_surface(
        &mut self,
        size: PixelSize,
        format: wgpu::TextureFormat,
        frame_index: u64,
    ) -> Result<&dyn OffscreenSurface, BridgeError> {
        let requested = SurfaceDescriptor::new(size, format).with_usage(self.usage);

        let surface = match self.surface.take() {
            Some(current) if self.descriptor == Some(requested) => current,
            stale => {
                // Free the old surface first so peak memory never holds both.
                if let Some(old) = stale {
                    log::debug!("offscreen surface {} stale, releasing", old.id());
                }
                self.descriptor = None;

                let fresh = self.allocator.allocate(&requested).map_err(|source| {
                    BridgeError::ResourceUnavailable {
                        descriptor: requested,
                        source,
                    }
                })?;
                log::debug!("allocated offscreen surface {} ({requested})", fresh.id());

                self.descriptor = Some(requested);
                self.allocations += 1;
                fresh
            }
        };

        self.last_used_frame = frame_index;
        Ok(&**self.surface.insert(surface))
    }

    /// Frees the surface, if any. Returns whether one was held.
    pub fn release(&mut self) -> bool {
        self.descriptor = None;
        match self.surface.take() {
            Some(surface) => {
                log::debug!("releasing offscreen surface {}", surface.id());
                drop(surface);
                true
            }
            None => false,
        }
    }

    /// Frees the surface once it has gone unused for more than `idle_frames`
    /// frames. Returns whether it was freed.
    pub fn trim(&mut self, frame_index: u64, idle_frames: u64) -> bool {
        if self.surface.is_none() {
            return false;
        }
        let idle = frame_index.saturating_sub(self.last_used_frame);
        if idle <= idle_frames {
            return false;
        }
        log::debug!("offscreen surface idle for {idle} frames, trimming");
        self.release()
    }

    #[inline]
    pub fn surface(&self) -> Option<&dyn OffscreenSurface> {
        self.surface.as_deref()
    }

    #[inline]
    pub fn descriptor(&self) -> Option<&SurfaceDescriptor> {
        self.descriptor.as_ref()
    }

    /// Number of successful allocations over the manager's lifetime.
    #[inline]
    pub fn allocation_count(&self) -> u64 {
        self.allocations
    }
}

impl fmt::Debug for OffscreenSurfaceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffscreenSurfaceManager")
            .field("surface", &self.surface)
            .field("descriptor", &self.descriptor)
            .field("last_used_frame", &self.last_used_frame)
            .field("allocations", &self.allocations)
            .finish_non_exhaustive()
    }
}

impl Drop for OffscreenSurfaceManager {
    fn drop(&mut self) {
        self.release();
    }
}
