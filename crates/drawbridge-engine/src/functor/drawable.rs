use core::fmt;
use std::sync::Arc;

use crate::coords::{Rect, Transform};
use crate::render::{GpuState, RenderCtx, ScissorRect};
use crate::scene::{Canvas, ImageCmd};

use super::{
    BridgeConfig, BridgeError, FunctorInvoker, FunctorRef, FunctorRequest, InvocationParams,
    LifecycleListener, OffscreenSurfaceManager, SurfaceAllocator, SurfaceDescriptor, SurfaceId,
    TargetInfo, Trampoline,
};

/// Lifecycle of a [`BridgingDrawable`].
///
/// `Created → Ready ⇄ Drawn → Destroyed`; any state may go to `Destroyed`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NodeState {
    Created,
    Ready,
    Drawn,
    Destroyed,
}

/// Why a draw phase produced no image.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SkipReason {
    /// Node bounds do not intersect the visible area.
    EmptyBounds,
    /// The owner destroyed the functor.
    FunctorDestroyed,
    /// The node itself was destroyed.
    NodeDestroyed,
}

/// Result of a draw phase that did not fail.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DrawOutcome {
    /// One image command referencing `surface` was recorded.
    Drawn {
        surface: SurfaceId,
        state_restored: bool,
    },
    Skipped(SkipReason),
}

/// Diagnostic counters.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct BridgeStats {
    pub frames_drawn: u64,
    /// Draw phases without output, including failed ones.
    pub frames_skipped: u64,
    pub invocation_failures: u64,
    pub state_restorations: u64,
    pub surface_allocations: u64,
}

/// Command-list node that brings a functor's native GPU output into a
/// recorded frame.
///
/// Per frame the pipeline calls [`sync_functor`](Self::sync_functor) and then
/// [`on_draw`](Self::on_draw), possibly from different threads; it guarantees
/// the sync of a frame finishes before its draw begins. The draw phase renders
/// the functor into an offscreen surface and records that surface as exactly
/// one image command.
///
/// Destruction ([`destroy`](Self::destroy) or drop) releases the surface and
/// then drops the listener reference, in that order, exactly once.
pub struct BridgingDrawable {
    functor: Arc<FunctorRef>,
    listener: Option<Arc<dyn LifecycleListener>>,
    /// Local bounds captured when the node was recorded.
    bounds: Rect,

    surfaces: OffscreenSurfaceManager,
    invoker: Box<dyn FunctorInvoker>,
    config: BridgeConfig,

    state: NodeState,
    stats: BridgeStats,
}

impl BridgingDrawable {
    /// Creates a node and takes a reference on the functor through `listener`.
    pub fn new(
        functor: Arc<FunctorRef>,
        listener: Arc<dyn LifecycleListener>,
        bounds: Rect,
        allocator: Arc<dyn SurfaceAllocator>,
        config: BridgeConfig,
    ) -> Self {
        listener.on_functor_referenced();
        let surfaces = OffscreenSurfaceManager::with_usage(allocator, config.surface_usage);

        Self {
            functor,
            listener: Some(listener),
            bounds,
            surfaces,
            invoker: Box::new(Trampoline),
            config,
            state: NodeState::Created,
            stats: BridgeStats::default(),
        }
    }

    /// Replaces the invoker (the [`Trampoline`] by default).
    pub fn with_invoker(mut self, invoker: Box<dyn FunctorInvoker>) -> Self {
        self.invoker = invoker;
        self
    }

    #[inline]
    pub fn state(&self) -> NodeState {
        self.state
    }

    #[inline]
    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            surface_allocations: self.surfaces.allocation_count(),
            ..self.stats
        }
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Updates the local bounds, e.g. after the owning view is re-recorded.
    #[inline]
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    #[inline]
    pub fn functor(&self) -> &Arc<FunctorRef> {
        &self.functor
    }

    /// Descriptor of the currently held surface.
    #[inline]
    pub fn surface_descriptor(&self) -> Option<&SurfaceDescriptor> {
        self.surfaces.descriptor()
    }

    /// Sync phase.
    ///
    /// Runs once per frame before recording, whether or not the node ends up
    /// drawn. Does nothing (and does not call the functor) when the node or
    /// the functor is already destroyed.
    pub fn sync_functor(&mut self) -> Result<(), BridgeError> {
        if self.state == NodeState::Destroyed {
            return Ok(());
        }
        if self.functor.is_destroyed() {
            log::trace!("sync skipped: functor destroyed");
            return Ok(());
        }

        // No native context exists during sync; a scratch state still catches
        // functors that try to leave a recording open.
        let mut scratch = GpuState::default();
        let result = self.invoker.invoke(
            &self.functor,
            FunctorRequest::Sync,
            InvocationParams::detached(),
            &mut scratch,
        );
        self.state = NodeState::Ready;

        match result {
            Ok(report) => {
                if report.restored.is_some() {
                    self.stats.state_restorations += 1;
                }
                Ok(())
            }
            Err(err) => {
                self.stats.invocation_failures += 1;
                log::warn!("functor sync failed: {err}");
                Err(err)
            }
        }
    }

    /// Draw phase.
    ///
    /// 1. derives surface bounds from the canvas clip and transform,
    /// 2. ensures a matching offscreen surface,
    /// 3. lets the functor draw into it,
    /// 4. records one image command for it on `canvas`.
    ///
    /// Errors only cost this node its output for the current frame; the
    /// canvas is left untouched and the node stays usable.
    pub fn on_draw(
        &mut self,
        canvas: &mut Canvas,
        ctx: &mut RenderCtx<'_>,
    ) -> Result<DrawOutcome, BridgeError> {
        let skip = match self.state {
            NodeState::Destroyed => Some(SkipReason::NodeDestroyed),
            _ if self.functor.is_destroyed() => Some(SkipReason::FunctorDestroyed),
            _ => None,
        };
        if let Some(reason) = skip {
            return Ok(self.skip(reason));
        }
        if self.state != NodeState::Ready {
            log::debug!("draw phase without preceding sync (state {:?})", self.state);
        }

        let local_to_device = canvas.total_transform();
        let visible = canvas
            .device_clip_bounds()
            .and_then(|clip| clip.intersect(local_to_device.map_rect(self.bounds)));
        let Some(device_rect) = visible.map(Rect::round_out) else {
            return Ok(self.skip(SkipReason::EmptyBounds));
        };
        let size = device_rect.pixel_size();
        if size.is_empty() {
            return Ok(self.skip(SkipReason::EmptyBounds));
        }

        self.state = NodeState::Drawn;

        let surface = match self.surfaces.ensure_surface(size, canvas.format(), ctx.frame_index) {
            Ok(surface) => surface,
            Err(err) => {
                self.stats.frames_skipped += 1;
                log::warn!("skipping functor draw this frame: {err}");
                return Err(err);
            }
        };

        let surface_id = surface.id();
        let target = TargetInfo {
            id: surface_id,
            descriptor: *surface.descriptor(),
            view: surface.view(),
        };
        let params = InvocationParams {
            target: Some(target),
            transform: Transform::translate(-device_rect.origin) * local_to_device,
            clip: Some(ScissorRect::new(0, 0, size.width, size.height)),
            gpu: ctx.gpu,
        };

        let result = self
            .invoker
            .invoke(&self.functor, FunctorRequest::Draw, params, ctx.state);
        let report = match result {
            Ok(report) => report,
            Err(err) => {
                self.stats.invocation_failures += 1;
                self.stats.frames_skipped += 1;
                log::warn!("functor draw failed, node skipped this frame: {err}");
                return Err(err);
            }
        };
        if report.restored.is_some() {
            self.stats.state_restorations += 1;
        }

        canvas.draw_image(ImageCmd::new(surface_id, device_rect, size));
        self.stats.frames_drawn += 1;

        Ok(DrawOutcome::Drawn {
            surface: surface_id,
            state_restored: report.restored.is_some(),
        })
    }

    fn skip(&mut self, reason: SkipReason) -> DrawOutcome {
        if self.state != NodeState::Destroyed {
            self.state = NodeState::Drawn;
        }
        self.stats.frames_skipped += 1;
        log::trace!("functor draw skipped: {reason:?}");
        DrawOutcome::Skipped(reason)
    }

    /// Frees the surface if it has not been drawn for longer than
    /// [`BridgeConfig::surface_idle_frames`]. Returns whether it was freed.
    pub fn trim(&mut self, frame_index: u64) -> bool {
        self.surfaces.trim(frame_index, self.config.surface_idle_frames)
    }

    /// Frees the surface now (memory pressure). The next draw reallocates.
    pub fn release_surface(&mut self) -> bool {
        self.surfaces.release()
    }

    /// The GPU context is being torn down: drop the surface and give the
    /// functor a chance to free its own native resources.
    pub fn on_context_destroyed(&mut self) -> Result<(), BridgeError> {
        self.surfaces.release();
        if self.state == NodeState::Destroyed || self.functor.is_destroyed() {
            return Ok(());
        }

        let mut scratch = GpuState::default();
        self.invoker
            .invoke(
                &self.functor,
                FunctorRequest::ContextDestroyed,
                InvocationParams::detached(),
                &mut scratch,
            )
            .map(|_| ())
            .inspect_err(|err| {
                self.stats.invocation_failures += 1;
                log::warn!("functor context teardown failed: {err}");
            })
    }

    /// Releases the surface, then the functor reference. Idempotent.
    pub fn destroy(&mut self) {
        if self.state == NodeState::Destroyed {
            return;
        }
        self.state = NodeState::Destroyed;

        self.surfaces.release();
        if let Some(listener) = self.listener.take() {
            listener.on_functor_dereferenced();
        }
        log::debug!("bridging drawable destroyed");
    }
}

impl Drop for BridgingDrawable {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for BridgingDrawable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgingDrawable")
            .field("functor", &self.functor)
            .field("bounds", &self.bounds)
            .field("surfaces", &self.surfaces)
            .field("invoker", &self.invoker)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
