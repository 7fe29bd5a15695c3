use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::Result;

use drawbridge_engine::coords::{Rect, Viewport};
use drawbridge_engine::device::{GpuContext, GpuInit};
use drawbridge_engine::functor::{
    BridgeConfig, BridgingDrawable, DrawOutcome, Functor, FunctorError, FunctorRef,
    FunctorRequest, InvocationContext, LifecycleListener, SurfaceAllocator,
};
use drawbridge_engine::logging::{LoggingConfig, init_logging};
use drawbridge_engine::paint::Color;
use drawbridge_engine::render::{GpuState, RenderCtx};
use drawbridge_engine::scene::{Canvas, DrawCmd, DrawList, ZIndex};

const FRAMES: u64 = 8;
const RESIZE_AT: u64 = 4;
const VIEWPORT: Viewport = Viewport::new(640.0, 360.0);
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Stand-in for a foreign renderer: clears whatever target it is handed.
struct ClearFunctor {
    name: &'static str,
    color: Color,
}

impl Functor for ClearFunctor {
    fn invoke(
        &self,
        request: FunctorRequest,
        ctx: &mut InvocationContext<'_>,
    ) -> Result<(), FunctorError> {
        match request {
            FunctorRequest::Sync => Ok(()),
            FunctorRequest::ContextDestroyed => {
                log::info!("{}: dropping GPU resources", self.name);
                Ok(())
            }
            FunctorRequest::Draw => {
                let target = ctx
                    .target()
                    .copied()
                    .ok_or_else(|| FunctorError::Failed("draw without a target".into()))?;
                let view = target
                    .view
                    .ok_or_else(|| FunctorError::Device("target has no texture view".into()))?;
                let gpu = ctx
                    .gpu()
                    .ok_or_else(|| FunctorError::Device("no device".into()))?;

                let mut encoder = gpu
                    .device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("studio functor encoder"),
                    });
                {
                    let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("studio functor clear pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(self.color.to_wgpu()),
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        })],
                        depth_stencil_attachment: None,
                        timestamp_writes: None,
                        occlusion_query_set: None,
                        multiview_mask: None,
                    });
                }
                gpu.queue.submit(std::iter::once(encoder.finish()));

                log::debug!(
                    "{}: cleared {} ({})",
                    self.name,
                    target.id,
                    target.descriptor
                );
                Ok(())
            }
        }
    }
}

/// Owner-side reference count, as a foreign toolkit would keep it.
#[derive(Default)]
struct CountingListener {
    refs: AtomicI64,
}

impl LifecycleListener for CountingListener {
    fn on_functor_referenced(&self) {
        let n = self.refs.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("functor referenced ({n} outstanding)");
    }

    fn on_functor_dereferenced(&self) {
        let n = self.refs.fetch_sub(1, Ordering::SeqCst) - 1;
        log::debug!("functor dereferenced ({n} outstanding)");
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let gpu = GpuContext::new_blocking(GpuInit::default())?;
    let allocator: Arc<dyn SurfaceAllocator> = Arc::new(gpu.surface_allocator());
    let listener = Arc::new(CountingListener::default());

    let mut nodes = [
        bridged_node(
            "spinner",
            Color::from_srgb_u8(220, 60, 60, 255),
            Rect::new(0.0, 0.0, 120.0, 120.0),
            &allocator,
            &listener,
        ),
        // Partly off-screen: only the visible part gets a surface.
        bridged_node(
            "overlay",
            Color::from_srgb_u8(60, 90, 220, 200),
            Rect::new(0.0, 0.0, 200.0, 100.0),
            &allocator,
            &listener,
        ),
    ];
    let offsets = [(40.0, 40.0), (540.0, 300.0)];

    let mut state = GpuState::default();
    for frame in 0..FRAMES {
        if gpu.is_lost() {
            log::error!("frame {frame}: device lost, stopping");
            break;
        }
        if frame == RESIZE_AT {
            nodes[0].set_bounds(Rect::new(0.0, 0.0, 240.0, 160.0));
        }

        for node in nodes.iter_mut() {
            if let Err(err) = node.sync_functor() {
                log::warn!("frame {frame}: sync failed: {err}");
            }
        }

        let mut canvas = Canvas::new(VIEWPORT, FORMAT);
        canvas.draw_rect(VIEWPORT.bounds(), Color::from_srgb_u8(24, 24, 32, 255));

        let mut ctx = RenderCtx::new(Some(gpu.handles()), &mut state, frame);
        for (i, (node, (dx, dy))) in nodes.iter_mut().zip(offsets).enumerate() {
            canvas.save();
            canvas.set_z_index(ZIndex(i as i32 + 1));
            canvas.translate(dx, dy);
            match node.on_draw(&mut canvas, &mut ctx) {
                Ok(DrawOutcome::Drawn { state_restored: true, surface }) => {
                    log::warn!("frame {frame}: node {i} left GPU state dirty ({surface})");
                }
                Ok(_) => {}
                Err(err) => log::warn!("frame {frame}: node {i} draw failed: {err}"),
            }
            canvas.restore();
        }

        log_list(frame, canvas.finish());

        for node in nodes.iter_mut() {
            node.trim(frame);
        }
    }

    for (i, node) in nodes.iter_mut().enumerate() {
        if let Err(err) = node.on_context_destroyed() {
            log::warn!("node {i}: context teardown failed: {err}");
        }
        node.destroy();
        log::info!("node {i}: {:?}", node.stats());
    }

    log::info!(
        "outstanding functor references: {}",
        listener.refs.load(Ordering::SeqCst)
    );
    Ok(())
}

fn bridged_node(
    name: &'static str,
    color: Color,
    bounds: Rect,
    allocator: &Arc<dyn SurfaceAllocator>,
    listener: &Arc<CountingListener>,
) -> BridgingDrawable {
    let functor = FunctorRef::new(Arc::new(ClearFunctor { name, color }));
    BridgingDrawable::new(
        functor,
        listener.clone(),
        bounds,
        Arc::clone(allocator),
        BridgeConfig::default(),
    )
}

fn log_list(frame: u64, mut list: DrawList) {
    log::info!(
        "frame {frame}: {} items, {} bridged images",
        list.len(),
        list.image_count()
    );
    for item in list.iter_in_paint_order() {
        match &item.cmd {
            DrawCmd::Rect(rect) => log::debug!("  z={:?} rect {:?}", item.key.z, rect.rect),
            DrawCmd::Image(image) => log::debug!(
                "  z={:?} image {} {}x{} at {:?}",
                item.key.z,
                image.surface,
                image.size.width,
                image.size.height,
                image.dst
            ),
        }
    }
}
