// ============================================================================
// PAINT CANVAS — coordinator for the per-frame pass chain + shading hookup
// ============================================================================
//
// One tick, strictly sequential by encoder order, nothing waited on:
//
//   paint kernel → blur (h, v) → threshold → presentable surface
//
// The canvas also owns the coordinating side of the shading pipeline: touch
// release and shading-image changes request relief runs, and
// `poll_shading` applies completions and starts the one coalesced follow-up
// run when needed.  All shading state mutation happens on the caller's
// (coordinating) context.

use image::RgbaImage;
use rand::Rng;

use crate::TEXTURE_DIM;
use crate::error::SetupError;
use crate::gpu::paint::PaintPipeline;
use crate::gpu::post::{BlurPipeline, ThresholdPipeline};
use crate::gpu::{GpuContext, aligned_bytes_per_row, create_chain_texture};
use crate::scheduler::FrameScheduler;
use crate::shading::{ShadingController, ShadingEvent};
use crate::touch::{TouchSample, TouchTracker, normalized_force};
use crate::{BLUR_SIGMA, THRESHOLD_CUTOFF};

/// Result of one render tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The full pass chain was recorded and submitted.
    Rendered,
    /// No presentable surface is attached; the frame was skipped whole.
    NoSurface,
}

struct PresentSurface {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

pub struct PaintCanvas {
    ctx: GpuContext,
    paint: PaintPipeline,
    blur: BlurPipeline,
    threshold: ThresholdPipeline,
    /// Kernel write target; accumulates the stroke across frames.  The view
    /// keeps the underlying texture alive.
    working_view: wgpu::TextureView,
    /// Scratch between the blur's horizontal and vertical passes.
    blur_scratch_view: wgpu::TextureView,
    /// Blur output / threshold input.
    intermediate_view: wgpu::TextureView,
    present: Option<PresentSurface>,
    touch: TouchTracker,
    scheduler: FrameScheduler,
    shading: ShadingController,
    shading_image: Option<RgbaImage>,
}

impl PaintCanvas {
    /// Build the full chain.  Fails fast on any setup invariant violation;
    /// a `PaintCanvas` that constructs is ready to tick.
    pub fn new(ctx: GpuContext, rng: &mut impl Rng) -> Result<Self, SetupError> {
        let paint = PaintPipeline::new(&ctx, rng)?;
        let blur = BlurPipeline::new(&ctx, BLUR_SIGMA, TEXTURE_DIM, TEXTURE_DIM);
        let threshold = ThresholdPipeline::new(&ctx, THRESHOLD_CUTOFF, TEXTURE_DIM, TEXTURE_DIM);

        let working_tex = create_chain_texture(&ctx.device, TEXTURE_DIM, TEXTURE_DIM, "working_tex");
        let blur_scratch =
            create_chain_texture(&ctx.device, TEXTURE_DIM, TEXTURE_DIM, "blur_scratch_tex");
        let intermediate =
            create_chain_texture(&ctx.device, TEXTURE_DIM, TEXTURE_DIM, "intermediate_tex");

        let working_view = working_tex.create_view(&wgpu::TextureViewDescriptor::default());
        let blur_scratch_view = blur_scratch.create_view(&wgpu::TextureViewDescriptor::default());
        let intermediate_view = intermediate.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            ctx,
            paint,
            blur,
            threshold,
            working_view,
            blur_scratch_view,
            intermediate_view,
            present: None,
            touch: TouchTracker::new(),
            scheduler: FrameScheduler::new(),
            shading: ShadingController::new(),
            shading_image: None,
        })
    }

    /// Allocate the presentable surface (the live canvas the host displays).
    /// The chain resolution is fixed; this fails only if the device cannot
    /// hold a texture that large.
    pub fn attach_present_surface(&mut self) -> Result<(), SetupError> {
        if !self.ctx.supports_size(TEXTURE_DIM, TEXTURE_DIM) {
            return Err(SetupError::SurfaceSize {
                width: TEXTURE_DIM,
                height: TEXTURE_DIM,
                max_dim: self.ctx.max_texture_dim,
            });
        }
        let texture = create_chain_texture(&self.ctx.device, TEXTURE_DIM, TEXTURE_DIM, "present_tex");
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.present = Some(PresentSurface { texture, view });
        Ok(())
    }

    /// The live canvas texture, read-only to the host UI.
    pub fn present_texture(&self) -> Option<&wgpu::Texture> {
        self.present.as_ref().map(|p| &p.texture)
    }

    /// The latest relief composite, read-only to the host UI.
    pub fn filtered_output(&self) -> Option<&RgbaImage> {
        self.shading.output()
    }

    /// Host render-loop gate: tick only while this is true.
    pub fn is_active(&self) -> bool {
        self.scheduler.is_active()
    }

    // ------------------------------------------------------------------
    // Touch entry points
    // ------------------------------------------------------------------

    pub fn touch_began(&mut self, x: f32, y: f32, device_force: Option<f32>) {
        self.touch
            .begin(TouchSample::new(x, y, normalized_force(device_force)));
        self.scheduler.wake();
    }

    pub fn touch_moved(&mut self, samples: &[TouchSample]) {
        self.touch.moved(samples);
        self.scheduler.wake();
    }

    /// Stroke end: slots reset to sentinels, the loop winds down, and a
    /// shading run is requested from the finished surface.
    pub fn touch_ended(&mut self) {
        self.touch.release();
        self.scheduler.stroke_ended();
        self.request_shading();
    }

    // ------------------------------------------------------------------
    // Shading pipeline hookup
    // ------------------------------------------------------------------

    /// Swap the shading reference image.  Re-runs the relief pipeline unless
    /// a stroke is in progress (it will run on the coming touch release).
    pub fn set_shading_image(&mut self, image: Option<RgbaImage>) {
        self.shading_image = image;
        if !self.scheduler.is_drawing() {
            self.request_shading();
        }
    }

    /// Pump shading completions.  Call regularly from the coordinating
    /// context; a coalesced follow-up run re-derives its inputs here, from
    /// the state current at completion time.
    pub fn poll_shading(&mut self) -> ShadingEvent {
        let event = self.shading.poll_completion();
        if event == ShadingEvent::RerunRequested {
            self.request_shading();
        }
        event
    }

    fn request_shading(&mut self) {
        // Busy: coalesce without snapshotting — inputs are re-derived fresh
        // when the follow-up run actually starts.
        if self.shading.is_busy() {
            self.shading.trigger(None, None);
            return;
        }
        let shading = self.shading_image.clone();
        if shading.is_none() {
            return;
        }
        let surface = self.snapshot_surface();
        if surface.is_none() {
            crate::log_warn!("shading requested with no presentable surface");
            return;
        }
        self.shading.trigger(surface, shading);
    }

    // ------------------------------------------------------------------
    // Render tick
    // ------------------------------------------------------------------

    /// Run one frame of the pass chain.  All stages are recorded into a
    /// single encoder, so the queue enforces kernel → blur → threshold.
    /// Skipped whole (nothing committed) when no surface is attached.
    pub fn tick(&mut self) -> FrameOutcome {
        let Some(present) = &self.present else {
            crate::log_warn!("no presentable surface this frame - skipping");
            self.scheduler.frame_finished();
            return FrameOutcome::NoSurface;
        };

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        self.paint
            .encode(&self.ctx, &mut encoder, self.touch.encoded(), &self.working_view);
        self.blur.encode(
            &self.ctx,
            &mut encoder,
            &self.working_view,
            &self.blur_scratch_view,
            &self.intermediate_view,
            TEXTURE_DIM,
            TEXTURE_DIM,
        );
        self.threshold.encode(
            &self.ctx,
            &mut encoder,
            &self.intermediate_view,
            &present.view,
            TEXTURE_DIM,
            TEXTURE_DIM,
        );

        // Enqueued, not waited on: the render context never blocks.
        self.ctx.queue.submit(std::iter::once(encoder.finish()));

        self.scheduler.frame_finished();
        FrameOutcome::Rendered
    }

    // ------------------------------------------------------------------
    // Surface snapshot (shading pipeline input)
    // ------------------------------------------------------------------

    /// Read the presentable surface back into an `RgbaImage` via an aligned
    /// staging buffer.  Returns `None` when no surface is attached or the
    /// readback fails; both make the shading request a no-op.
    fn snapshot_surface(&self) -> Option<RgbaImage> {
        let present = self.present.as_ref()?;
        let device = &self.ctx.device;
        let queue = &self.ctx.queue;

        let bytes_per_row = aligned_bytes_per_row(TEXTURE_DIM);
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("snapshot_staging"),
            size: (bytes_per_row * TEXTURE_DIM) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("snapshot_encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &present.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(TEXTURE_DIM),
                },
            },
            wgpu::Extent3d {
                width: TEXTURE_DIM,
                height: TEXTURE_DIM,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                crate::log_err!("snapshot readback map error: {e:?}");
                return None;
            }
            Err(e) => {
                crate::log_err!("snapshot readback channel error: {e:?}");
                return None;
            }
        }

        let mapped = slice.get_mapped_range();
        let row = TEXTURE_DIM as usize * 4;
        let mut pixels = vec![0u8; row * TEXTURE_DIM as usize];
        for y in 0..TEXTURE_DIM as usize {
            let src = y * bytes_per_row as usize;
            pixels[y * row..(y + 1) * row].copy_from_slice(&mapped[src..src + row]);
        }
        drop(mapped);
        staging.unmap();

        RgbaImage::from_raw(TEXTURE_DIM, TEXTURE_DIM, pixels)
    }
}
