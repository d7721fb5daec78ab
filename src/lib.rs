// ============================================================================
// LIQUID CANVAS — GPU particle painting surface with async relief shading
// ============================================================================
//
// Two halves, stitched together by `canvas::PaintCanvas`:
//
//   1. Real-time half: a compute kernel evolves a fixed 2048-cell particle
//      buffer from touch input and splats it into a 2048×2048 working
//      texture, which is blurred and binary-thresholded into the presentable
//      surface once per scheduled frame.
//
//   2. Background half: on stroke end (or shading-image change) the current
//      surface is snapshotted and pushed through mask → height field →
//      shaded-material compositing against a user shading image, off the
//      render thread, single-flight with coalesced re-triggers.
// ============================================================================

#![allow(clippy::too_many_arguments)]

pub mod canvas;
pub mod error;
pub mod gpu;
pub mod logger;
pub mod relief;
pub mod scheduler;
pub mod shading;
pub mod touch;

pub use canvas::{FrameOutcome, PaintCanvas};
pub use error::SetupError;
pub use shading::{ShadingController, ShadingEvent, TriggerOutcome};
pub use touch::{TouchSample, TouchTracker};

/// Number of particle cells driving the paint simulation.  Fixed for the
/// process lifetime; the GPU buffer is never resized or copied.
pub const PARTICLE_COUNT: u32 = 2048;

/// Side length of the working / intermediate / presentable textures (pixels).
pub const TEXTURE_DIM: u32 = 2048;

/// Canvas-space → texture-space scale (device pixel ratio).  A 1024-point
/// canvas maps onto the 2048-pixel working texture.
pub const CANVAS_SCALE: i32 = 2;

/// Spatial sigma of the post-process Gaussian blur.
pub const BLUR_SIGMA: f32 = 3.0;

/// Luminance cutoff of the binary threshold stage.
pub const THRESHOLD_CUTOFF: f32 = 0.5;
