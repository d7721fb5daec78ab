// ============================================================================
// SETUP ERRORS — unrecoverable init-time invariant violations
// ============================================================================
//
// Everything here aborts startup: continuing with a half-built GPU state
// would corrupt the shared-memory contract around the particle buffer.
// Recoverable conditions (no presentable surface this frame, no shading
// image set, a filter stage yielding nothing) are `Option`-shaped no-ops
// elsewhere and never appear in this enum.

use std::fmt::{self, Display};

#[derive(Debug)]
pub enum SetupError {
    /// No wgpu adapter available, even with the software fallback.
    AdapterUnavailable,
    /// Adapter found but the device/queue request failed.
    DeviceRequest(String),
    /// `particle_count` is not evenly divisible by the kernel workgroup
    /// width — dispatching would silently truncate work.
    DispatchGeometry { particle_count: u32, group_width: u32 },
    /// The presentable surface could not be sized to the host rectangle.
    SurfaceSize { width: u32, height: u32, max_dim: u32 },
}

impl Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::AdapterUnavailable => {
                write!(f, "no GPU adapter available (hardware or software)")
            }
            SetupError::DeviceRequest(msg) => write!(f, "device request failed: {msg}"),
            SetupError::DispatchGeometry {
                particle_count,
                group_width,
            } => write!(
                f,
                "particle count {particle_count} not divisible by workgroup width {group_width}"
            ),
            SetupError::SurfaceSize {
                width,
                height,
                max_dim,
            } => write!(
                f,
                "surface {width}x{height} exceeds device texture limit {max_dim}"
            ),
        }
    }
}

impl std::error::Error for SetupError {}
