// ============================================================================
// GPU CONTEXT — wgpu Device, Queue, and adapter initialization
// ============================================================================

use std::sync::Arc;

use crate::error::SetupError;

/// Holds the core wgpu resources shared by the paint and post-process
/// pipelines.  Created once at startup; failure here is unrecoverable and
/// aborts setup, since every downstream contract depends on a live device.
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_name: String,
    /// Maximum texture dimension supported by this device.
    pub max_texture_dim: u32,
}

impl GpuContext {
    /// Attempt to create a GPU context.  Tries hardware first, then falls
    /// back to a software rasterizer (`force_fallback_adapter`) so the
    /// canvas still works without a real GPU.
    ///
    /// `pollster::block_on` is fine here: this runs once, at setup, before
    /// the render loop exists.
    pub fn new() -> Result<Self, SetupError> {
        match pollster::block_on(Self::new_async(false)) {
            Ok(ctx) => return Ok(ctx),
            Err(e) => {
                crate::log_warn!("hardware adapter unavailable ({e}) - trying software fallback");
            }
        }
        pollster::block_on(Self::new_async(true))
    }

    async fn new_async(force_fallback: bool) -> Result<Self, SetupError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None, // headless — compute + offscreen only
                force_fallback_adapter: force_fallback,
            })
            .await
            .ok_or(SetupError::AdapterUnavailable)?;

        let adapter_name = adapter.get_info().name.clone();
        let limits = adapter.limits();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("liquid-canvas GPU"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits {
                        max_texture_dimension_2d: limits.max_texture_dimension_2d,
                        max_storage_buffer_binding_size: limits.max_storage_buffer_binding_size,
                        max_compute_workgroup_size_x: limits.max_compute_workgroup_size_x,
                        max_compute_workgroups_per_dimension: limits
                            .max_compute_workgroups_per_dimension,
                        ..wgpu::Limits::downlevel_defaults()
                    },
                },
                None,
            )
            .await
            .map_err(|e| SetupError::DeviceRequest(e.to_string()))?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_name,
            max_texture_dim: limits.max_texture_dimension_2d,
        })
    }

    /// Check if a texture of the given dimensions can be created.
    pub fn supports_size(&self, width: u32, height: u32) -> bool {
        width <= self.max_texture_dim && height <= self.max_texture_dim
    }
}
