// ============================================================================
// GPU MODULE — compute kernel and post-process chain for liquid-canvas
// ============================================================================
//
// Architecture:
//   context.rs   — wgpu Device, Queue, adapter init
//   shaders.rs   — all WGSL shader source (inline strings)
//   particles.rs — the fixed-length, seeded particle storage buffer
//   paint.rs     — compute pipeline splatting particles into the working texture
//   post.rs      — Gaussian blur (σ=3) + binary threshold pipelines
// ============================================================================

pub mod context;
pub mod paint;
pub mod particles;
pub mod post;
pub mod shaders;

pub use context::GpuContext;
pub use paint::PaintPipeline;
pub use particles::ParticleBuffer;

use crate::error::SetupError;

/// WGPU requires `bytes_per_row` to be a multiple of 256 for texture↔buffer
/// copies (surface snapshot readback).
pub const COPY_BYTES_PER_ROW_ALIGNMENT: u32 = 256;

/// Round `width * 4` bytes up to the copy alignment.
pub fn aligned_bytes_per_row(width: u32) -> u32 {
    let unaligned = width * 4;
    unaligned.div_ceil(COPY_BYTES_PER_ROW_ALIGNMENT) * COPY_BYTES_PER_ROW_ALIGNMENT
}

/// Validate the kernel launch geometry: the particle grid must divide evenly
/// into workgroups, otherwise lanes would be silently dropped.  Returns the
/// workgroup count for the dispatch.
pub fn workgroup_count(particle_count: u32, group_width: u32) -> Result<u32, SetupError> {
    if group_width == 0 || particle_count % group_width != 0 {
        return Err(SetupError::DispatchGeometry {
            particle_count,
            group_width,
        });
    }
    Ok(particle_count / group_width)
}

/// Standard RGBA8 texture sized for the paint pass chain.
pub(crate) fn create_chain_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    label: &str,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workgroup_count_divides_evenly() {
        assert_eq!(workgroup_count(2048, 64).unwrap(), 32);
        assert_eq!(workgroup_count(2048, 32).unwrap(), 64);
    }

    #[test]
    fn uneven_geometry_fails_fast() {
        assert!(workgroup_count(2048, 100).is_err());
        assert!(workgroup_count(2048, 0).is_err());
        let err = workgroup_count(2047, 64).unwrap_err();
        assert!(err.to_string().contains("2047"));
    }

    #[test]
    fn bytes_per_row_alignment() {
        assert_eq!(aligned_bytes_per_row(2048), 8192); // already aligned
        assert_eq!(aligned_bytes_per_row(100), 512);
        assert_eq!(aligned_bytes_per_row(64), 256);
    }
}
