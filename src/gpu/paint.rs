// ============================================================================
// PAINT PIPELINE — particle compute kernel dispatch
// ============================================================================

use bytemuck::{Pod, Zeroable};
use rand::Rng;
use wgpu::util::DeviceExt;

use super::context::GpuContext;
use super::particles::ParticleBuffer;
use super::shaders::PAINT_WORKGROUP_WIDTH;
use crate::error::SetupError;
use crate::touch::TouchVectors;

/// Touch input uniform, mirrored by `TouchUniforms` in the WGSL.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct TouchUniforms {
    x: [i32; 4],
    y: [i32; 4],
    force: f32,
    _pad: [f32; 3],
}

impl From<TouchVectors> for TouchUniforms {
    fn from(v: TouchVectors) -> Self {
        Self {
            x: v.x,
            y: v.y,
            force: v.force,
            _pad: [0.0; 3],
        }
    }
}

/// Owns the compute pipeline, the particle buffer, and the per-frame touch
/// uniform.  The dispatch geometry is validated once here; a bad
/// configuration never reaches the GPU.
pub struct PaintPipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    particles: ParticleBuffer,
    touch_buf: wgpu::Buffer,
    workgroups: u32,
}

impl PaintPipeline {
    pub fn new(ctx: &GpuContext, rng: &mut impl Rng) -> Result<Self, SetupError> {
        let device = &ctx.device;

        let particles = ParticleBuffer::new(device, rng);
        let workgroups = super::workgroup_count(particles.count(), PAINT_WORKGROUP_WIDTH)?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("paint_kernel_shader"),
            source: wgpu::ShaderSource::Wgsl(super::shaders::PAINT_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("paint_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba8Unorm,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("paint_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("paint_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "cs_paint",
            compilation_options: Default::default(),
        });

        let touch_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("paint_touch_uniforms"),
            contents: bytemuck::bytes_of(&TouchUniforms::from(TouchVectors {
                x: [-1; 4],
                y: [-1; 4],
                force: 0.0,
            })),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Ok(Self {
            pipeline,
            bind_group_layout,
            particles,
            touch_buf,
            workgroups,
        })
    }

    /// Workgroup count computed at setup from the validated geometry.
    pub fn workgroups(&self) -> u32 {
        self.workgroups
    }

    /// Record this frame's kernel dispatch.  The touch uniform write is
    /// queued before the submit that carries `encoder`, so the pass sees the
    /// current frame's input.  Nothing is waited on.
    pub fn encode(
        &self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        touch: TouchVectors,
        working_view: &wgpu::TextureView,
    ) {
        ctx.queue.write_buffer(
            &self.touch_buf,
            0,
            bytemuck::bytes_of(&TouchUniforms::from(touch)),
        );

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("paint_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.particles.as_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.touch_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(working_view),
                },
            ],
        });

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("paint_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(self.workgroups, 1, 1);
    }
}
