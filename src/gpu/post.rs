// ============================================================================
// POST-PROCESS CHAIN — Gaussian blur (σ=3) then binary threshold
// ============================================================================
//
// Both stages are pure image transforms with no state carried across
// frames.  They are recorded into the frame's single command encoder after
// the paint kernel, so queue order gives kernel → blur → threshold without
// any host-side synchronization.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::context::GpuContext;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct BlurParams {
    radius: u32,
    direction: u32,
    width: u32,
    height: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ThresholdParams {
    cutoff: f32,
    width: u32,
    height: u32,
    _pad0: u32,
}

fn post_bgl(device: &wgpu::Device, label: &str, with_kernel: bool) -> wgpu::BindGroupLayout {
    let mut entries = vec![
        wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::WriteOnly,
                format: wgpu::TextureFormat::Rgba8Unorm,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 2,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        },
    ];
    if with_kernel {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 3,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });
    }
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &entries,
    })
}

// ============================================================================
// GAUSSIAN BLUR
// ============================================================================

/// Two-pass separable Gaussian blur with a fixed sigma.  Kernel weights are
/// baked into a storage buffer at construction.
pub struct BlurPipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    kernel_buf: wgpu::Buffer,
    params_h: wgpu::Buffer,
    params_v: wgpu::Buffer,
    radius: u32,
}

impl BlurPipeline {
    pub fn new(ctx: &GpuContext, sigma: f32, width: u32, height: u32) -> Self {
        let device = &ctx.device;

        let kernel = build_kernel(sigma);
        let radius = (kernel.len() / 2) as u32;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blur_compute_shader"),
            source: wgpu::ShaderSource::Wgsl(super::shaders::BLUR_SHADER.into()),
        });
        let bind_group_layout = post_bgl(device, "blur_bgl", true);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blur_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("blur_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "cs_blur",
            compilation_options: Default::default(),
        });

        let kernel_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("blur_kernel_buf"),
            contents: bytemuck::cast_slice(&kernel),
            usage: wgpu::BufferUsages::STORAGE,
        });

        // Sigma and dimensions are fixed for the chain's lifetime, so both
        // directions' params can be baked up front.
        let mk_params = |direction: u32, label: &str| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&BlurParams {
                    radius,
                    direction,
                    width,
                    height,
                }),
                usage: wgpu::BufferUsages::UNIFORM,
            })
        };
        let params_h = mk_params(0, "blur_params_h");
        let params_v = mk_params(1, "blur_params_v");

        Self {
            pipeline,
            bind_group_layout,
            kernel_buf,
            params_h,
            params_v,
            radius,
        }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Record horizontal (src → scratch) and vertical (scratch → dst) passes.
    pub fn encode(
        &self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        src: &wgpu::TextureView,
        scratch: &wgpu::TextureView,
        dst: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) {
        self.encode_pass(ctx, encoder, src, scratch, &self.params_h, width, height);
        self.encode_pass(ctx, encoder, scratch, dst, &self.params_v, width, height);
    }

    fn encode_pass(
        &self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
        params: &wgpu::Buffer,
        width: u32,
        height: u32,
    ) {
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blur_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(output),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: self.kernel_buf.as_entire_binding(),
                },
            ],
        });

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("blur_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(width.div_ceil(16), height.div_ceil(16), 1);
    }
}

/// Normalized 1-D Gaussian weights for the given sigma (radius = 3σ).
pub fn build_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil() as usize;
    if radius == 0 {
        return vec![1.0];
    }
    let len = radius * 2 + 1;
    let mut kernel = vec![0.0f32; len];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;
    for (i, item) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        let v = (-x * x / s2).exp();
        *item = v;
        sum += v;
    }
    let inv = 1.0 / sum;
    for v in &mut kernel {
        *v *= inv;
    }
    kernel
}

// ============================================================================
// BINARY THRESHOLD
// ============================================================================

pub struct ThresholdPipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buf: wgpu::Buffer,
}

impl ThresholdPipeline {
    pub fn new(ctx: &GpuContext, cutoff: f32, width: u32, height: u32) -> Self {
        let device = &ctx.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("threshold_shader"),
            source: wgpu::ShaderSource::Wgsl(super::shaders::THRESHOLD_SHADER.into()),
        });
        let bind_group_layout = post_bgl(device, "threshold_bgl", false);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("threshold_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("threshold_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "cs_threshold",
            compilation_options: Default::default(),
        });

        let params_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("threshold_params"),
            contents: bytemuck::bytes_of(&ThresholdParams {
                cutoff,
                width,
                height,
                _pad0: 0,
            }),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        Self {
            pipeline,
            bind_group_layout,
            params_buf,
        }
    }

    /// Record the threshold pass from the intermediate texture into the
    /// presentable surface.
    pub fn encode(
        &self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        src: &wgpu::TextureView,
        dst: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) {
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("threshold_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(src),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(dst),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.params_buf.as_entire_binding(),
                },
            ],
        });

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("threshold_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(width.div_ceil(16), height.div_ceil(16), 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let k = build_kernel(3.0);
        assert_eq!(k.len(), 19); // radius 9
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for i in 0..k.len() / 2 {
            assert!((k[i] - k[k.len() - 1 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn zero_sigma_degenerates_to_identity() {
        assert_eq!(build_kernel(0.0), vec![1.0]);
    }
}
