// ============================================================================
// GPU SHADERS — all WGSL code kept inline for containment
// ============================================================================

/// Workgroup width of the paint kernel.  Must match the literal in
/// `@workgroup_size` inside [`PAINT_SHADER`]; the dispatch geometry check at
/// setup guarantees the particle count divides evenly by this.
pub const PAINT_WORKGROUP_WIDTH: u32 = 64;

// ============================================================================
// PAINT KERNEL — one lane per particle cell
// ============================================================================
//
// Each lane owns exactly one cell of the particle buffer.  Per frame it
// advances the cell through an LCG and splats a handful of white texels
// around each live touch slot, with the scatter radius scaled by force.
// The update is a pure function of (cell value, touch slots, force): lanes
// never read or write another lane's cell, and overlapping texel writes all
// store the same value, so lane execution order is irrelevant.
pub const PAINT_SHADER: &str = r#"
struct TouchUniforms {
    x: vec4<i32>,        // touch slot x coords in texture space, -1 = unused
    y: vec4<i32>,        // touch slot y coords in texture space, -1 = unused
    force: f32,          // normalized touch force [0,1]
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
};

@group(0) @binding(0) var<storage, read_write> particles: array<u32>;
@group(0) @binding(1) var<uniform> touch: TouchUniforms;
@group(0) @binding(2) var painting_tex: texture_storage_2d<rgba8unorm, write>;

fn lcg(state: u32) -> u32 {
    return state * 1664525u + 1013904223u;
}

@compute @workgroup_size(64)
fn cs_paint(@builtin(global_invocation_id) gid: vec3<u32>) {
    let index = gid.x;
    if (index >= arrayLength(&particles)) {
        return;
    }

    let dims = vec2<i32>(textureDimensions(painting_tex));
    var state = particles[index];

    // Scatter radius grows with force: light touches give a tight bead,
    // full force a wide splash.
    let spread = 4.0 + touch.force * 236.0;

    for (var slot = 0; slot < 4; slot = slot + 1) {
        let tx = touch.x[slot];
        let ty = touch.y[slot];
        if (tx < 0) {
            continue;
        }

        state = lcg(state);
        let radius = f32(state % 1000u) / 1000.0 * spread;
        state = lcg(state);
        let theta = f32(state % 6283u) / 1000.0;

        let px = tx + i32(radius * cos(theta));
        let py = ty + i32(radius * sin(theta));

        if (px >= 0 && px < dims.x && py >= 0 && py < dims.y) {
            textureStore(painting_tex, vec2<i32>(px, py), vec4<f32>(1.0));
        }
    }

    particles[index] = state;
}
"#;

// ============================================================================
// GAUSSIAN BLUR — two-pass separable, kernel weights in a storage buffer
// ============================================================================
pub const BLUR_SHADER: &str = r#"
struct BlurParams {
    radius: u32,
    direction: u32,      // 0 = horizontal, 1 = vertical
    width: u32,
    height: u32,
};

@group(0) @binding(0) var src_tex: texture_2d<f32>;
@group(0) @binding(1) var dst_tex: texture_storage_2d<rgba8unorm, write>;
@group(0) @binding(2) var<uniform> params: BlurParams;
@group(0) @binding(3) var<storage, read> kernel_weights: array<f32>;

@compute @workgroup_size(16, 16)
fn cs_blur(@builtin(global_invocation_id) gid: vec3<u32>) {
    let x = i32(gid.x);
    let y = i32(gid.y);
    if (gid.x >= params.width || gid.y >= params.height) {
        return;
    }

    let r = i32(params.radius);
    var acc = vec4<f32>(0.0);
    for (var k = -r; k <= r; k = k + 1) {
        var sx = x;
        var sy = y;
        if (params.direction == 0u) {
            sx = clamp(x + k, 0, i32(params.width) - 1);
        } else {
            sy = clamp(y + k, 0, i32(params.height) - 1);
        }
        let w = kernel_weights[k + r];
        acc = acc + textureLoad(src_tex, vec2<i32>(sx, sy), 0) * w;
    }

    textureStore(dst_tex, vec2<i32>(x, y), acc);
}
"#;

// ============================================================================
// BINARY THRESHOLD — luminance cutoff, output levels {0, 1}
// ============================================================================
pub const THRESHOLD_SHADER: &str = r#"
struct ThresholdParams {
    cutoff: f32,
    width: u32,
    height: u32,
    _pad0: u32,
};

@group(0) @binding(0) var src_tex: texture_2d<f32>;
@group(0) @binding(1) var dst_tex: texture_storage_2d<rgba8unorm, write>;
@group(0) @binding(2) var<uniform> params: ThresholdParams;

@compute @workgroup_size(16, 16)
fn cs_threshold(@builtin(global_invocation_id) gid: vec3<u32>) {
    if (gid.x >= params.width || gid.y >= params.height) {
        return;
    }

    let texel = textureLoad(src_tex, vec2<i32>(i32(gid.x), i32(gid.y)), 0);
    let luma = dot(texel.rgb, vec3<f32>(0.2126, 0.7152, 0.0722));
    let v = select(0.0, 1.0, luma > params.cutoff);

    textureStore(dst_tex, vec2<i32>(i32(gid.x), i32(gid.y)), vec4<f32>(v, v, v, 1.0));
}
"#;
