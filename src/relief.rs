// ============================================================================
// RELIEF STAGES — mask→alpha, height field, shaded material (CPU, rayon)
// ============================================================================
//
// The three stages are strictly ordered: the height field is derived from
// the alpha mask, and the shading lookup is driven by the height field's
// gradient.  Each stage is a pure transform; `render_relief` chains them and
// yields `None` instead of a partial image when any stage cannot run.

use image::RgbaImage;
use rayon::prelude::*;

use crate::gpu::post::build_kernel;

/// Smoothing sigma applied to the mask when lifting it into a height field.
/// Wider than the display blur so the relief rolls off gently at stroke
/// edges instead of reading as a hard emboss.
const HEIGHT_SIGMA: f32 = 4.0;

/// Gradient-to-normal steepness.  Larger values exaggerate the relief.
const RELIEF_SCALE: f32 = 4.0;

/// Scalar elevation map derived from the painting mask.  Values in [0, 1].
pub struct HeightField {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl HeightField {
    fn at(&self, x: i32, y: i32) -> f32 {
        let x = x.clamp(0, self.width as i32 - 1) as usize;
        let y = y.clamp(0, self.height as i32 - 1) as usize;
        self.data[y * self.width as usize + x]
    }
}

/// Stage (a): extract a coverage mask from the rasterized painting surface.
/// Luminance becomes coverage; the thresholded surface is {0,1} so this is
/// effectively a binary stencil of the painted area.
pub fn mask_to_alpha(surface: &RgbaImage) -> Vec<f32> {
    surface
        .pixels()
        .map(|p| {
            let luma = 0.2126 * p[0] as f32 + 0.7152 * p[1] as f32 + 0.0722 * p[2] as f32;
            luma / 255.0
        })
        .collect()
}

/// Stage (b): lift the coverage mask into a smooth elevation map.  Higher
/// intensity ⇒ greater height; the separable Gaussian rounds the plateau
/// edges so the gradient (and therefore the relief) is continuous.
pub fn height_field(mask: &[f32], width: u32, height: u32) -> Option<HeightField> {
    if mask.len() != (width as usize) * (height as usize) || width == 0 || height == 0 {
        return None;
    }
    let w = width as usize;
    let h = height as usize;
    let kernel = build_kernel(HEIGHT_SIGMA);
    let radius = (kernel.len() / 2) as i32;

    // Horizontal pass
    let mut tmp = vec![0.0f32; w * h];
    tmp.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (k, &weight) in kernel.iter().enumerate() {
                let sx = (x as i32 + k as i32 - radius).clamp(0, w as i32 - 1) as usize;
                acc += mask[y * w + sx] * weight;
            }
            *out = acc;
        }
    });

    // Vertical pass
    let mut data = vec![0.0f32; w * h];
    data.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (k, &weight) in kernel.iter().enumerate() {
                let sy = (y as i32 + k as i32 - radius).clamp(0, h as i32 - 1) as usize;
                acc += tmp[sy * w + x] * weight;
            }
            *out = acc;
        }
    });

    Some(HeightField {
        width,
        height,
        data,
    })
}

/// Stage (c): render a shaded-material composite.  The height gradient gives
/// a surface normal per pixel; the normal's x/y sphere-map into the shading
/// image (its center is "facing the viewer").  Output is premultiplied by
/// coverage, so a flat height field contributes nothing.
pub fn shaded_material(field: &HeightField, shading: &RgbaImage) -> Option<RgbaImage> {
    let (sw, sh) = shading.dimensions();
    if sw == 0 || sh == 0 || field.width == 0 || field.height == 0 {
        return None;
    }

    let w = field.width as usize;
    let mut out = RgbaImage::new(field.width, field.height);
    out.par_chunks_mut(w * 4).enumerate().for_each(|(y, row)| {
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let (xi, yi) = (x as i32, y as i32);
            let elevation = field.at(xi, yi);

            let dx = (field.at(xi + 1, yi) - field.at(xi - 1, yi)) * 0.5 * RELIEF_SCALE;
            let dy = (field.at(xi, yi + 1) - field.at(xi, yi - 1)) * 0.5 * RELIEF_SCALE;
            let inv_len = 1.0 / (dx * dx + dy * dy + 1.0).sqrt();
            let (nx, ny, nz) = (-dx * inv_len, -dy * inv_len, inv_len);

            // Sphere-map lookup into the shading image.
            let u = ((nx * 0.5 + 0.5) * (sw - 1) as f32).round() as u32;
            let v = ((ny * 0.5 + 0.5) * (sh - 1) as f32).round() as u32;
            let material = shading.get_pixel(u.min(sw - 1), v.min(sh - 1));

            let coverage = elevation.clamp(0.0, 1.0);
            let lit = nz * coverage;
            px[0] = (material[0] as f32 * lit) as u8;
            px[1] = (material[1] as f32 * lit) as u8;
            px[2] = (material[2] as f32 * lit) as u8;
            px[3] = (coverage * 255.0) as u8;
        }
    });

    Some(out)
}

/// Full chain: painting surface + shading image → relief composite.
/// `None` means the run is a no-op (the previous composite stays displayed).
pub fn render_relief(surface: &RgbaImage, shading: &RgbaImage) -> Option<RgbaImage> {
    let (w, h) = surface.dimensions();
    let mask = mask_to_alpha(surface);
    let field = height_field(&mask, w, h)?;
    shaded_material(&field, shading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(rgba))
    }

    #[test]
    fn mask_extracts_luminance_coverage() {
        let mut img = solid(2, 1, [0, 0, 0, 255]);
        img.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
        let mask = mask_to_alpha(&img);
        assert!(mask[0] < 0.01);
        assert!(mask[1] > 0.99);
    }

    #[test]
    fn height_field_rejects_mismatched_dimensions() {
        assert!(height_field(&[0.0; 4], 3, 3).is_none());
        assert!(height_field(&[], 0, 0).is_none());
    }

    #[test]
    fn flat_white_mask_gives_unit_plateau() {
        let field = height_field(&vec![1.0; 64 * 64], 64, 64).unwrap();
        // Center of a large plateau is unaffected by edge clamping.
        let center = field.at(32, 32);
        assert!((center - 1.0).abs() < 1e-3, "center height {center}");
    }

    #[test]
    fn all_zero_surface_yields_zero_relief() {
        // Stage-ordering property: an empty painting through the full
        // mask → height → shade chain must contribute nothing.
        let surface = solid(32, 32, [0, 0, 0, 255]);
        let shading = solid(16, 16, [200, 180, 90, 255]);
        let out = render_relief(&surface, &shading).unwrap();
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn flat_plateau_interior_samples_shading_center() {
        let surface = solid(64, 64, [255, 255, 255, 255]);
        let mut shading = solid(33, 33, [10, 10, 10, 255]);
        shading.put_pixel(16, 16, Rgba([250, 100, 50, 255]));
        let out = render_relief(&surface, &shading).unwrap();
        // Deep interior: zero gradient, normal (0,0,1), so the sphere map
        // hits the shading image's center pixel at full coverage.
        let p = out.get_pixel(32, 32);
        assert!(p[0] > 200 && p[1] < 150 && p[3] == 255, "got {:?}", p);
    }

    #[test]
    fn empty_shading_image_fails_the_stage() {
        let surface = solid(8, 8, [255, 255, 255, 255]);
        let shading = RgbaImage::new(0, 0);
        assert!(render_relief(&surface, &shading).is_none());
    }
}
