// ============================================================================
// PARTICLE BUFFER — fixed-length, seeded, GPU-resident kernel working state
// ============================================================================
//
// The buffer is created once, seeded host-side, and then belongs to the
// paint kernel for the rest of the process.  The handle is deliberately
// opaque: nothing outside `gpu::paint` can bind it, nothing can read it
// back, and it is never resized or copied.

use rand::Rng;
use wgpu::util::DeviceExt;

use crate::PARTICLE_COUNT;

/// Upper bound (exclusive) for initial particle cell values.
pub const SEED_RANGE: u32 = 9999;

/// Opaque handle over the kernel's particle storage buffer.
pub struct ParticleBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl ParticleBuffer {
    /// Allocate and seed the buffer.  The RNG is caller-supplied entropy:
    /// two setups never produce the same buffer.
    pub fn new(device: &wgpu::Device, rng: &mut impl Rng) -> Self {
        let seeds = seed_values(rng);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("particle_buffer"),
            contents: bytemuck::cast_slice(&seeds),
            usage: wgpu::BufferUsages::STORAGE,
        });
        Self {
            buffer,
            count: PARTICLE_COUNT,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Binding for the paint kernel's bind group.  The only access path to
    /// the underlying buffer.
    pub(crate) fn as_binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

/// Host-side seeding: `PARTICLE_COUNT` uniform integers in `[0, SEED_RANGE)`.
pub fn seed_values(rng: &mut impl Rng) -> Vec<u32> {
    (0..PARTICLE_COUNT)
        .map(|_| rng.gen_range(0..SEED_RANGE))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn seeds_have_fixed_length_and_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let seeds = seed_values(&mut rng);
        assert_eq!(seeds.len(), PARTICLE_COUNT as usize);
        assert!(seeds.iter().all(|&v| v < SEED_RANGE));
    }

    #[test]
    fn different_entropy_yields_different_buffers() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(8);
        assert_ne!(seed_values(&mut a), seed_values(&mut b));
    }

    #[test]
    fn seeds_are_roughly_uniform() {
        // Split the range into quarters; each should hold a reasonable share
        // of the 2048 samples.  Loose bounds, not a statistical test.
        let mut rng = StdRng::seed_from_u64(42);
        let seeds = seed_values(&mut rng);
        let mut quarters = [0usize; 4];
        for &v in &seeds {
            quarters[(v * 4 / SEED_RANGE) as usize] += 1;
        }
        for &q in &quarters {
            assert!(q > PARTICLE_COUNT as usize / 8, "skewed quarter: {quarters:?}");
        }
    }
}
