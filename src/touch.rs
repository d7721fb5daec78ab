// ============================================================================
// TOUCH SAMPLER — fixed 4-slot touch state for the paint kernel
// ============================================================================
//
// The kernel always receives a fixed-arity input: four (x, y) slots encoded
// as two vec4<i32> plus one scalar force.  Slots without a live touch carry
// the sentinel (-1, -1).  On release the slots are *reset to sentinels*,
// never emptied, so the uniform layout is identical every frame.

use crate::CANVAS_SCALE;

/// Sentinel coordinate for an unused touch slot.
pub const TOUCH_SENTINEL: f32 = -1.0;

/// Number of touch slots consumed by the kernel per frame.
pub const TOUCH_SLOTS: usize = 4;

/// Mid-pressure default for input devices that don't report force.
const DEFAULT_FORCE: f32 = 0.5;

/// One extracted pointer/stylus sample in canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    pub position: [f32; 2],
    /// Normalized applied force in [0, 1].
    pub force: f32,
}

impl TouchSample {
    pub fn new(x: f32, y: f32, force: f32) -> Self {
        Self {
            position: [x, y],
            force,
        }
    }
}

/// Kernel-ready touch input: x/y coordinate vectors (texture space) and the
/// scalar force.  Produced by [`TouchTracker::encoded`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchVectors {
    pub x: [i32; 4],
    pub y: [i32; 4],
    pub force: f32,
}

/// Normalize a device force reading: `applied / maximum` for pressure-capable
/// devices, mid-pressure default otherwise.
pub fn normalized_force(device_force: Option<f32>) -> f32 {
    match device_force {
        Some(f) => f.clamp(0.0, 1.0),
        None => DEFAULT_FORCE,
    }
}

/// Holds the current frame's touch slots between events and ticks.
#[derive(Debug, Clone)]
pub struct TouchTracker {
    locations: [[f32; 2]; TOUCH_SLOTS],
    force: f32,
}

impl Default for TouchTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchTracker {
    pub fn new() -> Self {
        Self {
            locations: [[TOUCH_SENTINEL, TOUCH_SENTINEL]; TOUCH_SLOTS],
            force: 0.0,
        }
    }

    /// Stroke start: first slot live, the rest sentinel.
    pub fn begin(&mut self, sample: TouchSample) {
        self.locations = [[TOUCH_SENTINEL, TOUCH_SENTINEL]; TOUCH_SLOTS];
        self.locations[0] = sample.position;
        self.force = sample.force;
    }

    /// Stroke motion: up to four coalesced samples fill the slots in order;
    /// anything beyond `TOUCH_SLOTS` is dropped.  Force follows the last
    /// sample.
    pub fn moved(&mut self, samples: &[TouchSample]) {
        self.locations = [[TOUCH_SENTINEL, TOUCH_SENTINEL]; TOUCH_SLOTS];
        for (slot, sample) in self.locations.iter_mut().zip(samples.iter()) {
            *slot = sample.position;
        }
        if let Some(last) = samples.last() {
            self.force = last.force;
        }
    }

    /// Stroke end: all four slots back to sentinels.
    pub fn release(&mut self) {
        self.locations = [[TOUCH_SENTINEL, TOUCH_SENTINEL]; TOUCH_SLOTS];
    }

    /// Encode the slots for the kernel.  Live coordinates are scaled from
    /// canvas space to texture space; sentinel slots stay -1 unscaled.
    pub fn encoded(&self) -> TouchVectors {
        let mut x = [-1i32; TOUCH_SLOTS];
        let mut y = [-1i32; TOUCH_SLOTS];
        for (i, loc) in self.locations.iter().enumerate() {
            if loc[0] >= 0.0 {
                x[i] = loc[0] as i32 * CANVAS_SCALE;
                y[i] = loc[1] as i32 * CANVAS_SCALE;
            }
        }
        TouchVectors {
            x,
            y,
            force: self.force,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tracker_is_all_sentinel() {
        let t = TouchTracker::new();
        let v = t.encoded();
        assert_eq!(v.x, [-1; 4]);
        assert_eq!(v.y, [-1; 4]);
    }

    #[test]
    fn begin_fills_first_slot_only() {
        let mut t = TouchTracker::new();
        t.begin(TouchSample::new(100.0, 100.0, 0.5));
        let v = t.encoded();
        assert_eq!(v.x, [200, -1, -1, -1]);
        assert_eq!(v.y, [200, -1, -1, -1]);
        assert_eq!(v.force, 0.5);
    }

    #[test]
    fn moved_fills_slots_in_order_and_sentinels_the_rest() {
        let mut t = TouchTracker::new();
        t.moved(&[
            TouchSample::new(1.0, 2.0, 0.3),
            TouchSample::new(3.0, 4.0, 0.7),
        ]);
        let v = t.encoded();
        assert_eq!(v.x, [2, 6, -1, -1]);
        assert_eq!(v.y, [4, 8, -1, -1]);
        assert_eq!(v.force, 0.7);
    }

    #[test]
    fn moved_drops_samples_beyond_four_slots() {
        let mut t = TouchTracker::new();
        let samples: Vec<_> = (0..6)
            .map(|i| TouchSample::new(i as f32, i as f32, 0.5))
            .collect();
        t.moved(&samples);
        let v = t.encoded();
        assert_eq!(v.x[3], 6);
        // Slot arity is fixed at four.
        assert_eq!(v.x.len(), 4);
    }

    #[test]
    fn release_resets_all_slots_to_sentinel() {
        let mut t = TouchTracker::new();
        t.moved(&[
            TouchSample::new(1.0, 2.0, 0.3),
            TouchSample::new(3.0, 4.0, 0.7),
            TouchSample::new(5.0, 6.0, 0.7),
            TouchSample::new(7.0, 8.0, 0.7),
        ]);
        t.release();
        let v = t.encoded();
        assert_eq!(v.x, [-1; 4]);
        assert_eq!(v.y, [-1; 4]);
    }

    #[test]
    fn force_defaults_to_mid_pressure_without_a_pressure_device() {
        assert_eq!(normalized_force(None), 0.5);
        assert_eq!(normalized_force(Some(0.25)), 0.25);
        assert_eq!(normalized_force(Some(7.0)), 1.0);
    }
}
