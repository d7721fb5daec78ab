// ============================================================================
// FRAME SCHEDULER — idle/active gating for the render loop
// ============================================================================
//
// The render loop is normally idle; any touch wakes it, and it goes idle the
// instant drawing stops.  State changes only through the explicit transition
// functions below — no implicit property observers.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Active,
}

#[derive(Debug)]
pub struct FrameScheduler {
    state: LoopState,
    drawing: bool,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            drawing: false,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// The host only ticks the canvas while this is true.
    pub fn is_active(&self) -> bool {
        self.state == LoopState::Active
    }

    /// Whether a stroke is currently in progress (gates shading re-runs on
    /// image changes).
    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Touch begin/move: mark drawing and force the loop awake.
    pub fn wake(&mut self) {
        self.drawing = true;
        self.state = LoopState::Active;
    }

    /// Touch release: the loop winds down at the end of the current frame.
    pub fn stroke_ended(&mut self) {
        self.drawing = false;
    }

    /// End-of-tick re-evaluation.  Returns the resulting state so the caller
    /// can stop requesting frames.
    pub fn frame_finished(&mut self) -> LoopState {
        if !self.drawing {
            self.state = LoopState::Idle;
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let s = FrameScheduler::new();
        assert_eq!(s.state(), LoopState::Idle);
        assert!(!s.is_drawing());
    }

    #[test]
    fn touch_begin_activates_within_one_transition() {
        // End-to-end scenario: touch-begin on an idle canvas wakes the loop.
        let mut s = FrameScheduler::new();
        s.wake();
        assert_eq!(s.state(), LoopState::Active);
    }

    #[test]
    fn stays_active_across_frames_while_drawing() {
        let mut s = FrameScheduler::new();
        s.wake();
        assert_eq!(s.frame_finished(), LoopState::Active);
        assert_eq!(s.frame_finished(), LoopState::Active);
    }

    #[test]
    fn idles_on_first_frame_after_stroke_end() {
        let mut s = FrameScheduler::new();
        s.wake();
        s.frame_finished();
        s.stroke_ended();
        assert_eq!(s.frame_finished(), LoopState::Idle);
        assert!(!s.is_active());
    }
}
