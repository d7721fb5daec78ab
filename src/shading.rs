// ============================================================================
// SHADING CONTROLLER — single-flight, coalescing relief pipeline driver
// ============================================================================
//
// Concurrency contract:
//   * At most one relief run executes at a time (`busy`).
//   * A trigger that arrives while busy discards its own inputs and sets
//     `pending_rerun`; any number of such triggers collapse into exactly one
//     follow-up run started by the coordinator after completion, using state
//     current at that moment.
//   * Workers never touch controller state: they send their result over a
//     channel, and only `poll_completion` — called from the single
//     coordinating context — applies it.  No locks, by construction.
//   * A run is never cancelled; a stalled worker stalls only its own run.

use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread;

use image::RgbaImage;

use crate::relief;

/// What `trigger` did with an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A worker run was started.
    Started,
    /// A run is in flight; collapsed into one pending re-run.
    Deferred,
    /// Missing inputs — no-op, zero state change.
    Skipped,
}

/// What `poll_completion` observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingEvent {
    /// No completed run this poll.
    None,
    /// A run finished; the output (if the run produced one) was applied.
    Completed,
    /// A run finished AND triggers were coalesced while it ran: the
    /// coordinator should re-derive fresh inputs and trigger once more.
    RerunRequested,
}

pub struct ShadingController {
    busy: bool,
    pending_rerun: bool,
    /// Most recent completed composite, replaced wholesale on completion.
    output: Option<RgbaImage>,
    tx: Sender<Option<RgbaImage>>,
    rx: Receiver<Option<RgbaImage>>,
}

impl Default for ShadingController {
    fn default() -> Self {
        Self::new()
    }
}

impl ShadingController {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self {
            busy: false,
            pending_rerun: false,
            output: None,
            tx,
            rx,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn rerun_pending(&self) -> bool {
        self.pending_rerun
    }

    /// The latest completed relief composite, read-only to the host.
    pub fn output(&self) -> Option<&RgbaImage> {
        self.output.as_ref()
    }

    /// Request a relief run from a surface snapshot and shading image.
    ///
    /// While busy the specific trigger data is discarded: "pending" means
    /// "run again with current state", not "queue this exact request".
    pub fn trigger(
        &mut self,
        surface: Option<RgbaImage>,
        shading: Option<RgbaImage>,
    ) -> TriggerOutcome {
        if self.busy {
            self.pending_rerun = true;
            return TriggerOutcome::Deferred;
        }
        let (Some(surface), Some(shading)) = (surface, shading) else {
            return TriggerOutcome::Skipped;
        };
        self.start(move || relief::render_relief(&surface, &shading))
    }

    /// Spawn a worker for `job` and mark the controller busy.
    fn start(&mut self, job: impl FnOnce() -> Option<RgbaImage> + Send + 'static) -> TriggerOutcome {
        self.busy = true;
        let tx = self.tx.clone();
        thread::spawn(move || {
            // Receiver dropped means the controller is gone; nothing to do.
            let _ = tx.send(job());
        });
        TriggerOutcome::Started
    }

    /// Apply a completed run, if any.  Must be called from the coordinating
    /// context — it is the only mutator of the run state and the output.
    ///
    /// A run that produced no image (stage failure) publishes nothing; the
    /// previous output stays.  On `RerunRequested` the caller re-triggers
    /// with freshly derived inputs.
    pub fn poll_completion(&mut self) -> ShadingEvent {
        match self.rx.try_recv() {
            Ok(result) => {
                if let Some(img) = result {
                    self.output = Some(img);
                }
                self.busy = false;
                if std::mem::take(&mut self.pending_rerun) {
                    ShadingEvent::RerunRequested
                } else {
                    ShadingEvent::Completed
                }
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => ShadingEvent::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    fn white(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    /// Poll until a non-`None` event or the deadline.
    fn wait_for_event(ctl: &mut ShadingController) -> ShadingEvent {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let event = ctl.poll_completion();
            if event != ShadingEvent::None {
                return event;
            }
            assert!(Instant::now() < deadline, "no completion within deadline");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn missing_shading_image_is_a_noop() {
        let mut ctl = ShadingController::new();
        assert_eq!(ctl.trigger(Some(white(8, 8)), None), TriggerOutcome::Skipped);
        assert!(!ctl.is_busy());
        assert!(!ctl.rerun_pending());
        assert!(ctl.output().is_none());
    }

    #[test]
    fn missing_surface_is_a_noop() {
        let mut ctl = ShadingController::new();
        assert_eq!(ctl.trigger(None, Some(white(8, 8))), TriggerOutcome::Skipped);
        assert!(!ctl.is_busy());
    }

    #[test]
    fn single_run_replaces_output_exactly_once() {
        // End-to-end scenario: idle controller, valid inputs — busy goes
        // false → true → false and the output is published once.
        let mut ctl = ShadingController::new();
        assert!(!ctl.is_busy());
        assert_eq!(
            ctl.trigger(Some(white(16, 16)), Some(white(8, 8))),
            TriggerOutcome::Started
        );
        assert!(ctl.is_busy());
        assert_eq!(wait_for_event(&mut ctl), ShadingEvent::Completed);
        assert!(!ctl.is_busy());
        assert!(ctl.output().is_some());
        // Nothing further pending.
        assert_eq!(ctl.poll_completion(), ShadingEvent::None);
    }

    #[test]
    fn failed_stage_keeps_previous_output() {
        let mut ctl = ShadingController::new();
        ctl.trigger(Some(white(16, 16)), Some(white(8, 8)));
        assert_eq!(wait_for_event(&mut ctl), ShadingEvent::Completed);
        let first = ctl.output().unwrap().clone();

        // Zero-sized shading image makes the shade stage yield nothing.
        ctl.trigger(Some(white(16, 16)), Some(RgbaImage::new(0, 0)));
        assert_eq!(wait_for_event(&mut ctl), ShadingEvent::Completed);
        assert_eq!(ctl.output().unwrap(), &first);
    }

    #[test]
    fn triggers_while_busy_coalesce_into_one_rerun() {
        let mut ctl = ShadingController::new();

        // Hold the worker open with a gate so the busy window is
        // deterministic.
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        ctl.start(move || {
            gate_rx.recv().ok();
            Some(white(4, 4))
        });
        assert!(ctl.is_busy());

        // K = 3 triggers while busy: pending is set once, never double-set,
        // and their trigger data is discarded.
        for _ in 0..3 {
            assert_eq!(
                ctl.trigger(Some(white(4, 4)), Some(white(4, 4))),
                TriggerOutcome::Deferred
            );
            assert!(ctl.rerun_pending());
        }

        gate_tx.send(()).unwrap();
        assert_eq!(wait_for_event(&mut ctl), ShadingEvent::RerunRequested);
        assert!(!ctl.is_busy());
        assert!(!ctl.rerun_pending());

        // Exactly one follow-up: after the coordinator re-triggers and that
        // run completes, nothing else is pending.
        ctl.trigger(Some(white(4, 4)), Some(white(4, 4)));
        assert_eq!(wait_for_event(&mut ctl), ShadingEvent::Completed);
        assert_eq!(ctl.poll_completion(), ShadingEvent::None);
    }

    #[test]
    fn image_change_while_busy_defers_even_without_inputs() {
        // While busy the inputs are not inspected; the invocation only
        // records that a re-run is wanted.
        let mut ctl = ShadingController::new();
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        ctl.start(move || {
            gate_rx.recv().ok();
            None
        });
        assert_eq!(ctl.trigger(None, None), TriggerOutcome::Deferred);
        assert!(ctl.rerun_pending());
        gate_tx.send(()).unwrap();
        assert_eq!(wait_for_event(&mut ctl), ShadingEvent::RerunRequested);
    }
}
