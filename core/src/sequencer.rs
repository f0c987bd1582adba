//! Simulated speed test sequencer
//!
//! Drives the speed test panel through Idle -> Latency -> Download -> Upload -> Done.
//! No traffic is generated: each step sleeps for `duration / 100` and then
//! updates the displayed values from a per-run [`RunPlan`].
//!
//! Only one run may be in flight. A run can be aborted with
//! [`Sequencer::cancel`]; dropping the run future has the same effect on the
//! published state.

use crate::constants::*;
use crate::error::SequencerError;
use crate::measurement::{MeasurementResult, Phase};
use rand::Rng;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Cancellation signal shared between a run and whoever may abort it
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Whether both tokens belong to the same run
    pub fn same_run(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.tx, &other.tx)
    }

    /// Resolves once `cancel` has been called (immediately if it already was)
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Random values drawn once at the start of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunPlan {
    pub latency: f64,
    pub jitter: f64,
    pub download_ceiling: f64,
    pub upload_ceiling: f64,
}

impl RunPlan {
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            latency: rng.gen_range(LATENCY_RANGE_MS.0..=LATENCY_RANGE_MS.1),
            jitter: rng.gen_range(JITTER_RANGE_MS.0..=JITTER_RANGE_MS.1),
            download_ceiling: rng
                .gen_range(DOWNLOAD_CEILING_RANGE_MBPS.0..=DOWNLOAD_CEILING_RANGE_MBPS.1),
            upload_ceiling: rng
                .gen_range(UPLOAD_CEILING_RANGE_MBPS.0..=UPLOAD_CEILING_RANGE_MBPS.1),
        }
    }
}

/// What subscribers see after every step
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SequencerSnapshot {
    pub phase: Phase,
    pub result: MeasurementResult,
}

/// Apply a single step (0..=100) of the sequence to `result`
pub fn apply_step(result: &mut MeasurementResult, step: u8, plan: &RunPlan) {
    if step == 0 {
        result.reset();
        return;
    }

    result.progress = step.min(TOTAL_STEPS);

    match Phase::for_step(step) {
        Phase::Latency => {
            if step == LATENCY_PHASE_END {
                result.latency = plan.latency;
                result.jitter = plan.jitter;
            }
        }
        Phase::Download => {
            result.download = interpolate(
                step,
                LATENCY_PHASE_END,
                DOWNLOAD_PHASE_END,
                DOWNLOAD_FLOOR_MBPS,
                plan.download_ceiling,
            );
        }
        Phase::Upload => {
            result.upload = interpolate(
                step,
                DOWNLOAD_PHASE_END,
                UPLOAD_PHASE_END,
                UPLOAD_FLOOR_MBPS,
                plan.upload_ceiling,
            );
        }
        Phase::Idle | Phase::Done => {}
    }
}

/// Linear ramp from `floor` to `ceiling` over the steps `(start, end]`.
/// The last step returns `ceiling` exactly.
fn interpolate(step: u8, start: u8, end: u8, floor: f64, ceiling: f64) -> f64 {
    if step >= end {
        return ceiling;
    }
    let fraction = f64::from(step - start) / f64::from(end - start);
    floor + (ceiling - floor) * fraction
}

pub struct Sequencer {
    step_delay: Duration,
    active: Mutex<Option<CancelToken>>,
    state: watch::Sender<SequencerSnapshot>,
}

impl Sequencer {
    pub fn new(duration: Duration) -> Self {
        let (state, _rx) = watch::channel(SequencerSnapshot::default());
        Self {
            step_delay: duration / u32::from(TOTAL_STEPS),
            active: Mutex::new(None),
            state,
        }
    }

    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    pub fn subscribe(&self) -> watch::Receiver<SequencerSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SequencerSnapshot {
        *self.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.lock_active().is_some()
    }

    /// Abort the in-flight run, if any. The slot is free again on return.
    pub fn cancel(&self) {
        let Some(token) = self.lock_active().take() else {
            return;
        };
        info!("Cancelling speed test");
        token.cancel();
        self.reset_phase();
    }

    /// Run a full speed test with freshly drawn random values
    pub async fn run_measurement(&self) -> Result<MeasurementResult, SequencerError> {
        let plan = RunPlan::draw(&mut rand::thread_rng());
        self.run_with_plan(plan).await
    }

    pub async fn run_with_plan(&self, plan: RunPlan) -> Result<MeasurementResult, SequencerError> {
        let token = self.claim()?;
        let _guard = ActiveRun {
            sequencer: self,
            token: token.clone(),
        };

        info!("Starting speed test ({:?} per step)", self.step_delay);
        debug!("Run plan: {:?}", plan);

        let mut result = MeasurementResult::default();
        self.publish(Phase::Latency, result);

        for step in 0..=TOTAL_STEPS {
            if step > 0 {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep(self.step_delay) => {}
                }
                // A cancelled run must not publish over a newer one
                if token.is_cancelled() {
                    debug!("Speed test cancelled at step {}", step);
                    return Err(SequencerError::Cancelled);
                }
            }
            apply_step(&mut result, step, &plan);
            self.publish(Phase::for_step(step), result);
        }

        self.publish(Phase::Done, result);
        info!(
            "Speed test complete: download={:.1} Mbps, upload={:.1} Mbps, latency={:.0}ms, jitter={:.1}ms",
            result.download, result.upload, result.latency, result.jitter
        );

        Ok(result)
    }

    fn claim(&self) -> Result<CancelToken, SequencerError> {
        let mut active = self.lock_active();
        if active.is_some() {
            return Err(SequencerError::AlreadyRunning);
        }
        let token = CancelToken::new();
        *active = Some(token.clone());
        Ok(token)
    }

    fn reset_phase(&self) {
        self.state.send_modify(|snapshot| {
            if snapshot.phase.is_running() {
                snapshot.phase = Phase::Idle;
            }
        });
    }

    fn publish(&self, phase: Phase, result: MeasurementResult) {
        self.state.send_replace(SequencerSnapshot { phase, result });
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<CancelToken>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(Duration::from_millis(TEST_DURATION_MS))
    }
}

/// Releases the in-flight slot when a run ends, however it ends.
/// Leaves the slot alone once it belongs to a newer run.
struct ActiveRun<'a> {
    sequencer: &'a Sequencer,
    token: CancelToken,
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        let mut active = self.sequencer.lock_active();
        if active.as_ref().is_some_and(|t| t.same_run(&self.token)) {
            *active = None;
            drop(active);
            self.sequencer.reset_phase();
        }
    }
}
