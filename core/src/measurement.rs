//! Speed test measurement data structures

use crate::constants::{DOWNLOAD_PHASE_END, LATENCY_PHASE_END, TOTAL_STEPS};
use serde::{Deserialize, Serialize};

/// Values shown in the speed test panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    /// Download bandwidth in Mbps
    pub download: f64,

    /// Upload bandwidth in Mbps
    pub upload: f64,

    /// Latency in milliseconds
    pub latency: f64,

    /// Jitter in milliseconds
    pub jitter: f64,

    /// Progress of the current run, 0..=100
    pub progress: u8,
}

impl MeasurementResult {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Sequencer state machine position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Latency,
    Download,
    Upload,
    Done,
}

impl Phase {
    /// Phase a given step belongs to. Step 100 is the last upload step;
    /// `Done` is entered only after it has been applied.
    pub fn for_step(step: u8) -> Self {
        match step {
            s if s <= LATENCY_PHASE_END => Phase::Latency,
            s if s <= DOWNLOAD_PHASE_END => Phase::Download,
            s if s <= TOTAL_STEPS => Phase::Upload,
            _ => Phase::Done,
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, Phase::Latency | Phase::Download | Phase::Upload)
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Latency => "Measuring latency",
            Phase::Download => "Testing download",
            Phase::Upload => "Testing upload",
            Phase::Done => "Complete",
        }
    }
}
