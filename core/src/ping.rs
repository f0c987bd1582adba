//! Simulated ping panel
//!
//! No packets are sent; each host gets a random latency.

use crate::constants::{PING_HOSTS, PING_RANGE_MS};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingSample {
    pub host: String,
    pub latency_ms: u32,
}

pub fn simulate_ping_for_hosts() -> Vec<PingSample> {
    simulate_ping_with(&mut rand::thread_rng())
}

pub fn simulate_ping_with<R: Rng + ?Sized>(rng: &mut R) -> Vec<PingSample> {
    PING_HOSTS
        .iter()
        .map(|host| PingSample {
            host: host.to_string(),
            latency_ms: rng.gen_range(PING_RANGE_MS.0..=PING_RANGE_MS.1).round() as u32,
        })
        .collect()
}
