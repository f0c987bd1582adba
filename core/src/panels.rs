//! Presentational state for the dashboard panels

use crate::location::{LocationInfo, NetworkInfo};
use crate::ping::PingSample;
use crate::sequencer::SequencerSnapshot;
use crate::weather::WeatherSnapshot;
use serde::Serialize;

/// Data usage monitor figures. These are fixed display values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataUsage {
    pub today_gb: f64,
    pub today_limit_pct: u8,
    pub monthly_gb: f64,
    pub monthly_limit_pct: u8,
    pub downloaded_gb: f64,
    pub uploaded_gb: f64,
    pub sessions: u32,
    pub online_hours: f64,
}

impl Default for DataUsage {
    fn default() -> Self {
        Self {
            today_gb: 2.4,
            today_limit_pct: 60,
            monthly_gb: 45.2,
            monthly_limit_pct: 75,
            downloaded_gb: 1.2,
            uploaded_gb: 1.2,
            sessions: 156,
            online_hours: 8.5,
        }
    }
}

/// Everything the renderer shows. Fields are replaced wholesale.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardState {
    pub location: LocationInfo,
    pub network: NetworkInfo,
    pub weather: WeatherSnapshot,
    pub ping: Vec<PingSample>,
    pub usage: DataUsage,
    pub speed_test: SequencerSnapshot,
}
