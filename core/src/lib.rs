//! SpeedHub Core Library
//!
//! Shared definitions for the SpeedHub dashboard: the simulated speed test
//! sequencer, the TTL cache, weather/location models and the data pipeline
//! that fills the dashboard panels.

pub mod cache;
pub mod condition;
pub mod constants;
pub mod error;
pub mod location;
pub mod measurement;
pub mod panels;
pub mod pipeline;
pub mod ping;
pub mod sequencer;
pub mod weather;

pub use cache::{CacheStore, MemoryStore, TtlCache};
pub use condition::Condition;
pub use constants::*;
pub use error::{CacheError, FetchError, SequencerError};
pub use location::{IpLookup, LocationInfo, NetworkInfo};
pub use measurement::{MeasurementResult, Phase};
pub use panels::{DashboardState, DataUsage};
pub use pipeline::{DataPipeline, LocationSource, WeatherSource};
pub use ping::{PingSample, simulate_ping_for_hosts};
pub use sequencer::{CancelToken, RunPlan, Sequencer, SequencerSnapshot};
pub use weather::{ForecastDay, OneCallResponse, WeatherSnapshot};
