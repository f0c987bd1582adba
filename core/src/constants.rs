//! Dashboard constants: sequencer timing, simulated value ranges and cache policy

use std::time::Duration;

/// Total wall-clock length of one simulated speed test
pub const TEST_DURATION_MS: u64 = 10_000;

/// Number of steps the test duration is split into (progress 0..=100)
pub const TOTAL_STEPS: u8 = 100;

/// Last step of the latency/jitter phase
pub const LATENCY_PHASE_END: u8 = 20;

/// Last step of the download phase
pub const DOWNLOAD_PHASE_END: u8 = 60;

/// Last step of the upload phase
pub const UPLOAD_PHASE_END: u8 = TOTAL_STEPS;

pub const LATENCY_RANGE_MS: (f64, f64) = (5.0, 20.0);
pub const JITTER_RANGE_MS: (f64, f64) = (1.0, 5.0);

/// Download interpolation starts here (Mbps)
pub const DOWNLOAD_FLOOR_MBPS: f64 = 10.0;
pub const DOWNLOAD_CEILING_RANGE_MBPS: (f64, f64) = (150.0, 300.0);

/// Upload interpolation starts here (Mbps)
pub const UPLOAD_FLOOR_MBPS: f64 = 5.0;
pub const UPLOAD_CEILING_RANGE_MBPS: (f64, f64) = (50.0, 150.0);

/// Simulated ping latency range (ms)
pub const PING_RANGE_MS: (f64, f64) = (5.0, 25.0);

/// Hosts shown in the ping panel
pub const PING_HOSTS: [&str; 3] = ["Google DNS", "Cloudflare", "Local Server"];

/// Cache key for the IP lookup result
pub const IP_INFO_CACHE_KEY: &str = "ipInfo";

/// Prefix of the per-city weather cache key
pub const WEATHER_CACHE_PREFIX: &str = "weatherData_";

pub const IP_INFO_TTL: Duration = Duration::from_secs(60 * 60);
pub const WEATHER_TTL: Duration = Duration::from_secs(30 * 60);

/// Number of forecast days kept from the provider's daily list
pub const FORECAST_DAYS: usize = 5;

/// Placeholder for network fields we could not resolve
pub const NOT_AVAILABLE: &str = "N/A";

/// Build the weather cache key for a city
pub fn weather_cache_key(city: &str) -> String {
    format!("{}{}", WEATHER_CACHE_PREFIX, city)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_bounds_are_ordered() {
        assert!(LATENCY_PHASE_END < DOWNLOAD_PHASE_END);
        assert!(DOWNLOAD_PHASE_END < UPLOAD_PHASE_END);
        assert_eq!(UPLOAD_PHASE_END, 100);
    }

    #[test]
    fn test_weather_cache_key() {
        assert_eq!(weather_cache_key("Lahore"), "weatherData_Lahore");
    }
}
