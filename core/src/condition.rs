//! Weather condition classification

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    Sunny,
    Cloudy,
    Rain,
    Snow,
}

impl Condition {
    /// Map a provider condition string (e.g. OpenWeather `weather[].main`).
    ///
    /// Matching is case-insensitive and by substring; anything unrecognised
    /// is reported as `Cloudy`.
    pub fn from_provider(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        let has = |needle: &str| lowered.contains(needle);

        if has("thunder") || has("drizzle") || has("rain") || has("shower") {
            Condition::Rain
        } else if has("snow") || has("sleet") {
            Condition::Snow
        } else if has("clear") || has("sun") {
            Condition::Sunny
        } else {
            Condition::Cloudy
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Sunny => "Sunny",
            Condition::Cloudy => "Cloudy",
            Condition::Rain => "Rain",
            Condition::Snow => "Snow",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_mapping() {
        assert_eq!(Condition::from_provider("THUNDERSTORM"), Condition::Rain);
        assert_eq!(Condition::from_provider("Drizzle"), Condition::Rain);
        assert_eq!(Condition::from_provider("Rain"), Condition::Rain);
        assert_eq!(Condition::from_provider("snow"), Condition::Snow);
        assert_eq!(Condition::from_provider("Clear"), Condition::Sunny);
        assert_eq!(Condition::from_provider("Clouds"), Condition::Cloudy);
    }

    #[test]
    fn test_unknown_is_cloudy() {
        assert_eq!(Condition::from_provider("Mist"), Condition::Cloudy);
        assert_eq!(Condition::from_provider("Haze"), Condition::Cloudy);
        assert_eq!(Condition::from_provider(""), Condition::Cloudy);
        assert_eq!(Condition::from_provider("Tornado"), Condition::Cloudy);
    }
}
