//! Weather panel model and conversion from the provider's one-call payload

use crate::condition::Condition;
use crate::constants::FORECAST_DAYS;
use crate::error::FetchError;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// OpenWeather one-call response (metric units), only the fields we use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneCallResponse {
    pub current: CurrentWeather,
    #[serde(default)]
    pub daily: Vec<DailyWeather>,
    /// Seconds east of UTC for the requested location
    #[serde(default)]
    pub timezone_offset: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temp: f64,
    #[serde(default)]
    pub feels_like: Option<f64>,
    pub humidity: u8,
    /// Metres per second
    pub wind_speed: f64,
    #[serde(default)]
    pub weather: Vec<WeatherDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyWeather {
    /// Unix timestamp (seconds)
    pub dt: i64,
    pub temp: DailyTemperature,
    #[serde(default)]
    pub weather: Vec<WeatherDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTemperature {
    pub max: f64,
    pub min: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherDescription {
    pub main: String,
}

fn main_condition(weather: &[WeatherDescription]) -> Condition {
    Condition::from_provider(weather.first().map(|w| w.main.as_str()).unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub day: String,
    pub high: i32,
    pub low: i32,
    pub condition: Condition,
}

/// Current weather plus a five day forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: String,
    /// °C
    pub temperature: i32,
    /// °C
    pub feels_like: i32,
    pub condition: Condition,
    /// Percent
    pub humidity: u8,
    /// km/h
    pub wind_speed: i32,
    pub forecast: Vec<ForecastDay>,
}

impl WeatherSnapshot {
    /// Build a snapshot from a provider response.
    ///
    /// The daily list is cut to five entries; fewer than five is rejected.
    /// Day labels after "Tomorrow" are weekday names in `timezone` (an IANA
    /// name such as "Asia/Karachi"). An unknown name falls back to the
    /// provider's `timezone_offset`, then to UTC.
    pub fn from_one_call(
        location: String,
        timezone: &str,
        response: &OneCallResponse,
    ) -> Result<Self, FetchError> {
        if response.daily.len() < FORECAST_DAYS {
            return Err(FetchError::Payload(format!(
                "expected {} daily entries, got {}",
                FORECAST_DAYS,
                response.daily.len()
            )));
        }

        let zone = LocalZone::resolve(timezone, response.timezone_offset);

        let forecast = response
            .daily
            .iter()
            .take(FORECAST_DAYS)
            .enumerate()
            .map(|(index, daily)| {
                Ok(ForecastDay {
                    day: day_label(index, daily.dt, &zone)?,
                    high: daily.temp.max.round() as i32,
                    low: daily.temp.min.round() as i32,
                    condition: main_condition(&daily.weather),
                })
            })
            .collect::<Result<Vec<_>, FetchError>>()?;

        let current = &response.current;
        let temperature = current.temp.round() as i32;

        Ok(Self {
            location,
            temperature,
            feels_like: current
                .feels_like
                .map(|f| f.round() as i32)
                .unwrap_or(temperature + 2),
            condition: main_condition(&current.weather),
            humidity: current.humidity,
            wind_speed: (current.wind_speed * 3.6).round() as i32,
            forecast,
        })
    }
}

/// Timezone used to name forecast weekdays
#[derive(Debug, Clone, Copy)]
enum LocalZone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl LocalZone {
    fn resolve(timezone: &str, provider_offset: Option<i32>) -> Self {
        match timezone.parse::<Tz>() {
            Ok(tz) => Self::Named(tz),
            Err(_) => {
                debug!("Unknown timezone {:?}, using provider offset", timezone);
                Self::Fixed(
                    provider_offset
                        .and_then(FixedOffset::east_opt)
                        .unwrap_or_else(|| Utc.fix()),
                )
            }
        }
    }

    fn weekday(&self, utc: DateTime<Utc>) -> String {
        match self {
            Self::Named(tz) => utc.with_timezone(tz).format("%A").to_string(),
            Self::Fixed(offset) => utc.with_timezone(offset).format("%A").to_string(),
        }
    }
}

fn day_label(index: usize, dt: i64, zone: &LocalZone) -> Result<String, FetchError> {
    match index {
        0 => Ok("Today".to_string()),
        1 => Ok("Tomorrow".to_string()),
        _ => {
            let utc = DateTime::<Utc>::from_timestamp(dt, 0)
                .ok_or_else(|| FetchError::Payload(format!("invalid daily timestamp {}", dt)))?;
            Ok(zone.weekday(utc))
        }
    }
}

impl Default for WeatherSnapshot {
    /// Shown until the first successful fetch
    fn default() -> Self {
        let day = |day: &str, high, low, condition| ForecastDay {
            day: day.to_string(),
            high,
            low,
            condition,
        };

        Self {
            location: "Karachi, Pakistan".to_string(),
            temperature: 28,
            feels_like: 30,
            condition: Condition::Cloudy,
            humidity: 65,
            wind_speed: 12,
            forecast: vec![
                day("Today", 30, 24, Condition::Sunny),
                day("Tomorrow", 32, 26, Condition::Cloudy),
                day("Wednesday", 29, 23, Condition::Rain),
                day("Thursday", 31, 25, Condition::Sunny),
                day("Friday", 28, 22, Condition::Cloudy),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// 2024-01-01T12:00:00Z, a Monday
    const MONDAY_NOON: i64 = 1_704_110_400;
    const DAY: i64 = 86_400;

    fn response(days: usize, offset: Option<i32>) -> OneCallResponse {
        let daily: Vec<_> = (0..days)
            .map(|i| {
                json!({
                    "dt": MONDAY_NOON + i as i64 * DAY,
                    "temp": {"max": 30.6, "min": 21.4},
                    "weather": [{"main": if i % 2 == 0 { "Clear" } else { "Rain" }}]
                })
            })
            .collect();

        serde_json::from_value(json!({
            "current": {
                "temp": 27.5,
                "feels_like": 29.2,
                "humidity": 61,
                "wind_speed": 4.0,
                "weather": [{"main": "Clouds"}]
            },
            "daily": daily,
            "timezone_offset": offset,
        }))
        .unwrap()
    }

    #[test]
    fn test_snapshot_from_one_call() {
        let snapshot = WeatherSnapshot::from_one_call(
            "Lahore, PK".to_string(),
            "Asia/Karachi",
            &response(8, None),
        )
        .unwrap();

        assert_eq!(snapshot.location, "Lahore, PK");
        assert_eq!(snapshot.temperature, 28);
        assert_eq!(snapshot.feels_like, 29);
        assert_eq!(snapshot.humidity, 61);
        assert_eq!(snapshot.wind_speed, 14);
        assert_eq!(snapshot.condition, Condition::Cloudy);

        let labels: Vec<_> = snapshot.forecast.iter().map(|d| d.day.as_str()).collect();
        assert_eq!(labels, ["Today", "Tomorrow", "Wednesday", "Thursday", "Friday"]);
        assert_eq!(snapshot.forecast[0].high, 31);
        assert_eq!(snapshot.forecast[0].low, 21);
        assert_eq!(snapshot.forecast[0].condition, Condition::Sunny);
        assert_eq!(snapshot.forecast[1].condition, Condition::Rain);
    }

    /// 2024-01-03T22:00:00Z, Wednesday in UTC and Thursday 03:00 in Karachi
    const WEDNESDAY_LATE_UTC: i64 = 1_704_067_200 + 2 * DAY + 22 * 3600;

    #[test]
    fn test_weekday_in_location_timezone() {
        let mut resp = response(5, None);
        resp.daily[2].dt = WEDNESDAY_LATE_UTC;

        let karachi = "Karachi, PK".to_string();
        let snapshot = WeatherSnapshot::from_one_call(karachi, "Asia/Karachi", &resp).unwrap();
        assert_eq!(snapshot.forecast[2].day, "Thursday");

        let london = "London, GB".to_string();
        let snapshot = WeatherSnapshot::from_one_call(london, "Europe/London", &resp).unwrap();
        assert_eq!(snapshot.forecast[2].day, "Wednesday");
    }

    #[test]
    fn test_unknown_timezone_uses_provider_offset() {
        let mut resp = response(5, Some(5 * 3600));
        resp.daily[2].dt = WEDNESDAY_LATE_UTC;
        let snapshot = WeatherSnapshot::from_one_call("X".to_string(), "Not/AZone", &resp).unwrap();
        assert_eq!(snapshot.forecast[2].day, "Thursday");

        resp.timezone_offset = None;
        let snapshot = WeatherSnapshot::from_one_call("X".to_string(), "Not/AZone", &resp).unwrap();
        assert_eq!(snapshot.forecast[2].day, "Wednesday");
    }

    #[test]
    fn test_short_daily_list_rejected() {
        let result = WeatherSnapshot::from_one_call("X".to_string(), "UTC", &response(3, None));
        assert!(matches!(result, Err(FetchError::Payload(_))));
    }

    #[test]
    fn test_feels_like_fallback() {
        let mut resp = response(5, None);
        resp.current.feels_like = None;
        let snapshot = WeatherSnapshot::from_one_call("X".to_string(), "UTC", &resp).unwrap();
        assert_eq!(snapshot.feels_like, snapshot.temperature + 2);
    }

    #[test]
    fn test_default_has_five_days() {
        assert_eq!(WeatherSnapshot::default().forecast.len(), FORECAST_DAYS);
    }
}
