//! Geo/weather data pipeline
//!
//! Resolves the caller's location from an IP lookup, then fills the weather
//! panel for it. Both calls sit behind the TTL cache. Nothing here returns an
//! error: a failed IP lookup falls back to the default location with "N/A"
//! network fields, a failed weather fetch keeps whatever was shown before.

use crate::cache::{CacheStore, TtlCache};
use crate::constants::{IP_INFO_CACHE_KEY, IP_INFO_TTL, WEATHER_TTL, weather_cache_key};
use crate::error::FetchError;
use crate::location::{IpLookup, LocationInfo, NetworkInfo};
use crate::panels::DashboardState;
use crate::weather::{OneCallResponse, WeatherSnapshot};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

#[async_trait]
pub trait LocationSource {
    async fn lookup(&self) -> Result<IpLookup, FetchError>;
}

#[async_trait]
pub trait WeatherSource {
    /// Current conditions and daily forecast in metric units
    async fn one_call(&self, latitude: f64, longitude: f64) -> Result<OneCallResponse, FetchError>;
}

pub struct DataPipeline<L, W, S: CacheStore> {
    locations: L,
    weather: W,
    cache: TtlCache<S>,
    ip_info_ttl: Duration,
    weather_ttl: Duration,
}

impl<L, W, S> DataPipeline<L, W, S>
where
    L: LocationSource,
    W: WeatherSource,
    S: CacheStore,
{
    pub fn new(locations: L, weather: W, cache: TtlCache<S>) -> Self {
        Self {
            locations,
            weather,
            cache,
            ip_info_ttl: IP_INFO_TTL,
            weather_ttl: WEATHER_TTL,
        }
    }

    pub fn with_ttls(mut self, ip_info_ttl: Duration, weather_ttl: Duration) -> Self {
        self.ip_info_ttl = ip_info_ttl;
        self.weather_ttl = weather_ttl;
        self
    }

    pub fn cache(&self) -> &TtlCache<S> {
        &self.cache
    }

    /// Update location, network and weather panels in `state`
    pub async fn resolve_location_and_weather(&self, state: &mut DashboardState) {
        let (location, network) = self.resolve_location().await;
        info!("Location: {} ({})", location.label(), network.ip_address);

        state.location = location;
        state.network = network;

        match self.resolve_weather(&state.location).await {
            Some(snapshot) => state.weather = snapshot,
            None => debug!("Keeping previous weather for {}", state.weather.location),
        }
    }

    async fn resolve_location(&self) -> (LocationInfo, NetworkInfo) {
        if let Some(cached) = self.cache.get_as::<IpLookup>(IP_INFO_CACHE_KEY, self.ip_info_ttl) {
            match cached.resolve() {
                Ok(resolved) => {
                    debug!("Using cached IP info");
                    return resolved;
                }
                Err(e) => warn!("Cached IP info unusable: {}", e),
            }
        }

        let lookup = match self.locations.lookup().await {
            Ok(lookup) => lookup,
            Err(e) => {
                warn!("IP lookup failed, using default location: {}", e);
                return fallback_location();
            }
        };

        match lookup.resolve() {
            Ok(resolved) => {
                self.cache.put_as(IP_INFO_CACHE_KEY, &lookup);
                resolved
            }
            Err(e) => {
                warn!("IP lookup unusable, using default location: {}", e);
                fallback_location()
            }
        }
    }

    async fn resolve_weather(&self, location: &LocationInfo) -> Option<WeatherSnapshot> {
        let key = weather_cache_key(&location.city);

        if let Some(cached) = self.cache.get_as::<WeatherSnapshot>(&key, self.weather_ttl) {
            debug!("Using cached weather for {}", location.city);
            return Some(cached);
        }

        let response = match self.weather.one_call(location.latitude, location.longitude).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Weather fetch failed for {}: {}", location.city, e);
                return None;
            }
        };

        let snapshot =
            WeatherSnapshot::from_one_call(location.label(), &location.timezone, &response);
        match snapshot {
            Ok(snapshot) => {
                self.cache.put_as(&key, &snapshot);
                Some(snapshot)
            }
            Err(e) => {
                warn!("Weather payload for {} rejected: {}", location.city, e);
                None
            }
        }
    }
}

fn fallback_location() -> (LocationInfo, NetworkInfo) {
    (LocationInfo::default(), NetworkInfo::unavailable())
}
