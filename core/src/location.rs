//! Location and network information derived from the IP lookup

use crate::constants::NOT_AVAILABLE;
use crate::error::FetchError;
use serde::{Deserialize, Serialize};

/// Raw IP lookup payload (ip-api.com field names)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpLookup {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub isp: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl IpLookup {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Validate the payload and split it into location and network parts
    pub fn resolve(&self) -> Result<(LocationInfo, NetworkInfo), FetchError> {
        if !self.is_success() {
            let reason = self
                .message
                .clone()
                .unwrap_or_else(|| format!("status {:?}", self.status));
            return Err(FetchError::LookupFailed(reason));
        }

        let missing = |field: &str| FetchError::Payload(format!("missing field {}", field));

        let city = self.city.clone().filter(|c| !c.is_empty()).ok_or_else(|| missing("city"))?;
        let country_code = self
            .country_code
            .clone()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| missing("countryCode"))?;
        let latitude = self.lat.ok_or_else(|| missing("lat"))?;
        let longitude = self.lon.ok_or_else(|| missing("lon"))?;

        let location = LocationInfo {
            city,
            country_code,
            latitude,
            longitude,
            timezone: self
                .timezone
                .clone()
                .unwrap_or_else(|| LocationInfo::default().timezone),
        };

        let network = NetworkInfo::resolved(
            self.isp.as_deref().unwrap_or(NOT_AVAILABLE),
            self.query.as_deref().unwrap_or(NOT_AVAILABLE),
        );

        Ok((location, network))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub city: String,
    pub country_code: String,
    pub latitude: f64,
    pub longitude: f64,
    /// IANA identifier, e.g. "Asia/Karachi"
    pub timezone: String,
}

impl LocationInfo {
    /// "City, CC"
    pub fn label(&self) -> String {
        format!("{}, {}", self.city, self.country_code)
    }
}

impl Default for LocationInfo {
    fn default() -> Self {
        Self {
            city: "Karachi".to_string(),
            country_code: "PK".to_string(),
            latitude: 24.8607,
            longitude: 67.0011,
            timezone: "Asia/Karachi".to_string(),
        }
    }
}

/// Network diagnostics panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub isp: String,
    pub ip_address: String,
    pub connection_type: String,
    pub dns_server: String,
    pub packet_loss_pct: f64,
    pub mtu: u16,
    pub quality: String,
    pub server_distance_km: u32,
}

impl NetworkInfo {
    pub fn resolved(isp: &str, ip_address: &str) -> Self {
        Self {
            isp: isp.to_string(),
            ip_address: ip_address.to_string(),
            ..Self::default()
        }
    }

    /// ISP and IP could not be determined
    pub fn unavailable() -> Self {
        Self::resolved(NOT_AVAILABLE, NOT_AVAILABLE)
    }

    pub fn ip_version_label(&self) -> &'static str {
        if self.ip_address == NOT_AVAILABLE {
            "Not Connected"
        } else if self.ip_address.contains(':') {
            "IPv6 Connected"
        } else {
            "IPv4 Connected"
        }
    }
}

impl Default for NetworkInfo {
    fn default() -> Self {
        Self {
            isp: NOT_AVAILABLE.to_string(),
            ip_address: NOT_AVAILABLE.to_string(),
            connection_type: "Fiber".to_string(),
            dns_server: "8.8.8.8".to_string(),
            packet_loss_pct: 0.0,
            mtu: 1500,
            quality: "Excellent".to_string(),
            server_distance_km: 12,
        }
    }
}
