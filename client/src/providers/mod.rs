//! HTTP providers for the IP lookup and weather calls

use async_trait::async_trait;
use speedhub_core::{FetchError, IpLookup, LocationSource, OneCallResponse, WeatherSource};
use std::time::Duration;
use tracing::debug;

/// Fields requested from the IP lookup service
const IP_LOOKUP_FIELDS: &str = "status,message,countryCode,city,isp,query,lat,lon,timezone";

/// One-call sections we never display
const WEATHER_EXCLUDE: &str = "minutely,hourly,alerts";

/// Build the shared HTTP client. `None` leaves requests without a timeout.
pub fn build_http_client(timeout: Option<Duration>) -> Result<reqwest::Client, FetchError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("speedhub/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| FetchError::Transport(format!("Failed to create HTTP client: {}", e)))
}

fn transport(e: reqwest::Error) -> FetchError {
    FetchError::Transport(e.to_string())
}

fn check_status(response: &reqwest::Response) -> Result<(), FetchError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(FetchError::Status(response.status().as_u16()))
    }
}

/// ip-api.com style geolocation lookup of the caller's address
pub struct IpApiClient {
    client: reqwest::Client,
    url: String,
}

impl IpApiClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl LocationSource for IpApiClient {
    async fn lookup(&self) -> Result<IpLookup, FetchError> {
        debug!("Querying IP lookup: {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .query(&[("fields", IP_LOOKUP_FIELDS)])
            .send()
            .await
            .map_err(transport)?;

        check_status(&response)?;

        response
            .json::<IpLookup>()
            .await
            .map_err(|e| FetchError::Payload(e.to_string()))
    }
}

/// OpenWeather one-call client
pub struct OpenWeatherClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl OpenWeatherClient {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        api_key: Option<String>,
        api_key_env: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
            api_key_env: api_key_env.into(),
        }
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn one_call(&self, latitude: f64, longitude: f64) -> Result<OneCallResponse, FetchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| FetchError::MissingApiKey(self.api_key_env.clone()))?;

        debug!("Querying weather for {:.4},{:.4}", latitude, longitude);

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("exclude", WEATHER_EXCLUDE.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(transport)?;

        check_status(&response)?;

        response
            .json::<OneCallResponse>()
            .await
            .map_err(|e| FetchError::Payload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the request line
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut read = 0;
            loop {
                let n = socket.read(&mut buf[read..]).await.unwrap();
                read += n;
                if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let request = String::from_utf8_lossy(&buf[..read]).to_string();

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            request.lines().next().unwrap_or_default().to_string()
        });

        (format!("http://{}/json/", addr), handle)
    }

    #[tokio::test]
    async fn test_ip_lookup_success() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"status":"success","city":"Lahore","countryCode":"PK","lat":31.5,"lon":74.3,"isp":"XYZ","query":"1.2.3.4"}"#,
        )
        .await;

        let http = build_http_client(Some(Duration::from_secs(5))).unwrap();
        let client = IpApiClient::new(http, url);
        let lookup = client.lookup().await.unwrap();

        assert!(lookup.is_success());
        assert_eq!(lookup.city.as_deref(), Some("Lahore"));

        let request_line = server.await.unwrap();
        assert!(request_line.starts_with("GET /json/?fields=status%2Cmessage%2CcountryCode"));
    }

    #[tokio::test]
    async fn test_ip_lookup_http_error() {
        let (url, _server) = serve_once("503 Service Unavailable", "{}").await;
        let client = IpApiClient::new(build_http_client(None).unwrap(), url);

        assert!(matches!(client.lookup().await, Err(FetchError::Status(503))));
    }

    #[tokio::test]
    async fn test_ip_lookup_malformed_payload() {
        let (url, _server) = serve_once("200 OK", "[1, 2, 3]").await;
        let client = IpApiClient::new(build_http_client(None).unwrap(), url);

        assert!(matches!(client.lookup().await, Err(FetchError::Payload(_))));
    }

    #[tokio::test]
    async fn test_weather_request_parameters() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"current":{"temp":20.0,"humidity":50,"wind_speed":1.0,"weather":[{"main":"Clear"}]},"daily":[]}"#,
        )
        .await;

        let client = OpenWeatherClient::new(
            build_http_client(None).unwrap(),
            url,
            Some("test-key".to_string()),
            "OPENWEATHER_API_KEY",
        );
        let response = client.one_call(31.5, 74.3).await.unwrap();
        assert_eq!(response.current.humidity, 50);

        let request_line = server.await.unwrap();
        assert!(request_line.contains("lat=31.5"));
        assert!(request_line.contains("lon=74.3"));
        assert!(request_line.contains("exclude=minutely%2Chourly%2Calerts"));
        assert!(request_line.contains("appid=test-key"));
        assert!(request_line.contains("units=metric"));
    }

    #[tokio::test]
    async fn test_weather_without_api_key() {
        let client = OpenWeatherClient::new(
            build_http_client(None).unwrap(),
            "http://127.0.0.1:9/onecall",
            None,
            "OPENWEATHER_API_KEY",
        );

        match client.one_call(0.0, 0.0).await {
            Err(FetchError::MissingApiKey(var)) => assert_eq!(var, "OPENWEATHER_API_KEY"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
