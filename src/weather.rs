//! # Weather Fetching and Normalization
//!
//! Current conditions come from the OpenWeather "current weather" endpoint:
//!
//! ```json
//! {
//!   "main": { "temp": 21.4, "feels_like": 20.1, "temp_min": 19.0, "temp_max": 23.0 },
//!   "weather": [ { "main": "Clear" } ]
//! }
//! ```
//!
//! The four temperatures are the payload; if any is missing the whole fetch
//! fails. The condition is best-effort: a missing, empty or oddly shaped
//! `weather` list just means no icon.

use crate::error::FetchError;
use crate::{Condition, WeatherSnapshot};
use serde_json::Value;

/// Normalize a parsed current-weather response.
pub fn normalize(response: &Value) -> Result<WeatherSnapshot, FetchError> {
    let main = response.get("main").ok_or(FetchError::MissingField("main"))?;

    let field = |name: &'static str| {
        main.get(name)
            .and_then(Value::as_f64)
            .ok_or(FetchError::MissingField(name))
    };

    Ok(WeatherSnapshot {
        current_temp: field("temp")?,
        feels_like: field("feels_like")?,
        min_temp: field("temp_min")?,
        max_temp: field("temp_max")?,
        condition: condition(response),
    })
}

/// Parse and normalize a raw JSON body.
pub fn parse_weather(body: &str) -> Result<WeatherSnapshot, FetchError> {
    let response: Value = serde_json::from_str(body)?;
    normalize(&response)
}

fn condition(response: &Value) -> Option<Condition> {
    response
        .get("weather")?
        .as_array()?
        .first()?
        .get("main")?
        .as_str()
        .filter(|name| !name.is_empty())
        .map(Condition::from_name)
}

/// HTTP client for the current-weather endpoint.
#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    latitude: f64,
    longitude: f64,
    units: String,
}

impl WeatherClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        latitude: f64,
        longitude: f64,
        units: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            latitude,
            longitude,
            units: units.into(),
        }
    }

    /// Fetch current conditions for the configured location.
    pub async fn fetch(&self) -> Result<WeatherSnapshot, FetchError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("lat", self.latitude.to_string()),
                ("lon", self.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", self.units.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body: Value = response.json().await?;
        normalize(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_stub::{client, StubServer};
    use serde_json::json;

    fn weather_client(server: &StubServer) -> WeatherClient {
        WeatherClient::new(
            client(),
            server.url("/data/2.5/weather"),
            "owm-key",
            40.688986,
            -73.9861586,
            "metric",
        )
    }

    #[test]
    fn test_normalize_full_response() {
        let snapshot = parse_weather(
            r#"{"main":{"temp":21.4,"feels_like":20.1,"temp_min":19.0,"temp_max":23.0},"weather":[{"main":"Clear"}]}"#,
        )
        .unwrap();

        assert_eq!(snapshot.current_temp, 21.4);
        assert_eq!(snapshot.feels_like, 20.1);
        assert_eq!(snapshot.min_temp, 19.0);
        assert_eq!(snapshot.max_temp, 23.0);
        assert_eq!(snapshot.condition, Some(Condition::Clear));
    }

    #[test]
    fn test_condition_is_best_effort() {
        let temps = json!({"temp": 1, "feels_like": -2, "temp_min": 0, "temp_max": 3});

        for weather in [
            None,
            Some(json!([])),
            Some(json!("Clear")),
            Some(json!([{"description": "sunny"}])),
            Some(json!([{"main": 7}])),
            Some(json!([{"main": ""}])),
        ] {
            let mut response = json!({ "main": temps });
            if let Some(weather) = weather {
                response["weather"] = weather;
            }
            let snapshot = normalize(&response).unwrap();
            assert_eq!(snapshot.condition, None, "response {response}");
            assert_eq!(snapshot.current_temp, 1.0);
        }
    }

    #[test]
    fn test_unknown_condition_kept_by_name() {
        let response = json!({
            "main": {"temp": 5.0, "feels_like": 4.0, "temp_min": 3.0, "temp_max": 6.0},
            "weather": [{"main": "Mist"}, {"main": "Rain"}]
        });
        let snapshot = normalize(&response).unwrap();
        assert_eq!(snapshot.condition, Some(Condition::Other("Mist".to_string())));
    }

    #[test]
    fn test_missing_temperature_is_hard_failure() {
        let response = json!({
            "main": {"temp": 5.0, "feels_like": 4.0, "temp_min": 3.0},
            "weather": [{"main": "Rain"}]
        });
        assert!(matches!(
            normalize(&response),
            Err(FetchError::MissingField("temp_max"))
        ));

        assert!(matches!(
            normalize(&json!({"weather": []})),
            Err(FetchError::MissingField("main"))
        ));

        let non_numeric = json!({
            "main": {"temp": "warm", "feels_like": 4.0, "temp_min": 3.0, "temp_max": 6.0}
        });
        assert!(matches!(
            normalize(&non_numeric),
            Err(FetchError::MissingField("temp"))
        ));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(parse_weather("<html>"), Err(FetchError::Json(_))));
    }

    #[tokio::test]
    async fn test_fetch_sends_location_and_key() {
        let body = json!({
            "main": {"temp": 21.4, "feels_like": 20.1, "temp_min": 19.0, "temp_max": 23.0},
            "weather": [{"main": "Clouds"}]
        });
        let mut server =
            StubServer::start(200, "application/json", body.to_string().into_bytes()).await;

        let snapshot = weather_client(&server).fetch().await.unwrap();
        assert_eq!(snapshot.current_temp, 21.4);
        assert_eq!(snapshot.condition, Some(Condition::Clouds));

        let request = server.next_request().await;
        let line = request.lines().next().unwrap();
        assert!(line.starts_with("get /data/2.5/weather?"), "{line}");
        for param in ["lat=40.688986", "lon=-73.9861586", "appid=owm-key", "units=metric"] {
            assert!(line.contains(param), "{param} missing from {line}");
        }
    }

    #[tokio::test]
    async fn test_fetch_maps_error_status() {
        let server = StubServer::start(503, "application/json", b"{}".to_vec()).await;

        let err = weather_client(&server).fetch().await.unwrap_err();
        assert!(
            matches!(err, FetchError::Status(s) if s == reqwest::StatusCode::SERVICE_UNAVAILABLE),
            "{err}"
        );
    }

    #[tokio::test]
    async fn test_fetch_missing_temperature_fails() {
        let body = json!({"main": {"temp": 5.0}, "weather": [{"main": "Rain"}]});
        let server =
            StubServer::start(200, "application/json", body.to_string().into_bytes()).await;

        let err = weather_client(&server).fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::MissingField("feels_like")));
    }
}
