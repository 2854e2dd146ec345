//! # Periodic Data Refreshers
//!
//! One refresher per upstream source, each on its own timer. A tick fetches,
//! normalizes and publishes; a failed tick logs and leaves the published value
//! alone. There is no fast retry: the next scheduled tick is the retry.

use crate::error::FetchError;
use crate::state::DisplayState;
use crate::transit::{StopPair, TransitClient};
use crate::weather::WeatherClient;
use chrono_tz::Tz;
use log::{debug, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Fetch → publish cycle on a fixed cadence.
#[derive(Debug, Clone)]
pub struct Refresher {
    name: &'static str,
    cadence: Duration,
}

impl Refresher {
    pub fn new(name: &'static str, cadence: Duration) -> Self {
        Self { name, cadence }
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    /// Run one fetch and publish the result if it succeeded.
    ///
    /// Returns whether anything was published.
    pub async fn refresh_once<T, F, Fut, P>(&self, fetch: &mut F, publish: &P) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
        P: Fn(T),
    {
        match fetch().await {
            Ok(value) => {
                publish(value);
                debug!("{} refresh published", self.name);
                true
            }
            Err(e) => {
                warn!("{} refresh failed, keeping previous data: {}", self.name, e);
                false
            }
        }
    }

    /// Refresh forever. The first fetch happens immediately.
    pub async fn run<T, F, Fut, P>(self, mut fetch: F, publish: P)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
        P: Fn(T),
    {
        let mut ticker = interval(self.cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.refresh_once(&mut fetch, &publish).await;
        }
    }
}

/// Keep `state`'s arrivals in step with the transit feed.
pub fn spawn_transit_refresher(
    client: TransitClient,
    stops: StopPair,
    tz: Tz,
    state: Arc<DisplayState>,
    cadence: Duration,
) -> JoinHandle<()> {
    let refresher = Refresher::new("transit", cadence);
    tokio::spawn(refresher.run(
        move || {
            let client = client.clone();
            let stops = stops.clone();
            async move { client.fetch_arrivals(&stops, tz).await }
        },
        move |arrivals| state.publish_arrivals(arrivals),
    ))
}

/// Keep `state`'s weather in step with the weather service.
pub fn spawn_weather_refresher(
    client: WeatherClient,
    state: Arc<DisplayState>,
    cadence: Duration,
) -> JoinHandle<()> {
    let refresher = Refresher::new("weather", cadence);
    tokio::spawn(refresher.run(
        move || {
            let client = client.clone();
            async move { client.fetch().await }
        },
        move |weather| state.publish_weather(weather),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_stub::{client, StubServer};
    use crate::transit::fixtures::{feed, stop, trip};
    use crate::{ArrivalInstant, Condition, WeatherSnapshot};
    use chrono::TimeZone;
    use chrono_tz::America::New_York;
    use prost::Message;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::timeout;

    fn snapshot(temp: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            current_temp: temp,
            feels_like: temp - 1.0,
            min_temp: temp - 2.0,
            max_temp: temp + 2.0,
            condition: Some(Condition::Rain),
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_weather() {
        let state = DisplayState::new();
        state.publish_weather(snapshot(18.0));
        let before = state.snapshot().weather;

        let refresher = Refresher::new("weather", Duration::from_secs(300));
        let mut failing = || async { Err::<WeatherSnapshot, _>(FetchError::MissingField("main")) };
        let published = refresher
            .refresh_once(&mut failing, &|w| state.publish_weather(w))
            .await;

        assert!(!published);
        assert_eq!(state.snapshot().weather, before);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_arrivals() {
        let state = DisplayState::new();
        let at = New_York.timestamp_opt(1_700_000_000, 0).unwrap();
        state.publish_arrivals(vec![ArrivalInstant::new(at)]);
        let before = state.snapshot().arrivals;

        let refresher = Refresher::new("transit", Duration::from_secs(60));
        let mut failing = || async {
            Err::<Vec<ArrivalInstant>, _>(FetchError::Status(reqwest::StatusCode::BAD_GATEWAY))
        };
        refresher
            .refresh_once(&mut failing, &|a| state.publish_arrivals(a))
            .await;

        assert_eq!(state.snapshot().arrivals, before);
    }

    #[tokio::test]
    async fn test_successful_fetch_publishes() {
        let state = DisplayState::new();
        let refresher = Refresher::new("weather", Duration::from_secs(300));
        let mut ok = || async { Ok(snapshot(21.0)) };

        assert!(
            refresher
                .refresh_once(&mut ok, &|w| state.publish_weather(w))
                .await
        );
        assert_eq!(state.snapshot().weather, Some(snapshot(21.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_on_cadence_and_survives_failures() {
        let state = Arc::new(DisplayState::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let refresher = Refresher::new("weather", Duration::from_secs(300));
        let handle = {
            let state = Arc::clone(&state);
            let calls = Arc::clone(&calls);
            tokio::spawn(refresher.run(
                move || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n == 1 {
                            Err(FetchError::MissingField("main"))
                        } else {
                            Ok(snapshot(n as f64))
                        }
                    }
                },
                move |w| state.publish_weather(w),
            ))
        };

        // Ticks at t=0, 300 (fails), 600
        tokio::time::sleep(Duration::from_secs(650)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(state.snapshot().weather, Some(snapshot(2.0)));

        handle.abort();
    }

    #[tokio::test]
    async fn test_spawned_transit_refresher_publishes_feed() {
        let body = feed(vec![trip(
            "1",
            vec![stop("A42N", 1_700_000_600), stop("A42N", 1_700_000_120)],
        )])
        .encode_to_vec();
        let server = StubServer::start(200, "application/x-protobuf", body).await;

        let state = Arc::new(DisplayState::new());
        let mut arrivals = state.subscribe_arrivals();
        let handle = spawn_transit_refresher(
            TransitClient::new(client(), server.url("/feed"), "mta-key"),
            StopPair::new("A42N", "A42S"),
            New_York,
            Arc::clone(&state),
            Duration::from_secs(3600),
        );

        timeout(Duration::from_secs(10), arrivals.changed())
            .await
            .unwrap()
            .unwrap();
        let epochs: Vec<i64> = state
            .snapshot()
            .arrivals
            .iter()
            .map(|a| a.at().timestamp())
            .collect();
        assert_eq!(epochs, vec![1_700_000_120, 1_700_000_600]);

        handle.abort();
    }

    #[tokio::test]
    async fn test_spawned_weather_refresher_publishes_snapshot() {
        let body = r#"{"main":{"temp":3.6,"feels_like":-1.2,"temp_min":2.0,"temp_max":5.0},"weather":[{"main":"Snow"}]}"#;
        let server = StubServer::start(200, "application/json", body.as_bytes().to_vec()).await;

        let state = Arc::new(DisplayState::new());
        let mut weather = state.subscribe_weather();
        let handle = spawn_weather_refresher(
            WeatherClient::new(client(), server.url("/weather"), "owm-key", 40.7, -74.0, "metric"),
            Arc::clone(&state),
            Duration::from_secs(3600),
        );

        timeout(Duration::from_secs(10), weather.changed())
            .await
            .unwrap()
            .unwrap();
        let published = state.snapshot().weather.unwrap();
        assert_eq!(published.current_temp, 3.6);
        assert_eq!(published.feels_like, -1.2);
        assert_eq!(published.condition, Some(Condition::Snow));

        handle.abort();
    }

    #[tokio::test]
    async fn test_spawned_refresher_keeps_state_on_error_status() {
        let mut server = StubServer::start(503, "text/plain", b"down".to_vec()).await;

        let state = Arc::new(DisplayState::new());
        state.publish_weather(snapshot(18.0));
        let handle = spawn_weather_refresher(
            WeatherClient::new(client(), server.url("/weather"), "owm-key", 40.7, -74.0, "metric"),
            Arc::clone(&state),
            Duration::from_secs(3600),
        );

        // The request was made; give the failed response time to be handled
        timeout(Duration::from_secs(10), server.next_request())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(state.snapshot().weather, Some(snapshot(18.0)));

        handle.abort();
    }
}
