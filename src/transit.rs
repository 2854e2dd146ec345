//! # Transit Feed Fetching and Arrival Extraction
//!
//! The feed is a GTFS-realtime `FeedMessage` served as protobuf over HTTP:
//!
//! ```text
//! FeedMessage
//!   └─ entity[]            (one per trip)
//!        └─ trip_update?
//!             └─ stop_time_update[]
//!                  ├─ stop_id        "A42N"
//!                  └─ arrival.time   epoch seconds
//! ```
//!
//! Only the arrival times for the monitored platform survive extraction. The
//! opposite-direction platform at the same station is recognised so that its
//! records are accounted for in the logs, but it is not shown.

use crate::error::FetchError;
use crate::ArrivalInstant;
use chrono::TimeZone;
use chrono_tz::Tz;
use gtfs_rt::FeedMessage;
use log::debug;
use prost::Message;

/// The two platforms of the monitored station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopPair {
    /// Platform whose arrivals are displayed
    pub monitored: String,
    /// Same station, other direction
    pub opposite: String,
}

impl StopPair {
    pub fn new(monitored: impl Into<String>, opposite: impl Into<String>) -> Self {
        Self {
            monitored: monitored.into(),
            opposite: opposite.into(),
        }
    }
}

/// Pull the monitored platform's arrivals out of a decoded feed.
///
/// Entities without a trip update, trip updates without stop-time updates and
/// stop-time updates without an arrival time are skipped. Duplicates are kept;
/// the result is sorted ascending and converted into `tz`.
pub fn extract_arrivals(feed: &FeedMessage, stops: &StopPair, tz: Tz) -> Vec<ArrivalInstant> {
    let mut arrivals = Vec::new();
    let mut opposite_seen = 0usize;

    let stop_time_updates = feed
        .entity
        .iter()
        .filter_map(|entity| entity.trip_update.as_ref())
        .flat_map(|trip_update| trip_update.stop_time_update.iter());

    for stop in stop_time_updates {
        let Some(stop_id) = stop.stop_id.as_deref() else {
            continue;
        };

        if stop_id == stops.monitored {
            let Some(epoch) = stop.arrival.as_ref().and_then(|event| event.time) else {
                continue;
            };
            if let Some(at) = tz.timestamp_opt(epoch, 0).single() {
                arrivals.push(ArrivalInstant::new(at));
            }
        } else if stop_id == stops.opposite {
            opposite_seen += 1;
        }
    }

    arrivals.sort();

    debug!(
        "Feed had {} arrivals for {} ({} for {} not shown)",
        arrivals.len(),
        stops.monitored,
        opposite_seen,
        stops.opposite
    );

    arrivals
}

/// Decode a raw GTFS-realtime protobuf body.
pub fn decode_feed(body: &[u8]) -> Result<FeedMessage, FetchError> {
    Ok(FeedMessage::decode(body)?)
}

/// HTTP client for the real-time transit feed.
#[derive(Clone)]
pub struct TransitClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl TransitClient {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Download and decode the current feed.
    ///
    /// # Errors
    /// - [`FetchError::Http`] on network failure
    /// - [`FetchError::Status`] on a non-2xx response
    /// - [`FetchError::Decode`] if the body is not a feed message
    pub async fn fetch_feed(&self) -> Result<FeedMessage, FetchError> {
        let response = self
            .http
            .get(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        decode_feed(&body)
    }

    /// Fetch the feed and extract the monitored platform's arrivals.
    pub async fn fetch_arrivals(
        &self,
        stops: &StopPair,
        tz: Tz,
    ) -> Result<Vec<ArrivalInstant>, FetchError> {
        let feed = self.fetch_feed().await?;
        Ok(extract_arrivals(&feed, stops, tz))
    }
}
