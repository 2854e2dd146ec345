//! # Subway Board Core Library
//!
//! This library provides the data model and the refresh/render machinery for a
//! 64×32 RGB LED matrix that shows the next trains at one platform alongside
//! the current weather. It is built for a single unattended installation: one
//! stop, one location, running until the power goes out.
//!
//! ## Design Philosophy
//!
//! ### Independent Cadences
//! - **Transit**: the real-time feed is polled every 60 seconds
//! - **Weather**: current conditions are polled every 5 minutes
//! - **Display**: the matrix is repainted every 30 seconds from whatever was
//!   last published, never waiting on either source
//!
//! ### Absolute Arrival Times
//! Arrivals are stored as absolute, time-zone-aware instants rather than
//! "minutes away". The countdown is recomputed on every paint, so a transit
//! refresh that is a minute late still yields correct numbers, and trains that
//! have already left simply drop off the board.
//!
//! ### Data Flow
//! 1. **Fetch**: GTFS-realtime feed / OpenWeather JSON over HTTP
//! 2. **Normalize**: feed entities → sorted [`ArrivalInstant`]s, JSON → [`WeatherSnapshot`]
//! 3. **Publish**: whole-value replace into [`state::DisplayState`]
//! 4. **Render**: snapshot → [`frame::Frame`] → [`frame::PixelSink`]
//!
//! ## Core Types
//! - [`ArrivalInstant`]: when a train is predicted at the monitored platform
//! - [`WeatherSnapshot`]: current/feels-like/min/max temperature plus condition
//! - [`Condition`]: the coarse weather condition used to pick an icon

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

// Module declarations
pub mod assets;
pub mod clock;
pub mod config;
pub mod error;
pub mod frame;
#[cfg(test)]
pub(crate) mod http_stub;
pub mod refresher;
pub mod render_loop;
pub mod renderer;
pub mod state;
pub mod transit;
pub mod weather;

/// Predicted arrival of a train at the monitored platform.
///
/// Produced by [`transit::extract_arrivals`] from the raw feed and never
/// mutated afterwards; each transit refresh replaces the whole set.
///
/// # Example
/// ```
/// use chrono::TimeZone;
/// use chrono_tz::America::New_York;
/// use subway_board_lib::ArrivalInstant;
///
/// let at = New_York.with_ymd_and_hms(2024, 3, 1, 8, 15, 0).unwrap();
/// let arrival = ArrivalInstant::new(at);
/// assert_eq!(arrival.at(), at);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArrivalInstant(DateTime<Tz>);

impl ArrivalInstant {
    pub fn new(at: DateTime<Tz>) -> Self {
        Self(at)
    }

    /// The predicted arrival time in the target time zone.
    pub fn at(&self) -> DateTime<Tz> {
        self.0
    }
}

/// Coarse weather condition as reported by the `weather[0].main` field.
///
/// The four named conditions are the ones an icon ships for. Anything else the
/// upstream service reports ("Mist", "Drizzle", ...) is carried as `Other` so
/// that an icon dropped into the asset directory under the same name is still
/// picked up.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Clouds,
    Rain,
    Clear,
    Snow,
    Other(String),
}

impl Condition {
    /// Map an upstream condition name to a [`Condition`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "Clouds" => Condition::Clouds,
            "Rain" => Condition::Rain,
            "Clear" => Condition::Clear,
            "Snow" => Condition::Snow,
            other => Condition::Other(other.to_string()),
        }
    }

    /// Upstream spelling of the condition.
    pub fn name(&self) -> &str {
        match self {
            Condition::Clouds => "Clouds",
            Condition::Rain => "Rain",
            Condition::Clear => "Clear",
            Condition::Snow => "Snow",
            Condition::Other(name) => name,
        }
    }

    /// File stem of the icon asset for this condition (`clear` → `img/clear.png`).
    pub fn icon_key(&self) -> String {
        self.name().to_lowercase()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Current conditions from one successful weather fetch, in °C.
///
/// Temperatures are kept at full precision; rounding happens at render time.
///
/// # Example
/// ```
/// use subway_board_lib::{Condition, WeatherSnapshot};
///
/// let snapshot = WeatherSnapshot {
///     current_temp: 21.4,
///     feels_like: 20.1,
///     min_temp: 19.0,
///     max_temp: 23.0,
///     condition: Some(Condition::Clear),
/// };
/// assert_eq!(snapshot.condition.unwrap().icon_key(), "clear");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub current_temp: f64,
    pub feels_like: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    /// Absent when the response carried no usable `weather` list
    pub condition: Option<Condition>,
}
