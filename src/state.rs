//! # Shared Display State
//!
//! The latest arrivals and weather, written by the two refreshers and read by
//! the render loop. Each field sits behind its own `watch` channel, so a
//! publish swaps the whole value in one step: a reader sees either the old
//! value or the new one, never a mixture.

use crate::{ArrivalInstant, WeatherSnapshot};
use std::sync::Arc;
use tokio::sync::watch;

/// Everything the renderer needs, as of one instant.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Ascending; may contain instants that have since passed
    pub arrivals: Arc<[ArrivalInstant]>,
    pub weather: Option<WeatherSnapshot>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            arrivals: Arc::from(Vec::new()),
            weather: None,
        }
    }
}

/// Latest published data. Starts empty and lives for the whole process.
#[derive(Debug)]
pub struct DisplayState {
    arrivals: watch::Sender<Arc<[ArrivalInstant]>>,
    weather: watch::Sender<Option<WeatherSnapshot>>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayState {
    pub fn new() -> Self {
        let (arrivals, _) = watch::channel(Arc::<[ArrivalInstant]>::from(Vec::new()));
        let (weather, _) = watch::channel(None);
        Self { arrivals, weather }
    }

    /// Replace the arrival list. Never merges with the previous list.
    pub fn publish_arrivals(&self, arrivals: Vec<ArrivalInstant>) {
        self.arrivals.send_replace(Arc::from(arrivals));
    }

    /// Replace the weather snapshot.
    pub fn publish_weather(&self, weather: WeatherSnapshot) {
        self.weather.send_replace(Some(weather));
    }

    /// Current value of both fields.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            arrivals: Arc::clone(&self.arrivals.borrow()),
            weather: self.weather.borrow().clone(),
        }
    }

    pub fn subscribe_arrivals(&self) -> watch::Receiver<Arc<[ArrivalInstant]>> {
        self.arrivals.subscribe()
    }

    pub fn subscribe_weather(&self) -> watch::Receiver<Option<WeatherSnapshot>> {
        self.weather.subscribe()
    }
}
