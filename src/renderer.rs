//! # Board Layout and Rendering
//!
//! Composes one frame from a [`Snapshot`] on the 64×32 matrix:
//!
//! ```text
//!  ┌────────────────────────────────────────────────────────────────┐
//!  │ (A)  3,12,25                                  ← rows 0-9       │
//!  │ (☀)  21°   19° 23°                            ← rows 10-20     │
//!  └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Countdowns are recomputed from absolute arrival instants at paint time, so
//! the numbers stay right between transit refreshes and departed trains drop
//! off. A region with no data is left black.

use crate::assets::{Assets, FONT};
use crate::error::SinkError;
use crate::frame::{Frame, PixelSink};
use crate::state::Snapshot;
use crate::{ArrivalInstant, WeatherSnapshot};
use chrono::DateTime;
use chrono_tz::Tz;
use embedded_graphics::{
    image::Image, mono_font::MonoTextStyle, pixelcolor::Rgb888, prelude::*, text::Text,
};
use log::debug;

pub const COLOUR_YELLOW: Rgb888 = Rgb888::new(255, 255, 0);
pub const COLOUR_LIGHT_GRAY: Rgb888 = Rgb888::new(211, 211, 211);
pub const COLOUR_LIGHT_BLUE: Rgb888 = Rgb888::new(204, 255, 255);
pub const COLOUR_LIGHT_ORANGE: Rgb888 = Rgb888::new(255, 229, 204);

/// Most arrivals shown at once
pub const MAX_COUNTDOWNS: usize = 3;

const TRAIN_ICON_AT: Point = Point::new(1, 1);
const COUNTDOWN_AT: Point = Point::new(12, 8);
const WEATHER_ICON_AT: Point = Point::new(1, 11);
const TEMPS_AT: Point = Point::new(12, 18);

/// Horizontal advance per character when placing the next temperature
const TEMP_CHAR_ADVANCE: i32 = 5;
const GAP_AFTER_CURRENT: i32 = 6;
const GAP_AFTER_MIN: i32 = 3;

/// Whole minutes until each upcoming arrival, at most `limit` of them.
///
/// Arrivals before `now` are dropped. Minutes are floored, so a train 119 s
/// out reads 1 and one 120 s out reads 2.
pub fn countdown_minutes(arrivals: &[ArrivalInstant], now: DateTime<Tz>, limit: usize) -> Vec<i64> {
    arrivals
        .iter()
        .map(ArrivalInstant::at)
        .filter(|at| *at >= now)
        .map(|at| (at - now).num_seconds().div_euclid(60))
        .take(limit)
        .collect()
}

/// Countdown line as drawn on the board, e.g. `"3,12,25"`.
pub fn countdown_text(arrivals: &[ArrivalInstant], now: DateTime<Tz>) -> String {
    countdown_minutes(arrivals, now, MAX_COUNTDOWNS)
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Temperature rounded to the nearest degree, e.g. `21.4` → `"21°"`.
pub fn temperature_label(celsius: f64) -> String {
    format!("{}°", celsius.round() as i64)
}

/// Draws snapshots onto frames.
pub struct Renderer {
    assets: Assets,
}

impl Renderer {
    pub fn new(assets: Assets) -> Self {
        Self { assets }
    }

    /// Draw `snapshot` into `frame`.
    ///
    /// Returns `true` when both the arrivals and the weather region had data.
    /// Whatever is available is drawn either way.
    pub fn compose(&self, frame: &mut Frame, snapshot: &Snapshot, now: DateTime<Tz>) -> bool {
        let mut rendered_subway = false;
        let mut rendered_weather = false;

        if !snapshot.arrivals.is_empty() {
            self.draw_arrivals(frame, &snapshot.arrivals, now);
            rendered_subway = true;
        }

        if let Some(weather) = &snapshot.weather {
            self.draw_weather(frame, weather);
            rendered_weather = true;
        }

        rendered_subway && rendered_weather
    }

    /// Compose a fresh frame of `size`.
    pub fn render(&self, snapshot: &Snapshot, now: DateTime<Tz>, size: Size) -> (Frame, bool) {
        let mut frame = Frame::new(size.width, size.height);
        let complete = self.compose(&mut frame, snapshot, now);
        (frame, complete)
    }

    /// Compose a frame and present it on `sink`.
    pub fn render_to<S: PixelSink + ?Sized>(
        &self,
        sink: &mut S,
        snapshot: &Snapshot,
        now: DateTime<Tz>,
    ) -> Result<bool, SinkError> {
        let mut frame = sink.create_frame();
        let complete = self.compose(&mut frame, snapshot, now);
        sink.present(frame)?;
        debug!("Presented frame (fully rendered: {})", complete);
        Ok(complete)
    }

    fn draw_arrivals(&self, frame: &mut Frame, arrivals: &[ArrivalInstant], now: DateTime<Tz>) {
        let times = countdown_text(arrivals, now);

        Image::new(self.assets.train_icon(), TRAIN_ICON_AT)
            .draw(frame)
            .ok();

        Text::new(&times, COUNTDOWN_AT, MonoTextStyle::new(FONT, COLOUR_YELLOW))
            .draw(frame)
            .ok();
    }

    fn draw_weather(&self, frame: &mut Frame, weather: &WeatherSnapshot) {
        let curr_temp = temperature_label(weather.current_temp);
        let min_temp = temperature_label(weather.min_temp);
        let max_temp = temperature_label(weather.max_temp);

        let mut position = TEMPS_AT;
        Text::new(&curr_temp, position, MonoTextStyle::new(FONT, COLOUR_LIGHT_GRAY))
            .draw(frame)
            .ok();

        position.x += label_width(&curr_temp) + GAP_AFTER_CURRENT;
        Text::new(&min_temp, position, MonoTextStyle::new(FONT, COLOUR_LIGHT_BLUE))
            .draw(frame)
            .ok();

        position.x += label_width(&min_temp) + GAP_AFTER_MIN;
        Text::new(&max_temp, position, MonoTextStyle::new(FONT, COLOUR_LIGHT_ORANGE))
            .draw(frame)
            .ok();

        if let Some(condition) = &weather.condition {
            match self.assets.condition_icon(condition) {
                Some(icon) => {
                    Image::new(icon, WEATHER_ICON_AT).draw(frame).ok();
                }
                None => debug!("No weather icon exists for {}", condition),
            }
        }
    }
}

fn label_width(label: &str) -> i32 {
    label.chars().count() as i32 * TEMP_CHAR_ADVANCE
}
