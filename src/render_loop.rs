//! # Render Loop
//!
//! Repaints the board on its own fixed cadence from whatever the refreshers
//! last published. It never waits for fresh data: missing data just leaves a
//! region blank until the next paint.

use crate::clock::TimeSource;
use crate::error::SinkError;
use crate::frame::PixelSink;
use crate::renderer::Renderer;
use crate::state::DisplayState;
use log::{debug, error, info};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, sleep, MissedTickBehavior};

/// Periodic driver for [`Renderer`].
pub struct RenderLoop {
    renderer: Renderer,
    clock: Arc<dyn TimeSource>,
    state: Arc<DisplayState>,
    cadence: Duration,
    grace: Duration,
}

impl RenderLoop {
    /// `grace` delays the first paint so the first fetches have a chance to land.
    pub fn new(
        renderer: Renderer,
        clock: Arc<dyn TimeSource>,
        state: Arc<DisplayState>,
        cadence: Duration,
        grace: Duration,
    ) -> Self {
        Self {
            renderer,
            clock,
            state,
            cadence,
            grace,
        }
    }

    /// Paint one frame from the current state.
    ///
    /// Returns the "fully rendered" flag, or `None` if the sink failed.
    pub fn render_once<S: PixelSink + ?Sized>(&self, sink: &mut S) -> Option<bool> {
        let snapshot = self.state.snapshot();
        let now = self.clock.now();

        match self.renderer.render_to(sink, &snapshot, now) {
            Ok(complete) => {
                if !complete {
                    debug!(
                        "Partial frame at {}: {} arrivals, weather {}",
                        now.format("%H:%M:%S"),
                        snapshot.arrivals.len(),
                        if snapshot.weather.is_some() { "present" } else { "absent" }
                    );
                }
                Some(complete)
            }
            Err(e) => {
                error!("Failed to present frame: {}", e);
                None
            }
        }
    }

    /// Paint forever: once after the grace period, then every cadence.
    pub async fn run<S: PixelSink + ?Sized>(&self, sink: &mut S) {
        sleep(self.grace).await;

        let mut ticker = interval(self.cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.render_once(sink);
        }
    }

    /// Paint until `shutdown` resolves, then blank the sink.
    pub async fn run_until<S, F>(&self, sink: &mut S, shutdown: F) -> Result<(), SinkError>
    where
        S: PixelSink + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = self.run(sink) => {}
            _ = shutdown => {
                info!("Shutdown requested, clearing display");
            }
        }
        sink.clear()
    }
}
