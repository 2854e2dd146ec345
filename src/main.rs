//! # Subway Board Application Entry Point
//!
//! Wires the two refreshers and the render loop together and runs them until
//! the process is interrupted, then blanks the display.
//!
//! ```text
//! subway-board [--config PATH] [--plain] [--headless]
//! ```
//!
//! - `--config PATH`: read overrides from PATH instead of `subway-config.toml`;
//!   unlike the default file, PATH must exist and parse
//! - `--plain`: terminal output without ANSI colour
//! - `--headless`: render into memory only (checks fetching without a display)


use anyhow::Context;
use embedded_graphics::prelude::Size;
use log::{error, info, warn};
use std::env;
use std::io;
use std::sync::Arc;
use subway_board_lib::{
    assets::Assets,
    clock::SystemClock,
    config::{Config, Secrets},
    frame::{MemorySink, TerminalSink},
    refresher::{spawn_transit_refresher, spawn_weather_refresher},
    render_loop::RenderLoop,
    renderer::Renderer,
    state::DisplayState,
    transit::{StopPair, TransitClient},
    weather::WeatherClient,
};

/// Command line switches, scanned the simple way.
struct Options {
    config_path: Option<String>,
    plain: bool,
    headless: bool,
}

impl Options {
    fn parse(args: &[String]) -> Self {
        let config_path = args
            .windows(2)
            .find(|pair| pair[0] == "--config")
            .map(|pair| pair[1].clone());

        Options {
            config_path,
            plain: args.iter().any(|arg| arg == "--plain"),
            headless: args.iter().any(|arg| arg == "--headless"),
        }
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let options = Options::parse(&args);

    // A file named on the command line must exist and parse
    let config = match &options.config_path {
        Some(path) => Config::from_path(path)?,
        None => Config::load(),
    };
    config.validate().context("configuration")?;

    // Both keys must be present before anything starts
    let secrets = Secrets::from_env()?;

    // A missing train icon is fatal; missing weather icons are not
    let assets = Assets::load(&config.display.asset_dir).with_context(|| {
        format!(
            "loading display assets from {}",
            config.display.asset_dir.display()
        )
    })?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, secrets, assets, options))
}

async fn run(
    config: Config,
    secrets: Secrets,
    assets: Assets,
    options: Options,
) -> anyhow::Result<()> {
    let tz = config.time_zone()?;

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout())
        .user_agent(concat!("subway-board/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")?;

    let state = Arc::new(DisplayState::new());

    let transit = spawn_transit_refresher(
        TransitClient::new(
            http.clone(),
            &config.transit.endpoint,
            secrets.transit_api_key,
        ),
        StopPair::new(&config.transit.stop_id, &config.transit.opposite_stop_id),
        tz,
        Arc::clone(&state),
        config.transit_cadence(),
    );

    let weather = spawn_weather_refresher(
        WeatherClient::new(
            http,
            &config.weather.endpoint,
            secrets.weather_api_key,
            config.weather.latitude,
            config.weather.longitude,
            &config.weather.units,
        ),
        Arc::clone(&state),
        config.weather_cadence(),
    );

    let render_loop = RenderLoop::new(
        Renderer::new(assets),
        Arc::new(SystemClock::new(tz)),
        state,
        config.render_cadence(),
        config.render_grace(),
    );

    info!(
        "Showing {} every {}s (transit every {}s, weather every {}s)",
        config.transit.stop_id,
        config.display.render_secs,
        config.transit.refresh_secs,
        config.weather.refresh_secs
    );

    let size = Size::new(config.display.cols, config.display.rows);
    let result = if options.headless {
        let mut sink = MemorySink::new(size);
        render_loop.run_until(&mut sink, shutdown_signal()).await
    } else {
        let mut sink = TerminalSink::new(io::stdout(), size, !options.plain);
        render_loop.run_until(&mut sink, shutdown_signal()).await
    };

    transit.abort();
    weather.abort();

    result.context("clearing display on shutdown")?;
    info!("Display cleared, exiting");
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
