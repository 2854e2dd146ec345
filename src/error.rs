//! # Error Types
//!
//! One enum per failure family. Only [`ConfigError`] and a required-asset
//! [`AssetError`] stop the process; everything else is logged and the display
//! keeps showing the last good data.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Startup configuration problems. Always fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required secret environment variable is unset or empty
    #[error("required environment variable {0} is not set")]
    MissingSecret(&'static str),

    /// Configuration values that cannot drive the board
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failure to obtain fresh data from one of the upstream services.
///
/// Non-fatal: the refresher logs it and the previously published value stays
/// on the display until the next scheduled attempt.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed (network, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),

    /// Body was not a valid GTFS-realtime message
    #[error("feed decode failed: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Body was not valid JSON
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field was missing or not numeric
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// Problems loading static image assets.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    Missing(PathBuf),

    #[error("asset IO: {0}")]
    Io(#[from] io::Error),

    #[error("image decode failed for {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Failure while handing a frame to the display.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink IO: {0}")]
    Io(#[from] io::Error),

    #[error("frame is {got:?} but sink is {expected:?}")]
    SizeMismatch {
        expected: (u32, u32),
        got: (u32, u32),
    },
}
