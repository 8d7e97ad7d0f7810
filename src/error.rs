//! Error types for the station controller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("NMEA: {0}")]
    Nmea(String),

    #[error("KISS: {0}")]
    Kiss(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
