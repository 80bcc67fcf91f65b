//! Error types for the heatmap pipeline.

use thiserror::Error;

/// Result type alias using HeatmapError.
pub type HeatmapResult<T> = Result<T, HeatmapError>;

/// Primary error type for heatmap operations.
#[derive(Debug, Error)]
pub enum HeatmapError {
    // === Configuration Errors ===
    #[error("Colormap {0} does not exist")]
    UnknownColormap(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    // === Empty Input Errors ===
    #[error("No track points matching {0}")]
    NoTrackPoints(String),

    #[error("No track points inside bounds {0}")]
    NoPointsInBounds(String),

    // === Resource Bound Errors ===
    #[error("{count} tiles requested but at most {max} allowed, reduce the zoom level")]
    TooManyTiles { count: u64, max: u64 },

    // === Transient Errors ===
    #[error("Failed to fetch tile {tile}: {message}")]
    TileFetch { tile: String, message: String },

    #[error("Failed to decode tile {tile}: {message}")]
    TileDecode { tile: String, message: String },

    // === Data Errors ===
    #[error("Failed to parse track file: {0}")]
    Parse(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl HeatmapError {
    /// Shorthand for an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Whether the pipeline can recover from this error locally.
    ///
    /// Tile failures are replaced with fallback imagery; everything else
    /// aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HeatmapError::TileFetch { .. } | HeatmapError::TileDecode { .. }
        )
    }
}

impl From<std::io::Error> for HeatmapError {
    fn from(err: std::io::Error) -> Self {
        HeatmapError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for HeatmapError {
    fn from(err: serde_json::Error) -> Self {
        HeatmapError::Config(format!("JSON error: {}", err))
    }
}
