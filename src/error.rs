use std::path::PathBuf;

use thiserror::Error;

/// Every way a sheet evaluation can fail. Each variant is fatal to the
/// invocation that produced it.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to decode image: {0}")]
    Decode(String),

    #[error("no foreground pixels found in {width}x{height} image (blank or unreadable scan)")]
    EmptyForeground { width: u32, height: u32 },

    #[error("no grid contour found in {width}x{height} edge map")]
    GridNotFound { width: u32, height: u32 },

    #[error("edge thresholds must be finite with low <= high, got low {low} and high {high}")]
    InvalidEdgeThresholds { low: f32, high: f32 },

    #[error("invalid grid region: {reason}")]
    InvalidGrid { reason: String },

    #[error("answer key line {line}, column {column}: expected 0 or 1, found {found:?}")]
    KeyFormat {
        line: usize,
        column: usize,
        found: String,
    },

    #[error("answer key shape mismatch: expected {expected_rows}x{expected_cols}, {found}")]
    KeyShape {
        expected_rows: usize,
        expected_cols: usize,
        found: String,
    },

    #[error("unable to read answer key: {0}")]
    KeyRead(#[source] std::io::Error),

    #[error("cannot score {matrix_rows}x{matrix_cols} bubble matrix against {key_rows}x{key_cols} answer key")]
    ShapeMismatch {
        matrix_rows: usize,
        matrix_cols: usize,
        key_rows: usize,
        key_cols: usize,
    },

    #[error("unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// The pipeline stage that produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Decode(_) | Error::Io { .. } => "image loader",
            Error::EmptyForeground { .. } => "orientation corrector",
            Error::GridNotFound { .. } | Error::InvalidEdgeThresholds { .. } => "grid locator",
            Error::InvalidGrid { .. } => "bubble classifier",
            Error::KeyFormat { .. } | Error::KeyShape { .. } | Error::KeyRead(_) => {
                "answer key loader"
            }
            Error::ShapeMismatch { .. } => "scorer",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
