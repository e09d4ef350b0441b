//! Scores photographed or scanned bubble-sheet answer forms.
//!
//! A sheet goes through four stages: the image is deskewed
//! ([`orientation`]), the answer grid is located as the largest contour on
//! the page ([`grid`]), the grid is tiled into cells that are read as filled
//! or empty ([`bubbles`]), and the result is compared to an answer key
//! ([`answer_key`], [`score`]). [`evaluate`] runs all of them.

pub mod answer_key;
pub mod bubbles;
pub mod config;
pub mod debug;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod image_utils;
pub mod interpret;
pub mod orientation;
pub mod score;
pub mod transform;
pub mod types;

pub use answer_key::AnswerKeySource;
pub use config::Options;
pub use error::{Error, Result};
pub use image_utils::RasterImage;
pub use interpret::{evaluate, evaluate_batch, evaluate_path, evaluate_sheet};
pub use score::ScoreResult;
pub use types::{AnswerKey, BoolGrid, BoundingBox, BubbleMatrix};
