//! Google PageSpeed Insights client
//!
//! Performance scores are optional enrichment: every error here degrades to
//! a missing score and a warning, never a failed page.

mod client;

pub use client::{parse_performance_score, PageSpeedClient};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Performance scores (0-100) per strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpeedScores {
    pub mobile: Option<u8>,
    pub desktop: Option<u8>,
}

/// Errors from a single PageSpeed request
#[derive(Debug, Error)]
pub enum PageSpeedError {
    #[error("PageSpeed request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("PageSpeed returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid PageSpeed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PageSpeed response has no performance score")]
    MissingScore,
}
