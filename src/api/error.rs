//! API error types

use thiserror::Error;

/// Errors that can occur when fetching price history
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("API returned error: {0}")]
    ApiResponseError(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("No data available")]
    NoData,
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;
