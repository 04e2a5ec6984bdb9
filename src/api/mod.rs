//! HTTP clients for external market data

pub mod error;
pub mod yahoo;

pub use error::ApiError;
pub use yahoo::YahooClient;
