//! Centralized error handling for the logo service
//!
//! Errors are split by the layer that produces them:
//!
//! - **StoreError**: raised by storage adapters (metadata, object store,
//!   cache index, pending-deletion queue). Each adapter translates its own
//!   "missing" signal into the shared [`StoreError::NotFound`] variant.
//! - **RasterizeError**: external rasterizer and resize/re-encode failures.
//! - **AppError**: what the resolver and the web layer see. Maps onto HTTP
//!   status codes in `web::responses`.
//!
//! # Usage
//!
//! ```rust
//! use logo_api::errors::{AppError, AppResult};
//!
//! fn lookup(name: &str) -> AppResult<()> {
//!     Err(AppError::not_found("logo", name))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for storage adapter Results
pub type StoreResult<T> = Result<T, StoreError>;

/// Convenience type alias for rasterization Results
pub type RasterizeResult<T> = Result<T, RasterizeError>;
