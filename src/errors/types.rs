//! Error type definitions for the logo service

use std::time::Duration;
use thiserror::Error;

/// Top-level application error type
///
/// Cache-layer problems never show up here: the resolver downgrades them to
/// warnings and keeps going on the authoritative path.
#[derive(Error, Debug)]
pub enum AppError {
    /// No metadata row (or source object) matches the request
    #[error("Not found: {resource} '{id}'")]
    NotFound { resource: String, id: String },

    /// Malformed or out-of-range request parameters
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Rasterization or re-encode failed
    #[error("Conversion failed: {0}")]
    Conversion(#[from] RasterizeError),

    /// An authoritative store (metadata or object store) could not be reached
    #[error("Store unavailable: {store} - {message}")]
    StoreUnavailable { store: String, message: String },

    /// The request deadline elapsed before resolution finished
    #[error("Resolution timed out after {0:?}")]
    Timeout(Duration),
}

impl AppError {
    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True for outcomes the caller should present as "no such logo"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { store, key } => Self::NotFound {
                resource: store.to_string(),
                id: key,
            },
            StoreError::Unavailable { store, message } => Self::StoreUnavailable {
                store: store.to_string(),
                message,
            },
        }
    }
}

/// Errors produced at the storage adapter boundary
///
/// `NotFound` is the single "missing" signal shared by every backend: a
/// SeaORM empty result, a Redis nil reply, an HTTP 404 and a missing file all
/// become this variant.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The addressed key, path or row does not exist
    #[error("{store}: '{key}' not found")]
    NotFound { store: &'static str, key: String },

    /// The backing store failed or could not be reached
    #[error("{store} unavailable: {message}")]
    Unavailable {
        store: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn not_found<K: Into<String>>(store: &'static str, key: K) -> Self {
        Self::NotFound {
            store,
            key: key.into(),
        }
    }

    pub fn unavailable<E: std::fmt::Display>(store: &'static str, err: E) -> Self {
        Self::Unavailable {
            store,
            message: err.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Rasterization pipeline errors
///
/// None of these are retried: a failing render points at a malformed source
/// or a broken environment.
#[derive(Error, Debug)]
pub enum RasterizeError {
    /// The rasterizer process could not be started or talked to
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The rasterizer exited unsuccessfully
    #[error("'{command}' exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    /// The rasterizer did not finish in time
    #[error("'{command}' timed out after {timeout:?}")]
    TimedOut { command: String, timeout: Duration },

    /// The vector source could not be parsed
    #[error("Invalid vector source: {0}")]
    InvalidSource(String),

    /// Encoding the rendered image failed
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// The rasterizer produced no output
    #[error("Rasterizer produced an empty image")]
    EmptyOutput,

    /// Decoding, resizing or encoding the intermediate image failed
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),

    /// The target format cannot be produced from a raster intermediate
    #[error("Unsupported target format: {0}")]
    UnsupportedFormat(String),

    /// The blocking image task panicked or was cancelled
    #[error("Image task aborted: {0}")]
    TaskAborted(String),
}
