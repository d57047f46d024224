//! Service layer
//!
//! - [`ResourceResolver`]: answers logo requests, generating and caching
//!   raster artifacts on demand
//! - [`ExpiredArtifactSweeper`]: deletes generated artifacts whose time is up
//! - [`CleanupHousekeeper`]: runs the sweeper on a timer
//!
//! Services receive their stores explicitly; nothing here reaches for
//! global state.

pub mod cleanup;
pub mod housekeeper;
pub mod resolver;

pub use cleanup::ExpiredArtifactSweeper;
pub use housekeeper::CleanupHousekeeper;
pub use resolver::{ResolveSource, ResolvedLogo, ResolverSettings, ResolverStores, ResourceResolver};
