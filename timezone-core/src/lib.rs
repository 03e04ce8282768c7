//! Core library for the `timezone` CLI.
//!
//! This crate defines:
//! - Request options and their validation into ordered query parameters
//! - The provider abstraction and the Google Time Zone API implementation
//! - `lookup`, which settles the returned future and an optional completion
//!   callback with the same outcome
//! - Stored CLI defaults (API key, language)
//!
//! ```no_run
//! # async fn demo() -> Result<(), timezone_core::TimezoneError> {
//! use timezone_core::{LookupOptions, lookup};
//!
//! let res = lookup(&LookupOptions::new("43.7182713,-79.3777061"), None).await?;
//! println!("{:?}", res.time_zone_id());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod lookup;
pub mod model;
pub mod params;
pub mod provider;

pub use config::Config;
pub use error::TimezoneError;
pub use lookup::{Completion, lookup, lookup_with};
pub use model::{Coordinates, LookupOptions, TimezoneResponse};
pub use params::PathParams;
pub use provider::{Endpoint, GoogleTimezoneProvider, TimezoneProvider};
