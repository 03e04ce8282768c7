use async_trait::async_trait;
use std::fmt::Debug;

use crate::{TimezoneError, TimezoneResponse, params::PathParams};

pub mod google;

pub use google::{Endpoint, GoogleTimezoneProvider};

/// A remote service that turns validated query parameters into a response.
#[async_trait]
pub trait TimezoneProvider: Send + Sync + Debug {
    async fn fetch(&self, params: &PathParams) -> Result<TimezoneResponse, TimezoneError>;
}
