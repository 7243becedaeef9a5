//! indietoken — IndieAuth token endpoint.
//!
//! Library crate shared by the binary and the integration tests in `tests/`.

use std::sync::Arc;

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod flows;
pub mod indieauth;
pub mod middleware;
pub mod models;
pub mod store;

use indieauth::fetch::Fetch;
use indieauth::markup::LinkExtractor;
use store::{SettingsRepository, TokenRepository};

/// Everything a request handler needs. Built once at startup.
pub struct AppState {
    pub tokens: Arc<dyn TokenRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub fetcher: Arc<dyn Fetch>,
    pub markup: Arc<dyn LinkExtractor>,
    pub config: config::Config,
}
