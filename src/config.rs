//! Component factory for environment-based configuration
//!
//! Factory methods to create the store and resolve server options from
//! environment variables, so development and deployment setups differ only
//! in environment.

use crate::api::ApiServerConfig;
use crate::store::SeriesStore;
use crate::telemetry::parse_optional_bool;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::info;

pub struct ComponentFactory;

impl ComponentFactory {
    /// Create the series store from environment
    ///
    /// Environment variables:
    /// - VINTAGEDB_SEED: seed the demo dataset (default: true)
    pub fn create_store() -> Result<Arc<SeriesStore>> {
        let seed = parse_optional_bool("VINTAGEDB_SEED")?.unwrap_or(true);
        if seed {
            info!("Seeding demo dataset");
            Ok(Arc::new(SeriesStore::seeded()?))
        } else {
            info!("Starting with an empty store");
            Ok(Arc::new(SeriesStore::new()))
        }
    }

    /// Resolve HTTP server options from environment, with an optional
    /// command-line port override taking precedence.
    ///
    /// Environment variables:
    /// - VINTAGEDB_HTTP_PORT: listen port (default: 8080)
    /// - VINTAGEDB_MAX_BODY_SIZE: request body limit in bytes
    /// - VINTAGEDB_ENABLE_CORS: enable permissive CORS (default: true)
    pub fn resolve_api_config(port_override: Option<u16>) -> Result<ApiServerConfig> {
        let mut config = ApiServerConfig::default();

        if let Some(port) = port_override {
            config.http_port = port;
        } else if let Ok(raw) = std::env::var("VINTAGEDB_HTTP_PORT") {
            config.http_port = raw.trim().parse::<u16>().map_err(|e| {
                Error::Config(format!("VINTAGEDB_HTTP_PORT must be a port number: {e}"))
            })?;
        }

        if let Ok(raw) = std::env::var("VINTAGEDB_MAX_BODY_SIZE") {
            config.max_body_size = raw.trim().parse::<usize>().map_err(|e| {
                Error::Config(format!("VINTAGEDB_MAX_BODY_SIZE must be a byte count: {e}"))
            })?;
        }

        if let Some(enable) = parse_optional_bool("VINTAGEDB_ENABLE_CORS")? {
            config.enable_cors = enable;
        }

        Ok(config)
    }
}
