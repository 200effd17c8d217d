//! Configuration model loaded from external sources.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::gate::list::ListSettings;

#[derive(Clone, Debug, Deserialize)]
/// Settings of the admin client.
pub struct AdminConfig {
    /// Root of the admin API, e.g. `http://localhost:5000/`.
    pub base_url: String,
    /// Quiet window applied to filter text and uniqueness checks.
    pub debounce_ms: u64,
    pub page_size: u32,
    /// Per-request timeout; `0` disables it.
    #[serde(default)]
    pub request_timeout_secs: u64,
}

impl AdminConfig {
    /// Reads `config/default`, then `config/{app_env}` if present, then
    /// `APP_*` environment variables.
    pub fn load(app_env: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{app_env}")).required(false))
            .add_source(Environment::with_prefix("APP"))
            .build()?
            .try_deserialize()
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Listing defaults for screens built from this configuration.
    pub fn list_settings(&self) -> ListSettings {
        ListSettings {
            page_size: self.page_size,
            debounce: self.debounce(),
            ..ListSettings::default()
        }
    }
}
