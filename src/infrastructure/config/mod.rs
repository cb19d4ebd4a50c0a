use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::error::{AppError, Result};

fn default_request_timeout_secs() -> u64 {
    120
}

/// Runtime settings. The backend origin is the one piece of required
/// configuration; everything else has defaults.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub backend_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Settings {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Layers `genstudio.toml` under `GENSTUDIO_`-prefixed environment
    /// variables, with `.env` loaded first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings: Settings = Figment::new()
            .merge(Toml::file("genstudio.toml"))
            .merge(Env::prefixed("GENSTUDIO_"))
            .extract()
            .map_err(|e| {
                AppError::ConfigError(format!(
                    "Missing or invalid configuration (set GENSTUDIO_BACKEND_URL): {}",
                    e
                ))
            })?;
        settings.origin()?;
        Ok(settings)
    }

    pub fn origin(&self) -> Result<Url> {
        Url::parse(&self.backend_url).map_err(|e| {
            AppError::ConfigError(format!(
                "Invalid backend origin {}: {}",
                self.backend_url, e
            ))
        })
    }
}
