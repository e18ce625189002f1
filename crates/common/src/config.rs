use crate::{Error, Result};

/// Deployment configuration loaded from environment variables at startup.
///
/// Trading parameters live in the TOML settings file (see `Settings`); this
/// struct only says where things are.
#[derive(Debug, Clone)]
pub struct Config {
    // Tick store / trade ledger
    pub database_url: String,

    // Downstream signal API
    pub signal_api_url: String,

    // Classification model
    pub model_path: String,
    /// Seed for the fallback classifier. `None` seeds from entropy.
    pub fallback_seed: Option<u64>,

    // Settings file path
    pub settings_path: String,

    /// Overrides `symbol` from the settings file when set.
    pub symbol_override: Option<String>,
}

impl Config {
    /// Load configuration from the process environment.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Missing keys fall back
    /// to defaults; present-but-malformed values are a `Config` error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fallback_seed = match non_empty(&lookup, "FALLBACK_SEED") {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                Error::Config(format!("FALLBACK_SEED must be an unsigned integer, got: '{raw}'"))
            })?),
            None => None,
        };

        let signal_api_url = non_empty(&lookup, "SIGNAL_API_URL")
            .unwrap_or_else(|| "http://localhost:5000/api/signals".to_string());
        if !signal_api_url.starts_with("http://") && !signal_api_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "SIGNAL_API_URL must be an http(s) URL, got: '{signal_api_url}'"
            )));
        }

        Ok(Config {
            database_url: non_empty(&lookup, "DATABASE_URL")
                .unwrap_or_else(|| "sqlite://trading_system.db".to_string()),
            signal_api_url,
            model_path: non_empty(&lookup, "MODEL_PATH")
                .unwrap_or_else(|| "models/scalping_model.json".to_string()),
            fallback_seed,
            settings_path: non_empty(&lookup, "SETTINGS_PATH")
                .unwrap_or_else(|| "config/scalper.toml".to_string()),
            symbol_override: non_empty(&lookup, "SYMBOL").map(|s| s.to_uppercase()),
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
