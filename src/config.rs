// Settings module: reads the environment (optionally seeded from dotenv
// files) into the settings the application and the API client need.

use std::path::PathBuf;
use std::time::Duration;

use crate::api::{ClientConfig, DEFAULT_HOST};
use crate::error::Error;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const ENV_DEBUG: &str = "TMDB_DEBUG";
const ENV_TOKEN: &str = "TMDB_TOKEN";
const ENV_HOST: &str = "TMDB_HOST";
const ENV_TIMEOUT: &str = "TMDB_TIMEOUT";

/// Application settings. `debug` switches error output to the diagnostic
/// form; the client settings are validated later by `ApiClient::new`.
#[derive(Debug, Clone)]
pub struct Settings {
    pub debug: bool,
    pub client: ClientConfig,
}

impl Settings {
    /// Load `./.env` and `~/.tmdb.env` (process environment wins, missing
    /// files are fine) and then read the `TMDB_*` variables.
    pub fn load() -> Result<Self, Error> {
        for path in dotenv_files() {
            match dotenvy::from_path(&path) {
                Ok(()) => {}
                Err(err) if err.not_found() => {}
                Err(err) => {
                    return Err(Error::InvalidConfig(format!(
                        "cannot read {}: {err}",
                        path.display()
                    )))
                }
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let debug = match lookup(ENV_DEBUG) {
            Some(value) => parse_bool(ENV_DEBUG, &value)?,
            None => false,
        };
        let token = lookup(ENV_TOKEN).unwrap_or_default();
        let host = lookup(ENV_HOST)
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let timeout = match lookup(ENV_TIMEOUT).filter(|t| !t.is_empty()) {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| Error::InvalidConfig(format!("{ENV_TIMEOUT}: {value:?}: {e}")))?,
            None => DEFAULT_TIMEOUT,
        };

        Ok(Settings {
            debug,
            client: ClientConfig {
                host,
                token,
                timeout,
                debug,
            },
        })
    }

    pub fn set_token(&mut self, token: &str) {
        self.client.token = token.to_string();
    }
}

fn dotenv_files() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from(".env")];
    if let Some(home) = dirs::home_dir() {
        files.push(home.join(".tmdb.env"));
    }
    files
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::InvalidConfig(format!(
            "{key}: {other:?} is not a boolean"
        ))),
    }
}
