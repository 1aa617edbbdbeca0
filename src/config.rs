// Stockroom - Runtime configuration
// Everything comes from the environment with a usable default, so a bare
// `stockroom-server` starts against ./stockroom.db on port 3000.

use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

pub const PORT_KEY: &str = "STOCKROOM_PORT";
pub const DB_PATH_KEY: &str = "STOCKROOM_DB";
pub const QUERY_TIMEOUT_KEY: &str = "STOCKROOM_QUERY_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub db_path: PathBuf,
    pub query_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3000,
            db_path: PathBuf::from("stockroom.db"),
            query_timeout_ms: 5000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            port: try_load(PORT_KEY, "3000"),
            db_path: try_load(DB_PATH_KEY, "stockroom.db"),
            query_timeout_ms: try_load(QUERY_TIMEOUT_KEY, "5000"),
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("{key} not set, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
