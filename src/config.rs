//! Service configuration read from `TODO_*` environment variables.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// sqlx connection string, e.g. `sqlite://todo.db`.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Origin allowed by the CORS layer.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Upper bound on any single database call.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Fallback filter when `RUST_LOG` is unset.
    #[serde(default = "default_log")]
    pub log: String,
}

fn default_database_url() -> String {
    "sqlite://todo.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_query_timeout_secs() -> u64 {
    5
}

fn default_log() -> String {
    "info".to_string()
}

impl Config {
    /// Loads `.env` if present, then reads the `TODO_` prefixed variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenv::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed("TODO_").from_iter(vars)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}
