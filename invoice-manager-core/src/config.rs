use anyhow::{anyhow, Context};

pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// Server configuration read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// PostgreSQL URL. `None` runs the server on the in-memory store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    /// Origin allowed to call the API from a browser
    pub cors_origin: String,
}

impl Config {
    /// Reads the configuration from process environment variables.
    ///
    /// Call `dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset. `PORT` is used when `SERVER_PORT` is absent.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("Invalid DATABASE_MAX_CONNECTIONS: {}", raw))?,
            None => 10,
        };
        if max_connections == 0 {
            return Err(anyhow!("DATABASE_MAX_CONNECTIONS must be at least 1"));
        }

        let port = match get("SERVER_PORT").or_else(|| get("PORT")) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| anyhow!("Invalid SERVER_PORT: {}", raw))?,
            None => 3000,
        };

        Ok(Config {
            database_url: get("DATABASE_URL"),
            max_connections,
            host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
