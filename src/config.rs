use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongo: MongoConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `PORT` and
    /// `MONGODB_CONNECT_STRING` are required.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("PORT")
            .context("PORT must be set")?
            .parse::<u16>()
            .context("PORT must be a valid port number")?;
        let mongo = MongoConfig {
            uri: lookup("MONGODB_CONNECT_STRING").context("MONGODB_CONNECT_STRING must be set")?,
            database: lookup("MONGODB_DATABASE").filter(|v| !v.is_empty()),
        };
        Ok(Self {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            mongo,
        })
    }
}
