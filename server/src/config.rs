use anyhow::{Context, Result, anyhow, bail};
use std::net::SocketAddr;
use std::str::FromStr;

const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";
const DEFAULT_DATABASE_NAME: &str = "userdata";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("Unknown STORE_BACKEND '{}', expected 'mongo' or 'memory'", other),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub mongodb_uri: String,
    pub database_name: String,
    pub store_backend: StoreBackend,
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub cors_allow_any: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| anyhow!("JWT_SECRET not set"))?;

        let store_backend = lookup("STORE_BACKEND")
            .map(|v| v.parse::<StoreBackend>())
            .transpose()?
            .unwrap_or(StoreBackend::Mongo);

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid BIND_ADDR '{}'", bind_addr))?;

        let cors_allow_any = lookup("CORS_ALLOW_ANY")
            .map(|v| v.parse::<bool>())
            .transpose()
            .context("CORS_ALLOW_ANY must be 'true' or 'false'")?
            .unwrap_or(true);

        Ok(Self {
            mongodb_uri: lookup("MONGODB_URI").unwrap_or_else(|| DEFAULT_MONGODB_URI.to_string()),
            database_name: lookup("DATABASE_NAME")
                .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string()),
            store_backend,
            jwt_secret,
            bind_addr,
            cors_allow_any,
        })
    }
}
