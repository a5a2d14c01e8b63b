use anyhow::{Context as _, Result};
use std::{env, fmt::Display, str::FromStr};

const DEFAULT_PORT: &str = "13000";
const DEFAULT_DATABASE: &str = "Taklid-Food-Server";
const DEFAULT_CLUSTER: &str = "cluster0.nndk6.mongodb.net";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub database_name: String,
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {e}");
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = try_load(&lookup, "PORT", DEFAULT_PORT)?;
        let database_name = try_load(&lookup, "DB_NAME", DEFAULT_DATABASE)?;

        let database_url = match lookup("MONGODB_URI") {
            Some(uri) => uri,
            None => {
                let user = lookup("DB_USER").context("'DB_USER' was not found")?;
                let pass = lookup("DB_PASS").context("'DB_PASS' was not found")?;
                let cluster: String = try_load(&lookup, "DB_CLUSTER", DEFAULT_CLUSTER)?;

                format!(
                    "mongodb+srv://{user}:{pass}@{cluster}/?retryWrites=true&w=majority&appName=Cluster0"
                )
            }
        };

        Ok(Self {
            port,
            database_url,
            database_name,
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T>
where
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        tracing::info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("Invalid {key} value {raw:?}: {e}"))
}
