use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub sweep_interval: Duration,
    pub board_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = var("TALLY_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("TALLY_JWT_SECRET is unset or still a placeholder");
        }

        let db_path = PathBuf::from(var("TALLY_DB_PATH").unwrap_or_else(|| "tally.db".into()));
        let host = var("TALLY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("TALLY_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("TALLY_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("TALLY_HOST must be an IP address")?;

        let sweep_secs: u64 = var("TALLY_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|| "5".into())
            .parse()
            .context("TALLY_SWEEP_INTERVAL_SECS must be a whole number")?;
        if sweep_secs == 0 {
            bail!("TALLY_SWEEP_INTERVAL_SECS must be at least 1");
        }

        let timeout_ms: u64 = var("TALLY_BOARD_TIMEOUT_MS")
            .unwrap_or_else(|| "2000".into())
            .parse()
            .context("TALLY_BOARD_TIMEOUT_MS must be a whole number")?;
        if timeout_ms == 0 {
            bail!("TALLY_BOARD_TIMEOUT_MS must be at least 1");
        }

        Ok(Self {
            jwt_secret,
            db_path,
            addr,
            sweep_interval: Duration::from_secs(sweep_secs),
            board_timeout: Duration::from_millis(timeout_ms),
        })
    }
}
