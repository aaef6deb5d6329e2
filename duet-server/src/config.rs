use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;

pub const DEFAULT_RELAY_ADDR: &str = "0.0.0.0:3000";
pub const RELAY_ADDR_VAR: &str = "DUET_RELAY_ADDR";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub addr: SocketAddr,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw = lookup(RELAY_ADDR_VAR).unwrap_or_else(|| DEFAULT_RELAY_ADDR.to_string());
        let addr = raw
            .parse()
            .with_context(|| format!("{RELAY_ADDR_VAR} is not a socket address: {raw}"))?;
        Ok(Self { addr })
    }
}
