use anyhow::{bail, Context, Result};
use platerank_core::DEFAULT_TOP_N;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_TOP_N: usize = 100;

#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    pub http_addr: SocketAddr,
    pub default_top_n: usize,
    pub max_top_n: usize,
    pub tls: Option<TlsPaths>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_path = get("PLATERANK_DATA")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .context("PLATERANK_DATA must point at the cleaned corpus")?;
        let http_addr = get("HTTP_ADDR")
            .unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("HTTP_ADDR must be a socket address")?;
        let default_top_n = parse_usize(&get, "DEFAULT_TOP_N", DEFAULT_TOP_N)?;
        let max_top_n = parse_usize(&get, "MAX_TOP_N", DEFAULT_MAX_TOP_N)?;
        if default_top_n == 0 || default_top_n > max_top_n {
            bail!(
                "DEFAULT_TOP_N must be in 1..={} (got {})",
                max_top_n,
                default_top_n
            );
        }
        let tls = match (get("TLS_CERT_PATH"), get("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => bail!("TLS_CERT_PATH and TLS_KEY_PATH must be set together"),
        };
        Ok(Self {
            data_path,
            http_addr,
            default_top_n,
            max_top_n,
            tls,
        })
    }
}

fn parse_usize(get: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> Result<usize> {
    match get(key) {
        Some(v) => v
            .parse::<usize>()
            .with_context(|| format!("{} must be a non-negative integer, got {:?}", key, v)),
        None => Ok(default),
    }
}
