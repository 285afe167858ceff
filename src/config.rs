//! Process configuration from environment variables.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `HOST` | `0.0.0.0` | listen address |
//! | `PORT` | `3333` | listen port |
//! | `RUST_LOG` | `info` | [`EnvFilter`](tracing_subscriber::EnvFilter) directives |
//! | `LOG_FORMAT` | `pretty` | `pretty` or `json` |

use std::net::SocketAddr;

use crate::error::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3333;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any variable source. Unset and empty variables
    /// fall back to their defaults.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config { key: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };

        // Bracket bare IPv6 hosts so "::1" and 3333 become "[::1]:3333".
        let joined = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        };
        let addr = joined
            .parse()
            .map_err(|source| Error::InvalidAddr { value: joined.clone(), source })?;

        let log_format_raw = var("LOG_FORMAT").map(|v| v.to_ascii_lowercase());
        let log_format = match log_format_raw.as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(_) => {
                return Err(Error::Config {
                    key: "LOG_FORMAT",
                    value: var("LOG_FORMAT").unwrap_or_default(),
                });
            }
        };

        Ok(Self {
            addr,
            log_filter: var("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned()),
            log_format,
        })
    }
}
