//! Server configuration.
//!
//! `serve` flags fall back to `LOOKMAX_*` environment variables and are
//! checked once into a [`ServerConfig`] before anything binds or opens.

use clap::Args;
use std::num::NonZeroU32;
use std::path::PathBuf;

/// Default request body limit: room for the data URI of a 3 MB upload.
pub const DEFAULT_BODY_LIMIT: usize = 8 * 1024 * 1024;

/// Flags of the `serve` command.
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "LOOKMAX_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "LOOKMAX_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Storage backend: memory or redb
    #[arg(short, long, env = "LOOKMAX_BACKEND", default_value = "memory")]
    pub backend: String,

    /// Database file for the redb backend
    #[arg(long, env = "LOOKMAX_DB", default_value = "lookmax.redb")]
    pub db: PathBuf,

    /// Directory of detection model files served under /models
    #[arg(long, env = "LOOKMAX_MODELS_DIR")]
    pub models_dir: Option<PathBuf>,

    /// Require `Authorization: Bearer <key>` on /api routes
    #[arg(long, env = "LOOKMAX_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Maximum /api requests per second, across all clients
    #[arg(long, env = "LOOKMAX_RATE_LIMIT")]
    pub rate_limit: Option<u32>,

    /// Maximum request body size in bytes
    #[arg(long, env = "LOOKMAX_BODY_LIMIT", default_value_t = DEFAULT_BODY_LIMIT)]
    pub body_limit: usize,
}

/// Validated server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub backend: String,
    pub db_path: PathBuf,
    pub models_dir: Option<PathBuf>,
    pub api_key: Option<String>,
    pub rate_limit: Option<NonZeroU32>,
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            backend: "memory".to_string(),
            db_path: PathBuf::from("lookmax.redb"),
            models_dir: None,
            api_key: None,
            rate_limit: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ServerConfig {
    /// Host and port to bind. The host may be a name such as `localhost`.
    pub fn bind_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

impl TryFrom<ServeArgs> for ServerConfig {
    type Error = String;

    fn try_from(args: ServeArgs) -> Result<Self, Self::Error> {
        if args.backend != "memory" && args.backend != "redb" {
            return Err(format!(
                "Unknown backend '{}' (expected 'memory' or 'redb')",
                args.backend
            ));
        }
        if args.host.trim().is_empty() {
            return Err("Host must not be empty".to_string());
        }
        if args.port == 0 {
            return Err("Port must be non-zero".to_string());
        }
        if args.body_limit == 0 {
            return Err("Body limit must be non-zero".to_string());
        }
        let rate_limit = match args.rate_limit {
            None => None,
            Some(n) => Some(
                NonZeroU32::new(n).ok_or_else(|| "Rate limit must be non-zero".to_string())?,
            ),
        };

        Ok(Self {
            host: args.host,
            port: args.port,
            backend: args.backend,
            db_path: args.db,
            models_dir: args.models_dir,
            // An empty key would lock every client out.
            api_key: args.api_key.filter(|k| !k.is_empty()),
            rate_limit,
            body_limit: args.body_limit,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args() -> ServeArgs {
        ServeArgs {
            host: "127.0.0.1".into(),
            port: 5000,
            backend: "memory".into(),
            db: PathBuf::from("lookmax.redb"),
            models_dir: None,
            api_key: None,
            rate_limit: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    #[test]
    fn defaults_validate() {
        let config = ServerConfig::try_from(args());
        assert_eq!(config, Ok(ServerConfig::default()));
    }

    #[test]
    fn unknown_backend_rejected() {
        let mut a = args();
        a.backend = "postgres".into();
        assert!(ServerConfig::try_from(a).is_err());
    }

    #[test]
    fn zero_port_and_rate_rejected() {
        let mut a = args();
        a.port = 0;
        assert!(ServerConfig::try_from(a).is_err());

        let mut a = args();
        a.rate_limit = Some(0);
        assert!(ServerConfig::try_from(a).is_err());
    }

    #[test]
    fn empty_api_key_means_no_auth() {
        let mut a = args();
        a.api_key = Some(String::new());
        let config = ServerConfig::try_from(a);
        assert!(matches!(config, Ok(c) if c.api_key.is_none()));
    }

    #[test]
    fn host_names_resolve() {
        use std::net::ToSocketAddrs;

        let mut a = args();
        a.host = "localhost".into();
        let config = ServerConfig::try_from(a).unwrap();
        assert_eq!(config.bind_addr(), ("localhost", 5000));

        let resolved: Vec<_> = config.bind_addr().to_socket_addrs().unwrap().collect();
        assert!(!resolved.is_empty());
        assert!(resolved.iter().all(|addr| addr.port() == 5000));
    }

    #[test]
    fn empty_host_rejected() {
        let mut a = args();
        a.host = String::new();
        assert!(ServerConfig::try_from(a).is_err());
    }
}
