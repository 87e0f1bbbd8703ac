// src/config.rs

use crate::errors::ConfigError;
use crate::logging::PROJECT_NAME;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// Tunables shared by every capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Scheme used to build HTTP probe URLs (`https` outside of tests).
    pub http_scheme: String,
    pub user_agent: String,
    pub http_timeout: Duration,
    pub dns_timeout: Duration,
    pub port_timeout: Duration,
    /// Upper bound on probes in flight within one batch.
    pub max_concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            http_scheme: "https".to_string(),
            user_agent: format!("VanguardRecon/{}", env!("CARGO_PKG_VERSION")),
            http_timeout: Duration::from_millis(10_000),
            dns_timeout: Duration::from_millis(5_000),
            port_timeout: Duration::from_millis(1_000),
            max_concurrency: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Both halves of the runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub scan: ScanConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Reads `VANGUARD_RECON_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup; unset keys keep
    /// their defaults, malformed ones are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };
        let defaults = Config::default();

        let scan = ScanConfig {
            http_scheme: env.string("HTTP_SCHEME").unwrap_or(defaults.scan.http_scheme),
            user_agent: env.string("USER_AGENT").unwrap_or(defaults.scan.user_agent),
            http_timeout: env.millis("HTTP_TIMEOUT_MS")?.unwrap_or(defaults.scan.http_timeout),
            dns_timeout: env.millis("DNS_TIMEOUT_MS")?.unwrap_or(defaults.scan.dns_timeout),
            port_timeout: env.millis("PORT_TIMEOUT_MS")?.unwrap_or(defaults.scan.port_timeout),
            max_concurrency: env
                .parsed::<usize>("MAX_CONCURRENCY", "a positive integer")?
                .unwrap_or(defaults.scan.max_concurrency),
        };
        if scan.max_concurrency == 0 {
            return Err(env.invalid("MAX_CONCURRENCY", "0", "a positive integer"));
        }
        if scan.http_scheme != "http" && scan.http_scheme != "https" {
            return Err(env.invalid("HTTP_SCHEME", &scan.http_scheme, "\"http\" or \"https\""));
        }

        let server = ServerConfig {
            host: env.parsed("HOST", "an IP address")?.unwrap_or(defaults.server.host),
            port: env.parsed("PORT", "a port number")?.unwrap_or(defaults.server.port),
        };

        Ok(Config { scan, server })
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn key(name: &str) -> String {
        format!("{}_{}", PROJECT_NAME.as_str(), name)
    }

    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(&Self::key(name)).filter(|v| !v.trim().is_empty())
    }

    fn parsed<T: FromStr>(&self, name: &str, expected: &'static str) -> Result<Option<T>, ConfigError> {
        match self.string(name) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| self.invalid(name, &raw, expected)),
        }
    }

    fn millis(&self, name: &str) -> Result<Option<Duration>, ConfigError> {
        Ok(self
            .parsed::<u64>(name, "a duration in milliseconds")?
            .map(Duration::from_millis))
    }

    fn invalid(&self, name: &str, value: &str, expected: &'static str) -> ConfigError {
        ConfigError::InvalidValue {
            key: Self::key(name),
            value: value.to_string(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (format!("VANGUARD_RECON_{k}"), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn unset_environment_yields_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.scan.port_timeout, Duration::from_secs(1));
        assert_eq!(config.server.bind_addr().to_string(), "0.0.0.0:8000");
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("HTTP_SCHEME", "http"),
            ("HTTP_TIMEOUT_MS", "2500"),
            ("MAX_CONCURRENCY", "4"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9090"),
        ])
        .unwrap();
        assert_eq!(config.scan.http_scheme, "http");
        assert_eq!(config.scan.http_timeout, Duration::from_millis(2500));
        assert_eq!(config.scan.max_concurrency, 4);
        assert_eq!(config.server.bind_addr().to_string(), "127.0.0.1:9090");
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = config_from(&[("PORT_TIMEOUT_MS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("VANGUARD_RECON_PORT_TIMEOUT_MS"));

        assert!(config_from(&[("MAX_CONCURRENCY", "0")]).is_err());
        assert!(config_from(&[("HTTP_SCHEME", "ftp")]).is_err());
        assert!(config_from(&[("PORT", "70000")]).is_err());
    }
}
