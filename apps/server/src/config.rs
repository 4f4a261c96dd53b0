use std::{fmt::Display, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::Context;
use cryptotrack_core::gateway::GatewayConfig;
use cryptotrack_market_data::CoinGeckoConfig;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 8_000;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub sweep_interval: Duration,
    pub upstream: CoinGeckoConfig,
    pub gateway: GatewayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            upstream: CoinGeckoConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl Config {
    /// Reads `CT_*` variables, after loading `.env` if present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    ///
    /// Unparsable numbers fall back to their default with a warning; an
    /// unparsable listen address or an inconsistent gateway config is fatal.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let defaults = GatewayConfig::default();

        let raw_addr = vars
            .string("CT_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr: SocketAddr = raw_addr
            .parse()
            .with_context(|| format!("Invalid CT_LISTEN_ADDR '{}'", raw_addr))?;

        let cors_allow = vars
            .string("CT_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let upstream = CoinGeckoConfig {
            base_url: vars
                .string("CT_UPSTREAM_BASE_URL")
                .unwrap_or_else(|| CoinGeckoConfig::default().base_url),
            api_key: vars.string("CT_UPSTREAM_API_KEY"),
            timeout: Duration::from_millis(
                vars.parse("CT_UPSTREAM_TIMEOUT_MS", DEFAULT_UPSTREAM_TIMEOUT_MS),
            ),
        };

        let gateway = GatewayConfig {
            markets_ttl: vars.secs("CT_MARKETS_TTL_SECS", defaults.markets_ttl),
            chart_ttl: vars.secs("CT_CHART_TTL_SECS", defaults.chart_ttl),
            fallback_ttl: vars.secs("CT_FALLBACK_TTL_SECS", defaults.fallback_ttl),
            stale_grace: vars.secs("CT_STALE_GRACE_SECS", defaults.stale_grace),
            default_limit: vars.parse("CT_DEFAULT_LIMIT", defaults.default_limit),
            max_limit: vars.parse("CT_MAX_LIMIT", defaults.max_limit),
            chart_days: vars.parse("CT_CHART_DAYS", defaults.chart_days),
            fallback_seed: vars.string("CT_FALLBACK_SEED").and_then(|raw| {
                raw.parse()
                    .map_err(|_| tracing::warn!("Ignoring invalid CT_FALLBACK_SEED '{}'", raw))
                    .ok()
            }),
        };
        gateway.validate()?;

        Ok(Self {
            listen_addr,
            cors_allow,
            request_timeout: Duration::from_millis(
                vars.parse("CT_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS),
            ),
            sweep_interval: Duration::from_secs(
                vars.parse("CT_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)
                    .max(1),
            ),
            upstream,
            gateway,
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr + Display,
    {
        match self.string(key) {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring invalid {}='{}', using {}", key, raw, default);
                default
            }),
        }
    }

    fn secs(&self, key: &str, default: Duration) -> Duration {
        Duration::from_secs(self.parse(key, default.as_secs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.cors_allow, vec!["*".to_string()]);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.upstream.base_url, "https://api.coingecko.com/api/v3");
        assert!(config.upstream.api_key.is_none());
        assert_eq!(config.upstream.timeout, Duration::from_secs(8));
        assert_eq!(config.gateway, GatewayConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("CT_LISTEN_ADDR", "127.0.0.1:8080"),
            ("CT_CORS_ALLOW_ORIGINS", "https://a.example, https://b.example,"),
            ("CT_UPSTREAM_API_KEY", "demo-key"),
            ("CT_MARKETS_TTL_SECS", "120"),
            ("CT_MAX_LIMIT", "100"),
            ("CT_FALLBACK_SEED", "42"),
        ])
        .unwrap();

        assert_eq!(config.listen_addr.port(), 8080);
        assert_eq!(config.cors_allow, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.upstream.api_key.as_deref(), Some("demo-key"));
        assert_eq!(config.gateway.markets_ttl, Duration::from_secs(120));
        assert_eq!(config.gateway.max_limit, 100);
        assert_eq!(config.gateway.fallback_seed, Some(42));
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let config = config_from(&[
            ("CT_CHART_TTL_SECS", "soon"),
            ("CT_DEFAULT_LIMIT", "-3"),
            ("CT_FALLBACK_SEED", "not-a-number"),
        ])
        .unwrap();

        assert_eq!(config.gateway.chart_ttl, Duration::from_secs(60));
        assert_eq!(config.gateway.default_limit, 50);
        assert!(config.gateway.fallback_seed.is_none());
    }

    #[test]
    fn invalid_listen_addr_is_fatal() {
        let err = config_from(&[("CT_LISTEN_ADDR", "not-an-address")])
            .err()
            .unwrap();
        assert!(err.to_string().contains("CT_LISTEN_ADDR"));
    }

    #[test]
    fn inconsistent_limits_are_fatal() {
        assert!(config_from(&[("CT_DEFAULT_LIMIT", "500")]).is_err());
    }
}
