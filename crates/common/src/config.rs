use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::FeedError;

const DEFAULT_MARKET: &str = "btcusd";
const DEFAULT_DEPTH: usize = 10;
const MAX_DEPTH: usize = 1_000;
const DEFAULT_UPTICKS: u32 = 3;
const DEFAULT_DOWNTICKS: u32 = 3;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REST_URL: &str = "https://www.bitstamp.net/api/v2/";
const DEFAULT_WS_URL: &str = "wss://ws.bitstamp.net";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Instrument symbol as Bitstamp spells it, e.g. `btcusd`.
    pub principal_market: String,

    /// Number of rows shown per table (levels per side, trades).
    /// The trade tape is requested at twice this size.
    pub depth: usize,

    /// Consecutive upticks before a synthetic sell.
    pub upticks_to_sell: u32,

    /// Consecutive downticks before a synthetic buy.
    pub downticks_to_buy: u32,

    pub poll_interval: Duration,

    pub rest_url: String,
    pub ws_url: String,
    pub http_timeout: Duration,

    /// Upper bound on the wait for the first delta. `None` waits forever.
    pub first_delta_timeout: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            principal_market: DEFAULT_MARKET.to_string(),
            depth: DEFAULT_DEPTH,
            upticks_to_sell: DEFAULT_UPTICKS,
            downticks_to_buy: DEFAULT_DOWNTICKS,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            rest_url: DEFAULT_REST_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            first_delta_timeout: None,
        }
    }
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, FeedError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, FeedError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let principal_market = lookup("PRINCIPAL_MARKET")
            .map(|m| m.trim().to_lowercase())
            .unwrap_or(defaults.principal_market);
        if principal_market.is_empty() {
            return Err(FeedError::Config("PRINCIPAL_MARKET is empty".to_string()));
        }

        let depth = parse_or("DEPTH_X", &lookup, defaults.depth)?;
        if depth == 0 || depth > MAX_DEPTH {
            return Err(FeedError::Config(format!(
                "DEPTH_X must be between 1 and {MAX_DEPTH}, got {depth}"
            )));
        }

        let poll_interval_ms = parse_or("POLL_INTERVAL_MS", &lookup, DEFAULT_POLL_INTERVAL_MS)?;
        let http_timeout_secs = parse_or("HTTP_TIMEOUT_SECS", &lookup, DEFAULT_HTTP_TIMEOUT_SECS)?;
        let first_delta_timeout = match lookup("FIRST_DELTA_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(parse_value("FIRST_DELTA_TIMEOUT_SECS", &raw)?)),
            None => None,
        };

        Ok(Self {
            principal_market,
            depth,
            upticks_to_sell: parse_or("UPTICK_M", &lookup, defaults.upticks_to_sell)?,
            downticks_to_buy: parse_or("DOWNTICK_N", &lookup, defaults.downticks_to_buy)?,
            poll_interval: Duration::from_millis(poll_interval_ms),
            rest_url: lookup("BITSTAMP_REST_URL").unwrap_or(defaults.rest_url),
            ws_url: lookup("BITSTAMP_WS_URL").unwrap_or(defaults.ws_url),
            http_timeout: Duration::from_secs(http_timeout_secs),
            first_delta_timeout,
        })
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, FeedError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, FeedError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| FeedError::Config(format!("{key}={raw:?} is not a valid value")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let cfg = AppConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(cfg.principal_market, "btcusd");
        assert_eq!(cfg.depth, 10);
        assert_eq!(cfg.upticks_to_sell, 3);
        assert_eq!(cfg.downticks_to_buy, 3);
        assert_eq!(cfg.poll_interval, Duration::from_secs(2));
        assert!(cfg.first_delta_timeout.is_none());
    }

    #[test]
    fn test_overrides_are_applied() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("PRINCIPAL_MARKET", " ETHEUR "),
            ("DEPTH_X", "5"),
            ("UPTICK_M", "2"),
            ("DOWNTICK_N", "4"),
            ("POLL_INTERVAL_MS", "500"),
            ("FIRST_DELTA_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(cfg.principal_market, "etheur");
        assert_eq!(cfg.depth, 5);
        assert_eq!(cfg.upticks_to_sell, 2);
        assert_eq!(cfg.downticks_to_buy, 4);
        assert_eq!(cfg.poll_interval, Duration::from_millis(500));
        assert_eq!(cfg.first_delta_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("UPTICK_M", "three")])).unwrap_err();
        assert!(matches!(err, FeedError::Config(ref msg) if msg.contains("UPTICK_M")));
    }

    #[test]
    fn test_zero_depth_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("DEPTH_X", "0")])).unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));
    }

    #[test]
    fn test_oversized_depth_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("DEPTH_X", "18446744073709551615")]))
            .unwrap_err();
        assert!(matches!(err, FeedError::Config(ref msg) if msg.contains("DEPTH_X")));

        let cfg = AppConfig::from_lookup(lookup_from(&[("DEPTH_X", "1000")])).unwrap();
        assert_eq!(cfg.depth, 1_000);
    }
}
