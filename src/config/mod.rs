//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::util::rate_limit::DEFAULT_INPUT_RATE_LIMIT;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS, comma separated
    pub client_origin: String,

    /// How often each player gets a stats snapshot
    pub stats_interval: Duration,
    /// Economy tick period
    pub economy_tick: Duration,
    /// Max inbound messages per second per player
    pub input_rate_limit: u32,

    /// Map grid width in regions (1-26)
    pub map_columns: u32,
    /// Map grid height in regions
    pub map_rows: u32,
    /// Side length of a region in world units
    pub region_size: i32,
    /// World to render coordinate scale
    pub render_scale: f64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Render provides PORT env var, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        let map_columns: u32 = parse_or("MAP_COLUMNS", 4)?;
        if !(1..=26).contains(&map_columns) {
            return Err(ConfigError::Invalid("MAP_COLUMNS"));
        }
        let map_rows: u32 = parse_or("MAP_ROWS", 3)?;
        if map_rows == 0 {
            return Err(ConfigError::Invalid("MAP_ROWS"));
        }
        let region_size: i32 = parse_or("REGION_SIZE", 100)?;
        check_map_extent(map_columns, map_rows, region_size)?;

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            client_origin: env::var("CLIENT_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),

            stats_interval: Duration::from_millis(parse_or("STATS_INTERVAL_MS", 250)?),
            economy_tick: Duration::from_millis(parse_or("ECONOMY_TICK_MS", 1000)?),
            input_rate_limit: parse_or("INPUT_RATE_LIMIT", DEFAULT_INPUT_RATE_LIMIT)?,

            map_columns,
            map_rows,
            region_size,
            render_scale: parse_or("RENDER_SCALE", 1.0)?,
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset
fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

/// The whole grid, far edges included, must fit in world coordinates
fn check_map_extent(columns: u32, rows: u32, region_size: i32) -> Result<(), ConfigError> {
    if region_size <= 0 {
        return Err(ConfigError::Invalid("REGION_SIZE"));
    }
    let extent = |cells: u32| i32::try_from(cells).ok()?.checked_mul(region_size);
    if extent(columns).is_none() || extent(rows).is_none() {
        return Err(ConfigError::Invalid("REGION_SIZE"));
    }
    Ok(())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_uses_default_when_unset() {
        assert_eq!(parse_or("REGION_CONTROL_TEST_UNSET", 7u32).unwrap(), 7);
    }

    #[test]
    fn parse_or_rejects_garbage() {
        env::set_var("REGION_CONTROL_TEST_GARBAGE", "seven");
        let err = parse_or::<u32>("REGION_CONTROL_TEST_GARBAGE", 7).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("REGION_CONTROL_TEST_GARBAGE")));
    }

    #[test]
    fn map_extent_must_fit_world_coordinates() {
        assert!(check_map_extent(4, 3, 100).is_ok());
        assert!(check_map_extent(26, 1, i32::MAX / 26).is_ok());

        for (columns, rows, size) in [(26, 1, 100_000_000), (1, 30, i32::MAX / 20), (4, 3, 0)] {
            let err = check_map_extent(columns, rows, size).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid("REGION_SIZE")));
        }
    }
}
