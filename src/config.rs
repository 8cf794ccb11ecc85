// Configuration module
//
// Reads settings from the environment (after `.env` has been loaded).
// Unset values fall back to defaults; set but unparsable values are errors.

use std::env;
use std::time::Duration;

use crate::pricing::AOA_COURSE_CAPACITY;

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Payment gateway settings; absent means the sandbox gateway is used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub conference_year: i32,
    /// Seats seeded for the certified course on a fresh database
    pub course_capacity: i64,
    pub payment_gateway: Option<GatewayConfig>,
    pub payment_timeout: Duration,
}

impl Config {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let payment_gateway = match lookup("PAYMENT_GATEWAY_URL") {
            Some(base_url) if !base_url.trim().is_empty() => Some(GatewayConfig {
                base_url,
                api_key: lookup("PAYMENT_GATEWAY_API_KEY")
                    .ok_or(ConfigError::Missing("PAYMENT_GATEWAY_API_KEY"))?,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            jwt_secret,
            conference_year: parse_or(&lookup, "CONFERENCE_YEAR", 2024)?,
            course_capacity: parse_or(&lookup, "AOA_COURSE_CAPACITY", AOA_COURSE_CAPACITY)?,
            payment_gateway,
            payment_timeout: Duration::from_secs(parse_or(&lookup, "PAYMENT_TIMEOUT_SECS", 10)?),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
