use std::env;
use thiserror::Error;

const DEFAULT_BILLING_API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration, read once at startup from the environment
/// (after `.env` has been loaded).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub billing: BillingConfig,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub secret_key: String,
    /// Price used for the per-contract monthly seat.
    pub monthly_price_id: String,
    pub api_base: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: v,
            })?,
            Err(_) => 8080,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            billing: BillingConfig {
                secret_key: required("BILLING_SECRET_KEY")?,
                monthly_price_id: required("BILLING_MONTHLY_PRICE_ID")?,
                api_base: env::var("BILLING_API_BASE")
                    .unwrap_or_else(|_| DEFAULT_BILLING_API_BASE.to_string()),
            },
            port,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}
