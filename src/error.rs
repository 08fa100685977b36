// src/error.rs
use thiserror::Error;

/// Unrecoverable engine failures. Anything that maps here ends the process.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("account for asset {0} not found")]
    AccountNotFound(String),

    #[error("failed to resolve account for {asset}: {source}")]
    AccountLookup {
        asset: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to place protective order at stop {stop_price}: {source}")]
    OrderPlacement {
        stop_price: rust_decimal::Decimal,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
