// src/config.rs

use crate::error::ConfigError;
use config::{Config, Environment, File};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Values supplied on the command line. They win over file and environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub settings_file: Option<String>,
    pub asset: Option<String>,
    pub wait_interval_secs: Option<u64>,
    pub window_size: Option<u64>,
    pub trailing_percent: Option<f64>,
    pub live_trading: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub secret_key: String,
    pub base_url: String,
    /// Held asset, e.g. "BTC"
    pub asset: String,
    pub quote_currency: String,
    pub wait_interval_secs: u64,
    pub window_size: usize,
    /// 0.05 = 5% below the reference price
    pub trailing_percent: f64,
    pub symbol_tick_size: Decimal,
    pub symbol_step_size: Decimal,
    pub http_timeout_secs: u64,
    pub log_file: String,
    pub live_trading: bool,
    /// Simulated holdings used when `live_trading` is off
    pub paper_balance: Decimal,
}

/// The subset of configuration the decision engine runs on.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub asset: String,
    pub symbol: String,
    pub wait_interval: Duration,
    pub window_size: usize,
    pub trailing_percent: Decimal,
    pub tick_size: Decimal,
    pub step_size: Decimal,
}

impl AppConfig {
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        let settings_file = overrides.settings_file.as_deref().unwrap_or("Settings");

        let builder = Config::builder()
            .set_default("api_key", "")?
            .set_default("secret_key", "")?
            .set_default("base_url", "https://api.binance.com")?
            .set_default("asset", "BTC")?
            .set_default("quote_currency", "USDT")?
            .set_default("wait_interval_secs", 10)?
            .set_default("window_size", 10)?
            .set_default("trailing_percent", 0.05)?
            .set_default("symbol_tick_size", "0.01")?
            .set_default("symbol_step_size", "0.00001")?
            .set_default("http_timeout_secs", 15)?
            .set_default("log_file", "tsl.log")?
            .set_default("live_trading", false)?
            .set_default("paper_balance", "1")?
            .add_source(File::with_name(settings_file).required(overrides.settings_file.is_some()))
            .add_source(Environment::with_prefix("TSL").try_parsing(true))
            .set_override_option("asset", overrides.asset.clone())?
            .set_override_option("wait_interval_secs", overrides.wait_interval_secs)?
            .set_override_option("window_size", overrides.window_size)?
            .set_override_option("trailing_percent", overrides.trailing_percent)?
            .set_override_option("live_trading", overrides.live_trading)?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.trailing_percent > 0.0 && self.trailing_percent < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "trailing_percent must be within (0, 1), got {}",
                self.trailing_percent
            )));
        }
        if self.window_size == 0 {
            return Err(ConfigError::Invalid("window_size must be positive".into()));
        }
        if self.wait_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "wait_interval_secs must be positive".into(),
            ));
        }
        if self.asset.trim().is_empty() || self.quote_currency.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "asset and quote_currency must be set".into(),
            ));
        }
        if self.live_trading && (self.api_key.is_empty() || self.secret_key.is_empty()) {
            return Err(ConfigError::Invalid(
                "live trading requires api_key and secret_key".into(),
            ));
        }
        if !self.live_trading && self.paper_balance <= Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "paper trading requires a positive paper_balance, got {}",
                self.paper_balance
            )));
        }
        Ok(())
    }

    /// Exchange market symbol, e.g. "BTCUSDT".
    pub fn symbol(&self) -> String {
        format!(
            "{}{}",
            self.asset.to_uppercase(),
            self.quote_currency.to_uppercase()
        )
    }

    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        let trailing_percent = Decimal::from_f64(self.trailing_percent).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "trailing_percent {} is not representable",
                self.trailing_percent
            ))
        })?;

        Ok(EngineSettings {
            asset: self.asset.to_uppercase(),
            symbol: self.symbol(),
            wait_interval: Duration::from_secs(self.wait_interval_secs),
            window_size: self.window_size,
            trailing_percent,
            tick_size: self.symbol_tick_size,
            step_size: self.symbol_step_size,
        })
    }
}
