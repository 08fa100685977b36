// src/core/engine.rs
use crate::config::EngineSettings;
use crate::connectors::traits::ExchangeGateway;
use crate::core::events::EventSink;
use crate::core::order_manager::{OrderManager, ReplaceOutcome};
use crate::core::price_window::PriceWindow;
use crate::error::EngineError;
use crate::strategies::trailing_stop::TrailingStop;
use crate::types::{Diagnostics, EngineEvent, FillReport, OrderStatus};
use crate::utils::stopwatch::Stopwatch;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Slack added to the stopwatch before comparing against the window duration.
const DIAGNOSTICS_SLACK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No price this round; nothing was touched.
    Skipped,
    Continue,
    Filled(FillReport),
}

pub struct TslEngine {
    settings: EngineSettings,
    gateway: Arc<dyn ExchangeGateway>,
    orders: OrderManager,
    stop: TrailingStop,
    window: PriceWindow,
    window_duration: Duration,
    stopwatch: Stopwatch,
    balance: Decimal,
    current_price: Option<Decimal>,
    events: EventSink,
}

impl TslEngine {
    pub fn new(
        settings: EngineSettings,
        gateway: Arc<dyn ExchangeGateway>,
        event_sender: mpsc::Sender<EngineEvent>,
    ) -> Self {
        let events = EventSink::new(event_sender);
        let orders = OrderManager::new(
            gateway.clone(),
            settings.symbol.clone(),
            settings.tick_size,
            settings.step_size,
            events.clone(),
        );
        let window_size = u32::try_from(settings.window_size).unwrap_or(u32::MAX);

        Self {
            stop: TrailingStop::new(settings.trailing_percent),
            window: PriceWindow::new(settings.window_size),
            window_duration: settings.wait_interval.saturating_mul(window_size),
            stopwatch: Stopwatch::start(),
            balance: Decimal::ZERO,
            current_price: None,
            orders,
            gateway,
            events,
            settings,
        }
    }

    pub fn stop_price(&self) -> Decimal {
        self.stop.stop_price()
    }

    #[cfg(test)]
    pub fn current_price(&self) -> Option<Decimal> {
        self.current_price
    }

    #[cfg(test)]
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    #[cfg(test)]
    pub fn window(&self) -> &PriceWindow {
        &self.window
    }

    #[cfg(test)]
    pub fn order_state(&self) -> crate::core::order_manager::OrderState {
        self.orders.state()
    }

    /// Blocks until the protective order is filled.
    pub async fn run(&mut self) -> Result<FillReport, EngineError> {
        info!("Engine starting...");
        self.init().await?;

        info!(
            symbol = %self.settings.symbol,
            stop_price = %self.stop.stop_price(),
            "Engine loop running"
        );

        loop {
            tokio::time::sleep(self.settings.wait_interval).await;

            if let TickOutcome::Filled(report) = self.tick().await? {
                return Ok(report);
            }
        }
    }

    /// Resolves the account, then either adopts the order already on the
    /// exchange or places the first one.
    pub async fn init(&mut self) -> Result<(), EngineError> {
        let asset = self.settings.asset.clone();
        let account = self
            .gateway
            .get_account(&asset)
            .await
            .map_err(|source| EngineError::AccountLookup {
                asset: asset.clone(),
                source,
            })?
            .ok_or_else(|| EngineError::AccountNotFound(asset.clone()))?;
        self.balance = account.balance;
        info!(%asset, balance = %self.balance, "account resolved");

        let existing = match self.gateway.find_open_order(&self.settings.symbol).await {
            Ok(existing) => existing,
            Err(e) => {
                warn!("could not list open orders: {:#}", e);
                None
            }
        };

        match existing {
            Some(order) => {
                self.stop.establish(order.stop_price);
                self.orders.adopt(order);
            }
            None => {
                warn!("didn't find existing orders");
                let price = self.initial_price().await;
                self.current_price = Some(price);
                let stop_price = self.stop.stop_for(price);
                self.stop.establish(stop_price);
                self.orders.create(stop_price, self.balance).await?;
            }
        }

        self.window = PriceWindow::new(self.settings.window_size);
        self.stopwatch.reset();
        Ok(())
    }

    /// Retries on every wait interval; no order exists yet to protect anything.
    async fn initial_price(&self) -> Decimal {
        loop {
            match self.gateway.fetch_price(&self.settings.symbol).await {
                Ok(price) => return price,
                Err(e) => {
                    warn!("could not get an initial price: {:#}", e);
                    self.events.send(EngineEvent::PriceUnavailable);
                    tokio::time::sleep(self.settings.wait_interval).await;
                }
            }
        }
    }

    /// One pass of fetch, append, diagnose, decide, check-terminal.
    pub async fn tick(&mut self) -> Result<TickOutcome, EngineError> {
        let price = match self.gateway.fetch_price(&self.settings.symbol).await {
            Ok(price) => price,
            Err(e) => {
                warn!("could not get a new price: {:#}", e);
                self.events.send(EngineEvent::PriceUnavailable);
                return Ok(TickOutcome::Skipped);
            }
        };

        self.current_price = Some(price);
        self.window.append(price);
        self.log_info_at_interval(price);

        if let Some(report) = self.raise_if_needed(price).await? {
            return Ok(TickOutcome::Filled(report));
        }

        self.check_for_fill().await
    }

    fn log_info_at_interval(&mut self, price: Decimal) {
        if self.stopwatch.elapsed() + DIAGNOSTICS_SLACK <= self.window_duration {
            return;
        }
        let (Some(average), Some(max), Some(min)) =
            (self.window.average(), self.window.max(), self.window.min())
        else {
            return;
        };

        self.events.send(EngineEvent::Diagnostics(Diagnostics {
            window_duration: self.window_duration,
            average,
            max,
            min,
            balance: self.balance,
            account_value: self.balance * price,
            stop_price: self.stop.stop_price(),
            order_changed_at: self.orders.last_changed(),
        }));
        self.stopwatch.reset();
    }

    async fn raise_if_needed(&mut self, price: Decimal) -> Result<Option<FillReport>, EngineError> {
        let Some(window_max) = self.window.max() else {
            return Ok(None);
        };
        if !self.stop.should_raise(window_max) {
            return Ok(None);
        }
        let Some(basis) = self.stop.raise_basis(price, window_max) else {
            return Ok(None);
        };

        let from = self.stop.stop_price();
        let target = self.stop.stop_for(basis);
        debug!(%price, %window_max, %from, %target, "update condition met");

        match self.orders.replace(target, self.balance).await? {
            ReplaceOutcome::Replaced { remaining } => {
                self.balance = remaining;
                if let Some(to) = self.stop.raise(basis) {
                    info!(%from, %to, %basis, "stop raised");
                    self.events.send(EngineEvent::StopRaised { from, to, basis });
                }
                Ok(None)
            }
            ReplaceOutcome::Deferred => Ok(None),
            ReplaceOutcome::Filled => Ok(self.report_fill()),
        }
    }

    async fn check_for_fill(&mut self) -> Result<TickOutcome, EngineError> {
        match self.orders.refresh_status().await {
            Some(OrderStatus::Done) => Ok(self
                .report_fill()
                .map_or(TickOutcome::Continue, TickOutcome::Filled)),
            Some(OrderStatus::Cancelled) => {
                self.balance -= self.orders.cancelled_fill();
                warn!(
                    stop_price = %self.stop.stop_price(),
                    balance = %self.balance,
                    "re-creating protective order"
                );
                self.orders
                    .create(self.stop.stop_price(), self.balance)
                    .await?;
                Ok(TickOutcome::Continue)
            }
            Some(OrderStatus::Open) | None => Ok(TickOutcome::Continue),
        }
    }

    fn report_fill(&self) -> Option<FillReport> {
        let report = self.orders.fill_report()?;
        info!(
            order_id = %report.order_id,
            filled = %report.filled_size,
            value = %report.executed_value,
            "[exe] sell executed"
        );
        self.events.send(EngineEvent::Filled(report.clone()));
        Some(report)
    }
}
