// src/core/order_manager.rs
use crate::connectors::traits::ExchangeGateway;
use crate::core::events::EventSink;
use crate::error::EngineError;
use crate::types::{
    EngineEvent, FillReport, OrderRequest, OrderStatus, ProtectiveOrder, Side, TimeInForce,
};
use crate::utils::precision::{normalize_price, normalize_quantity};
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Lifecycle of the single protective order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    NoOrder,
    Open,
    Done,
    /// Last order was cancelled; nothing is active.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    NothingToCancel,
    Cancelled,
    /// The order executed before the cancel landed.
    Filled,
    /// Cancel failed and the order may still be live.
    Unconfirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// New order placed for what the cancelled one left unfilled.
    Replaced { remaining: Decimal },
    Deferred,
    Filled,
}

pub struct OrderManager {
    gateway: Arc<dyn ExchangeGateway>,
    symbol: String,
    tick_size: Decimal,
    step_size: Decimal,
    order: Option<ProtectiveOrder>,
    state: OrderState,
    last_changed: DateTime<Utc>,
    /// Quantity the most recently cancelled order had executed.
    cancelled_fill: Decimal,
    events: EventSink,
}

impl OrderManager {
    pub fn new(
        gateway: Arc<dyn ExchangeGateway>,
        symbol: String,
        tick_size: Decimal,
        step_size: Decimal,
        events: EventSink,
    ) -> Self {
        Self {
            gateway,
            symbol,
            tick_size,
            step_size,
            order: None,
            state: OrderState::NoOrder,
            last_changed: Utc::now(),
            cancelled_fill: Decimal::ZERO,
            events,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> OrderState {
        self.state
    }

    #[cfg(test)]
    pub fn order(&self) -> Option<&ProtectiveOrder> {
        self.order.as_ref()
    }

    pub fn cancelled_fill(&self) -> Decimal {
        self.cancelled_fill
    }

    pub fn last_changed(&self) -> DateTime<Utc> {
        self.last_changed
    }

    fn transition(&mut self, state: OrderState) {
        self.state = state;
        self.last_changed = Utc::now();
    }

    /// Takes over an order already resting on the exchange.
    pub fn adopt(&mut self, order: ProtectiveOrder) {
        info!(order_id = %order.id, stop_price = %order.stop_price, "found existing order");
        self.events.send(EngineEvent::OrderAdopted {
            order_id: order.id.clone(),
            stop_price: order.stop_price,
        });
        self.order = Some(order);
        self.transition(OrderState::Open);
    }

    /// Places a sell stop-limit for the whole balance. Any failure is fatal:
    /// the position would be left unprotected.
    pub async fn create(
        &mut self,
        stop_price: Decimal,
        balance: Decimal,
    ) -> Result<&ProtectiveOrder, EngineError> {
        let price = normalize_price(stop_price, self.tick_size);
        let size = normalize_quantity(balance, self.step_size);

        if size.is_zero() {
            return Err(EngineError::OrderPlacement {
                stop_price,
                source: anyhow!("balance {} rounds to a zero quantity", balance),
            });
        }

        let request = OrderRequest {
            symbol: self.symbol.clone(),
            side: Side::Sell,
            stop_price: price,
            limit_price: price,
            size,
            time_in_force: TimeInForce::Gtc,
            client_order_id: format!("tsl-{}", Uuid::new_v4().simple()),
        };

        let placed = self
            .gateway
            .place_order(&request)
            .await
            .map_err(|source| EngineError::OrderPlacement { stop_price, source })?;

        info!(order_id = %placed.id, stop_price = %price, %size, "[order] placed");
        self.events.send(EngineEvent::OrderPlaced {
            order_id: placed.id.clone(),
            stop_price: price,
            size,
        });

        self.transition(OrderState::Open);
        Ok(&*self.order.insert(placed))
    }

    /// Cancels the active order. A failed cancel is re-verified against the
    /// exchange instead of assuming the order is gone.
    pub async fn cancel(&mut self) -> CancelOutcome {
        self.cancelled_fill = Decimal::ZERO;
        let order_id = match (&self.order, self.state) {
            (Some(order), OrderState::Open) => order.id.clone(),
            _ => {
                warn!("no order to cancel");
                return CancelOutcome::NothingToCancel;
            }
        };

        match self.gateway.cancel_order(&self.symbol, &order_id).await {
            Ok(cancelled) => {
                self.mark_cancelled(&cancelled);
                CancelOutcome::Cancelled
            }
            Err(e) => {
                warn!(%order_id, "could not cancel order: {:#}", e);
                self.verify_after_failed_cancel(order_id).await
            }
        }
    }

    async fn verify_after_failed_cancel(&mut self, order_id: String) -> CancelOutcome {
        match self.gateway.get_order(&self.symbol, &order_id).await {
            Ok(order) => match order.status {
                OrderStatus::Cancelled => {
                    self.mark_cancelled(&order);
                    CancelOutcome::Cancelled
                }
                OrderStatus::Done => {
                    self.order = Some(order);
                    self.transition(OrderState::Done);
                    CancelOutcome::Filled
                }
                OrderStatus::Open => {
                    warn!(%order_id, "order still open after failed cancel");
                    CancelOutcome::Unconfirmed
                }
            },
            Err(e) => {
                warn!(%order_id, "could not verify order after failed cancel: {:#}", e);
                CancelOutcome::Unconfirmed
            }
        }
    }

    fn mark_cancelled(&mut self, cancelled: &ProtectiveOrder) {
        if !cancelled.filled_size.is_zero() {
            warn!(
                order_id = %cancelled.id,
                filled = %cancelled.filled_size,
                "cancelled order was partially filled"
            );
        }
        self.cancelled_fill = cancelled.filled_size;
        self.order = None;
        self.transition(OrderState::Cancelled);
        self.events.send(EngineEvent::OrderCancelled {
            order_id: cancelled.id.clone(),
        });
    }

    /// Cancel followed by create at `stop_price`. The new order covers
    /// `balance` less whatever the cancelled order already sold.
    pub async fn replace(
        &mut self,
        stop_price: Decimal,
        balance: Decimal,
    ) -> Result<ReplaceOutcome, EngineError> {
        match self.cancel().await {
            CancelOutcome::Filled => Ok(ReplaceOutcome::Filled),
            CancelOutcome::Unconfirmed => {
                if let Some(order) = &self.order {
                    self.events.send(EngineEvent::ReplacementDeferred {
                        order_id: order.id.clone(),
                    });
                }
                Ok(ReplaceOutcome::Deferred)
            }
            CancelOutcome::Cancelled | CancelOutcome::NothingToCancel => {
                let remaining = balance - self.cancelled_fill;
                self.create(stop_price, remaining).await?;
                Ok(ReplaceOutcome::Replaced { remaining })
            }
        }
    }

    /// Polls the exchange for the active order's status. A failed poll leaves
    /// the last known status in place.
    pub async fn refresh_status(&mut self) -> Option<OrderStatus> {
        if self.state != OrderState::Open {
            return None;
        }
        let order_id = self.order.as_ref()?.id.clone();

        match self.gateway.get_order(&self.symbol, &order_id).await {
            Ok(order) => {
                let status = order.status;
                match status {
                    OrderStatus::Open => self.order = Some(order),
                    OrderStatus::Done => {
                        self.order = Some(order);
                        self.transition(OrderState::Done);
                    }
                    OrderStatus::Cancelled => {
                        warn!(%order_id, "order was cancelled outside the engine");
                        self.mark_cancelled(&order);
                    }
                }
                Some(status)
            }
            Err(e) => {
                warn!(%order_id, "could not refresh order status: {:#}", e);
                Some(OrderStatus::Open)
            }
        }
    }

    pub fn fill_report(&self) -> Option<FillReport> {
        match (&self.order, self.state) {
            (Some(order), OrderState::Done) => Some(FillReport {
                order_id: order.id.clone(),
                symbol: order.symbol.clone(),
                filled_size: order.filled_size,
                executed_value: order.executed_value,
                stop_price: order.stop_price,
            }),
            _ => None,
        }
    }
}
