// src/types.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-till-cancelled
    Gtc,
}

/// Last known exchange-side status of a protective order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    Done,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub asset: String,
    /// Full held balance (free + locked in open orders)
    pub balance: Decimal,
}

/// Parameters of a sell stop-limit order as submitted to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub stop_price: Decimal,
    pub limit_price: Decimal,
    pub size: Decimal,
    pub time_in_force: TimeInForce,
    pub client_order_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectiveOrder {
    pub id: String,
    pub symbol: String,
    pub side: Side,
    pub stop_price: Decimal,
    pub limit_price: Decimal,
    pub size: Decimal,
    pub time_in_force: TimeInForce,
    pub status: OrderStatus,
    pub filled_size: Decimal,
    /// Quote value received so far
    pub executed_value: Decimal,
}

impl ProtectiveOrder {
    pub fn from_request(id: String, request: &OrderRequest, status: OrderStatus) -> Self {
        Self {
            id,
            symbol: request.symbol.clone(),
            side: request.side,
            stop_price: request.stop_price,
            limit_price: request.limit_price,
            size: request.size,
            time_in_force: request.time_in_force,
            status,
            filled_size: Decimal::ZERO,
            executed_value: Decimal::ZERO,
        }
    }
}

/// What the engine reports once the protective order has executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillReport {
    pub order_id: String,
    pub symbol: String,
    pub filled_size: Decimal,
    pub executed_value: Decimal,
    pub stop_price: Decimal,
}

impl FillReport {
    pub fn average_price(&self) -> Option<Decimal> {
        if self.filled_size.is_zero() {
            None
        } else {
            Some(self.executed_value / self.filled_size)
        }
    }
}

/// Periodic snapshot emitted once per window duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    pub window_duration: Duration,
    pub average: Decimal,
    pub max: Decimal,
    pub min: Decimal,
    pub balance: Decimal,
    pub account_value: Decimal,
    pub stop_price: Decimal,
    pub order_changed_at: DateTime<Utc>,
}

/// Events flowing out of the engine to whoever renders them.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    OrderAdopted { order_id: String, stop_price: Decimal },
    OrderPlaced { order_id: String, stop_price: Decimal, size: Decimal },
    OrderCancelled { order_id: String },
    StopRaised { from: Decimal, to: Decimal, basis: Decimal },
    ReplacementDeferred { order_id: String },
    PriceUnavailable,
    Diagnostics(Diagnostics),
    Filled(FillReport),
}
