// src/connectors/mock.rs
//! Scripted in-memory gateway for engine tests.
use crate::connectors::traits::ExchangeGateway;
use crate::types::{Account, OrderRequest, OrderStatus, ProtectiveOrder, Side, TimeInForce};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub const SYMBOL: &str = "BTCUSDT";

#[derive(Default)]
struct MockState {
    /// `None` entries simulate a failed fetch
    prices: VecDeque<Option<Decimal>>,
    price_fetches: usize,
    account: Option<Account>,
    existing_order: Option<String>,
    orders: HashMap<String, ProtectiveOrder>,
    placed: Vec<OrderRequest>,
    cancelled: Vec<String>,
    status_polls: usize,
    fill_after_fetches: Option<usize>,
    cancel_error: Option<OrderStatus>,
    status_fails: bool,
    placement_fails: bool,
    next_id: u64,
}

#[derive(Default)]
pub struct MockExchange {
    state: Mutex<MockState>,
}

impl MockExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, balance: Decimal) -> Self {
        self.state.lock().unwrap().account = Some(Account {
            asset: "BTC".into(),
            balance,
        });
        self
    }

    pub fn with_prices<I>(self, prices: I) -> Self
    where
        I: IntoIterator<Item = Option<Decimal>>,
    {
        self.state.lock().unwrap().prices.extend(prices);
        self
    }

    pub fn with_existing_order(self, stop_price: Decimal, size: Decimal) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let order = ProtectiveOrder {
                id: "existing".into(),
                symbol: SYMBOL.into(),
                side: Side::Sell,
                stop_price,
                limit_price: stop_price,
                size,
                time_in_force: TimeInForce::Gtc,
                status: OrderStatus::Open,
                filled_size: Decimal::ZERO,
                executed_value: Decimal::ZERO,
            };
            state.existing_order = Some(order.id.clone());
            state.orders.insert(order.id.clone(), order);
        }
        self
    }

    /// The open order is reported filled once this many prices were fetched.
    pub fn fill_after(self, fetches: usize) -> Self {
        self.state.lock().unwrap().fill_after_fetches = Some(fetches);
        self
    }

    /// Cancels fail; a re-query then reports the order with `status_after`.
    pub fn failing_cancel(self, status_after: OrderStatus) -> Self {
        self.state.lock().unwrap().cancel_error = Some(status_after);
        self
    }

    /// Status queries fail, as when the exchange is unreachable.
    pub fn failing_status(self) -> Self {
        self.state.lock().unwrap().status_fails = true;
        self
    }

    pub fn failing_placement(self) -> Self {
        self.state.lock().unwrap().placement_fails = true;
        self
    }

    /// Marks an order as cancelled behind the engine's back.
    pub fn cancel_externally(&self, order_id: &str) {
        if let Some(order) = self.state.lock().unwrap().orders.get_mut(order_id) {
            order.status = OrderStatus::Cancelled;
        }
    }

    /// Executes `size` of an open order without completing it.
    pub fn fill_partially(&self, order_id: &str, size: Decimal) {
        if let Some(order) = self.state.lock().unwrap().orders.get_mut(order_id) {
            order.filled_size = size;
            order.executed_value = size * order.limit_price;
        }
    }

    pub fn placed(&self) -> Vec<OrderRequest> {
        self.state.lock().unwrap().placed.clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.state.lock().unwrap().cancelled.clone()
    }

    pub fn price_fetches(&self) -> usize {
        self.state.lock().unwrap().price_fetches
    }

    pub fn status_polls(&self) -> usize {
        self.state.lock().unwrap().status_polls
    }

    pub fn open_orders(&self) -> Vec<ProtectiveOrder> {
        self.state
            .lock()
            .unwrap()
            .orders
            .values()
            .filter(|o| o.status == OrderStatus::Open)
            .cloned()
            .collect()
    }
}

fn fill(order: &mut ProtectiveOrder) {
    order.status = OrderStatus::Done;
    order.filled_size = order.size;
    order.executed_value = order.size * order.limit_price;
}

#[async_trait]
impl ExchangeGateway for MockExchange {
    async fn get_account(&self, asset: &str) -> Result<Option<Account>> {
        let state = self.state.lock().unwrap();
        Ok(state.account.clone().filter(|a| a.asset == asset))
    }

    async fn fetch_price(&self, _symbol: &str) -> Result<Decimal> {
        let mut state = self.state.lock().unwrap();
        let next = state
            .prices
            .pop_front()
            .unwrap_or_else(|| panic!("price script exhausted"));
        state.price_fetches += 1;
        next.ok_or_else(|| anyhow!("ticker unavailable"))
    }

    async fn find_open_order(&self, _symbol: &str) -> Result<Option<ProtectiveOrder>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .existing_order
            .as_ref()
            .and_then(|id| state.orders.get(id))
            .cloned())
    }

    async fn get_order(&self, _symbol: &str, order_id: &str) -> Result<ProtectiveOrder> {
        let mut state = self.state.lock().unwrap();
        state.status_polls += 1;
        if state.status_fails {
            return Err(anyhow!("order status unavailable"));
        }
        let due = state
            .fill_after_fetches
            .is_some_and(|n| state.price_fetches >= n);
        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| anyhow!("unknown order {}", order_id))?;
        if due && order.status == OrderStatus::Open {
            fill(order);
        }
        Ok(order.clone())
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<ProtectiveOrder> {
        let mut state = self.state.lock().unwrap();
        if state.placement_fails {
            return Err(anyhow!("insufficient balance"));
        }
        state.next_id += 1;
        let order = ProtectiveOrder::from_request(
            format!("order-{}", state.next_id),
            request,
            OrderStatus::Open,
        );
        state.placed.push(request.clone());
        state.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn cancel_order(&self, _symbol: &str, order_id: &str) -> Result<ProtectiveOrder> {
        let mut state = self.state.lock().unwrap();
        if let Some(status_after) = state.cancel_error {
            if let Some(order) = state.orders.get_mut(order_id) {
                match status_after {
                    OrderStatus::Done => fill(order),
                    other => order.status = other,
                }
            }
            return Err(anyhow!("cancel rejected"));
        }
        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| anyhow!("unknown order {}", order_id))?;
        order.status = OrderStatus::Cancelled;
        let cancelled = order.clone();
        state.cancelled.push(order_id.to_string());
        Ok(cancelled)
    }
}
