// src/connectors/paper.rs
use crate::connectors::traits::ExchangeGateway;
use crate::types::{Account, OrderRequest, OrderStatus, ProtectiveOrder};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Default)]
struct PaperBook {
    orders: HashMap<String, ProtectiveOrder>,
    next_id: u64,
}

/// Real prices, simulated account and orders. A resting stop fills at its
/// limit price as soon as an observed price trades through the stop.
pub struct PaperExchange {
    prices: Arc<dyn ExchangeGateway>,
    asset: String,
    balance: Decimal,
    book: Mutex<PaperBook>,
}

impl PaperExchange {
    pub fn new(prices: Arc<dyn ExchangeGateway>, asset: &str, balance: Decimal) -> Self {
        Self {
            prices,
            asset: asset.to_uppercase(),
            balance,
            book: Mutex::new(PaperBook::default()),
        }
    }
}

#[async_trait]
impl ExchangeGateway for PaperExchange {
    async fn get_account(&self, asset: &str) -> Result<Option<Account>> {
        if !asset.eq_ignore_ascii_case(&self.asset) {
            return Ok(None);
        }
        Ok(Some(Account {
            asset: self.asset.clone(),
            balance: self.balance,
        }))
    }

    async fn fetch_price(&self, symbol: &str) -> Result<Decimal> {
        let price = self.prices.fetch_price(symbol).await?;

        let mut book = self.book.lock().await;
        for order in book.orders.values_mut() {
            if order.symbol == symbol
                && order.status == OrderStatus::Open
                && price <= order.stop_price
            {
                order.status = OrderStatus::Done;
                order.filled_size = order.size;
                order.executed_value = order.size * order.limit_price;
                info!(order_id = %order.id, %price, "Paper fill");
            }
        }
        Ok(price)
    }

    async fn find_open_order(&self, symbol: &str) -> Result<Option<ProtectiveOrder>> {
        let book = self.book.lock().await;
        Ok(book
            .orders
            .values()
            .find(|o| o.symbol == symbol && o.status == OrderStatus::Open)
            .cloned())
    }

    async fn get_order(&self, _symbol: &str, order_id: &str) -> Result<ProtectiveOrder> {
        let book = self.book.lock().await;
        book.orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown paper order {}", order_id))
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<ProtectiveOrder> {
        if request.size > self.balance {
            return Err(anyhow!(
                "Insufficient paper balance: {} > {}",
                request.size,
                self.balance
            ));
        }

        let mut book = self.book.lock().await;
        book.next_id += 1;
        let order = ProtectiveOrder::from_request(
            format!("paper-{}", book.next_id),
            request,
            OrderStatus::Open,
        );
        info!(
            "Paper order: {} {} @ stop {}",
            order.symbol, order.size, order.stop_price
        );
        book.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn cancel_order(&self, _symbol: &str, order_id: &str) -> Result<ProtectiveOrder> {
        let mut book = self.book.lock().await;
        let order = book
            .orders
            .get_mut(order_id)
            .ok_or_else(|| anyhow!("Unknown paper order {}", order_id))?;
        if order.status != OrderStatus::Open {
            return Err(anyhow!("Paper order {} is not open", order_id));
        }
        order.status = OrderStatus::Cancelled;
        Ok(order.clone())
    }
}
