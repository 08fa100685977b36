// src/connectors/traits.rs
use crate::types::{Account, OrderRequest, ProtectiveOrder};
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// `Ok(None)` when the account holds no such asset.
    async fn get_account(&self, asset: &str) -> Result<Option<Account>>;

    async fn fetch_price(&self, symbol: &str) -> Result<Decimal>;

    /// First open sell order on `symbol`, if any.
    async fn find_open_order(&self, symbol: &str) -> Result<Option<ProtectiveOrder>>;

    async fn get_order(&self, symbol: &str, order_id: &str) -> Result<ProtectiveOrder>;

    async fn place_order(&self, request: &OrderRequest) -> Result<ProtectiveOrder>;

    /// Returns the order as it stood when cancelled, including any partial fill.
    async fn cancel_order(&self, symbol: &str, order_id: &str) -> Result<ProtectiveOrder>;
}
