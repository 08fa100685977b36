// src/connectors/messages.rs
use crate::types::{OrderStatus, ProtectiveOrder, Side, TimeInForce};
use rust_decimal::Decimal;
use serde::Deserialize;

/// GET /api/v3/ticker/price
#[derive(Debug, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct Balance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

/// GET /api/v3/account
#[derive(Debug, Deserialize)]
pub struct AccountInfo {
    pub balances: Vec<Balance>,
}

/// Order object as returned by the order, openOrders, cancel and (RESULT) create endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceOrder {
    pub symbol: String,
    pub order_id: u64,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub orig_qty: Decimal,
    #[serde(default)]
    pub executed_qty: Decimal,
    #[serde(rename = "cummulativeQuoteQty", default)]
    pub cumulative_quote_qty: Decimal,
    pub status: String,
    pub side: String,
    #[serde(default)]
    pub stop_price: Option<Decimal>,
}

/// Maps the exchange status string onto the engine's view of the order.
pub fn map_status(status: &str) -> OrderStatus {
    match status {
        "FILLED" => OrderStatus::Done,
        "CANCELED" | "PENDING_CANCEL" | "REJECTED" | "EXPIRED" | "EXPIRED_IN_MATCH" => {
            OrderStatus::Cancelled
        }
        _ => OrderStatus::Open,
    }
}

impl BinanceOrder {
    pub fn is_sell(&self) -> bool {
        self.side.eq_ignore_ascii_case("SELL")
    }

    pub fn into_protective(self) -> ProtectiveOrder {
        // plain limit orders report a zero stopPrice
        let stop_price = self
            .stop_price
            .filter(|p| !p.is_zero())
            .unwrap_or(self.price);
        let side = if self.is_sell() { Side::Sell } else { Side::Buy };
        ProtectiveOrder {
            id: self.order_id.to_string(),
            symbol: self.symbol,
            side,
            stop_price,
            limit_price: self.price,
            size: self.orig_qty,
            time_in_force: TimeInForce::Gtc,
            status: map_status(&self.status),
            filled_size: self.executed_qty,
            executed_value: self.cumulative_quote_qty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_stop_loss_limit_order() {
        let raw = r#"{
            "symbol": "BTCUSDT",
            "orderId": 28,
            "orderListId": -1,
            "clientOrderId": "6gCrw2kRUAF9CvJDGP16IP",
            "price": "95000.00000000",
            "origQty": "0.50000000",
            "executedQty": "0.00000000",
            "cummulativeQuoteQty": "0.00000000",
            "status": "NEW",
            "timeInForce": "GTC",
            "type": "STOP_LOSS_LIMIT",
            "side": "SELL",
            "stopPrice": "95000.00000000",
            "time": 1499827319559
        }"#;

        let order: BinanceOrder = serde_json::from_str(raw).expect("parse order");
        assert!(order.is_sell());
        let order = order.into_protective();
        assert_eq!(order.id, "28");
        assert_eq!(order.stop_price, dec!(95000));
        assert_eq!(order.size, dec!(0.5));
        assert_eq!(order.status, OrderStatus::Open);
    }

    #[test]
    fn test_filled_order_carries_execution() {
        let raw = r#"{
            "symbol": "BTCUSDT",
            "orderId": 29,
            "price": "90.00",
            "origQty": "2.0",
            "executedQty": "2.0",
            "cummulativeQuoteQty": "180.5",
            "status": "FILLED",
            "side": "SELL",
            "stopPrice": "0.0"
        }"#;

        let order: BinanceOrder = serde_json::from_str(raw).expect("parse order");
        let order = order.into_protective();
        assert_eq!(order.status, OrderStatus::Done);
        assert_eq!(order.stop_price, dec!(90));
        assert_eq!(order.executed_value, dec!(180.5));
    }

    #[test]
    fn test_cancel_response_keeps_partial_fill() {
        // DELETE /api/v3/order on a partly executed stop-limit
        let raw = r#"{
            "symbol": "BTCUSDT",
            "origClientOrderId": "tsl-1",
            "orderId": 30,
            "clientOrderId": "cancel-1",
            "price": "104.50",
            "origQty": "1.00000000",
            "executedQty": "0.40000000",
            "cummulativeQuoteQty": "41.80000000",
            "status": "CANCELED",
            "timeInForce": "GTC",
            "type": "STOP_LOSS_LIMIT",
            "side": "SELL",
            "stopPrice": "104.50"
        }"#;

        let order: BinanceOrder = serde_json::from_str(raw).expect("parse order");
        let order = order.into_protective();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.side, Side::Sell);
        assert_eq!(order.filled_size, dec!(0.4));
        assert_eq!(order.size - order.filled_size, dec!(0.6));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(map_status("NEW"), OrderStatus::Open);
        assert_eq!(map_status("PARTIALLY_FILLED"), OrderStatus::Open);
        assert_eq!(map_status("FILLED"), OrderStatus::Done);
        assert_eq!(map_status("CANCELED"), OrderStatus::Cancelled);
        assert_eq!(map_status("EXPIRED"), OrderStatus::Cancelled);
    }

    #[test]
    fn test_parse_account_balances() {
        let raw = r#"{"balances": [
            {"asset": "BTC", "free": "0.40000000", "locked": "0.10000000"},
            {"asset": "USDT", "free": "12.5", "locked": "0"}
        ]}"#;
        let info: AccountInfo = serde_json::from_str(raw).expect("parse account");
        let btc = info.balances.iter().find(|b| b.asset == "BTC").unwrap();
        assert_eq!(btc.free + btc.locked, dec!(0.5));
    }
}
