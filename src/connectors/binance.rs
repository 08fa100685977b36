// src/connectors/binance.rs
use crate::connectors::messages::{AccountInfo, BinanceOrder, TickerPrice};
use crate::connectors::traits::ExchangeGateway;
use crate::types::{Account, OrderRequest, ProtectiveOrder, Side, TimeInForce};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

type HmacSha256 = Hmac<Sha256>;

const RECV_WINDOW_MS: &str = "5000";

pub struct BinanceClient {
    api_key: String,
    secret_key: String,
    http_client: Client,
    base_url: Url,
}

impl BinanceClient {
    pub fn new(
        api_key: String,
        secret_key: String,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid base url {}", base_url))?;
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key,
            secret_key,
            http_client,
            base_url,
        })
    }

    fn sign_and_build_query(&self, params: Vec<(&str, String)>) -> Result<String> {
        let mut params = params;
        params.push(("recvWindow", RECV_WINDOW_MS.to_string()));
        params.push(("timestamp", Utc::now().timestamp_millis().to_string()));

        let query_string = serde_urlencoded::to_string(&params)?;
        let signature = sign(&self.secret_key, &query_string)?;

        Ok(format!("{}&signature={}", query_string, signature))
    }

    async fn send_public_request<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        params: Vec<(&str, String)>,
    ) -> Result<T> {
        let mut url = self.base_url.join(endpoint)?;
        url.set_query(Some(&serde_urlencoded::to_string(&params)?));

        let response = self
            .http_client
            .get(url)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<T>().await?)
    }

    async fn send_signed_request<T: for<'de> Deserialize<'de>>(
        &self,
        method: Method,
        endpoint: &str,
        params: Vec<(&str, String)>,
    ) -> Result<T> {
        let mut url = self.base_url.join(endpoint)?;
        url.set_query(Some(&self.sign_and_build_query(params)?));

        debug!(%method, endpoint, "signed request");

        let response = self
            .http_client
            .request(method, url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<T>().await?)
    }
}

fn sign(secret_key: &str, payload: &str) -> Result<String> {
    let mut mac =
        HmacSha256::new_from_slice(secret_key.as_bytes()).context("Invalid secret key length")?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn order_params(request: &OrderRequest) -> Vec<(&'static str, String)> {
    let side = match request.side {
        Side::Buy => "BUY",
        Side::Sell => "SELL",
    };
    let time_in_force = match request.time_in_force {
        TimeInForce::Gtc => "GTC",
    };

    vec![
        ("symbol", request.symbol.clone()),
        ("side", side.to_string()),
        ("type", "STOP_LOSS_LIMIT".to_string()),
        ("timeInForce", time_in_force.to_string()),
        ("quantity", request.size.to_string()),
        ("price", request.limit_price.to_string()),
        ("stopPrice", request.stop_price.to_string()),
        ("newClientOrderId", request.client_order_id.clone()),
        ("newOrderRespType", "RESULT".to_string()),
    ]
}

#[async_trait]
impl ExchangeGateway for BinanceClient {
    async fn get_account(&self, asset: &str) -> Result<Option<Account>> {
        let resp: AccountInfo = self
            .send_signed_request(Method::GET, "/api/v3/account", vec![])
            .await?;

        Ok(resp
            .balances
            .into_iter()
            .find(|b| b.asset.eq_ignore_ascii_case(asset))
            .map(|b| Account {
                asset: b.asset,
                balance: b.free + b.locked,
            }))
    }

    async fn fetch_price(&self, symbol: &str) -> Result<Decimal> {
        let ticker: TickerPrice = self
            .send_public_request("/api/v3/ticker/price", vec![("symbol", symbol.to_string())])
            .await
            .with_context(|| format!("Failed to fetch price for {}", symbol))?;

        if ticker.symbol != symbol {
            return Err(anyhow!(
                "Ticker returned {} while asking for {}",
                ticker.symbol,
                symbol
            ));
        }
        Ok(ticker.price)
    }

    async fn find_open_order(&self, symbol: &str) -> Result<Option<ProtectiveOrder>> {
        let orders: Vec<BinanceOrder> = self
            .send_signed_request(
                Method::GET,
                "/api/v3/openOrders",
                vec![("symbol", symbol.to_string())],
            )
            .await?;

        Ok(orders
            .into_iter()
            .find(|o| o.symbol == symbol && o.is_sell())
            .map(BinanceOrder::into_protective))
    }

    async fn get_order(&self, symbol: &str, order_id: &str) -> Result<ProtectiveOrder> {
        let order: BinanceOrder = self
            .send_signed_request(
                Method::GET,
                "/api/v3/order",
                vec![
                    ("symbol", symbol.to_string()),
                    ("orderId", order_id.to_string()),
                ],
            )
            .await?;

        Ok(order.into_protective())
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<ProtectiveOrder> {
        info!(
            "Sending stop order: {} {} @ stop {} / limit {}",
            request.symbol, request.size, request.stop_price, request.limit_price
        );

        let order: BinanceOrder = self
            .send_signed_request(Method::POST, "/api/v3/order", order_params(request))
            .await?;

        // the RESULT response omits stopPrice, keep what we asked for
        let status = crate::connectors::messages::map_status(&order.status);
        Ok(ProtectiveOrder::from_request(
            order.order_id.to_string(),
            request,
            status,
        ))
    }

    async fn cancel_order(&self, symbol: &str, order_id: &str) -> Result<ProtectiveOrder> {
        let order: BinanceOrder = self
            .send_signed_request(
                Method::DELETE,
                "/api/v3/order",
                vec![
                    ("symbol", symbol.to_string()),
                    ("orderId", order_id.to_string()),
                ],
            )
            .await?;
        Ok(order.into_protective())
    }
}
