// src/reporter.rs
use crate::types::{EngineEvent, FillReport};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Renders engine events as log records. Owns no engine state; it only sees
/// the snapshots the engine chose to send.
#[derive(Debug, Default)]
pub struct Reporter {
    pub stop_price: Option<Decimal>,
    pub orders_placed: usize,
    pub missed_prices: usize,
    pub fill: Option<FillReport>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::OrderAdopted {
                order_id,
                stop_price,
            } => {
                info!("[info]    found existing order {}, price {}", order_id, stop_price);
                self.stop_price = Some(stop_price);
            }
            EngineEvent::OrderPlaced {
                order_id,
                stop_price,
                size,
            } => {
                info!("[order]   placed {} for {} @ {}", order_id, size, stop_price);
                self.orders_placed += 1;
                self.stop_price = Some(stop_price);
            }
            EngineEvent::OrderCancelled { order_id } => {
                info!("[order]   cancelled {}", order_id);
            }
            EngineEvent::StopRaised { from, to, basis } => {
                info!("[order]   stop raised {} -> {} (basis {})", from, to, basis);
            }
            EngineEvent::ReplacementDeferred { order_id } => {
                warn!("[warn]    replacement deferred, {} may still be live", order_id);
            }
            EngineEvent::PriceUnavailable => {
                self.missed_prices += 1;
            }
            EngineEvent::Diagnostics(d) => {
                let secs = d.window_duration.as_secs();
                info!("[info]    {} second rolling average: {:.2}", secs, d.average);
                info!("[info]    {} second rolling max: {:.2}", secs, d.max);
                info!("[info]    {} second rolling min: {:.2}", secs, d.min);
                info!("[account] active stop order: {:.2}", d.stop_price);
                info!(
                    "[account] value: {:.2}, balance {}",
                    d.account_value, d.balance
                );
                if self.missed_prices > 0 {
                    warn!("[warn]    {} price fetches failed", self.missed_prices);
                    self.missed_prices = 0;
                }
            }
            EngineEvent::Filled(report) => {
                info!(
                    "[exe]     sell executed for {} ({} filled)",
                    report.executed_value, report.filled_size
                );
                self.fill = Some(report);
            }
        }
    }
}

pub async fn run(mut rx: mpsc::Receiver<EngineEvent>) -> Reporter {
    let mut reporter = Reporter::new();
    while let Some(event) = rx.recv().await {
        reporter.on_event(event);
    }
    reporter
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_run_drains_until_sender_dropped() {
        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(run(rx));

        tx.send(EngineEvent::OrderAdopted {
            order_id: "1".into(),
            stop_price: dec!(90),
        })
        .await
        .unwrap();
        tx.send(EngineEvent::OrderPlaced {
            order_id: "2".into(),
            stop_price: dec!(95),
            size: dec!(1),
        })
        .await
        .unwrap();
        tx.send(EngineEvent::PriceUnavailable).await.unwrap();
        tx.send(EngineEvent::Filled(FillReport {
            order_id: "2".into(),
            symbol: "BTCUSDT".into(),
            filled_size: dec!(1),
            executed_value: dec!(95),
            stop_price: dec!(95),
        }))
        .await
        .unwrap();
        drop(tx);

        let reporter = handle.await.unwrap();
        assert_eq!(reporter.stop_price, Some(dec!(95)));
        assert_eq!(reporter.orders_placed, 1);
        assert_eq!(reporter.missed_prices, 1);
        assert_eq!(reporter.fill.map(|f| f.executed_value), Some(dec!(95)));
    }
}
