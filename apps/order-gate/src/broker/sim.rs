//! Simulated broker for paper trading.
//!
//! Resolves placements after a fixed artificial delay with a configurable
//! success probability. Both knobs are constructor arguments so tests can run
//! with zero latency and a probability of exactly 0 or 1.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{BrokerOrderId, Exchange, Order};

use super::{BrokerAdapter, ConnectivityReport, Placement, Quote};

/// Default artificial latency for simulated fills.
pub const DEFAULT_LATENCY_MS: u64 = 150;

/// Default probability that a simulated placement fills.
pub const DEFAULT_FILL_PROBABILITY: f64 = 0.95;

const REJECTION_REASON: &str = "Order rejected by simulated broker";

/// Paper-trading broker producing synthetic fills.
#[derive(Debug)]
pub struct SimulatedBroker {
    latency: Duration,
    fill_probability: f64,
    sequence: AtomicU64,
}

impl SimulatedBroker {
    /// Create a simulated broker with the given latency and fill probability.
    ///
    /// The probability is clamped into `[0, 1]`.
    #[must_use]
    pub fn new(latency: Duration, fill_probability: f64) -> Self {
        Self {
            latency,
            fill_probability: fill_probability.clamp(0.0, 1.0),
            sequence: AtomicU64::new(0),
        }
    }

    fn next_broker_order_id(&self) -> BrokerOrderId {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        BrokerOrderId::new(format!("SIM-{seq}"))
    }
}

impl Default for SimulatedBroker {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_LATENCY_MS),
            DEFAULT_FILL_PROBABILITY,
        )
    }
}

#[async_trait]
impl BrokerAdapter for SimulatedBroker {
    fn name(&self) -> &'static str {
        "sim"
    }

    async fn check_connectivity(&self) -> ConnectivityReport {
        ConnectivityReport::online(dec!(1_000_000), Decimal::ZERO)
    }

    async fn last_traded_price(
        &self,
        _exchange: Exchange,
        symbol: &str,
        _security_id: Option<&str>,
    ) -> Quote {
        // Synthetic price between 100.00 and 5000.00.
        let paise = rand::rng().random_range(10_000..=500_000);
        Quote::new(symbol, Decimal::new(paise, 2))
    }

    async fn place_order(&self, order: &Order) -> Placement {
        tokio::time::sleep(self.latency).await;

        let fills = rand::rng().random_bool(self.fill_probability);
        if fills {
            let placement = Placement::filled(
                order.quantity,
                order.price,
                self.next_broker_order_id(),
            );
            tracing::debug!(
                order_id = %order.id,
                symbol = %order.symbol,
                qty = %order.quantity,
                price = %order.price,
                "Simulated fill"
            );
            placement
        } else {
            tracing::debug!(order_id = %order.id, symbol = %order.symbol, "Simulated rejection");
            Placement::rejected(REJECTION_REASON)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountId, OrderRequest, OrderSide};

    fn pending_order() -> Order {
        let request = OrderRequest::limit("RELIANCE", OrderSide::Buy, dec!(10), dec!(2500));
        Order::from_request(AccountId::new("acct-1"), &request)
    }

    #[tokio::test]
    async fn test_always_fill_resolves_at_requested_price() {
        let broker = SimulatedBroker::new(Duration::ZERO, 1.0);
        let placement = broker.place_order(&pending_order()).await;

        assert!(placement.is_executed());
        assert_eq!(placement.filled_quantity, dec!(10));
        assert_eq!(placement.avg_fill_price, dec!(2500));
        assert!(placement.rejection_reason.is_none());
    }

    #[tokio::test]
    async fn test_broker_order_ids_are_sequential() {
        let broker = SimulatedBroker::new(Duration::ZERO, 1.0);
        let first = broker.place_order(&pending_order()).await;
        let second = broker.place_order(&pending_order()).await;

        assert_eq!(first.broker_order_id.unwrap().as_str(), "SIM-1");
        assert_eq!(second.broker_order_id.unwrap().as_str(), "SIM-2");
    }

    #[tokio::test]
    async fn test_never_fill_rejects_with_reason() {
        let broker = SimulatedBroker::new(Duration::ZERO, 0.0);
        let placement = broker.place_order(&pending_order()).await;

        assert!(!placement.is_executed());
        assert_eq!(placement.filled_quantity, Decimal::ZERO);
        assert!(placement.rejection_reason.is_some());
    }

    #[tokio::test]
    async fn test_probability_is_clamped() {
        // Out-of-range probability must not panic the RNG.
        let broker = SimulatedBroker::new(Duration::ZERO, 1.5);
        let placement = broker.place_order(&pending_order()).await;
        assert!(placement.is_executed());
    }

    #[tokio::test]
    async fn test_connectivity_is_always_online() {
        let broker = SimulatedBroker::default();
        let report = broker.check_connectivity().await;
        assert!(report.connected);
        assert!(report.available_margin.is_some());
    }

    #[tokio::test]
    async fn test_synthetic_quote_is_in_range() {
        let broker = SimulatedBroker::new(Duration::ZERO, 1.0);
        let quote = broker
            .last_traded_price(Exchange::NseEq, "RELIANCE", None)
            .await;

        assert_eq!(quote.symbol, "RELIANCE");
        assert!(quote.price >= dec!(100));
        assert!(quote.price <= dec!(5000));
    }
}
