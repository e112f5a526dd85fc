//! Broker execution adapters.
//!
//! The gate talks to brokers through [`BrokerAdapter`], a deliberately total
//! contract: every operation resolves to data, never to a fault. Transport
//! errors, non-success acknowledgments and missing credentials are absorbed
//! inside the adapter and surface as an offline report, a zero quote or a
//! rejected placement. The coordinator can therefore apply a placement
//! unconditionally without a broker failure escaping past it.
//!
//! Two implementations exist, selected process-wide by trading mode:
//! [`sim::SimulatedBroker`] for paper trading and [`dhan::DhanBroker`] for
//! the live Dhan-style REST broker.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, GateConfig, TradeMode};
use crate::models::{BrokerOrderId, Exchange, Order};

pub mod dhan;
pub mod sim;

pub use dhan::{DhanBroker, DhanConfig};
pub use sim::SimulatedBroker;

/// Result of a credential/health probe against the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityReport {
    /// Whether the broker answered the probe successfully.
    pub connected: bool,
    /// Margin available for new orders, when the broker reports it.
    pub available_margin: Option<Decimal>,
    /// Margin currently in use, when the broker reports it.
    pub utilized_margin: Option<Decimal>,
}

impl ConnectivityReport {
    /// Probe succeeded with the given margin figures.
    #[must_use]
    pub const fn online(available_margin: Decimal, utilized_margin: Decimal) -> Self {
        Self {
            connected: true,
            available_margin: Some(available_margin),
            utilized_margin: Some(utilized_margin),
        }
    }

    /// Probe failed or credentials are absent.
    #[must_use]
    pub const fn offline() -> Self {
        Self {
            connected: false,
            available_margin: None,
            utilized_margin: None,
        }
    }
}

/// A last-traded-price quote for one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Instrument symbol the quote is for.
    pub symbol: String,
    /// Last traded price. Zero when the quote could not be obtained.
    pub price: Decimal,
}

impl Quote {
    /// Build a quote for the given symbol.
    #[must_use]
    pub fn new(symbol: impl Into<String>, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            price,
        }
    }
}

/// Terminal outcome of a placement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlacementStatus {
    /// The broker accepted and filled the order.
    Executed,
    /// The broker rejected the order, or it never reached the broker.
    Rejected,
}

/// Resolution of a placement call.
///
/// Always terminal: an adapter either produces a fill or a rejection, and a
/// rejection carries a non-empty reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Fill or rejection.
    pub status: PlacementStatus,
    /// Quantity filled. Zero on rejection.
    pub filled_quantity: Decimal,
    /// Average fill price. Zero on rejection.
    pub avg_fill_price: Decimal,
    /// Broker-assigned order id, when the order reached the broker.
    pub broker_order_id: Option<BrokerOrderId>,
    /// Why the order was rejected.
    pub rejection_reason: Option<String>,
    /// When the broker resolved the order.
    pub executed_at: DateTime<Utc>,
}

impl Placement {
    /// A successful fill.
    #[must_use]
    pub fn filled(
        filled_quantity: Decimal,
        avg_fill_price: Decimal,
        broker_order_id: BrokerOrderId,
    ) -> Self {
        Self {
            status: PlacementStatus::Executed,
            filled_quantity,
            avg_fill_price,
            broker_order_id: Some(broker_order_id),
            rejection_reason: None,
            executed_at: Utc::now(),
        }
    }

    /// A rejection with the given reason.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            status: PlacementStatus::Rejected,
            filled_quantity: Decimal::ZERO,
            avg_fill_price: Decimal::ZERO,
            broker_order_id: None,
            rejection_reason: Some(reason.into()),
            executed_at: Utc::now(),
        }
    }

    /// Whether the placement is a fill.
    #[must_use]
    pub const fn is_executed(&self) -> bool {
        matches!(self.status, PlacementStatus::Executed)
    }
}

/// The broker execution contract.
///
/// Implementations must not let transport faults escape: a failed probe is an
/// offline report, an unobtainable quote is a zero price, and a failed
/// placement is a `Rejected` placement with a reason.
#[async_trait]
pub trait BrokerAdapter: Send + Sync {
    /// Short name of the backing broker, for logs.
    fn name(&self) -> &'static str;

    /// Probe broker credentials and health.
    ///
    /// Absent credentials yield an offline report without touching the
    /// network.
    async fn check_connectivity(&self) -> ConnectivityReport;

    /// Last traded price for an instrument.
    ///
    /// The instrument id is resolved from the static symbol table when not
    /// supplied. Defaults to a zero price when the quote cannot be obtained.
    async fn last_traded_price(
        &self,
        exchange: Exchange,
        symbol: &str,
        security_id: Option<&str>,
    ) -> Quote;

    /// Place an order with the broker and resolve it to a terminal outcome.
    async fn place_order(&self, order: &Order) -> Placement;
}

/// Construct the adapter for the configured trading mode.
///
/// Live mode requires broker credentials. Their absence is a configuration
/// fault raised here, at startup, rather than at the first order.
pub fn build_broker(config: &GateConfig) -> Result<Arc<dyn BrokerAdapter>, ConfigError> {
    match config.trading.mode {
        TradeMode::Paper => {
            let broker = SimulatedBroker::new(
                config.broker.sim.latency(),
                config.broker.sim.fill_probability,
            );
            tracing::info!(broker = broker.name(), "Paper trading mode, using simulated broker");
            Ok(Arc::new(broker))
        }
        TradeMode::Live => {
            if !config.broker.dhan.has_credentials() {
                return Err(ConfigError::MissingBrokerCredentials {
                    details: config.broker.dhan.missing_credentials().join(", "),
                });
            }
            let broker = DhanBroker::new(DhanConfig::from_settings(&config.broker.dhan))
                .map_err(|e| ConfigError::Broker(e.to_string()))?;
            tracing::info!(broker = broker.name(), "Live trading mode, using Dhan broker");
            Ok(Arc::new(broker))
        }
    }
}
