//! Order lifecycle types.
//!
//! An [`OrderRequest`] is the candidate submitted by the caller. The gate
//! turns an admitted candidate into an [`Order`] with status `Pending`,
//! which reaches exactly one terminal status (`Executed` or `Rejected`)
//! and is never mutated afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AccountId, BrokerOrderId, OrderId, StrategyId};

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    /// Buy order.
    Buy,
    /// Sell order.
    Sell,
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Market order - execute at best available price.
    Market,
    /// Limit order - execute at the requested price or better.
    Limit,
}

/// Exchange segment an instrument trades on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Exchange {
    /// NSE equities.
    #[default]
    NseEq,
    /// BSE equities.
    BseEq,
}

impl Exchange {
    /// Wire name of the segment.
    #[must_use]
    pub const fn as_segment_str(&self) -> &'static str {
        match self {
            Self::NseEq => "NSE_EQ",
            Self::BseEq => "BSE_EQ",
        }
    }
}

/// Order status in the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Admitted by the risk gate, placement in flight.
    Pending,
    /// Filled by the broker.
    Executed,
    /// Denied by the gate or rejected by the broker.
    Rejected,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Executed | Self::Rejected)
    }
}

/// A candidate order as submitted by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Instrument symbol, e.g. `RELIANCE`.
    pub symbol: String,
    /// Exchange segment the symbol trades on.
    #[serde(default)]
    pub exchange: Exchange,
    /// Buy or sell.
    pub side: OrderSide,
    /// Market or limit.
    pub order_type: OrderType,
    /// Requested quantity.
    pub quantity: Decimal,
    /// Requested price. For market orders this is the reference price
    /// used for exposure accounting.
    pub price: Decimal,
    /// Strategy the order belongs to, if any.
    #[serde(default)]
    pub strategy_id: Option<StrategyId>,
}

impl OrderRequest {
    /// Build a limit order candidate.
    #[must_use]
    pub fn limit(symbol: impl Into<String>, side: OrderSide, quantity: Decimal, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: Exchange::default(),
            side,
            order_type: OrderType::Limit,
            quantity,
            price,
            strategy_id: None,
        }
    }

    /// Build a market order candidate. The reference price is still used
    /// for exposure accounting.
    #[must_use]
    pub fn market(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        reference_price: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: Exchange::default(),
            side,
            order_type: OrderType::Market,
            quantity,
            price: reference_price,
            strategy_id: None,
        }
    }

    /// Attach a strategy reference.
    #[must_use]
    pub fn with_strategy(mut self, strategy_id: StrategyId) -> Self {
        self.strategy_id = Some(strategy_id);
        self
    }

    /// Notional value of the candidate (price x quantity).
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }
}

/// A journaled order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Gate-internal order ID; doubles as the broker correlation id.
    pub id: OrderId,
    /// Owning account.
    pub account_id: AccountId,
    /// Strategy the order belongs to, if any.
    pub strategy_id: Option<StrategyId>,
    /// Instrument symbol.
    pub symbol: String,
    /// Exchange segment.
    pub exchange: Exchange,
    /// Buy or sell.
    pub side: OrderSide,
    /// Market or limit.
    pub order_type: OrderType,
    /// Requested quantity.
    pub quantity: Decimal,
    /// Requested price.
    pub price: Decimal,
    /// Quantity filled by the broker.
    pub filled_quantity: Decimal,
    /// Average fill price.
    pub avg_fill_price: Decimal,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Broker's identifier for the order, once known.
    pub broker_order_id: Option<BrokerOrderId>,
    /// Reason the order was denied or rejected.
    pub rejection_reason: Option<String>,
    /// When the gate created the order.
    pub created_at: DateTime<Utc>,
    /// When the broker resolved the order.
    pub executed_at: Option<DateTime<Utc>>,
    /// Milliseconds between creation and broker resolution.
    pub latency_ms: Option<i64>,
}

impl Order {
    /// Create a pending order from an admitted candidate.
    #[must_use]
    pub fn from_request(account_id: AccountId, request: &OrderRequest) -> Self {
        Self {
            id: OrderId::generate(),
            account_id,
            strategy_id: request.strategy_id.clone(),
            symbol: request.symbol.clone(),
            exchange: request.exchange,
            side: request.side,
            order_type: request.order_type,
            quantity: request.quantity,
            price: request.price,
            filled_quantity: Decimal::ZERO,
            avg_fill_price: Decimal::ZERO,
            status: OrderStatus::Pending,
            broker_order_id: None,
            rejection_reason: None,
            created_at: Utc::now(),
            executed_at: None,
            latency_ms: None,
        }
    }

    /// Create an order that was denied by the gate before placement.
    #[must_use]
    pub fn denied(account_id: AccountId, request: &OrderRequest, reason: impl Into<String>) -> Self {
        let mut order = Self::from_request(account_id, request);
        order.status = OrderStatus::Rejected;
        order.rejection_reason = Some(reason.into());
        order
    }

    /// Notional value of the order (price x quantity).
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }

    /// Apply a broker fill. Sets the terminal `Executed` status and the
    /// creation-to-fill latency.
    pub fn record_fill(
        &mut self,
        filled_quantity: Decimal,
        avg_fill_price: Decimal,
        broker_order_id: Option<BrokerOrderId>,
        executed_at: DateTime<Utc>,
    ) {
        self.status = OrderStatus::Executed;
        self.filled_quantity = filled_quantity;
        self.avg_fill_price = avg_fill_price;
        self.broker_order_id = broker_order_id;
        self.executed_at = Some(executed_at);
        self.latency_ms = Some((executed_at - self.created_at).num_milliseconds());
    }

    /// Apply a broker rejection. Sets the terminal `Rejected` status and
    /// leaves fill fields untouched.
    pub fn record_rejection(&mut self, reason: impl Into<String>, rejected_at: DateTime<Utc>) {
        self.status = OrderStatus::Rejected;
        self.rejection_reason = Some(reason.into());
        self.executed_at = Some(rejected_at);
        self.latency_ms = Some((rejected_at - self.created_at).num_milliseconds());
    }
}
