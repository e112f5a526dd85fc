//! Dhan broker adapter.
//!
//! Implementation of [`BrokerAdapter`] for Dhan's REST API with:
//! - Header-based credential auth (`access-token`, `client-id`)
//! - Retry with exponential backoff for idempotent requests
//! - Single-shot order placement with transport faults absorbed into
//!   rejected placements

mod api_types;
mod client;
mod config;
mod error;
mod instruments;

pub use config::{DhanConfig, RetryConfig};
pub use error::DhanError;
pub use instruments::resolve_security_id;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::models::{BrokerOrderId, Exchange, Order, OrderSide, OrderType};

use super::{BrokerAdapter, ConnectivityReport, Placement, Quote};
use api_types::{DhanOrderRequest, DhanOrderResponse, FundLimitResponse, LtpRequest, LtpResponse};
use client::DhanHttpClient;

/// Product type sent with every placement.
const PRODUCT_TYPE: &str = "INTRADAY";

/// Order validity sent with every placement.
const VALIDITY: &str = "DAY";

/// Generic reason attached when the broker cannot be reached.
const CONNECTIVITY_FAILURE_REASON: &str = "Broker connectivity failure";

/// Reason attached when the adapter was built without credentials.
const MISSING_CREDENTIALS_REASON: &str = "Broker credentials not configured";

/// Live broker adapter for the Dhan REST API.
#[derive(Debug, Clone)]
pub struct DhanBroker {
    client: DhanHttpClient,
}

impl DhanBroker {
    /// Create a new Dhan broker adapter.
    pub fn new(config: DhanConfig) -> Result<Self, DhanError> {
        let client = DhanHttpClient::new(&config)?;
        Ok(Self { client })
    }

    /// Map an internal order to Dhan's placement schema.
    fn to_dhan_order_request(&self, order: &Order, security_id: &str) -> DhanOrderRequest {
        let transaction_type = match order.side {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        };
        let (order_type, price) = match order.order_type {
            OrderType::Market => ("MARKET", 0.0),
            OrderType::Limit => ("LIMIT", order.price.to_f64().unwrap_or(0.0)),
        };

        DhanOrderRequest {
            client_id: self.client.client_id().to_string(),
            correlation_id: order.id.as_str().to_string(),
            transaction_type: transaction_type.to_string(),
            exchange_segment: order.exchange.as_segment_str().to_string(),
            product_type: PRODUCT_TYPE.to_string(),
            order_type: order_type.to_string(),
            validity: VALIDITY.to_string(),
            security_id: security_id.to_string(),
            quantity: order.quantity.to_i64().unwrap_or(0),
            price,
        }
    }
}

#[async_trait]
impl BrokerAdapter for DhanBroker {
    fn name(&self) -> &'static str {
        "dhan"
    }

    async fn check_connectivity(&self) -> ConnectivityReport {
        if !self.client.has_credentials() {
            tracing::warn!("Dhan credentials absent, reporting unconnected");
            return ConnectivityReport::offline();
        }

        match self.client.get::<FundLimitResponse>("/fundlimit").await {
            Ok(funds) => ConnectivityReport {
                connected: true,
                available_margin: funds.available_balance,
                utilized_margin: funds.utilized_amount,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Dhan connectivity probe failed");
                ConnectivityReport::offline()
            }
        }
    }

    async fn last_traded_price(
        &self,
        exchange: Exchange,
        symbol: &str,
        security_id: Option<&str>,
    ) -> Quote {
        if !self.client.has_credentials() {
            tracing::warn!(symbol = %symbol, "Dhan credentials absent, returning zero quote");
            return Quote::new(symbol, Decimal::ZERO);
        }

        let resolved = match security_id.or_else(|| resolve_security_id(symbol)) {
            Some(id) => id,
            None => {
                tracing::warn!(symbol = %symbol, "No security id mapping for symbol");
                return Quote::new(symbol, Decimal::ZERO);
            }
        };

        let request = LtpRequest::single(exchange.as_segment_str(), resolved);
        match self
            .client
            .post::<LtpResponse, _>("/marketfeed/ltp", &request)
            .await
        {
            Ok(response) => Quote::new(symbol, response.top_price()),
            Err(e) => {
                tracing::warn!(error = %e, symbol = %symbol, "Quote request failed");
                Quote::new(symbol, Decimal::ZERO)
            }
        }
    }

    async fn place_order(&self, order: &Order) -> Placement {
        if !self.client.has_credentials() {
            tracing::warn!(order_id = %order.id, "Dhan credentials absent, rejecting placement");
            return Placement::rejected(MISSING_CREDENTIALS_REASON);
        }

        let Some(security_id) = resolve_security_id(&order.symbol) else {
            return Placement::rejected(format!(
                "No security id mapping for symbol {}",
                order.symbol
            ));
        };

        let request = self.to_dhan_order_request(order, security_id);
        tracing::info!(
            order_id = %order.id,
            symbol = %order.symbol,
            side = %request.transaction_type,
            order_type = %request.order_type,
            qty = request.quantity,
            price = request.price,
            "Submitting order to Dhan"
        );

        // Single attempt: a placement that reached the broker must not be
        // repeated.
        let response: Result<DhanOrderResponse, DhanError> =
            self.client.post_once("/orders", &request).await;

        match response {
            Ok(ack) if ack.is_accepted() => {
                let broker_order_id = ack
                    .order_id
                    .map_or_else(|| BrokerOrderId::new(order.id.as_str()), BrokerOrderId::new);
                tracing::info!(
                    order_id = %order.id,
                    broker_order_id = %broker_order_id,
                    "Dhan accepted order"
                );
                Placement::filled(order.quantity, order.price, broker_order_id)
            }
            Ok(ack) => {
                let reason = ack
                    .remarks
                    .unwrap_or_else(|| "Order rejected by broker".to_string());
                tracing::warn!(order_id = %order.id, reason = %reason, "Dhan rejected order");
                Placement::rejected(reason)
            }
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Dhan placement failed");
                Placement::rejected(CONNECTIVITY_FAILURE_REASON)
            }
        }
    }
}
