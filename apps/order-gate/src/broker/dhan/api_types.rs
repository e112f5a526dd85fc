//! Dhan API request and response types.
//!
//! These types map directly to Dhan's REST wire format; all field names are
//! camelCase on the wire.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Funds / Connectivity Types
// ============================================================================

/// Response from the fund-limit endpoint, used as the connectivity probe.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundLimitResponse {
    /// Margin available for new orders.
    #[serde(default)]
    pub available_balance: Option<Decimal>,
    /// Margin currently utilized.
    #[serde(default)]
    pub utilized_amount: Option<Decimal>,
}

// ============================================================================
// Quote Types
// ============================================================================

/// Request body for the market-feed LTP endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct LtpRequest {
    /// Instruments to quote.
    pub instruments: Vec<LtpInstrument>,
}

impl LtpRequest {
    /// Request a quote for a single instrument.
    #[must_use]
    pub fn single(exchange_segment: impl Into<String>, security_id: impl Into<String>) -> Self {
        Self {
            instruments: vec![LtpInstrument {
                exchange_segment: exchange_segment.into(),
                security_id: security_id.into(),
            }],
        }
    }
}

/// One instrument reference in an LTP request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LtpInstrument {
    /// Exchange segment, e.g. `NSE_EQ`.
    pub exchange_segment: String,
    /// Broker security id.
    pub security_id: String,
}

/// Response from the market-feed LTP endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LtpResponse {
    /// Per-instrument ticks, in request order.
    #[serde(default)]
    pub data: Vec<LtpTick>,
}

impl LtpResponse {
    /// Last price of the first instrument, or zero when absent.
    #[must_use]
    pub fn top_price(&self) -> Decimal {
        self.data
            .first()
            .and_then(|tick| tick.last_price)
            .unwrap_or(Decimal::ZERO)
    }
}

/// One tick in an LTP response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LtpTick {
    /// Last traded price.
    #[serde(default)]
    pub last_price: Option<Decimal>,
}

// ============================================================================
// Order Types
// ============================================================================

/// Order placement request for the Dhan API.
///
/// Quantity is sent as an integer and price as a plain number, matching the
/// broker's expected scalar types.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DhanOrderRequest {
    /// Dhan client id.
    pub client_id: String,
    /// Caller-side correlation id echoed back by the broker.
    pub correlation_id: String,
    /// `BUY` or `SELL`.
    pub transaction_type: String,
    /// Exchange segment, e.g. `NSE_EQ`.
    pub exchange_segment: String,
    /// Product type, e.g. `INTRADAY`.
    pub product_type: String,
    /// `MARKET` or `LIMIT`.
    pub order_type: String,
    /// Order validity, e.g. `DAY`.
    pub validity: String,
    /// Broker security id for the instrument.
    pub security_id: String,
    /// Quantity in whole units.
    pub quantity: i64,
    /// Limit price; zero for market orders.
    pub price: f64,
}

/// Order placement acknowledgment from the Dhan API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DhanOrderResponse {
    /// `success` when the order was accepted.
    #[serde(default)]
    pub status: Option<String>,
    /// Broker-assigned order id.
    #[serde(default)]
    pub order_id: Option<String>,
    /// Broker-side order status, e.g. `TRADED`.
    #[serde(default)]
    pub order_status: Option<String>,
    /// Broker remarks, populated on rejection.
    #[serde(default)]
    pub remarks: Option<String>,
}

impl DhanOrderResponse {
    /// Whether the broker accepted the order.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error response body from the Dhan API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DhanErrorResponse {
    /// Broker error code.
    #[serde(default)]
    pub error_code: Option<String>,
    /// Broker error message.
    #[serde(default)]
    pub error_message: Option<String>,
}
