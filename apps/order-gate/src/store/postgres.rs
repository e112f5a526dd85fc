//! Postgres-backed store.
//!
//! Uses `PostgreSQL` via `SQLx` for durable state, shared with the wider
//! backend that owns the schema. Expected tables:
//!
//! ```sql
//! gate_accounts   (account_id TEXT PK, is_active BOOL, is_paused BOOL,
//!                  max_open_positions INT NULL, max_exposure NUMERIC NULL,
//!                  max_orders_per_minute INT NULL)
//! gate_halt_flag  (id SMALLINT PK CHECK (id = 1), master_kill_switch BOOL)
//! gate_orders     (order_id TEXT PK, account_id TEXT, strategy_id TEXT NULL,
//!                  symbol TEXT, exchange TEXT, side TEXT, order_type TEXT,
//!                  quantity NUMERIC, price NUMERIC, filled_quantity NUMERIC,
//!                  avg_fill_price NUMERIC, status TEXT,
//!                  broker_order_id TEXT NULL, rejection_reason TEXT NULL,
//!                  created_at TIMESTAMPTZ, executed_at TIMESTAMPTZ NULL,
//!                  latency_ms BIGINT NULL)
//! gate_positions  (account_id TEXT, symbol TEXT, strategy_id TEXT NULL,
//!                  side TEXT, quantity NUMERIC, avg_entry_price NUMERIC,
//!                  mark_price NUMERIC, unrealized_pnl NUMERIC,
//!                  opened_at TIMESTAMPTZ, updated_at TIMESTAMPTZ,
//!                  PK (account_id, symbol))
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use super::{AccountDirectory, HaltSwitch, OrderJournal, PositionLedger, StoreError};
use crate::models::{
    Account, AccountId, Exchange, Order, OrderId, OrderSide, OrderStatus, OrderType, Position,
    PositionSide, RiskSettings,
};

/// Durable implementation of the gate store traits.
pub struct PgGateStore {
    pool: PgPool,
}

impl PgGateStore {
    /// Connect with a default pool size.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        Self::connect_with_max_connections(database_url, 5).await
    }

    /// Connect with a custom pool size.
    pub async fn connect_with_max_connections(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!(
            max_connections = max_connections,
            "PostgreSQL connection pool initialized"
        );

        Ok(Self { pool })
    }

    /// Wrap an existing pool (for testing).
    #[must_use]
    pub const fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AccountDirectory for PgGateStore {
    async fn find_account(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(
            r"
            SELECT account_id, is_active, is_paused,
                   max_open_positions, max_exposure, max_orders_per_minute
            FROM gate_accounts WHERE account_id = $1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        row.map(|r| row_to_account(&r)).transpose()
    }
}

#[async_trait]
impl HaltSwitch for PgGateStore {
    async fn is_halted(&self) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT master_kill_switch FROM gate_halt_flag WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        // Absent singleton reads as not halted.
        Ok(row
            .map(|r| r.try_get::<bool, _>("master_kill_switch").unwrap_or(false))
            .unwrap_or(false))
    }
}

#[async_trait]
impl OrderJournal for PgGateStore {
    async fn append(&self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO gate_orders (
                order_id, account_id, strategy_id, symbol, exchange, side,
                order_type, quantity, price, filled_quantity, avg_fill_price,
                status, broker_order_id, rejection_reason, created_at,
                executed_at, latency_ms
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ",
        )
        .bind(order.id.as_str())
        .bind(order.account_id.as_str())
        .bind(order.strategy_id.as_ref().map(|s| s.as_str()))
        .bind(&order.symbol)
        .bind(order.exchange.as_segment_str())
        .bind(side_str(order.side))
        .bind(order_type_str(order.order_type))
        .bind(order.quantity)
        .bind(order.price)
        .bind(order.filled_quantity)
        .bind(order.avg_fill_price)
        .bind(status_str(order.status))
        .bind(order.broker_order_id.as_ref().map(|b| b.as_str()))
        .bind(order.rejection_reason.as_deref())
        .bind(order.created_at)
        .bind(order.executed_at)
        .bind(order.latency_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        debug!(order_id = %order.id, "Order appended to journal");
        Ok(())
    }

    async fn record_outcome(&self, order: &Order) -> Result<(), StoreError> {
        // The status guard keeps terminal rows immutable.
        let result = sqlx::query(
            r"
            UPDATE gate_orders SET
                status = $2,
                filled_quantity = $3,
                avg_fill_price = $4,
                broker_order_id = $5,
                rejection_reason = $6,
                executed_at = $7,
                latency_ms = $8
            WHERE order_id = $1 AND status = 'PENDING'
            ",
        )
        .bind(order.id.as_str())
        .bind(status_str(order.status))
        .bind(order.filled_quantity)
        .bind(order.avg_fill_price)
        .bind(order.broker_order_id.as_ref().map(|b| b.as_str()))
        .bind(order.rejection_reason.as_deref())
        .bind(order.executed_at)
        .bind(order.latency_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return match self.find_order(&order.id).await? {
                Some(_) => Err(StoreError::TerminalOrder {
                    order_id: order.id.to_string(),
                }),
                None => Err(StoreError::not_found("order", order.id.as_str())),
            };
        }

        debug!(order_id = %order.id, status = status_str(order.status), "Order outcome recorded");
        Ok(())
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(
            r"
            SELECT order_id, account_id, strategy_id, symbol, exchange, side,
                   order_type, quantity, price, filled_quantity, avg_fill_price,
                   status, broker_order_id, rejection_reason, created_at,
                   executed_at, latency_ms
            FROM gate_orders WHERE order_id = $1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        row.map(|r| row_to_order(&r)).transpose()
    }

    async fn count_since(
        &self,
        account_id: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS order_count FROM gate_orders WHERE account_id = $1 AND created_at >= $2",
        )
        .bind(account_id.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("order_count")
            .map_err(|e| StoreError::MissingField(format!("order_count: {e}")))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

#[async_trait]
impl PositionLedger for PgGateStore {
    async fn find_open(&self, account_id: &AccountId) -> Result<Vec<Position>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT account_id, symbol, strategy_id, side, quantity,
                   avg_entry_price, mark_price, unrealized_pnl, opened_at, updated_at
            FROM gate_positions WHERE account_id = $1
            ",
        )
        .bind(account_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.iter().map(row_to_position).collect()
    }

    async fn find_position(
        &self,
        account_id: &AccountId,
        symbol: &str,
    ) -> Result<Option<Position>, StoreError> {
        let row = sqlx::query(
            r"
            SELECT account_id, symbol, strategy_id, side, quantity,
                   avg_entry_price, mark_price, unrealized_pnl, opened_at, updated_at
            FROM gate_positions WHERE account_id = $1 AND symbol = $2
            ",
        )
        .bind(account_id.as_str())
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        row.map(|r| row_to_position(&r)).transpose()
    }

    async fn upsert(&self, position: &Position) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO gate_positions (
                account_id, symbol, strategy_id, side, quantity,
                avg_entry_price, mark_price, unrealized_pnl, opened_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (account_id, symbol) DO UPDATE SET
                strategy_id = EXCLUDED.strategy_id,
                side = EXCLUDED.side,
                quantity = EXCLUDED.quantity,
                avg_entry_price = EXCLUDED.avg_entry_price,
                mark_price = EXCLUDED.mark_price,
                unrealized_pnl = EXCLUDED.unrealized_pnl,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(position.account_id.as_str())
        .bind(&position.symbol)
        .bind(position.strategy_id.as_ref().map(|s| s.as_str()))
        .bind(position_side_str(position.side))
        .bind(position.quantity)
        .bind(position.avg_entry_price)
        .bind(position.mark_price)
        .bind(position.unrealized_pnl)
        .bind(position.opened_at)
        .bind(position.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        debug!(symbol = %position.symbol, "Position upserted");
        Ok(())
    }

    async fn remove(&self, account_id: &AccountId, symbol: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM gate_positions WHERE account_id = $1 AND symbol = $2")
            .bind(account_id.as_str())
            .bind(symbol)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        debug!(symbol = symbol, "Position removed");
        Ok(())
    }
}

// ============================================================================
// Row Conversion
// ============================================================================

fn row_to_account(row: &sqlx::postgres::PgRow) -> Result<Account, StoreError> {
    let account_id: String = row
        .try_get("account_id")
        .map_err(|e| StoreError::MissingField(format!("account_id: {e}")))?;

    Ok(Account {
        id: AccountId::new(account_id),
        is_active: row.try_get("is_active").unwrap_or(false),
        is_paused: row.try_get("is_paused").unwrap_or(false),
        risk_settings: RiskSettings {
            max_open_positions: row
                .try_get::<Option<i32>, _>("max_open_positions")
                .unwrap_or(None)
                .and_then(|v| u32::try_from(v).ok()),
            max_exposure: row.try_get::<Option<Decimal>, _>("max_exposure").unwrap_or(None),
            max_orders_per_minute: row
                .try_get::<Option<i32>, _>("max_orders_per_minute")
                .unwrap_or(None)
                .and_then(|v| u32::try_from(v).ok()),
        },
    })
}

fn row_to_order(row: &sqlx::postgres::PgRow) -> Result<Order, StoreError> {
    let order_id: String = row
        .try_get("order_id")
        .map_err(|e| StoreError::MissingField(format!("order_id: {e}")))?;
    let account_id: String = row
        .try_get("account_id")
        .map_err(|e| StoreError::MissingField(format!("account_id: {e}")))?;
    let status: String = row
        .try_get("status")
        .map_err(|e| StoreError::MissingField(format!("status: {e}")))?;
    let side: String = row
        .try_get("side")
        .map_err(|e| StoreError::MissingField(format!("side: {e}")))?;
    let order_type: String = row
        .try_get("order_type")
        .map_err(|e| StoreError::MissingField(format!("order_type: {e}")))?;
    let exchange: String = row.try_get("exchange").unwrap_or_default();
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| StoreError::MissingField(format!("created_at: {e}")))?;

    Ok(Order {
        id: OrderId::new(order_id),
        account_id: AccountId::new(account_id),
        strategy_id: row
            .try_get::<Option<String>, _>("strategy_id")
            .unwrap_or(None)
            .map(Into::into),
        symbol: row.try_get("symbol").unwrap_or_default(),
        exchange: parse_exchange(&exchange),
        side: parse_side(&side),
        order_type: parse_order_type(&order_type),
        quantity: row.try_get::<Decimal, _>("quantity").unwrap_or(Decimal::ZERO),
        price: row.try_get::<Decimal, _>("price").unwrap_or(Decimal::ZERO),
        filled_quantity: row
            .try_get::<Decimal, _>("filled_quantity")
            .unwrap_or(Decimal::ZERO),
        avg_fill_price: row
            .try_get::<Decimal, _>("avg_fill_price")
            .unwrap_or(Decimal::ZERO),
        status: parse_status(&status),
        broker_order_id: row
            .try_get::<Option<String>, _>("broker_order_id")
            .unwrap_or(None)
            .map(Into::into),
        rejection_reason: row
            .try_get::<Option<String>, _>("rejection_reason")
            .unwrap_or(None),
        created_at,
        executed_at: row
            .try_get::<Option<DateTime<Utc>>, _>("executed_at")
            .unwrap_or(None),
        latency_ms: row.try_get::<Option<i64>, _>("latency_ms").unwrap_or(None),
    })
}

fn row_to_position(row: &sqlx::postgres::PgRow) -> Result<Position, StoreError> {
    let account_id: String = row
        .try_get("account_id")
        .map_err(|e| StoreError::MissingField(format!("account_id: {e}")))?;
    let symbol: String = row
        .try_get("symbol")
        .map_err(|e| StoreError::MissingField(format!("symbol: {e}")))?;
    let side: String = row
        .try_get("side")
        .map_err(|e| StoreError::MissingField(format!("side: {e}")))?;
    let now = Utc::now();

    Ok(Position {
        account_id: AccountId::new(account_id),
        strategy_id: row
            .try_get::<Option<String>, _>("strategy_id")
            .unwrap_or(None)
            .map(Into::into),
        symbol,
        side: parse_position_side(&side),
        quantity: row.try_get::<Decimal, _>("quantity").unwrap_or(Decimal::ZERO),
        avg_entry_price: row
            .try_get::<Decimal, _>("avg_entry_price")
            .unwrap_or(Decimal::ZERO),
        mark_price: row
            .try_get::<Decimal, _>("mark_price")
            .unwrap_or(Decimal::ZERO),
        unrealized_pnl: row
            .try_get::<Decimal, _>("unrealized_pnl")
            .unwrap_or(Decimal::ZERO),
        opened_at: row
            .try_get::<DateTime<Utc>, _>("opened_at")
            .unwrap_or(now),
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .unwrap_or(now),
    })
}

// ============================================================================
// Enum <-> Column Helpers
// ============================================================================

const fn status_str(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "PENDING",
        OrderStatus::Executed => "EXECUTED",
        OrderStatus::Rejected => "REJECTED",
    }
}

const fn side_str(side: OrderSide) -> &'static str {
    match side {
        OrderSide::Buy => "BUY",
        OrderSide::Sell => "SELL",
    }
}

const fn order_type_str(order_type: OrderType) -> &'static str {
    match order_type {
        OrderType::Market => "MARKET",
        OrderType::Limit => "LIMIT",
    }
}

const fn position_side_str(side: PositionSide) -> &'static str {
    match side {
        PositionSide::Long => "LONG",
        PositionSide::Short => "SHORT",
    }
}

fn parse_status(s: &str) -> OrderStatus {
    match s {
        "EXECUTED" => OrderStatus::Executed,
        "REJECTED" => OrderStatus::Rejected,
        // "PENDING" and unknown statuses stay pending
        _ => OrderStatus::Pending,
    }
}

fn parse_side(s: &str) -> OrderSide {
    match s {
        "SELL" => OrderSide::Sell,
        // "BUY" and unknown sides default to Buy
        _ => OrderSide::Buy,
    }
}

fn parse_order_type(s: &str) -> OrderType {
    match s {
        "LIMIT" => OrderType::Limit,
        // "MARKET" and unknown types default to Market
        _ => OrderType::Market,
    }
}

fn parse_exchange(s: &str) -> Exchange {
    match s {
        "BSE_EQ" => Exchange::BseEq,
        // "NSE_EQ" and unknown segments default to NSE
        _ => Exchange::NseEq,
    }
}

fn parse_position_side(s: &str) -> PositionSide {
    match s {
        "SHORT" => PositionSide::Short,
        // "LONG" and unknown sides default to Long
        _ => PositionSide::Long,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Executed,
            OrderStatus::Rejected,
        ] {
            assert_eq!(parse_status(status_str(status)), status);
        }
        assert_eq!(parse_status("UNKNOWN"), OrderStatus::Pending);
    }

    #[test]
    fn test_side_roundtrip() {
        assert_eq!(parse_side(side_str(OrderSide::Buy)), OrderSide::Buy);
        assert_eq!(parse_side(side_str(OrderSide::Sell)), OrderSide::Sell);
        assert_eq!(parse_side("garbage"), OrderSide::Buy);
    }

    #[test]
    fn test_order_type_roundtrip() {
        assert_eq!(
            parse_order_type(order_type_str(OrderType::Limit)),
            OrderType::Limit
        );
        assert_eq!(
            parse_order_type(order_type_str(OrderType::Market)),
            OrderType::Market
        );
    }

    #[test]
    fn test_position_side_roundtrip() {
        assert_eq!(
            parse_position_side(position_side_str(PositionSide::Short)),
            PositionSide::Short
        );
        assert_eq!(
            parse_position_side(position_side_str(PositionSide::Long)),
            PositionSide::Long
        );
    }

    #[test]
    fn test_exchange_roundtrip() {
        assert_eq!(parse_exchange("NSE_EQ"), Exchange::NseEq);
        assert_eq!(parse_exchange("BSE_EQ"), Exchange::BseEq);
        assert_eq!(parse_exchange(""), Exchange::NseEq);
    }
}
