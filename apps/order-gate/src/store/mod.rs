//! Data-access contracts for the risk gate.
//!
//! The gate reads account state, the system halt flag, order history, and
//! open positions through narrow traits so the core stays testable with
//! injected fakes. Two implementations exist: [`memory::InMemoryGateStore`]
//! for tests and paper setups, and [`postgres::PgGateStore`] for durable
//! storage.

mod memory;
mod postgres;

pub use memory::InMemoryGateStore;
pub use postgres::PgGateStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Account, AccountId, Order, OrderId, Position};

/// Errors from store operations.
///
/// Any of these surfacing during validation means the risk decision could
/// not be computed; callers must treat that as a fault and never admit the
/// order.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("Query error: {0}")]
    Query(String),

    /// A row that must exist is missing.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. `order`.
        entity: &'static str,
        /// Identifier that failed to resolve.
        id: String,
    },

    /// A required column was missing or failed to decode.
    #[error("Missing field: {0}")]
    MissingField(String),

    /// Attempted to mutate an order that already reached a terminal status.
    #[error("Order {order_id} is terminal and cannot be updated")]
    TerminalOrder {
        /// The order refusing the update.
        order_id: String,
    },
}

impl StoreError {
    /// Shorthand for a missing-row error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Connection(err.to_string())
    }
}

/// Read access to account records.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Look up an account by id.
    async fn find_account(&self, id: &AccountId) -> Result<Option<Account>, StoreError>;
}

/// Read access to the system-wide halt flag.
///
/// The flag is read fresh on every validation; implementations must not
/// cache it. An absent flag reads as not halted.
#[async_trait]
pub trait HaltSwitch: Send + Sync {
    /// Whether the master kill switch is set.
    async fn is_halted(&self) -> Result<bool, StoreError>;
}

/// Append-only journal of submitted orders.
#[async_trait]
pub trait OrderJournal: Send + Sync {
    /// Append a newly created order.
    async fn append(&self, order: &Order) -> Result<(), StoreError>;

    /// Persist the terminal outcome of a previously appended order.
    ///
    /// Fails with [`StoreError::TerminalOrder`] if the stored order already
    /// reached a terminal status, and [`StoreError::NotFound`] if it was
    /// never appended.
    async fn record_outcome(&self, order: &Order) -> Result<(), StoreError>;

    /// Fetch an order by id.
    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// Count orders created by the account at or after `since`.
    async fn count_since(
        &self,
        account_id: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError>;
}

/// Durable set of open positions per account.
#[async_trait]
pub trait PositionLedger: Send + Sync {
    /// All open positions for the account.
    async fn find_open(&self, account_id: &AccountId) -> Result<Vec<Position>, StoreError>;

    /// The open position on a symbol, if any.
    async fn find_position(
        &self,
        account_id: &AccountId,
        symbol: &str,
    ) -> Result<Option<Position>, StoreError>;

    /// Insert or replace the position for (account, symbol).
    async fn upsert(&self, position: &Position) -> Result<(), StoreError>;

    /// Remove a flattened position.
    async fn remove(&self, account_id: &AccountId, symbol: &str) -> Result<(), StoreError>;
}

/// The full set of store capabilities the gate needs.
///
/// Blanket-implemented for any type carrying all four narrow traits, so a
/// coordinator can hold a single `Arc<dyn GateStore>` while the risk engine
/// and tests keep depending on the narrow pieces.
pub trait GateStore: AccountDirectory + HaltSwitch + OrderJournal + PositionLedger {}

impl<T> GateStore for T where T: AccountDirectory + HaltSwitch + OrderJournal + PositionLedger {}
