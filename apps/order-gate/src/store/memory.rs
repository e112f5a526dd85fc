//! In-memory store for tests and paper setups.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{AccountDirectory, HaltSwitch, OrderJournal, PositionLedger, StoreError};
use crate::models::{Account, AccountId, Order, OrderId, Position};

/// In-memory implementation of all gate store traits.
///
/// Suitable for testing and paper trading. Not for production use.
#[derive(Debug, Default)]
pub struct InMemoryGateStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
    halted: AtomicBool,
    orders: RwLock<HashMap<OrderId, Order>>,
    positions: RwLock<HashMap<(AccountId, String), Position>>,
}

impl InMemoryGateStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account (test setup; accounts are owned by
    /// external collaborators in production).
    pub async fn upsert_account(&self, account: Account) {
        let mut accounts = self.accounts.write().await;
        accounts.insert(account.id.clone(), account);
    }

    /// Flip the master kill switch.
    pub fn set_halted(&self, halted: bool) {
        self.halted.store(halted, Ordering::SeqCst);
    }

    /// Number of journaled orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Number of open positions across all accounts.
    pub async fn position_count(&self) -> usize {
        self.positions.read().await.len()
    }
}

#[async_trait]
impl AccountDirectory for InMemoryGateStore {
    async fn find_account(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(id).cloned())
    }
}

#[async_trait]
impl HaltSwitch for InMemoryGateStore {
    async fn is_halted(&self) -> Result<bool, StoreError> {
        Ok(self.halted.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl OrderJournal for InMemoryGateStore {
    async fn append(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn record_outcome(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().await;
        match orders.get(&order.id) {
            None => Err(StoreError::not_found("order", order.id.as_str())),
            Some(existing) if existing.status.is_terminal() => Err(StoreError::TerminalOrder {
                order_id: order.id.to_string(),
            }),
            Some(_) => {
                orders.insert(order.id.clone(), order.clone());
                Ok(())
            }
        }
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders.get(id).cloned())
    }

    async fn count_since(
        &self,
        account_id: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let orders = self.orders.read().await;
        let count = orders
            .values()
            .filter(|o| &o.account_id == account_id && o.created_at >= since)
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl PositionLedger for InMemoryGateStore {
    async fn find_open(&self, account_id: &AccountId) -> Result<Vec<Position>, StoreError> {
        let positions = self.positions.read().await;
        Ok(positions
            .values()
            .filter(|p| &p.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn find_position(
        &self,
        account_id: &AccountId,
        symbol: &str,
    ) -> Result<Option<Position>, StoreError> {
        let positions = self.positions.read().await;
        Ok(positions
            .get(&(account_id.clone(), symbol.to_string()))
            .cloned())
    }

    async fn upsert(&self, position: &Position) -> Result<(), StoreError> {
        let mut positions = self.positions.write().await;
        positions.insert(
            (position.account_id.clone(), position.symbol.clone()),
            position.clone(),
        );
        Ok(())
    }

    async fn remove(&self, account_id: &AccountId, symbol: &str) -> Result<(), StoreError> {
        let mut positions = self.positions.write().await;
        positions.remove(&(account_id.clone(), symbol.to_string()));
        Ok(())
    }
}
