//! Order execution coordination.
//!
//! [`ExecutionCoordinator::submit`] is the single path an order takes
//! through the gate: risk validation, journaling, broker placement and
//! position bookkeeping. It is the only component whose side effects span
//! multiple entities, and it runs the whole pipeline under the owning
//! account's submit lock so concurrent submissions cannot double-admit past
//! a limit.

mod locks;

pub use locks::AccountLocks;

use std::sync::Arc;
use std::time::Duration;

use crate::broker::{BrokerAdapter, Placement};
use crate::error::GateError;
use crate::models::{AccountId, FillEffect, Order, OrderRequest, Position};
use crate::risk::{RiskEngine, Verdict};
use crate::store::{GateStore, StoreError};

/// Default upper bound on a single broker placement call.
pub const DEFAULT_PLACEMENT_TIMEOUT: Duration = Duration::from_secs(5);

const PLACEMENT_TIMEOUT_REASON: &str = "Broker placement timed out";

/// Drives admitted orders from validation to a terminal status.
pub struct ExecutionCoordinator<S: ?Sized, B: ?Sized> {
    store: Arc<S>,
    broker: Arc<B>,
    engine: RiskEngine<S>,
    locks: AccountLocks,
    placement_timeout: Duration,
}

impl<S, B> ExecutionCoordinator<S, B>
where
    S: GateStore + ?Sized,
    B: BrokerAdapter + ?Sized,
{
    /// Create a coordinator over the given store and broker.
    pub fn new(store: Arc<S>, broker: Arc<B>) -> Self {
        Self {
            engine: RiskEngine::new(Arc::clone(&store)),
            store,
            broker,
            locks: AccountLocks::new(),
            placement_timeout: DEFAULT_PLACEMENT_TIMEOUT,
        }
    }

    /// Set the placement timeout.
    #[must_use]
    pub fn with_placement_timeout(mut self, timeout: Duration) -> Self {
        self.placement_timeout = timeout;
        self
    }

    /// Submit a candidate order for an account.
    ///
    /// The pipeline runs under the account's submit lock: read the account
    /// fresh, validate, journal, place with the broker, then apply the
    /// outcome. A denial is journaled as a `Rejected` order carrying the
    /// reason and returns without the broker ever being contacted. A broker
    /// failure of any kind resolves to a `Rejected` order too; it never
    /// surfaces as a fault.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::AccountNotFound`] for an unknown account and
    /// [`GateError::Store`] when storage is unavailable. In the latter case
    /// nothing was admitted: the gate fails closed when the risk decision
    /// cannot be computed.
    pub async fn submit(
        &self,
        account_id: &AccountId,
        candidate: OrderRequest,
    ) -> Result<Order, GateError> {
        let lock = self.locks.for_account(account_id).await;
        let _guard = lock.lock().await;

        // Fresh read under the lock so a pause or halt set moments ago is
        // honored for this submission.
        let account = self
            .store
            .find_account(account_id)
            .await?
            .ok_or_else(|| GateError::AccountNotFound(account_id.clone()))?;

        let verdict = self.engine.validate(&account, &candidate).await?;
        if let Verdict::Denied { reason } = verdict {
            let order = Order::denied(account.id.clone(), &candidate, reason);
            self.store.append(&order).await?;
            return Ok(order);
        }

        let mut order = Order::from_request(account.id.clone(), &candidate);
        self.store.append(&order).await?;
        tracing::info!(
            order_id = %order.id,
            account_id = %order.account_id,
            symbol = %order.symbol,
            qty = %order.quantity,
            price = %order.price,
            "Order admitted, placing with broker"
        );

        let placement = self.place_with_timeout(&order).await;

        if placement.is_executed() {
            order.record_fill(
                placement.filled_quantity,
                placement.avg_fill_price,
                placement.broker_order_id.clone(),
                placement.executed_at,
            );
            self.apply_fill(&order).await?;
            tracing::info!(
                order_id = %order.id,
                broker_order_id = ?order.broker_order_id,
                filled_qty = %order.filled_quantity,
                avg_price = %order.avg_fill_price,
                latency_ms = ?order.latency_ms,
                "Order executed"
            );
        } else {
            let reason = placement
                .rejection_reason
                .clone()
                .unwrap_or_else(|| "Order rejected by broker".to_string());
            order.record_rejection(reason, placement.executed_at);
            tracing::warn!(
                order_id = %order.id,
                reason = ?order.rejection_reason,
                "Order rejected by broker"
            );
        }

        self.store.record_outcome(&order).await?;
        Ok(order)
    }

    /// Place an order with the broker, bounding the call time.
    ///
    /// A timeout counts as a rejection so an admitted order cannot remain
    /// `Pending` indefinitely.
    async fn place_with_timeout(&self, order: &Order) -> Placement {
        match tokio::time::timeout(self.placement_timeout, self.broker.place_order(order)).await {
            Ok(placement) => placement,
            Err(_) => {
                tracing::warn!(
                    order_id = %order.id,
                    timeout_ms = self.placement_timeout.as_millis() as u64,
                    "Broker placement timed out"
                );
                Placement::rejected(PLACEMENT_TIMEOUT_REASON)
            }
        }
    }

    /// Fold an executed order into the position ledger.
    async fn apply_fill(&self, order: &Order) -> Result<(), StoreError> {
        let existing = self
            .store
            .find_position(&order.account_id, &order.symbol)
            .await?;

        match existing {
            Some(mut position) => {
                let effect =
                    position.apply_fill(order.side, order.filled_quantity, order.avg_fill_price);
                match effect {
                    FillEffect::Flat => {
                        self.store.remove(&order.account_id, &order.symbol).await?;
                        tracing::info!(
                            account_id = %order.account_id,
                            symbol = %order.symbol,
                            "Position flattened"
                        );
                    }
                    FillEffect::Open => {
                        self.store.upsert(&position).await?;
                    }
                }
            }
            None => {
                let position = Position::open(
                    order.account_id.clone(),
                    order.strategy_id.clone(),
                    order.symbol.clone(),
                    order.side,
                    order.filled_quantity,
                    order.avg_fill_price,
                );
                self.store.upsert(&position).await?;
                tracing::info!(
                    account_id = %order.account_id,
                    symbol = %order.symbol,
                    qty = %order.filled_quantity,
                    "Position opened"
                );
            }
        }

        Ok(())
    }
}
