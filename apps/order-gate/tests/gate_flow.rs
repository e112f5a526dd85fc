//! End-to-end gate flow tests.
//!
//! Drives the full submit pipeline with a counting broker fake: risk
//! validation, order journaling, broker placement, position bookkeeping.

// Allow unwrap in tests - tests should panic on unexpected errors
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use order_gate::ExecutionCoordinator;
use order_gate::broker::{BrokerAdapter, ConnectivityReport, Placement, Quote};
use order_gate::models::{
    Account, AccountId, BrokerOrderId, Exchange, Order, OrderRequest, OrderSide, OrderStatus,
    RiskSettings,
};
use order_gate::store::{InMemoryGateStore, PositionLedger};

// =============================================================================
// Counting broker fake
// =============================================================================

/// Broker fake that counts placement calls and either fills at the requested
/// price or rejects everything.
struct CountingBroker {
    accept_orders: bool,
    place_calls: AtomicU64,
}

impl CountingBroker {
    const fn accepting() -> Self {
        Self {
            accept_orders: true,
            place_calls: AtomicU64::new(0),
        }
    }

    const fn rejecting() -> Self {
        Self {
            accept_orders: false,
            place_calls: AtomicU64::new(0),
        }
    }

    fn place_calls(&self) -> u64 {
        self.place_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrokerAdapter for CountingBroker {
    fn name(&self) -> &'static str {
        "counting"
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
        Quote::new(symbol, dec!(100))
    }

    async fn place_order(&self, order: &Order) -> Placement {
        self.place_calls.fetch_add(1, Ordering::SeqCst);
        if self.accept_orders {
            Placement::filled(
                order.quantity,
                order.price,
                BrokerOrderId::new(format!("broker-{}", order.id)),
            )
        } else {
            Placement::rejected("Order rejected for testing")
        }
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn scripted_account(id: &str) -> Account {
    let mut account = Account::new(AccountId::new(id));
    account.risk_settings = RiskSettings {
        max_open_positions: Some(2),
        max_exposure: Some(dec!(1_000_000)),
        max_orders_per_minute: Some(10),
    };
    account
}

fn buy(symbol: &str, quantity: Decimal, price: Decimal) -> OrderRequest {
    OrderRequest::limit(symbol, OrderSide::Buy, quantity, price)
}

// =============================================================================
// Scenarios
// =============================================================================

/// Scripted session: two admissions fill and open positions, the third
/// symbol trips the position limit, and once the account is paused nothing
/// reaches the broker.
#[tokio::test]
async fn test_scripted_session_respects_limits_and_pause() {
    let store = Arc::new(InMemoryGateStore::new());
    let broker = Arc::new(CountingBroker::accepting());
    let mut account = scripted_account("acct-1");
    store.upsert_account(account.clone()).await;

    let coordinator = ExecutionCoordinator::new(Arc::clone(&store), Arc::clone(&broker));
    let account_id = AccountId::new("acct-1");

    let first = coordinator
        .submit(&account_id, buy("RELIANCE", dec!(1), dec!(2500)))
        .await
        .unwrap();
    assert_eq!(first.status, OrderStatus::Executed);
    assert!(
        store
            .find_position(&account_id, "RELIANCE")
            .await
            .unwrap()
            .is_some()
    );

    let second = coordinator
        .submit(&account_id, buy("TCS", dec!(1), dec!(3500)))
        .await
        .unwrap();
    assert_eq!(second.status, OrderStatus::Executed);
    assert_eq!(store.position_count().await, 2);

    let third = coordinator
        .submit(&account_id, buy("INFY", dec!(1), dec!(1500)))
        .await
        .unwrap();
    assert_eq!(third.status, OrderStatus::Rejected);
    assert!(
        third
            .rejection_reason
            .as_deref()
            .unwrap()
            .contains("Position limit")
    );
    assert_eq!(store.position_count().await, 2);

    account.is_paused = true;
    store.upsert_account(account).await;

    let fourth = coordinator
        .submit(&account_id, buy("SBIN", dec!(10), dec!(500)))
        .await
        .unwrap();
    assert_eq!(fourth.status, OrderStatus::Rejected);
    assert!(
        fourth
            .rejection_reason
            .as_deref()
            .unwrap()
            .contains("paused")
    );

    // Only the two admitted orders ever reached the broker.
    assert_eq!(broker.place_calls(), 2);
}

/// A broker that fails every placement yields terminal rejected orders with
/// a reason, never a fault, and never touches positions.
#[tokio::test]
async fn test_broker_failure_is_absorbed_into_rejection() {
    let store = Arc::new(InMemoryGateStore::new());
    let broker = Arc::new(CountingBroker::rejecting());
    store.upsert_account(scripted_account("acct-1")).await;

    let coordinator = ExecutionCoordinator::new(Arc::clone(&store), Arc::clone(&broker));
    let order = coordinator
        .submit(
            &AccountId::new("acct-1"),
            buy("RELIANCE", dec!(1), dec!(2500)),
        )
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Rejected);
    assert!(!order.rejection_reason.unwrap().is_empty());
    assert_eq!(broker.place_calls(), 1);
    assert_eq!(store.position_count().await, 0);
}

/// Two concurrent submissions on distinct symbols cannot jointly breach
/// `max_open_positions = 1`.
#[tokio::test]
async fn test_concurrent_submissions_cannot_breach_position_limit() {
    let store = Arc::new(InMemoryGateStore::new());
    let broker = Arc::new(CountingBroker::accepting());
    let mut account = Account::new(AccountId::new("acct-1"));
    account.risk_settings = RiskSettings {
        max_open_positions: Some(1),
        ..RiskSettings::default()
    };
    store.upsert_account(account).await;

    let coordinator = Arc::new(ExecutionCoordinator::new(
        Arc::clone(&store),
        Arc::clone(&broker),
    ));

    let a = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        async move {
            coordinator
                .submit(
                    &AccountId::new("acct-1"),
                    buy("RELIANCE", dec!(1), dec!(2500)),
                )
                .await
                .unwrap()
        }
    });
    let b = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        async move {
            coordinator
                .submit(&AccountId::new("acct-1"), buy("TCS", dec!(1), dec!(3500)))
                .await
                .unwrap()
        }
    });

    let (first, second) = (a.await.unwrap(), b.await.unwrap());
    let executed = [&first, &second]
        .iter()
        .filter(|order| order.status == OrderStatus::Executed)
        .count();

    assert_eq!(executed, 1, "exactly one submission may be admitted");
    assert_eq!(store.position_count().await, 1);

    let denied = if first.status == OrderStatus::Executed {
        second
    } else {
        first
    };
    assert!(
        denied
            .rejection_reason
            .as_deref()
            .unwrap()
            .contains("Position limit")
    );
}
