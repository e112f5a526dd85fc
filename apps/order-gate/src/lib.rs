// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Order Gate - Pre-Trade Risk Gate and Order Execution Coordinator
//!
//! Every candidate order passes through one pipeline: risk validation
//! against account state, then broker placement, then position
//! bookkeeping. The gate decides admission; the broker decides fills.
//!
//! # Modules
//!
//! - `models`: Account, `Order`, `Position` and their identifier newtypes
//! - `store`: data-access traits with in-memory and Postgres
//!   implementations
//! - `risk`: ordered short-circuit validation (halt, pause, rate,
//!   position count, exposure)
//! - `broker`: [`BrokerAdapter`] contract with simulated and Dhan REST
//!   implementations
//! - `execution`: [`ExecutionCoordinator`], the single submit pipeline
//! - `config`: YAML + environment configuration and startup validation
//!
//! # Failure posture
//!
//! Risk denials and broker rejections are data on the resulting
//! [`Order`]. Faults ([`GateError`]) are reserved for storage and
//! configuration problems, and the gate fails closed on them: an order is
//! never admitted when the risk decision could not be computed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod broker;
pub mod config;
pub mod error;
pub mod execution;
pub mod models;
pub mod risk;
pub mod store;
pub mod telemetry;

pub use broker::{
    BrokerAdapter, ConnectivityReport, DhanBroker, DhanConfig, Placement, PlacementStatus, Quote,
    SimulatedBroker, build_broker,
};
pub use config::{ConfigError, GateConfig, TradeMode, load_config, validate_startup};
pub use error::GateError;
pub use execution::{DEFAULT_PLACEMENT_TIMEOUT, ExecutionCoordinator};
pub use models::{
    Account, AccountId, Exchange, Order, OrderId, OrderRequest, OrderSide, OrderStatus, OrderType,
    Position, PositionSide, RiskSettings, StrategyId,
};
pub use risk::{RiskEngine, Verdict};
pub use store::{
    AccountDirectory, GateStore, HaltSwitch, InMemoryGateStore, OrderJournal, PgGateStore,
    PositionLedger, StoreError,
};
