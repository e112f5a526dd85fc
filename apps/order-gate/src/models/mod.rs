//! Core domain models for the risk gate.
//!
//! These types define accounts, candidate orders, journaled orders, and
//! open positions as the gate sees them.

mod account;
mod identifiers;
mod order;
mod position;

pub use account::{Account, RiskSettings};
pub use identifiers::{AccountId, BrokerOrderId, OrderId, StrategyId};
pub use order::{Exchange, Order, OrderRequest, OrderSide, OrderStatus, OrderType};
pub use position::{FillEffect, Position, PositionSide};
