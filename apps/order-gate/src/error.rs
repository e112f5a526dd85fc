//! Top-level error types.
//!
//! Risk denials and broker rejections are not errors; they come back as
//! data on the journaled [`crate::models::Order`]. What remains are genuine
//! faults: the gate could not compute or persist a decision, or was
//! misconfigured at startup. These must reach the boundary layer as
//! faults, and the gate fails closed when they occur.

use thiserror::Error;

use crate::config::ConfigError;
use crate::models::AccountId;
use crate::store::StoreError;

/// Faults surfaced by the gate.
#[derive(Debug, Error)]
pub enum GateError {
    /// The submitting account does not exist.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Storage was unavailable; the risk decision could not be computed
    /// safely and no order was admitted.
    #[error("Data access failure: {0}")]
    Store(#[from] StoreError),

    /// The gate was misconfigured at startup.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_not_found_display() {
        let err = GateError::AccountNotFound(AccountId::new("acct-1"));
        assert_eq!(err.to_string(), "Account not found: acct-1");
    }

    #[test]
    fn test_store_error_converts() {
        let err: GateError = StoreError::Connection("pool exhausted".to_string()).into();
        assert!(matches!(err, GateError::Store(_)));
        assert!(err.to_string().contains("pool exhausted"));
    }
}
