//! Risk validation engine.
//!
//! Pure decision logic over account state, the order journal, and the
//! position ledger. Checks run in strict order with the first denial
//! winning: system halt, account paused, account inactive, rate limit,
//! position-count limit, exposure limit. Safety flags therefore dominate
//! quantitative limits regardless of their values.
//!
//! The engine performs no writes. A store failure during any check aborts
//! validation with the error; the caller must treat that as "could not
//! decide" and never admit the order.

mod checks;

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Account, OrderRequest};
use crate::store::{HaltSwitch, OrderJournal, PositionLedger, StoreError};

/// Length of the sliding rate-limit window.
const RATE_WINDOW_SECS: i64 = 60;

/// Outcome of risk validation. A denial is structured data, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// All checks passed; the order may be forwarded to the broker.
    Admitted,
    /// A check failed; the order must not reach the broker.
    Denied {
        /// Human-readable reason from the first failing check.
        reason: String,
    },
}

impl Verdict {
    /// Build a denial.
    #[must_use]
    pub fn denied(reason: impl Into<String>) -> Self {
        Self::Denied {
            reason: reason.into(),
        }
    }

    /// Whether the order was admitted.
    #[must_use]
    pub const fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }

    /// The denial reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Admitted => None,
            Self::Denied { reason } => Some(reason),
        }
    }
}

/// The ordered-check validation engine.
pub struct RiskEngine<S: ?Sized> {
    store: Arc<S>,
}

impl<S> RiskEngine<S>
where
    S: HaltSwitch + OrderJournal + PositionLedger + ?Sized,
{
    /// Create an engine over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Validate a candidate order for an account.
    ///
    /// Read-only and idempotent: repeated calls with no intervening state
    /// change yield the same verdict. The halt and pause flags are read
    /// fresh on every call. Later checks are only evaluated (including
    /// their I/O) when every earlier check admitted.
    pub async fn validate(
        &self,
        account: &Account,
        candidate: &OrderRequest,
    ) -> Result<Verdict, StoreError> {
        let halted = self.store.is_halted().await?;
        if let Some(denial) = Self::denial(account, "system_halt", checks::check_system_halt(halted))
        {
            return Ok(denial);
        }

        if let Some(denial) = Self::denial(
            account,
            "account_flags",
            checks::check_account_flags(account),
        ) {
            return Ok(denial);
        }

        let window_start = Utc::now() - Duration::seconds(RATE_WINDOW_SECS);
        let recent = self.store.count_since(&account.id, window_start).await?;
        if let Some(denial) = Self::denial(
            account,
            "rate_limit",
            checks::check_rate_limit(recent, account.risk_settings.orders_per_minute_limit()),
        ) {
            return Ok(denial);
        }

        let open = self.store.find_open(&account.id).await?;
        if let Some(denial) = Self::denial(
            account,
            "position_count",
            checks::check_position_count(
                &open,
                &candidate.symbol,
                account.risk_settings.open_position_limit(),
            ),
        ) {
            return Ok(denial);
        }

        if let Some(denial) = Self::denial(
            account,
            "exposure",
            checks::check_exposure(
                &open,
                candidate.notional(),
                account.risk_settings.exposure_limit(),
            ),
        ) {
            return Ok(denial);
        }

        Ok(Verdict::Admitted)
    }

    /// Log and pass through a denial; `None` means the check admitted.
    fn denial(account: &Account, check: &'static str, verdict: Verdict) -> Option<Verdict> {
        match &verdict {
            Verdict::Admitted => None,
            Verdict::Denied { reason } => {
                tracing::warn!(
                    account_id = %account.id,
                    check = check,
                    reason = %reason,
                    "Order denied by risk gate"
                );
                Some(verdict)
            }
        }
    }
}
