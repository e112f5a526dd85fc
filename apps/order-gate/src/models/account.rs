//! Account state consumed by the risk gate.
//!
//! Accounts are owned and mutated by external collaborators (settings
//! updates, admin pause actions). The gate only reads them.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::AccountId;

/// Per-account risk limits. Every field is optional; absent fields fall
/// back to the documented defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSettings {
    /// Maximum number of distinct symbols with open exposure.
    #[serde(default)]
    pub max_open_positions: Option<u32>,
    /// Maximum total exposure (mark price x |quantity| summed over open
    /// positions, plus the candidate notional).
    #[serde(default)]
    pub max_exposure: Option<Decimal>,
    /// Maximum orders admitted per trailing 60-second window.
    #[serde(default)]
    pub max_orders_per_minute: Option<u32>,
}

impl RiskSettings {
    /// Default cap on distinct open symbols.
    pub const DEFAULT_MAX_OPEN_POSITIONS: u32 = 10;
    /// Default cap on total exposure.
    pub const DEFAULT_MAX_EXPOSURE: Decimal = dec!(1_000_000);
    /// Default cap on orders per trailing minute.
    pub const DEFAULT_MAX_ORDERS_PER_MINUTE: u32 = 20;

    /// Open-position limit with the default applied.
    #[must_use]
    pub const fn open_position_limit(&self) -> u32 {
        match self.max_open_positions {
            Some(limit) => limit,
            None => Self::DEFAULT_MAX_OPEN_POSITIONS,
        }
    }

    /// Exposure limit with the default applied.
    #[must_use]
    pub const fn exposure_limit(&self) -> Decimal {
        match self.max_exposure {
            Some(limit) => limit,
            None => Self::DEFAULT_MAX_EXPOSURE,
        }
    }

    /// Orders-per-minute limit with the default applied.
    #[must_use]
    pub const fn orders_per_minute_limit(&self) -> u32 {
        match self.max_orders_per_minute {
            Some(limit) => limit,
            None => Self::DEFAULT_MAX_ORDERS_PER_MINUTE,
        }
    }
}

/// A trading account as seen by the gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier.
    pub id: AccountId,
    /// Inactive accounts are denied before any quantitative check.
    pub is_active: bool,
    /// Per-account kill switch.
    pub is_paused: bool,
    /// Risk limits; absent settings fall back to defaults.
    #[serde(default)]
    pub risk_settings: RiskSettings,
}

impl Account {
    /// Create an active, unpaused account with default risk settings.
    #[must_use]
    pub fn new(id: AccountId) -> Self {
        Self {
            id,
            is_active: true,
            is_paused: false,
            risk_settings: RiskSettings::default(),
        }
    }

    /// Replace the risk settings.
    #[must_use]
    pub fn with_risk_settings(mut self, settings: RiskSettings) -> Self {
        self.risk_settings = settings;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_settings_absent() {
        let settings = RiskSettings::default();
        assert_eq!(settings.open_position_limit(), 10);
        assert_eq!(settings.exposure_limit(), dec!(1_000_000));
        assert_eq!(settings.orders_per_minute_limit(), 20);
    }

    #[test]
    fn test_explicit_settings_override_defaults() {
        let settings = RiskSettings {
            max_open_positions: Some(2),
            max_exposure: Some(dec!(50_000)),
            max_orders_per_minute: Some(5),
        };
        assert_eq!(settings.open_position_limit(), 2);
        assert_eq!(settings.exposure_limit(), dec!(50_000));
        assert_eq!(settings.orders_per_minute_limit(), 5);
    }

    #[test]
    fn test_partial_settings_mix_with_defaults() {
        let settings = RiskSettings {
            max_open_positions: Some(3),
            ..RiskSettings::default()
        };
        assert_eq!(settings.open_position_limit(), 3);
        assert_eq!(settings.exposure_limit(), dec!(1_000_000));
        assert_eq!(settings.orders_per_minute_limit(), 20);
    }

    #[test]
    fn test_new_account_is_active_and_unpaused() {
        let account = Account::new(AccountId::new("acct-1"));
        assert!(account.is_active);
        assert!(!account.is_paused);
    }

    #[test]
    fn test_settings_deserialize_with_missing_fields() {
        let settings: RiskSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, RiskSettings::default());

        let settings: RiskSettings =
            serde_json::from_str(r#"{"max_orders_per_minute": 10}"#).unwrap();
        assert_eq!(settings.orders_per_minute_limit(), 10);
        assert_eq!(settings.open_position_limit(), 10);
    }
}
