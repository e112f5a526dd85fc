//! Open positions and the fill bookkeeping applied to them.
//!
//! At most one open position exists per (account, symbol). Same-direction
//! fills merge into a weighted average entry; opposite-direction fills net
//! quantity down, flatten the position at exactly zero, or flip it when
//! crossing through zero.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AccountId, OrderSide, StrategyId};

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionSide {
    /// Net long.
    Long,
    /// Net short.
    Short,
}

impl PositionSide {
    /// The opposing direction.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

impl From<OrderSide> for PositionSide {
    fn from(side: OrderSide) -> Self {
        match side {
            OrderSide::Buy => Self::Long,
            OrderSide::Sell => Self::Short,
        }
    }
}

/// Outcome of applying a fill to a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillEffect {
    /// The position remains open and should be upserted.
    Open,
    /// The fill brought quantity to exactly zero; remove the position.
    Flat,
}

/// An open position held by an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Owning account.
    pub account_id: AccountId,
    /// Strategy the position belongs to, if any.
    pub strategy_id: Option<StrategyId>,
    /// Instrument symbol.
    pub symbol: String,
    /// Net direction.
    pub side: PositionSide,
    /// Held quantity, always positive; direction lives in `side`.
    pub quantity: Decimal,
    /// Weighted average entry price.
    pub avg_entry_price: Decimal,
    /// Latest known mark price; refreshed externally and on fills.
    pub mark_price: Decimal,
    /// Unrealized profit and loss against the mark price.
    pub unrealized_pnl: Decimal,
    /// When the position was opened.
    pub opened_at: DateTime<Utc>,
    /// Last bookkeeping update.
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// Open a new position from the first fill on a symbol.
    #[must_use]
    pub fn open(
        account_id: AccountId,
        strategy_id: Option<StrategyId>,
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            account_id,
            strategy_id,
            symbol: symbol.into(),
            side: side.into(),
            quantity,
            avg_entry_price: price,
            mark_price: price,
            unrealized_pnl: Decimal::ZERO,
            opened_at: now,
            updated_at: now,
        }
    }

    /// Capital at risk: mark price times absolute quantity.
    #[must_use]
    pub fn exposure(&self) -> Decimal {
        self.mark_price * self.quantity.abs()
    }

    /// Apply a fill to this position.
    ///
    /// Same-direction fills merge quantity and recompute the weighted
    /// average entry. Opposite-direction fills reduce quantity with the
    /// entry unchanged, flatten at exactly zero, or flip the side with the
    /// fill price as the new entry when crossing through zero. The mark
    /// price is refreshed to the fill price either way.
    pub fn apply_fill(&mut self, side: OrderSide, quantity: Decimal, price: Decimal) -> FillEffect {
        self.mark_price = price;
        self.updated_at = Utc::now();

        if PositionSide::from(side) == self.side {
            let total = self.quantity + quantity;
            self.avg_entry_price =
                (self.avg_entry_price * self.quantity + price * quantity) / total;
            self.quantity = total;
            self.refresh_pnl();
            return FillEffect::Open;
        }

        if quantity < self.quantity {
            self.quantity -= quantity;
            self.refresh_pnl();
            FillEffect::Open
        } else if quantity == self.quantity {
            self.quantity = Decimal::ZERO;
            self.unrealized_pnl = Decimal::ZERO;
            FillEffect::Flat
        } else {
            self.side = self.side.opposite();
            self.quantity = quantity - self.quantity;
            self.avg_entry_price = price;
            self.unrealized_pnl = Decimal::ZERO;
            FillEffect::Open
        }
    }

    /// Recompute unrealized P&L against the current mark price.
    fn refresh_pnl(&mut self) {
        let per_unit = match self.side {
            PositionSide::Long => self.mark_price - self.avg_entry_price,
            PositionSide::Short => self.avg_entry_price - self.mark_price,
        };
        self.unrealized_pnl = per_unit * self.quantity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn long_position(quantity: Decimal, price: Decimal) -> Position {
        Position::open(
            AccountId::new("acct-1"),
            None,
            "RELIANCE",
            OrderSide::Buy,
            quantity,
            price,
        )
    }

    #[test]
    fn test_open_from_buy_is_long() {
        let position = long_position(dec!(10), dec!(2500));
        assert_eq!(position.side, PositionSide::Long);
        assert_eq!(position.avg_entry_price, dec!(2500));
        assert_eq!(position.mark_price, dec!(2500));
        assert_eq!(position.unrealized_pnl, Decimal::ZERO);
    }

    #[test]
    fn test_open_from_sell_is_short() {
        let position = Position::open(
            AccountId::new("acct-1"),
            None,
            "SBIN",
            OrderSide::Sell,
            dec!(5),
            dec!(500),
        );
        assert_eq!(position.side, PositionSide::Short);
    }

    #[test]
    fn test_exposure_uses_mark_price() {
        let mut position = long_position(dec!(10), dec!(2500));
        assert_eq!(position.exposure(), dec!(25_000));

        position.mark_price = dec!(2600);
        assert_eq!(position.exposure(), dec!(26_000));
    }

    #[test]
    fn test_same_direction_fill_weights_entry() {
        let mut position = long_position(dec!(10), dec!(100));
        let effect = position.apply_fill(OrderSide::Buy, dec!(10), dec!(110));

        assert_eq!(effect, FillEffect::Open);
        assert_eq!(position.quantity, dec!(20));
        assert_eq!(position.avg_entry_price, dec!(105));
        assert_eq!(position.mark_price, dec!(110));
        // (110 - 105) * 20
        assert_eq!(position.unrealized_pnl, dec!(100));
    }

    #[test]
    fn test_opposite_fill_reduces_without_touching_entry() {
        let mut position = long_position(dec!(10), dec!(100));
        let effect = position.apply_fill(OrderSide::Sell, dec!(4), dec!(120));

        assert_eq!(effect, FillEffect::Open);
        assert_eq!(position.quantity, dec!(6));
        assert_eq!(position.avg_entry_price, dec!(100));
        assert_eq!(position.side, PositionSide::Long);
    }

    #[test]
    fn test_exact_opposite_fill_flattens() {
        let mut position = long_position(dec!(10), dec!(100));
        let effect = position.apply_fill(OrderSide::Sell, dec!(10), dec!(105));

        assert_eq!(effect, FillEffect::Flat);
        assert_eq!(position.quantity, Decimal::ZERO);
    }

    #[test]
    fn test_oversized_opposite_fill_flips_side() {
        let mut position = long_position(dec!(5), dec!(100));
        let effect = position.apply_fill(OrderSide::Sell, dec!(8), dec!(95));

        assert_eq!(effect, FillEffect::Open);
        assert_eq!(position.side, PositionSide::Short);
        assert_eq!(position.quantity, dec!(3));
        assert_eq!(position.avg_entry_price, dec!(95));
        assert_eq!(position.unrealized_pnl, Decimal::ZERO);
    }

    #[test]
    fn test_short_pnl_gains_when_mark_falls() {
        let mut position = Position::open(
            AccountId::new("acct-1"),
            None,
            "TCS",
            OrderSide::Sell,
            dec!(10),
            dec!(3500),
        );
        position.apply_fill(OrderSide::Sell, dec!(10), dec!(3400));

        // entry averages to 3450, mark 3400: (3450 - 3400) * 20
        assert_eq!(position.quantity, dec!(20));
        assert_eq!(position.avg_entry_price, dec!(3450));
        assert_eq!(position.unrealized_pnl, dec!(1_000));
    }

    #[test]
    fn test_side_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&PositionSide::Long).unwrap(),
            "\"LONG\""
        );
    }
}
