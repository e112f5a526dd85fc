//! Individual risk predicates.
//!
//! Each predicate is a pure function over pre-fetched state so order and
//! precedence stay explicit and each check is testable on its own. The
//! engine in [`super`] runs them in strict order with the first denial
//! winning.

use rust_decimal::Decimal;

use super::Verdict;
use crate::models::{Account, Position};

/// System-wide kill switch. Dominates every other check.
pub(crate) fn check_system_halt(halted: bool) -> Verdict {
    if halted {
        Verdict::denied("Trading halted by master kill switch")
    } else {
        Verdict::Admitted
    }
}

/// Per-account kill switches: paused first, then inactive.
pub(crate) fn check_account_flags(account: &Account) -> Verdict {
    if account.is_paused {
        return Verdict::denied("Trading is paused for this account");
    }
    if !account.is_active {
        return Verdict::denied("Account is not active");
    }
    Verdict::Admitted
}

/// Sliding-window rate limit. `recent` is the number of orders journaled
/// in the trailing 60 seconds, counted before the candidate itself.
pub(crate) fn check_rate_limit(recent: u64, limit: u32) -> Verdict {
    if recent >= u64::from(limit) {
        Verdict::denied(format!(
            "Rate limit exceeded: {recent} orders in the last 60s (max {limit}/min)"
        ))
    } else {
        Verdict::Admitted
    }
}

/// Distinct-symbol position cap.
///
/// Orders on a symbol that already has an open position are exempt
/// regardless of side: they cannot widen the set of symbols with
/// exposure, only extend or net the existing one.
pub(crate) fn check_position_count(open: &[Position], symbol: &str, limit: u32) -> Verdict {
    if open.iter().any(|p| p.symbol == symbol) {
        return Verdict::Admitted;
    }

    let count = open.len();
    if count >= limit as usize {
        Verdict::denied(format!(
            "Position limit reached: {count} open positions (max {limit})"
        ))
    } else {
        Verdict::Admitted
    }
}

/// Exposure cap. Current exposure is mark price times absolute quantity
/// summed over open positions; the candidate contributes its notional.
/// Equality with the limit passes; only strictly greater is denied.
pub(crate) fn check_exposure(
    open: &[Position],
    candidate_notional: Decimal,
    limit: Decimal,
) -> Verdict {
    let current: Decimal = open.iter().map(Position::exposure).sum();
    let projected = current + candidate_notional;

    if projected > limit {
        Verdict::denied(format!(
            "Exposure limit exceeded: current {current} + order {candidate_notional} > max {limit}"
        ))
    } else {
        Verdict::Admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountId, OrderSide};
    use rust_decimal_macros::dec;

    fn position(symbol: &str, quantity: Decimal, price: Decimal) -> Position {
        Position::open(
            AccountId::new("acct-1"),
            None,
            symbol,
            OrderSide::Buy,
            quantity,
            price,
        )
    }

    #[test]
    fn test_halt_denies_when_set() {
        assert!(check_system_halt(false).is_admitted());

        let verdict = check_system_halt(true);
        assert!(!verdict.is_admitted());
        assert!(verdict.reason().unwrap().contains("halted"));
    }

    #[test]
    fn test_paused_wins_over_inactive() {
        let mut account = Account::new(AccountId::new("acct-1"));
        account.is_paused = true;
        account.is_active = false;

        let verdict = check_account_flags(&account);
        assert!(verdict.reason().unwrap().contains("paused"));
    }

    #[test]
    fn test_inactive_account_denied() {
        let mut account = Account::new(AccountId::new("acct-1"));
        account.is_active = false;

        let verdict = check_account_flags(&account);
        assert!(verdict.reason().unwrap().contains("not active"));
    }

    #[test]
    fn test_rate_limit_boundary() {
        // N-th order sees N-1 journaled, admitted; N+1-th sees N, denied.
        assert!(check_rate_limit(9, 10).is_admitted());
        assert!(!check_rate_limit(10, 10).is_admitted());
        assert!(!check_rate_limit(11, 10).is_admitted());
    }

    #[test]
    fn test_position_count_boundary() {
        let open = vec![
            position("RELIANCE", dec!(1), dec!(2500)),
            position("TCS", dec!(1), dec!(3500)),
        ];

        // Third distinct symbol at the cap is denied.
        let verdict = check_position_count(&open, "INFY", 2);
        assert!(verdict.reason().unwrap().contains("Position limit"));

        // Under the cap a new symbol is fine.
        assert!(check_position_count(&open, "INFY", 3).is_admitted());
    }

    #[test]
    fn test_held_symbol_exempt_regardless_of_side() {
        let open = vec![
            position("RELIANCE", dec!(1), dec!(2500)),
            position("TCS", dec!(1), dec!(3500)),
        ];

        // Same symbol passes even with the count at the cap; the check
        // counts distinct symbols, not net direction.
        assert!(check_position_count(&open, "RELIANCE", 2).is_admitted());
        assert!(check_position_count(&open, "TCS", 1).is_admitted());
    }

    #[test]
    fn test_exposure_equality_passes() {
        let open = vec![position("RELIANCE", dec!(100), dec!(9_000))];

        // 900_000 current + 100_000 candidate == 1_000_000 limit.
        assert!(check_exposure(&open, dec!(100_000), dec!(1_000_000)).is_admitted());

        // One unit over is denied.
        let verdict = check_exposure(&open, dec!(100_001), dec!(1_000_000));
        assert!(verdict.reason().unwrap().contains("Exposure limit"));
    }

    #[test]
    fn test_exposure_uses_mark_price_not_entry() {
        let mut held = position("RELIANCE", dec!(10), dec!(100));
        held.mark_price = dec!(200);

        // Exposure is 2_000 at the mark, not 1_000 at entry.
        assert!(!check_exposure(&[held.clone()], dec!(1), dec!(2_000)).is_admitted());
        assert!(check_exposure(&[held], Decimal::ZERO, dec!(2_000)).is_admitted());
    }

    #[test]
    fn test_exposure_empty_book_admits_up_to_limit() {
        assert!(check_exposure(&[], dec!(1_000_000), dec!(1_000_000)).is_admitted());
        assert!(!check_exposure(&[], dec!(1_000_001), dec!(1_000_000)).is_admitted());
    }
}
