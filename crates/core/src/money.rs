//! Money stored as integer minor units (cents).
//!
//! Every monetary comparison in the engine goes through this type, so sums that are
//! "equal to the cent" compare equal without floating-point drift.
//!
//! Operator arithmetic saturates at the `i64` bounds. Code that must detect overflow
//! (split totals) uses [`Money::checked_add`] and [`Money::checked_sum`].

use core::iter::Sum;
use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Number of fractional digits carried by the currency.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Monetary amount in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest amount accepted for a single entry or split (10 trillion units).
    pub const MAX_AMOUNT: Money = Money(1_000_000_000_000_000);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(&self) -> i64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn abs(&self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Whether the magnitude is within [`Money::MAX_AMOUNT`].
    pub const fn is_within_limit(&self) -> bool {
        self.0.unsigned_abs() <= Self::MAX_AMOUNT.0 as u64
    }

    pub const fn checked_add(self, rhs: Money) -> Option<Money> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Sum that reports overflow instead of saturating.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(iter: I) -> Option<Money> {
        iter.into_iter().try_fold(Money::ZERO, Money::checked_add)
    }

    /// Convert a decimal amount (e.g. `1000.50`) into cents.
    ///
    /// Rejects amounts with more precision than the currency's minor unit and amounts
    /// whose magnitude exceeds [`Money::MAX_AMOUNT`].
    pub fn from_decimal(value: Decimal) -> DomainResult<Self> {
        let normalized = value.normalize();
        if normalized.scale() > MINOR_UNIT_SCALE {
            return Err(DomainError::validation(format!(
                "amount {value} has more than {MINOR_UNIT_SCALE} decimal places"
            )));
        }

        let money = normalized
            .checked_mul(Decimal::from(100))
            .and_then(|c| c.trunc().to_i64())
            .map(Self)
            .filter(Money::is_within_limit)
            .ok_or_else(|| DomainError::validation(format!("amount {value} is out of range")))?;

        Ok(money)
    }

    /// Decimal representation with exactly two fractional digits.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, MINOR_UNIT_SCALE)
    }

    /// Ratio `self / denominator` rounded to `dp` decimal places; zero when the
    /// denominator is zero.
    pub fn ratio(&self, denominator: Money, dp: u32) -> Decimal {
        if denominator.is_zero() {
            return Decimal::ZERO;
        }
        (Decimal::from(self.0) / Decimal::from(denominator.0)).round_dp(dp)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.to_decimal(), f)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;
    use proptest::prelude::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn decimal_conversion_is_exact_to_the_cent() {
        assert_eq!(Money::from_decimal(dec("1000.00")).unwrap(), Money::from_cents(100_000));
        assert_eq!(Money::from_decimal(dec("999.99")).unwrap(), Money::from_cents(99_999));
        assert_eq!(Money::from_decimal(dec("0.1")).unwrap(), Money::from_cents(10));
        assert_eq!(Money::from_decimal(dec("12.300")).unwrap(), Money::from_cents(1_230));
    }

    #[test]
    fn sub_cent_precision_is_rejected() {
        let err = Money::from_decimal(dec("10.005")).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn ratio_is_zero_for_zero_denominator() {
        assert_eq!(Money::from_cents(500).ratio(Money::ZERO, 4), Decimal::ZERO);
        assert_eq!(Money::from_cents(250).ratio(Money::from_cents(1000), 4), dec("0.25"));
    }

    #[test]
    fn amounts_beyond_the_limit_are_rejected() {
        assert_eq!(Money::from_decimal(dec("10000000000000.00")).unwrap(), Money::MAX_AMOUNT);
        assert!(Money::from_decimal(dec("10000000000000.01")).is_err());
        assert!(Money::from_decimal(dec("-92233720368547758.07")).is_err());
    }

    #[test]
    fn operators_saturate_and_checked_sum_reports_overflow() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!(max + Money::from_cents(1), max);
        assert_eq!(-Money::from_cents(i64::MIN), max);
        assert_eq!(Money::checked_sum([max, max, Money::from_cents(102)]), None);
        assert_eq!(
            Money::checked_sum([Money::from_cents(60), Money::from_cents(40)]),
            Some(Money::from_cents(100))
        );
    }

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(Money::from_cents(-1_005).to_string(), "-10.05");
    }

    proptest! {
        #[test]
        fn cents_survive_decimal_conversion(cents in -1_000_000_000_000i64..1_000_000_000_000i64) {
            let money = Money::from_cents(cents);
            prop_assert_eq!(Money::from_decimal(money.to_decimal()).unwrap(), money);
        }
    }
}
