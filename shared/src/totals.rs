//! Order total calculator
//!
//! Money is fixed-point with two decimal places. Every rounding in the system
//! goes through [`round_money`], which rounds half-up (away from zero), so a
//! line of `3 x 10.005` is always `30.02` wherever it is computed.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal places kept for every monetary value
pub const MONEY_SCALE: u32 = 2;

/// Largest amount a `NUMERIC(12, 2)` column holds: 9,999,999,999.99
pub fn max_money() -> Decimal {
    Decimal::new(999_999_999_999, MONEY_SCALE)
}

/// A computed amount fell outside what the ledger can store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("amount exceeds the largest storable value")]
pub struct MoneyOverflow;

fn within_range(value: Decimal) -> Result<Decimal, MoneyOverflow> {
    if value.abs() > max_money() {
        return Err(MoneyOverflow);
    }
    Ok(value)
}

/// Round a monetary value half-up to two decimal places.
///
/// The result always carries a scale of exactly two, so `20` becomes `20.00`.
/// Serialized snapshots therefore compare equal regardless of where the
/// value came from.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Subtotal of a single line.
///
/// Returns `Ok(None)` when either input is absent: the line is "not yet
/// priced", which is not the same thing as a zero subtotal.
pub fn line_subtotal(
    quantity: Option<i32>,
    unit_price: Option<Decimal>,
) -> Result<Option<Decimal>, MoneyOverflow> {
    let (Some(quantity), Some(unit_price)) = (quantity, unit_price) else {
        return Ok(None);
    };
    let exact = Decimal::from(quantity)
        .checked_mul(unit_price)
        .ok_or(MoneyOverflow)?;
    within_range(round_money(exact)).map(Some)
}

/// Order level monetary fields derived from its lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Sum the line subtotals (unpriced lines count as zero) and derive the
    /// total as `subtotal - discount + tax`.
    pub fn compute<I>(
        line_subtotals: I,
        discount: Decimal,
        tax: Decimal,
    ) -> Result<Self, MoneyOverflow>
    where
        I: IntoIterator<Item = Option<Decimal>>,
    {
        let subtotal = line_subtotals
            .into_iter()
            .try_fold(Decimal::ZERO, |sum, s| {
                sum.checked_add(s.unwrap_or(Decimal::ZERO))
            })
            .ok_or(MoneyOverflow)?;

        Self::from_subtotal(subtotal, discount, tax)
    }

    /// Derive the totals from an already summed subtotal
    pub fn from_subtotal(
        subtotal: Decimal,
        discount: Decimal,
        tax: Decimal,
    ) -> Result<Self, MoneyOverflow> {
        let subtotal = within_range(round_money(subtotal))?;
        let discount = within_range(round_money(discount))?;
        let tax = within_range(round_money(tax))?;

        let total = subtotal
            .checked_sub(discount)
            .and_then(|t| t.checked_add(tax))
            .ok_or(MoneyOverflow)?;

        Ok(Self {
            subtotal,
            discount,
            tax,
            total: within_range(round_money(total))?,
        })
    }

    /// Check the `total == subtotal - discount + tax` relation
    pub fn is_consistent(&self) -> bool {
        self.total == self.subtotal - self.discount + self.tax
    }
}
