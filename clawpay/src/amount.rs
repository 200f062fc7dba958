//! Atomic-unit currency arithmetic and fee math.
//!
//! All payment comparisons and revenue-share computations happen in
//! integer atomic units (1 USDC = 1,000,000 units at 6 decimals). Floating
//! point never enters the pipeline; conversion to a human-readable decimal
//! string happens only at the display boundary, and always by truncation
//! so the displayed figure is never more than is actually transferable.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

/// USDC's minor-unit precision.
pub const USDC_DECIMALS: u32 = 6;

/// Atomic units per whole USDC.
pub const ATOMIC_PER_USDC: u64 = 1_000_000;

/// One hundred percent, in basis points.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Errors converting a display amount into atomic units.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// The input was not a decimal number.
    #[error("invalid amount: {0:?}")]
    Invalid(String),
    /// Negative amounts have no on-chain representation.
    #[error("negative amounts are not representable")]
    Negative,
    /// The amount exceeds the representable u64 range of atomic units.
    #[error("amount exceeds the representable range")]
    Overflow,
}

/// Converts a human-readable USDC amount (e.g. `"0.25"`) into atomic units.
///
/// Digits beyond the sixth decimal place round to the nearest atomic unit
/// (`0.0000005` becomes `1`, `0.0000001` becomes `0`), so the conversion
/// is round-trip safe for every representable 6-decimal amount.
///
/// # Errors
///
/// Returns [`AmountError`] for non-decimal input, negative amounts, or
/// amounts beyond the u64 atomic range.
pub fn display_to_atomic(display: &str) -> Result<u64, AmountError> {
    let value =
        Decimal::from_str(display).map_err(|_| AmountError::Invalid(display.to_owned()))?;
    if value.is_sign_negative() {
        return Err(AmountError::Negative);
    }
    let scaled = value
        .checked_mul(Decimal::from(ATOMIC_PER_USDC))
        .ok_or(AmountError::Overflow)?;
    let rounded = scaled.round_dp_with_strategy(
        0,
        rust_decimal::RoundingStrategy::MidpointAwayFromZero,
    );
    rounded.to_u64().ok_or(AmountError::Overflow)
}

/// Formats atomic units as a human-readable USDC amount.
///
/// Fixed 6-decimal precision with trailing zeros trimmed; the fraction is
/// produced by integer division and remainder, so the result is exact and
/// never rounded up.
#[must_use]
pub fn atomic_to_display(raw: u64) -> String {
    let whole = raw / ATOMIC_PER_USDC;
    let frac = raw % ATOMIC_PER_USDC;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:06}");
    let frac = frac.trim_end_matches('0');
    format!("{whole}.{frac}")
}

/// Computes the platform's fee share of a payment, rounded down.
///
/// `fee_bps` is the platform share in basis points (1000 = 10%). The
/// multiply is widened to u128 so it cannot overflow for any u64 amount.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // quotient is <= amount_raw, which fits u64
pub const fn platform_fee(amount_raw: u64, fee_bps: u16) -> u64 {
    (amount_raw as u128 * fee_bps as u128 / BPS_DENOMINATOR as u128) as u64
}

/// The two-way settlement breakdown of a verified payment.
///
/// Invariant: `platform_fee_raw + author_amount_raw == amount_raw` exactly
/// — the author side is computed by subtraction, so flooring the fee never
/// leaks an atomic unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementAmounts {
    /// The platform's share in atomic units.
    pub platform_fee_raw: u64,
    /// The author's share in atomic units.
    pub author_amount_raw: u64,
}

impl SettlementAmounts {
    /// Splits a payment amount between platform and author.
    #[must_use]
    pub const fn split(amount_raw: u64, fee_bps: u16) -> Self {
        let platform_fee_raw = platform_fee(amount_raw, fee_bps);
        Self {
            platform_fee_raw,
            author_amount_raw: amount_raw - platform_fee_raw,
        }
    }
}
