//! Total conversions from raw contract values.

use alloy::primitives::U256;
use fuse_core::mantissa_to_decimal;
use rust_decimal::Decimal;
use tracing::warn;

/// `raw / 10^scale` truncated to `dp` digits, or zero if it does not fit.
pub(crate) fn scaled(raw: U256, scale: u32, dp: u32) -> Decimal {
    mantissa_to_decimal(raw, scale, dp).unwrap_or_else(|e| {
        warn!(%raw, scale, error = %e, "Mantissa out of range, using zero");
        Decimal::ZERO
    })
}

/// Saturating `U256` to `u64`.
pub(crate) fn count(raw: U256) -> u64 {
    raw.saturating_to()
}

/// `a * b` truncated to `dp`, or zero on overflow.
pub(crate) fn product(factors: &[Decimal], dp: u32) -> Decimal {
    factors
        .iter()
        .try_fold(Decimal::ONE, |acc, f| acc.checked_mul(*f))
        .map(|v| fuse_core::truncate(v, dp))
        .unwrap_or_else(|| {
            warn!(?factors, "Product overflowed, using zero");
            Decimal::ZERO
        })
}
