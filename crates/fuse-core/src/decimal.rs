//! Fixed-point conversion helpers.
//!
//! On-chain values are integer mantissas scaled by a known power of ten.
//! These helpers turn them into `rust_decimal::Decimal` values without
//! going through floating point, truncating toward zero wherever precision
//! has to be dropped (the contracts truncate too).

use crate::error::{CoreError, Result};
use alloy::primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};

/// Width of the protocol's `Exp` mantissa (1e18 = 1.0).
pub const MANTISSA_DECIMALS: u32 = 18;

/// Decimal count of every lending-market token.
pub const MARKET_TOKEN_DECIMALS: u32 = 8;

/// Blocks mined per day at a 15 second block time.
pub const BLOCKS_PER_DAY: u32 = 5_760;

pub const DAYS_PER_YEAR: u32 = 365;

/// `BLOCKS_PER_DAY * DAYS_PER_YEAR`.
pub const BLOCKS_PER_YEAR: u32 = BLOCKS_PER_DAY * DAYS_PER_YEAR;

/// Largest scale `Decimal` can carry.
const MAX_SCALE: u32 = 28;

/// Largest mantissa `Decimal` can carry (2^96 - 1).
const MAX_MANTISSA: u128 = 79_228_162_514_264_337_593_543_950_335;

/// Returns `10^n` as an exact decimal.
///
/// Rejects negative exponents and exponents beyond what `Decimal` can hold.
pub fn scale_factor(n: i32) -> Result<Decimal> {
    if n < 0 {
        return Err(CoreError::NegativeScale(n));
    }
    if n as u32 > MAX_SCALE {
        return Err(CoreError::ScaleOutOfRange(n));
    }
    Ok(Decimal::from_i128_with_scale(10i128.pow(n as u32), 0))
}

/// Interpret `raw` as a fixed-point value with `scale` fractional digits.
///
/// When the result does not fit in a `Decimal` (more than 28 fractional
/// digits, or a mantissa wider than 96 bits) trailing digits are dropped,
/// never rounded. Fails only when the integer part itself is too large.
pub fn from_mantissa(raw: U256, scale: u32) -> Result<Decimal> {
    let ten = U256::from(10u8);
    let limit = U256::from(MAX_MANTISSA);
    let mut raw = raw;
    let mut scale = scale;

    while scale > MAX_SCALE || raw > limit {
        if scale == 0 {
            return Err(CoreError::Overflow(format!("mantissa {raw} exceeds 96 bits")));
        }
        raw /= ten;
        scale -= 1;
    }

    let mantissa = u128::try_from(raw)
        .map_err(|_| CoreError::Overflow(format!("mantissa {raw} exceeds 128 bits")))?;
    Decimal::try_from_i128_with_scale(mantissa as i128, scale)
        .map_err(|e| CoreError::Overflow(e.to_string()))
}

/// Truncate (round toward zero) to `dp` fractional digits.
#[inline]
pub fn truncate(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::ToZero)
}

/// `from_mantissa` followed by `truncate`.
pub fn mantissa_to_decimal(raw: U256, scale: u32, dp: u32) -> Result<Decimal> {
    Ok(truncate(from_mantissa(raw, scale)?, dp))
}

/// Per-block rate to a per-year rate (simple multiplication, no compounding).
pub fn annualize(rate_per_block: Decimal) -> Result<Decimal> {
    ensure_non_negative(rate_per_block)?;
    rate_per_block
        .checked_mul(Decimal::from(BLOCKS_PER_YEAR))
        .ok_or_else(|| CoreError::Overflow(format!("annualize {rate_per_block}")))
}

/// Per-block rate to APR, in percent.
pub fn rate_to_apr(rate_per_block: Decimal) -> Result<Decimal> {
    annualize(rate_per_block)?
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| CoreError::Overflow(format!("apr {rate_per_block}")))
}

/// Per-block rate to APY, in percent, compounding daily over `days`.
///
/// `((1 + rate * BLOCKS_PER_DAY)^days - 1) * 100`
pub fn rate_to_apy(rate_per_block: Decimal, days: u32) -> Result<Decimal> {
    ensure_non_negative(rate_per_block)?;
    let overflow = || CoreError::Overflow(format!("apy {rate_per_block} over {days} days"));

    let daily = rate_per_block
        .checked_mul(Decimal::from(BLOCKS_PER_DAY))
        .ok_or_else(overflow)?;
    let growth = checked_powu(Decimal::ONE + daily, days).ok_or_else(overflow)?;

    (growth - Decimal::ONE)
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(overflow)
}

fn ensure_non_negative(rate: Decimal) -> Result<()> {
    if rate.is_sign_negative() && !rate.is_zero() {
        return Err(CoreError::NegativeRate(rate));
    }
    Ok(())
}

/// Exponentiation by squaring with overflow detection.
fn checked_powu(base: Decimal, exp: u32) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    let mut base = base;
    let mut exp = exp;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.checked_mul(base)?;
        }
        exp >>= 1;
        if exp > 0 {
            base = base.checked_mul(base)?;
        }
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_scale_factor() {
        assert_eq!(scale_factor(0).unwrap(), dec!(1));
        assert_eq!(scale_factor(8).unwrap(), dec!(100000000));
        assert_eq!(scale_factor(28).unwrap().to_string().len(), 29);
    }

    #[test]
    fn test_scale_factor_rejects_negative_and_oversized() {
        assert_eq!(scale_factor(-1), Err(CoreError::NegativeScale(-1)));
        assert_eq!(scale_factor(29), Err(CoreError::ScaleOutOfRange(29)));
    }

    #[test]
    fn test_from_mantissa_exact() {
        let raw = U256::from(123_456_789_012_345_678u64);
        let value = from_mantissa(raw, 18).unwrap();
        assert_eq!(value, dec!(0.123456789012345678));
        assert_eq!(value.scale(), 18);
    }

    #[test]
    fn test_truncation_never_rounds_up() {
        let raw = U256::from(1_999u64);
        assert_eq!(mantissa_to_decimal(raw, 3, 2).unwrap(), dec!(1.99));
        assert_eq!(truncate(dec!(0.123456789), 4), dec!(0.1234));
    }

    #[test]
    fn test_from_mantissa_drops_digits_beyond_max_scale() {
        // 0.5 expressed with 30 fractional digits
        let raw = U256::from(5u8) * U256::from(10u8).pow(U256::from(29u8));
        assert_eq!(from_mantissa(raw, 30).unwrap(), dec!(0.5));

        // 1.23456 with 32 fractional digits, trailing digits truncated
        let raw = U256::from(123_456u64) * U256::from(10u8).pow(U256::from(27u8)) + U256::from(9u8);
        assert_eq!(from_mantissa(raw, 32).unwrap(), dec!(1.23456));
    }

    #[test]
    fn test_from_mantissa_overflow() {
        let raw = U256::MAX;
        assert!(matches!(from_mantissa(raw, 0), Err(CoreError::Overflow(_))));
        // Large value with enough scale to shed digits still converts.
        assert!(from_mantissa(U256::from(10u8).pow(U256::from(40u8)), 18).is_ok());
    }

    #[test]
    fn test_annualize() {
        assert_eq!(annualize(dec!(0.000000001)).unwrap(), dec!(0.0021024));
    }

    #[test]
    fn test_apr_in_percent() {
        assert_eq!(rate_to_apr(dec!(0.000000001)).unwrap(), dec!(0.21024));
        assert_eq!(rate_to_apr(Decimal::ZERO).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_apy_compounds() {
        let rate = dec!(0.000000001);
        let apr = rate_to_apr(rate).unwrap();
        let apy = rate_to_apy(rate, DAYS_PER_YEAR).unwrap();
        assert!(apy > apr);
        // One period of compounding equals simple interest for that period.
        assert_eq!(rate_to_apy(rate, 1).unwrap(), dec!(0.000576));
        assert_eq!(rate_to_apy(rate, 0).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_negative_rate_rejected() {
        assert!(matches!(rate_to_apr(dec!(-0.1)), Err(CoreError::NegativeRate(_))));
        assert!(matches!(rate_to_apy(dec!(-0.1), 365), Err(CoreError::NegativeRate(_))));
    }
}
