//! Mathematical Utilities for FundMe
//!
//! Checked price conversion between the native currency and USD.

use crate::constants::{native, price_feed::MAX_DECIMALS};
use crate::errors::{FundMeError, FundMeResult};
use crate::price_feed::{latest_answer, AggregatorV3};

/// 10^decimals as u128
pub fn pow10(decimals: u8) -> FundMeResult<u128> {
    if decimals > MAX_DECIMALS {
        return Err(FundMeError::InvalidDecimals { decimals });
    }
    10u128
        .checked_pow(decimals as u32)
        .ok_or(FundMeError::Overflow)
}

/// Rescale a fixed-point value from one precision to another
///
/// Scaling down truncates.
pub fn normalize_decimals(value: u128, from_decimals: u8, to_decimals: u8) -> FundMeResult<u128> {
    if from_decimals == to_decimals {
        return Ok(value);
    }

    if from_decimals > to_decimals {
        let divisor = pow10(from_decimals - to_decimals)?;
        Ok(value / divisor)
    } else {
        let multiplier = pow10(to_decimals - from_decimals)?;
        value.checked_mul(multiplier).ok_or(FundMeError::Overflow)
    }
}

/// Latest feed price normalized to the native currency's 18 decimals
///
/// $2,000 at 8 decimals becomes 2_000e18.
pub fn get_price<F: AggregatorV3 + ?Sized>(feed: &F) -> FundMeResult<u128> {
    let (answer, decimals) = latest_answer(feed)?;
    normalize_decimals(answer as u128, decimals, native::DECIMALS)
}

/// USD value (18 decimals) of `amount` native base units at `answer`
///
/// usd = amount * answer / 10^decimals
///
/// Split as (q * D + r) * answer / D = q * answer + r * answer / D so that
/// only a result that itself overflows u128 is rejected. With D at most
/// 10^18 the remainder term cannot overflow.
pub fn conversion_rate(amount: u128, answer: i64, decimals: u8) -> FundMeResult<u128> {
    if answer <= 0 {
        return Err(FundMeError::InvalidPrice { answer });
    }
    let price = answer as u128;
    let scale = pow10(decimals)?;

    let whole = (amount / scale)
        .checked_mul(price)
        .ok_or(FundMeError::Overflow)?;
    let fraction = (amount % scale)
        .checked_mul(price)
        .ok_or(FundMeError::Overflow)?
        / scale;

    whole.checked_add(fraction).ok_or(FundMeError::Overflow)
}

/// USD value (18 decimals) of `amount` at the feed's latest answer
pub fn get_conversion_rate<F: AggregatorV3 + ?Sized>(amount: u128, feed: &F) -> FundMeResult<u128> {
    let (answer, decimals) = latest_answer(feed)?;
    conversion_rate(amount, answer, decimals)
}
