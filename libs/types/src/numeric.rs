//! Fixed-point scaled integers for prices and amounts
//!
//! Amounts are opaque integers in the token's own scale; the engine never
//! infers decimals. Prices are quote-per-base scaled by [`PRICE_PRECISION`].
//! `rust_decimal` is only used at the human-readable boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits carried by a [`Price`]
pub const PRICE_DECIMALS: u32 = 18;

/// Scale factor applied to prices (1e18)
pub const PRICE_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Token quantity as a scaled integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Whole token units at the given scale, e.g. `from_units(5, 6)` is 5_000_000
    pub fn from_units(units: u64, decimals: u32) -> Option<Self> {
        10u128
            .checked_pow(decimals)
            .and_then(|scale| scale.checked_mul(units as u128))
            .map(Self)
    }

    /// Parse a human-readable quantity ("1.25") into the token's scale
    pub fn from_decimal_str(s: &str, decimals: u32) -> Option<Self> {
        let dec = Decimal::from_str(s).ok()?;
        Self::from_decimal(dec, decimals)
    }

    pub fn from_decimal(value: Decimal, decimals: u32) -> Option<Self> {
        scale_decimal(value, decimals).map(Self)
    }

    /// Human-readable value, `None` when it does not fit a `Decimal`
    pub fn to_decimal(&self, decimals: u32) -> Option<Decimal> {
        unscale(self.0, decimals)
    }

    pub const fn raw(&self) -> u128 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Amount {
    fn from(raw: u64) -> Self {
        Self(raw as u128)
    }
}

/// Limit price, quote-per-base scaled by [`PRICE_PRECISION`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u128);

impl Price {
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Whole quote units per base unit
    pub fn from_units(units: u64) -> Self {
        Self(units as u128 * PRICE_PRECISION)
    }

    /// Parse a human-readable price ("0.97")
    pub fn from_decimal_str(s: &str) -> Option<Self> {
        let dec = Decimal::from_str(s).ok()?;
        scale_decimal(dec, PRICE_DECIMALS).map(Self)
    }

    pub fn to_decimal(&self) -> Option<Decimal> {
        unscale(self.0, PRICE_DECIMALS)
    }

    pub const fn raw(&self) -> u128 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Some(dec) => write!(f, "{}", dec.normalize()),
            None => write!(f, "{}e-{}", self.0, PRICE_DECIMALS),
        }
    }
}

/// Quote owed for `base` at `price`: `floor(base * price / PRICE_PRECISION)`
///
/// Returns `None` if the result does not fit in 128 bits.
pub fn quote_amount(base: Amount, price: Price) -> Option<Amount> {
    mul_div_floor(base.0, price.0, PRICE_PRECISION as u64).map(Amount)
}

/// `floor(a * b / d)` with a full 256-bit intermediate product.
pub fn mul_div_floor(a: u128, b: u128, d: u64) -> Option<u128> {
    if d == 0 {
        return None;
    }
    const MASK: u128 = u64::MAX as u128;

    let (a_hi, a_lo) = (a >> 64, a & MASK);
    let (b_hi, b_lo) = (b >> 64, b & MASK);

    let lo_lo = a_lo * b_lo;
    let lo_hi = a_lo * b_hi;
    let hi_lo = a_hi * b_lo;
    let hi_hi = a_hi * b_hi;

    let mid = (lo_lo >> 64) + (lo_hi & MASK) + (hi_lo & MASK);
    // a * b < 2^256, so the upper half never overflows
    let upper = (mid >> 64) + (lo_hi >> 64) + (hi_lo >> 64) + hi_hi;

    let limbs = [upper >> 64, upper & MASK, mid & MASK, lo_lo & MASK];
    let divisor = d as u128;
    let mut quotient = [0u128; 4];
    let mut rem: u128 = 0;
    for (i, limb) in limbs.iter().enumerate() {
        let cur = (rem << 64) | limb;
        quotient[i] = cur / divisor;
        rem = cur % divisor;
    }

    if quotient[0] != 0 || quotient[1] != 0 {
        return None;
    }
    Some((quotient[2] << 64) | quotient[3])
}

fn scale_decimal(value: Decimal, decimals: u32) -> Option<u128> {
    if value.is_sign_negative() {
        return None;
    }
    // Scale the mantissa directly so large 18-digit scales stay exact
    let mantissa = u128::try_from(value.mantissa()).ok()?;
    let scale = value.scale();
    if scale > decimals {
        let divisor = 10u128.checked_pow(scale - decimals)?;
        if mantissa % divisor != 0 {
            return None;
        }
        Some(mantissa / divisor)
    } else {
        mantissa.checked_mul(10u128.checked_pow(decimals - scale)?)
    }
}

fn unscale(raw: u128, decimals: u32) -> Option<Decimal> {
    let raw = i128::try_from(raw).ok()?;
    Decimal::try_from_i128_with_scale(raw, decimals).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_price_from_units() {
        let price = Price::from_units(100);
        assert_eq!(price.raw(), 100 * PRICE_PRECISION);
        assert_eq!(price.to_string(), "100");
    }

    #[test]
    fn test_price_from_decimal_str() {
        let price = Price::from_decimal_str("0.97").unwrap();
        assert_eq!(price.raw(), 970_000_000_000_000_000);
        assert!(Price::from_decimal_str("-1").is_none());
        assert!(Price::from_decimal_str("0.0000000000000000001").is_none());
    }

    #[test]
    fn test_amount_from_decimal_str() {
        assert_eq!(Amount::from_decimal_str("1.5", 6), Some(Amount::new(1_500_000)));
        assert_eq!(
            Amount::from_decimal_str("2", 18),
            Some(Amount::new(2 * PRICE_PRECISION))
        );
        assert_eq!(Amount::from_decimal_str("1.0000001", 6), None);
        assert_eq!(Amount::from_decimal_str("abc", 6), None);
    }

    #[test]
    fn test_amount_to_decimal() {
        let amount = Amount::new(1_500_000);
        assert_eq!(amount.to_decimal(6), Some(Decimal::new(15, 1)));
    }

    #[test]
    fn test_quote_amount_simple() {
        let q = quote_amount(Amount::new(10), Price::from_units(100)).unwrap();
        assert_eq!(q, Amount::new(1000));
    }

    #[test]
    fn test_quote_amount_floors() {
        // 3 units at 0.5 -> 1.5, floored to 1
        let q = quote_amount(Amount::new(3), Price::from_decimal_str("0.5").unwrap()).unwrap();
        assert_eq!(q, Amount::new(1));
    }

    #[test]
    fn test_quote_amount_large_operands() {
        // 1e9 tokens at 18 decimals, priced at 1e6 quote per base
        let base = Amount::from_units(1_000_000_000, 18).unwrap();
        let price = Price::from_units(1_000_000);
        let q = quote_amount(base, price).unwrap();
        assert_eq!(q.raw(), 1_000_000_000u128 * 1_000_000 * PRICE_PRECISION);
    }

    #[test]
    fn test_quote_amount_overflow() {
        assert_eq!(quote_amount(Amount::new(u128::MAX), Price::new(u128::MAX)), None);
    }

    #[test]
    fn test_mul_div_zero_divisor() {
        assert_eq!(mul_div_floor(1, 1, 0), None);
    }

    proptest! {
        #[test]
        fn prop_mul_div_matches_u128_when_no_overflow(
            a in 0u128..(1u128 << 63),
            b in 0u128..(1u128 << 63),
            d in 1u64..u64::MAX,
        ) {
            prop_assert_eq!(mul_div_floor(a, b, d), Some(a * b / d as u128));
        }
    }
}
