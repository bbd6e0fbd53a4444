//! # Exact Positions
//!
//! Span lengths and load positions are kept as exact rationals while the
//! model is being built, so that a load placed at `10.1` on a beam whose
//! spans are `4.3 + 5.8` lands exactly on the node instead of creating a
//! sliver segment a few ulps long. Lengths are only converted to `f64` once
//! all segment splitting is finished.
//!
//! ## Text Forms
//!
//! - Integers: `"12"`
//! - Decimals: `"12.375"`, `"-0.5"`
//! - Fractions: `"37/3"`
//!
//! JSON numbers are accepted too; they are read through their shortest
//! decimal representation, so `10.1` in a job file is exactly `101/10`.
//!
//! ## Example
//!
//! ```rust
//! use beam_core::exact::Exact;
//!
//! let a: Exact = "4.3".parse().unwrap();
//! let b: Exact = "5.8".parse().unwrap();
//! let c: Exact = "10.1".parse().unwrap();
//! assert_eq!(a + b, c);
//! assert_eq!(c.to_f64(), 10.1);
//! ```

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

use num::{BigInt, BigRational, Integer, One, Signed, ToPrimitive, Zero};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{CalcError, CalcResult};

/// Longest terminating decimal expansion printed as a decimal; longer
/// values print as `n/d`.
const MAX_DECIMAL_PLACES: usize = 30;

/// An exact rational coordinate or length.
///
/// Backed by arbitrary-precision integers, so sums and interpolation
/// fractions of positions with large coprime denominators stay exact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Exact(BigRational);

impl Exact {
    /// Exact zero
    pub fn zero() -> Self {
        Exact(BigRational::zero())
    }

    /// Whole number
    pub fn from_integer(value: i64) -> Self {
        Exact(BigRational::from_integer(BigInt::from(value)))
    }

    /// Build `numer / denom`; `None` when the denominator is zero
    pub fn new(numer: i64, denom: i64) -> Option<Self> {
        if denom == 0 {
            None
        } else {
            Some(Exact(BigRational::new(BigInt::from(numer), BigInt::from(denom))))
        }
    }

    /// Exact value of a float through its shortest round-trip decimal form.
    ///
    /// `Exact::from_decimal_f64(0.1)` is `1/10`, not the binary value of the
    /// float.
    pub fn from_decimal_f64(value: f64) -> CalcResult<Self> {
        if !value.is_finite() {
            return Err(CalcError::invalid_input(
                "position",
                value.to_string(),
                "Value must be finite",
            ));
        }
        format!("{}", value).parse()
    }

    /// Convert to floating point (only after all exact work is done)
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn numer(&self) -> &BigInt {
        self.0.numer()
    }

    pub fn denom(&self) -> &BigInt {
        self.0.denom()
    }

    /// Fraction of the way `self` lies between `start` and `end`.
    ///
    /// Returns `None` for a degenerate interval.
    pub fn fraction_between(&self, start: &Exact, end: &Exact) -> Option<Exact> {
        let width = end - start;
        if width.is_zero() {
            None
        } else {
            Some(&(self - start) / &width)
        }
    }

    /// Decimal digits needed to print this value exactly, if it has a
    /// short terminating decimal expansion.
    fn decimal_places(&self) -> Option<usize> {
        let ten = BigInt::from(10);
        let mut scale = BigInt::one();
        for places in 0..=MAX_DECIMAL_PLACES {
            if scale.is_multiple_of(self.denom()) {
                return Some(places);
            }
            scale *= &ten;
        }
        None
    }
}

impl Default for Exact {
    fn default() -> Self {
        Exact::zero()
    }
}

impl From<i64> for Exact {
    fn from(value: i64) -> Self {
        Exact::from_integer(value)
    }
}

impl From<i32> for Exact {
    fn from(value: i32) -> Self {
        Exact::from_integer(i64::from(value))
    }
}

impl From<BigRational> for Exact {
    fn from(value: BigRational) -> Self {
        Exact(value)
    }
}

macro_rules! exact_binop {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait for Exact {
            type Output = Exact;
            fn $method(self, rhs: Exact) -> Exact {
                Exact(self.0 $op rhs.0)
            }
        }

        impl<'a> $trait<&'a Exact> for &'a Exact {
            type Output = Exact;
            fn $method(self, rhs: &'a Exact) -> Exact {
                Exact(&self.0 $op &rhs.0)
            }
        }
    };
}

exact_binop!(Add, add, +);
exact_binop!(Sub, sub, -);
exact_binop!(Mul, mul, *);
exact_binop!(Div, div, /);

impl Neg for Exact {
    type Output = Exact;
    fn neg(self) -> Exact {
        Exact(-self.0)
    }
}

impl<'a> std::iter::Sum<&'a Exact> for Exact {
    fn sum<I: Iterator<Item = &'a Exact>>(iter: I) -> Exact {
        iter.fold(Exact::zero(), |acc, x| &acc + x)
    }
}

impl std::iter::Sum for Exact {
    fn sum<I: Iterator<Item = Exact>>(iter: I) -> Exact {
        iter.fold(Exact::zero(), |acc, x| acc + x)
    }
}

// ============================================================================
// Parsing and Display
// ============================================================================

fn parse_error(text: &str, reason: &str) -> CalcError {
    CalcError::invalid_input("exact", text, reason)
}

fn parse_decimal(text: &str) -> CalcResult<Exact> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (whole, frac) = match body.split_once('.') {
        Some((w, f)) => (w, f),
        None => (body, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(parse_error(text, "Empty number"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(parse_error(text, "Expected a decimal number or a fraction n/d"));
    }

    let digits = format!("{}{}", whole, frac);
    let numer: BigInt = digits
        .parse()
        .map_err(|_| parse_error(text, "Expected a decimal number or a fraction n/d"))?;
    let denom = num::pow(BigInt::from(10), frac.len());
    let value = BigRational::new(numer, denom);
    Ok(Exact(if negative { -value } else { value }))
}

impl FromStr for Exact {
    type Err = CalcError;

    fn from_str(s: &str) -> CalcResult<Exact> {
        let text = s.trim();
        if let Some((n, d)) = text.split_once('/') {
            let numer = parse_decimal(n.trim())?;
            let denom = parse_decimal(d.trim())?;
            if denom.is_zero() {
                return Err(parse_error(text, "Zero denominator"));
            }
            return Ok(numer / denom);
        }
        parse_decimal(text)
    }
}

impl fmt::Display for Exact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom().is_one() {
            return write!(f, "{}", self.numer());
        }
        match self.decimal_places() {
            Some(places) => {
                let scale = num::pow(BigInt::from(10), places);
                let scaled = (&self.0 * BigRational::from_integer(scale.clone())).to_integer();
                let sign = if scaled.is_negative() { "-" } else { "" };
                let (whole, frac) = scaled.abs().div_rem(&scale);
                write!(f, "{}{}.{:0>width$}", sign, whole, frac.to_string(), width = places)
            }
            None => write!(f, "{}/{}", self.numer(), self.denom()),
        }
    }
}

// ============================================================================
// Serde
// ============================================================================

impl Serialize for Exact {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct ExactVisitor;

impl<'de> Visitor<'de> for ExactVisitor {
    type Value = Exact;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number, a decimal string, or a fraction string like \"37/3\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Exact, E> {
        v.parse().map_err(|e: CalcError| E::custom(e.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Exact, E> {
        Ok(Exact::from_integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Exact, E> {
        Ok(Exact(BigRational::from_integer(BigInt::from(v))))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Exact, E> {
        Exact::from_decimal_f64(v).map_err(|e| E::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for Exact {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Exact, D::Error> {
        deserializer.deserialize_any(ExactVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ex(s: &str) -> Exact {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(ex("12"), Exact::from_integer(12));
        assert_eq!(ex("12.375"), Exact::new(99, 8).unwrap());
        assert_eq!(ex("-0.5"), Exact::new(-1, 2).unwrap());
        assert_eq!(ex("37/3"), Exact::new(37, 3).unwrap());
        assert_eq!(ex(".25"), Exact::new(1, 4).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("abc".parse::<Exact>().is_err());
        assert!("1/0".parse::<Exact>().is_err());
        assert!("".parse::<Exact>().is_err());
        assert!("1.2.3".parse::<Exact>().is_err());
    }

    #[test]
    fn test_decimal_sum_is_exact() {
        // 0.1 + 0.2 == 0.3 holds exactly, unlike f64
        assert_eq!(ex("0.1") + ex("0.2"), ex("0.3"));
        assert_eq!(ex("4.3") + ex("5.8"), ex("10.1"));
    }

    #[test]
    fn test_from_decimal_f64() {
        assert_eq!(Exact::from_decimal_f64(0.1).unwrap(), Exact::new(1, 10).unwrap());
        assert!(Exact::from_decimal_f64(f64::NAN).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ex("12.375").to_string(), "12.375");
        assert_eq!(ex("-0.05").to_string(), "-0.05");
        assert_eq!(ex("37/3").to_string(), "37/3");
        assert_eq!(ex("8").to_string(), "8");
    }

    #[test]
    fn test_fraction_between() {
        let f = ex("3").fraction_between(&ex("2"), &ex("6")).unwrap();
        assert_eq!(f, ex("1/4"));
        assert!(ex("1").fraction_between(&ex("2"), &ex("2")).is_none());
    }

    #[test]
    fn test_serde_accepts_numbers_and_strings() {
        let values: Vec<Exact> = serde_json::from_str(r#"[10.1, "37/3", 4]"#).unwrap();
        assert_eq!(values[0], ex("10.1"));
        assert_eq!(values[1], ex("37/3"));
        assert_eq!(values[2], ex("4"));

        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"["10.1","37/3","4"]"#);
    }

    #[test]
    fn test_large_coprime_denominators_stay_exact() {
        let a = ex("3/999999937");
        let b = ex("7/999999929");
        let c = ex("5/999999893");
        let t = c.fraction_between(&a, &b).unwrap();
        assert_eq!(&(&a + &(&t * &(&b - &a))) - &c, Exact::zero());
        assert!(t.to_f64().is_finite());

        let sum: Exact = [a, b, c].iter().sum();
        assert!(sum.is_positive());
    }

    #[test]
    fn test_long_decimals_parse() {
        let x = ex("0.1234567890123456789");
        assert_eq!(x.to_string(), "0.1234567890123456789");
        assert_eq!(ex("-2.50").to_string(), "-2.5");
    }
}
