use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const RUPIAH_CURRENCY_CODE: &str = "IDR";

//--------------------------------------       Rupiah        ---------------------------------------------------------
/// A whole-rupiah amount. The rupiah has no minor unit in circulation, so amounts are always integral.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Rupiah(i64);

op!(binary Rupiah, Add, add);
op!(binary Rupiah, Sub, sub);
op!(inplace Rupiah, SubAssign, sub_assign);
op!(unary Rupiah, Neg, neg);

impl Mul<i64> for Rupiah {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Rupiah {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented in rupiah: {0}")]
pub struct RupiahConversionError(String);

impl From<i64> for Rupiah {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Rupiah {
    type Error = RupiahConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(RupiahConversionError(format!("Value {value} is too large to convert to Rupiah")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

/// Parses gateway-style amounts such as `"1000000"` or `"1000000.00"`. A non-zero fractional part is rejected.
impl FromStr for Rupiah {
    type Err = RupiahConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (whole, frac) = match s.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (s, ""),
        };
        if !frac.chars().all(|c| c == '0') {
            return Err(RupiahConversionError(format!("{s} has a fractional rupiah component")));
        }
        whole.parse::<i64>().map(Self).map_err(|e| RupiahConversionError(format!("{s} is not a valid amount. {e}")))
    }
}

impl Display for Rupiah {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}Rp{grouped}")
    }
}

impl Rupiah {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    /// Adds `rhs`, clamping at the bounds of `i64` instead of overflowing.
    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_mul(self, rhs: i64) -> Self {
        Self(self.0.saturating_mul(rhs))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Rupiah::from(0).to_string(), "Rp0");
        assert_eq!(Rupiah::from(950).to_string(), "Rp950");
        assert_eq!(Rupiah::from(1_000_000).to_string(), "Rp1.000.000");
        assert_eq!(Rupiah::from(-12_500).to_string(), "-Rp12.500");
    }

    #[test]
    fn parse_gateway_amounts() {
        assert_eq!("400000.00".parse::<Rupiah>(), Ok(Rupiah::from(400_000)));
        assert_eq!("1000000".parse::<Rupiah>(), Ok(Rupiah::from(1_000_000)));
        assert!("10.50".parse::<Rupiah>().is_err());
        assert!("abc".parse::<Rupiah>().is_err());
    }

    #[test]
    fn arithmetic() {
        let mut total = Rupiah::from(250_000) * 4;
        assert_eq!(total, Rupiah::from(1_000_000));
        total -= Rupiah::from(100_000);
        assert_eq!(total - Rupiah::from(900_000), Rupiah::default());
        let sum: Rupiah = [Rupiah::from(1), Rupiah::from(2)].into_iter().sum();
        assert_eq!(sum, Rupiah::from(3));
        assert_eq!(serde_json::to_string(&sum).unwrap(), "3");
    }

    #[test]
    fn overflow_is_detected_or_clamped() {
        let max = Rupiah::from(i64::MAX);
        assert_eq!(max.checked_add(Rupiah::from(1)), None);
        assert_eq!(Rupiah::from(400_000).checked_add(Rupiah::from(600_000)), Some(Rupiah::from(1_000_000)));
        assert_eq!(max.checked_mul(2), None);
        assert_eq!(Rupiah::from(250_000).checked_mul(4), Some(Rupiah::from(1_000_000)));
        assert_eq!(Rupiah::from(400_000).saturating_add(max), max);
        assert_eq!(max.saturating_mul(3), max);
    }
}
