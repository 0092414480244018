// gdv.score -- differential decoding of musical commands onto a rational timeline
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Exact rational numbers, used for every time and duration on the score level.
//!
//! Tuplets and polyrhythms subdivide time arbitrarily, so nothing in here
//! ever goes through a float.

use std::convert::TryFrom;
use std::error::Error;
use std::fmt;
use std::{cmp::Ordering, ops};

/// Underlying integral type for the rational numbers.
type Int = i64;

/// Intermediate results are computed with twice the width, so that the
/// products of two `Int`s never overflow before normalization.
type Wide = i128;

/// A rational number, always fully normalized.
///
/// Because of the normalization, the derived `Eq` and `Hash` agree with
/// numeric equality.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Rational {
    /// The numerator of the fraction, carrying the sign.
    num: Int,
    /// The denominator of the fraction, always positive.
    denom: Int,
}

impl Rational {
    pub const ZERO: Rational = Rational { num: 0, denom: 1 };
    pub const ONE: Rational = Rational { num: 1, denom: 1 };

    // ==================== Constructors ====================

    /// Create a new rational from a potentially unnormalized fraction.
    ///
    /// # Panic
    ///
    /// Panics if the denominator is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use gdv_core::rational::*;
    ///
    /// assert_eq!(Rational::new(10, 5), Rational::int(2));
    /// assert_eq!(Rational::new(-10, -5), Rational::new(6, 3));
    /// assert_eq!(Rational::new(-6, 8), Rational::new(3, -4));
    /// assert_eq!(Rational::new(0, -7), Rational::ZERO);
    /// ```
    pub fn new(num: Int, denom: Int) -> Rational {
        assert_ne!(denom, 0, "Denominator must not be zero");

        let sign = num.signum() * denom.signum();
        let div = gcd(num, denom);
        Rational {
            num: sign * (num.abs() / div),
            denom: denom.abs() / div,
        }
    }

    pub const fn int(int: Int) -> Rational {
        Rational { num: int, denom: 1 }
    }

    // ==================== Transformations ====================

    /// The multiplicative inverse.
    ///
    /// # Panic
    ///
    /// Panics on zero.
    ///
    /// ```
    /// # use gdv_core::rational::*;
    /// assert_eq!(Rational::new(-1, 2).recip(), Rational::int(-2));
    /// ```
    pub fn recip(self) -> Rational {
        Rational::new(self.denom, self.num)
    }

    pub const fn abs(self) -> Rational {
        Rational {
            num: self.num.abs(),
            denom: self.denom,
        }
    }

    /// Round towards negative infinity.
    ///
    /// ```
    /// # use gdv_core::rational::*;
    ///
    /// assert_eq!(Rational::new(7, 2).floor(), 3);
    /// assert_eq!(Rational::new(-7, 2).floor(), -4);
    /// assert_eq!(Rational::int(-3).floor(), -3);
    /// ```
    pub fn floor(self) -> Int {
        self.num.div_euclid(self.denom)
    }

    // ==================== Predicates ====================

    pub const fn is_zero(self) -> bool {
        self.num == 0
    }

    pub const fn is_positive(self) -> bool {
        self.num > 0
    }

    // ==================== Checked arithmetic ====================

    /// Normalize a wide fraction, `None` if it does not fit.
    fn from_wide(num: Wide, denom: Wide) -> Option<Rational> {
        if denom == 0 {
            return None;
        }
        let div = gcd_wide(num, denom);
        let (num, denom) = if denom < 0 {
            (-num / div, -denom / div)
        } else {
            (num / div, denom / div)
        };
        Some(Rational {
            num: Int::try_from(num).ok()?,
            denom: Int::try_from(denom).ok()?,
        })
    }

    /// `None` if the normalized sum does not fit.
    ///
    /// ```
    /// # use gdv_core::rational::*;
    /// let tiny = Rational::new(1, i64::MAX);
    /// assert_eq!(tiny.checked_add(Rational::new(1, i64::MAX - 1)), None);
    /// assert_eq!(tiny.checked_add(tiny), Some(Rational::new(2, i64::MAX)));
    /// ```
    pub fn checked_add(self, rhs: Rational) -> Option<Rational> {
        Rational::from_wide(
            Wide::from(self.num) * Wide::from(rhs.denom) + Wide::from(self.denom) * Wide::from(rhs.num),
            Wide::from(self.denom) * Wide::from(rhs.denom),
        )
    }

    pub fn checked_sub(self, rhs: Rational) -> Option<Rational> {
        Rational::from_wide(
            Wide::from(self.num) * Wide::from(rhs.denom) - Wide::from(self.denom) * Wide::from(rhs.num),
            Wide::from(self.denom) * Wide::from(rhs.denom),
        )
    }

    /// `None` if the normalized product does not fit.
    ///
    /// ```
    /// # use gdv_core::rational::*;
    /// let big = Rational::new(i64::MAX, 3);
    /// assert_eq!(big.checked_mul(Rational::new(3, i64::MAX)), Some(Rational::ONE));
    /// assert_eq!(big.checked_mul(big), None);
    /// ```
    pub fn checked_mul(self, rhs: Rational) -> Option<Rational> {
        Rational::from_wide(
            Wide::from(self.num) * Wide::from(rhs.num),
            Wide::from(self.denom) * Wide::from(rhs.denom),
        )
    }

    /// `None` if `rhs` is zero or the quotient does not fit.
    pub fn checked_div(self, rhs: Rational) -> Option<Rational> {
        Rational::from_wide(
            Wide::from(self.num) * Wide::from(rhs.denom),
            Wide::from(self.denom) * Wide::from(rhs.num),
        )
    }

    // ==================== Destructors ====================

    pub const fn numerator(self) -> Int {
        self.num
    }

    pub const fn denominator(self) -> Int {
        self.denom
    }
}

impl Default for Rational {
    fn default() -> Self {
        Rational::ZERO
    }
}

impl From<Int> for Rational {
    fn from(int: Int) -> Self {
        Rational::int(int)
    }
}

/// # Examples
///
/// ```
/// use gdv_core::rational::*;
///
/// assert_eq!(Rational::new(1, 2) + Rational::new(3, 4), Rational::new(5, 4));
/// assert_eq!(Rational::new(3, 4) + Rational::new(-5, 8), Rational::new(1, 8));
/// ```
///
/// # Panic
///
/// The operators panic if the result does not fit, like integer overflow
/// does. Use the `checked_*` methods where that can happen.
impl ops::Add for Rational {
    type Output = Rational;

    fn add(self, rhs: Rational) -> Self::Output {
        self.checked_add(rhs).unwrap_or_else(|| overflow("addition"))
    }
}

impl ops::Sub for Rational {
    type Output = Rational;

    fn sub(self, rhs: Rational) -> Self::Output {
        self.checked_sub(rhs).unwrap_or_else(|| overflow("subtraction"))
    }
}

impl ops::Mul for Rational {
    type Output = Rational;

    fn mul(self, rhs: Rational) -> Self::Output {
        self.checked_mul(rhs).unwrap_or_else(|| overflow("multiplication"))
    }
}

impl ops::Div for Rational {
    type Output = Rational;

    fn div(self, rhs: Rational) -> Self::Output {
        assert!(!rhs.is_zero(), "Division by zero");
        self.checked_div(rhs).unwrap_or_else(|| overflow("division"))
    }
}

fn overflow(operation: &str) -> ! {
    panic!("Rational {} overflowed", operation)
}

/// ```
/// # use gdv_core::rational::*;
///
/// assert_eq!(Rational::int(5) % Rational::int(3), Rational::int(2));
/// assert_eq!(Rational::new(7, 3) % Rational::new(1, 4), Rational::new(1, 12));
/// ```
impl ops::Rem for Rational {
    type Output = Rational;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn rem(self, rhs: Rational) -> Self::Output {
        let (lhs_num, rhs_num) = (
            Wide::from(self.num) * Wide::from(rhs.denom),
            Wide::from(rhs.num) * Wide::from(self.denom),
        );
        Rational::from_wide(lhs_num % rhs_num, Wide::from(self.denom) * Wide::from(rhs.denom))
            .unwrap_or_else(|| overflow("remainder"))
    }
}

impl ops::Mul<Int> for Rational {
    type Output = Rational;

    fn mul(self, rhs: Int) -> Self::Output {
        self * Rational::int(rhs)
    }
}

/// ```
/// # use gdv_core::rational::*;
/// assert_eq!(Rational::new(1, 4) / 2, Rational::new(1, 8));
/// ```
impl ops::Div<Int> for Rational {
    type Output = Rational;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn div(self, rhs: Int) -> Self::Output {
        self / Rational::int(rhs)
    }
}

impl ops::Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Self::Output {
        Rational {
            num: self.num.checked_neg().unwrap_or_else(|| overflow("negation")),
            denom: self.denom,
        }
    }
}

impl ops::AddAssign for Rational {
    fn add_assign(&mut self, rhs: Rational) {
        *self = *self + rhs;
    }
}

impl ops::SubAssign for Rational {
    fn sub_assign(&mut self, rhs: Rational) {
        *self = *self - rhs;
    }
}

impl ops::MulAssign for Rational {
    fn mul_assign(&mut self, rhs: Rational) {
        *self = *self * rhs;
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Rational) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// ```
/// use gdv_core::rational::*;
///
/// assert!(Rational::new(3, 4) < Rational::new(3, 2));
/// assert!(Rational::new(-1, 2) < Rational::new(-1, 3));
/// ```
impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        // denominators are positive, so cross multiplying keeps the order
        (Wide::from(self.num) * Wide::from(other.denom))
            .cmp(&(Wide::from(other.num) * Wide::from(self.denom)))
    }
}

/// ```
/// # use gdv_core::rational::*;
/// assert_eq!(Rational::new(6, 8).to_string(), "3/4");
/// assert_eq!(Rational::int(-2).to_string(), "-2");
/// ```
impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.num)?;
        if self.denom != 1 {
            write!(f, "/{}", self.denom)?;
        }
        Ok(())
    }
}

/// An error which can be returned when parsing a rational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRationalError(RationalErrorKind);

impl ParseRationalError {
    pub fn kind(&self) -> RationalErrorKind {
        self.0
    }
}

impl Error for ParseRationalError {}

impl fmt::Display for ParseRationalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            RationalErrorKind::InvalidInt => write!(f, "invalid integer literal"),
            RationalErrorKind::Zero => write!(f, "denominator is zero"),
            RationalErrorKind::Malformed => write!(f, "malformed fraction"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RationalErrorKind {
    /// The numerator or denominator could not be parsed as integer.
    InvalidInt,
    /// The denominator was zero
    Zero,
    /// The rational was not of the form `<int>` or `<int>/<int>`
    Malformed,
}

/// ```
/// # use gdv_core::rational::*;
/// assert_eq!("3/4".parse(), Ok(Rational::new(3, 4)));
/// assert_eq!("-2".parse(), Ok(Rational::int(-2)));
/// assert_eq!("1/0".parse::<Rational>().unwrap_err().kind(), RationalErrorKind::Zero);
/// assert_eq!("1/2/3".parse::<Rational>().unwrap_err().kind(), RationalErrorKind::Malformed);
/// ```
impl std::str::FromStr for Rational {
    type Err = ParseRationalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |_| ParseRationalError(RationalErrorKind::InvalidInt);
        let mut parts = s.trim().splitn(3, '/');
        let numerator: Int = parts.next().unwrap_or("").parse().map_err(invalid)?;

        match (parts.next(), parts.next()) {
            (None, _) => Ok(Rational::int(numerator)),
            (Some(_), Some(_)) => Err(ParseRationalError(RationalErrorKind::Malformed)),
            (Some(denominator_str), None) => {
                let denominator: Int = denominator_str.parse().map_err(invalid)?;
                if denominator == 0 {
                    Err(ParseRationalError(RationalErrorKind::Zero))
                } else {
                    Ok(Rational::new(numerator, denominator))
                }
            }
        }
    }
}

/// Computes the greatest common divisor of two numbers using euclids algorithm.
///
/// # Example
///
/// ```
/// use gdv_core::rational::*;
///
/// assert_eq!(gcd(20, 15), 5);
/// assert_eq!(gcd(10, 0), 10);
/// assert_eq!(gcd(0, 10), 10);
/// assert_eq!(gcd(10, -10), 10);
/// ```
pub fn gcd(a: Int, b: Int) -> Int {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

fn gcd_wide(a: Wide, b: Wide) -> Wide {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn normalization_keeps_denominator_positive() {
        let r = Rational::new(3, -6);
        assert_eq!(r.numerator(), -1);
        assert_eq!(r.denominator(), 2);
        assert_eq!(r.recip().denominator(), 1);
        assert_eq!(r.recip().numerator(), -2);
    }

    #[test]
    fn sub_and_compare_tuplets() {
        let triplet = Rational::new(1, 12);
        let quintuplet = Rational::new(1, 20);
        assert_eq!(triplet * 3 + quintuplet * 5, Rational::new(1, 2));
        assert!(triplet > quintuplet);
        assert_eq!(std::cmp::max(triplet, quintuplet), triplet);
    }

    #[test]
    fn large_denominators_compare_and_reduce() {
        let a = Rational::new(1, i64::MAX);
        let b = Rational::new(1, i64::MAX - 1);
        assert!(a < b);
        assert!(-a > -b);
        // cross reduction keeps the product representable
        assert_eq!(Rational::new(i64::MAX, 2) * Rational::new(2, i64::MAX), Rational::ONE);
        assert_eq!(b - b, Rational::ZERO);
        assert_eq!(a.checked_div(Rational::ZERO), None);
    }

    #[test]
    #[should_panic(expected = "overflowed")]
    fn overflowing_operators_panic() {
        let _ = Rational::new(1, i64::MAX) + Rational::new(1, i64::MAX - 1);
    }

    #[test]
    #[should_panic]
    fn zero_recip_panics() {
        Rational::ZERO.recip();
    }
}
