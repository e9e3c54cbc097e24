//! Exact-or-float scalar values.
//!
//! Integers and fractions are kept as arbitrary-precision rationals; decimal
//! literals become `f64`. Arithmetic stays exact while both operands are
//! exact and degrades to float as soon as one side is a float.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use worldgraph_frontend::{FrontendError, NumberKind, NumberLiteral};

#[derive(Debug, Clone)]
pub enum Number {
    Exact(BigRational),
    Float(f64),
}

impl Number {
    pub fn zero() -> Self {
        Number::Exact(BigRational::zero())
    }

    pub fn one() -> Self {
        Number::Exact(BigRational::one())
    }

    /// Classifies `text` as fraction, integer or decimal, in that order.
    pub fn parse(text: &str) -> Result<Number, FrontendError> {
        let text = text.trim();
        let invalid = || FrontendError::InvalidLiteral(text.to_string());
        if is_fraction(text) {
            let (n, d) = text.split_once('/').ok_or_else(invalid)?;
            let n: BigInt = n.parse().map_err(|_| invalid())?;
            let d: BigInt = d.parse().map_err(|_| invalid())?;
            if d.is_zero() {
                return Err(invalid());
            }
            Ok(Number::Exact(BigRational::new(n, d)))
        } else if is_integer(text) {
            let n: BigInt = text.parse().map_err(|_| invalid())?;
            Ok(Number::Exact(BigRational::from_integer(n)))
        } else if is_decimal(text) {
            text.parse::<f64>().map(Number::Float).map_err(|_| invalid())
        } else {
            Err(invalid())
        }
    }

    pub fn from_literal(lit: &NumberLiteral) -> Result<Number, FrontendError> {
        let n = Number::parse(&lit.text)?;
        let consistent = matches!(
            (lit.kind, &n),
            (NumberKind::Decimal, Number::Float(_))
                | (NumberKind::Integer | NumberKind::Fraction, Number::Exact(_))
        );
        if consistent {
            Ok(n)
        } else {
            Err(FrontendError::InvalidLiteral(lit.text.clone()))
        }
    }

    pub fn from_f64(value: f64) -> Self {
        Number::Float(value)
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Exact(r) => r.is_zero(),
            Number::Float(f) => *f == 0.0,
        }
    }

    pub fn is_one(&self) -> bool {
        match self {
            Number::Exact(r) => r.is_one(),
            Number::Float(f) => *f == 1.0,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Number::Exact(_))
    }

    pub fn is_integer(&self) -> bool {
        match self {
            Number::Exact(r) => r.is_integer(),
            Number::Float(f) => f.fract() == 0.0,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Exact(r) => rational_to_f64(r),
            Number::Float(f) => *f,
        }
    }

    /// Returns `None` on division by zero.
    pub fn checked_div(&self, rhs: &Number) -> Option<Number> {
        if rhs.is_zero() {
            return None;
        }
        Some(match (self, rhs) {
            (Number::Exact(a), Number::Exact(b)) => Number::Exact(a / b),
            (a, b) => Number::Float(a.to_f64() / b.to_f64()),
        })
    }

    pub fn abs(&self) -> Number {
        match self {
            Number::Exact(r) => Number::Exact(r.abs()),
            Number::Float(f) => Number::Float(f.abs()),
        }
    }
}

fn rational_to_f64(r: &BigRational) -> f64 {
    match (r.numer().to_f64(), r.denom().to_f64()) {
        (Some(n), Some(d)) => n / d,
        _ => f64::NAN,
    }
}

fn is_fraction(s: &str) -> bool {
    match s.split_once('/') {
        Some((n, d)) => is_integer(n) && is_integer(d),
        None => false,
    }
}

fn is_integer(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal(s: &str) -> bool {
    match s.split_once('.') {
        Some((int, frac)) => {
            (!int.is_empty() || !frac.is_empty())
                && int.bytes().all(|b| b.is_ascii_digit())
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Exact(BigRational::from_integer(BigInt::from(value)))
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::from(i64::from(value))
    }
}

impl From<BigRational> for Number {
    fn from(value: BigRational) -> Self {
        Number::Exact(value)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Exact(a), Number::Exact(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a == b,
            (Number::Exact(a), Number::Float(b)) | (Number::Float(b), Number::Exact(a)) => {
                BigRational::from_float(*b).map_or(false, |b| *a == b)
            }
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Number::Exact(a), Number::Exact(b)) => Some(a.cmp(b)),
            (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
        }
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $op:tt) => {
        impl<'a> $trait<&'a Number> for &'a Number {
            type Output = Number;
            fn $method(self, rhs: &'a Number) -> Number {
                match (self, rhs) {
                    (Number::Exact(a), Number::Exact(b)) => Number::Exact(a $op b),
                    (a, b) => Number::Float(a.to_f64() $op b.to_f64()),
                }
            }
        }

        impl $trait for Number {
            type Output = Number;
            fn $method(self, rhs: Number) -> Number {
                (&self).$method(&rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, +);
impl_binary_op!(Sub, sub, -);
impl_binary_op!(Mul, mul, *);

impl Neg for &Number {
    type Output = Number;
    fn neg(self) -> Number {
        match self {
            Number::Exact(r) => Number::Exact(-r),
            Number::Float(f) => Number::Float(-f),
        }
    }
}

impl Neg for Number {
    type Output = Number;
    fn neg(self) -> Number {
        -&self
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Exact(r) if r.is_integer() => write!(f, "{}", r.numer()),
            Number::Exact(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            Number::Float(x) => write!(f, "{x:?}"),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Number {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Number::Exact(r) if r.is_integer() => match r.numer().to_i64() {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.collect_str(self),
            },
            Number::Exact(_) => serializer.collect_str(self),
            Number::Float(x) => serializer.serialize_f64(*x),
        }
    }
}
