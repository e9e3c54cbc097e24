//! Equation polynomials.
//!
//! Every relation in a world model yields an expression that must equal
//! zero. Those expressions are sums of products of at most a few symbols,
//! so they are stored as a map from monomial to coefficient. Zero
//! coefficients are never stored.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use smallvec::SmallVec;

use crate::number::Number;
use crate::symbol::Symbol;

/// Sorted multiset of symbols; the empty monomial is the constant term.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Monomial(SmallVec<[Symbol; 2]>);

impl Monomial {
    pub fn constant() -> Self {
        Monomial(SmallVec::new())
    }

    pub fn var(symbol: Symbol) -> Self {
        let mut v = SmallVec::new();
        v.push(symbol);
        Monomial(v)
    }

    pub fn degree(&self) -> usize {
        self.0.len()
    }

    pub fn is_constant(&self) -> bool {
        self.0.is_empty()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.0
    }

    fn times(&self, other: &Monomial) -> Monomial {
        let mut v: SmallVec<[Symbol; 2]> = self.0.iter().chain(other.0.iter()).cloned().collect();
        v.sort();
        Monomial(v)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polynomial {
    terms: BTreeMap<Monomial, Number>,
}

impl Polynomial {
    pub fn zero() -> Self {
        Polynomial::default()
    }

    pub fn constant(value: Number) -> Self {
        let mut p = Polynomial::zero();
        p.add_term(Monomial::constant(), value);
        p
    }

    pub fn symbol(symbol: Symbol) -> Self {
        let mut p = Polynomial::zero();
        p.add_term(Monomial::var(symbol), Number::one());
        p
    }

    fn add_term(&mut self, monomial: Monomial, coefficient: Number) {
        let sum = match self.terms.remove(&monomial) {
            Some(existing) => existing + coefficient,
            None => coefficient,
        };
        if !sum.is_zero() {
            self.terms.insert(monomial, sum);
        }
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &Number)> {
        self.terms.iter()
    }

    pub fn degree(&self) -> usize {
        self.terms.keys().map(Monomial::degree).max().unwrap_or(0)
    }

    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        self.terms
            .keys()
            .flat_map(|m| m.symbols().iter().cloned())
            .collect()
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.terms.keys().any(|m| m.symbols().contains(symbol))
    }

    /// Replaces every occurrence of `symbol` by `value`.
    pub fn substitute(&self, symbol: &Symbol, value: &Number) -> Polynomial {
        let mut out = Polynomial::zero();
        for (monomial, coefficient) in &self.terms {
            let mut coefficient = coefficient.clone();
            let mut rest: SmallVec<[Symbol; 2]> = SmallVec::new();
            for s in monomial.symbols() {
                if s == symbol {
                    coefficient = &coefficient * value;
                } else {
                    rest.push(s.clone());
                }
            }
            out.add_term(Monomial(rest), coefficient);
        }
        out
    }

    /// Solves `self = 0` for `symbol` when the polynomial is linear in it
    /// and has no other free symbols. Returns `None` otherwise, including
    /// for degenerate equations where the coefficient of `symbol` is zero.
    pub fn solve_linear(&self, symbol: &Symbol) -> Option<Number> {
        let mut slope = Number::zero();
        let mut intercept = Number::zero();
        for (monomial, coefficient) in &self.terms {
            match monomial.symbols() {
                [] => intercept = &intercept + coefficient,
                [s] if s == symbol => slope = &slope + coefficient,
                _ => return None,
            }
        }
        (-intercept).checked_div(&slope)
    }
}

impl Add for Polynomial {
    type Output = Polynomial;
    fn add(mut self, rhs: Polynomial) -> Polynomial {
        for (m, c) in rhs.terms {
            self.add_term(m, c);
        }
        self
    }
}

impl Neg for Polynomial {
    type Output = Polynomial;
    fn neg(self) -> Polynomial {
        Polynomial {
            terms: self.terms.into_iter().map(|(m, c)| (m, -c)).collect(),
        }
    }
}

impl Sub for Polynomial {
    type Output = Polynomial;
    fn sub(self, rhs: Polynomial) -> Polynomial {
        self + (-rhs)
    }
}

impl Mul for Polynomial {
    type Output = Polynomial;
    fn mul(self, rhs: Polynomial) -> Polynomial {
        let mut out = Polynomial::zero();
        for (ma, ca) in &self.terms {
            for (mb, cb) in &rhs.terms {
                out.add_term(ma.times(mb), ca * cb);
            }
        }
        out
    }
}

impl From<Number> for Polynomial {
    fn from(value: Number) -> Self {
        Polynomial::constant(value)
    }
}

impl From<Symbol> for Polynomial {
    fn from(value: Symbol) -> Self {
        Polynomial::symbol(value)
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return f.write_str("0");
        }
        // Constant term last, as in `x1 - x2 + 3`.
        let ordered = self
            .terms
            .iter()
            .filter(|(m, _)| !m.is_constant())
            .chain(self.terms.iter().filter(|(m, _)| m.is_constant()));
        for (i, (monomial, coefficient)) in ordered.enumerate() {
            let negative = coefficient < &Number::zero();
            let magnitude = coefficient.abs();
            match (i, negative) {
                (0, true) => f.write_str("-")?,
                (0, false) => {}
                (_, true) => f.write_str(" - ")?,
                (_, false) => f.write_str(" + ")?,
            }
            let factors: Vec<String> = monomial.symbols().iter().map(|s| s.to_string()).collect();
            if monomial.is_constant() {
                write!(f, "{magnitude}")?;
            } else if magnitude.is_one() {
                f.write_str(&factors.join("*"))?;
            } else {
                write!(f, "{magnitude}*{}", factors.join("*"))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x(n: u64) -> Polynomial {
        Polynomial::symbol(Symbol::numbered(n))
    }

    fn k(v: i64) -> Polynomial {
        Polynomial::constant(Number::from(v))
    }

    #[test]
    fn like_terms_cancel() {
        let p = x(1) + k(3) - x(1);
        assert_eq!(p, k(3));
        assert!((x(2) - x(2)).is_zero());
    }

    #[test]
    fn solves_linear_equation() {
        // 10 - 3 - x2 = 0
        let p = k(10) - k(3) - x(2);
        assert_eq!(p.solve_linear(&Symbol::numbered(2)), Some(Number::from(7)));
    }

    #[test]
    fn refuses_nonlinear_and_multivariate() {
        let quad = x(1) * x(1) - k(4);
        assert_eq!(quad.degree(), 2);
        assert!(quad.solve_linear(&Symbol::numbered(1)).is_none());
        let two = x(1) + x(2);
        assert!(two.solve_linear(&Symbol::numbered(1)).is_none());
        assert!(k(5).solve_linear(&Symbol::numbered(1)).is_none());
    }

    #[test]
    fn substitution_reduces_products() {
        // x1 * x2 - x3 with x2 = 4
        let p = x(1) * x(2) - x(3);
        let q = p.substitute(&Symbol::numbered(2), &Number::from(4));
        assert_eq!(q.to_string(), "4*x1 - x3");
        assert!(!q.contains(&Symbol::numbered(2)));
    }
}
