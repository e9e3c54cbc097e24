//! Reference expressions.
//!
//! A problem's question is answered by evaluating a small arithmetic
//! expression over graph variables, almost always a single symbol. This
//! module provides the tree, substitution and constant folding.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use worldgraph_frontend::{BinaryOp, ExprAst, FrontendError};

use crate::number::Number;
use crate::symbol::Symbol;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(Number),
    Sym(Symbol),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn symbol(name: impl AsRef<str>) -> Self {
        Expr::Sym(Symbol::new(name))
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Expr::Sym(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Expr::Num(n) => Some(n),
            _ => None,
        }
    }

    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<Symbol>) {
        match self {
            Expr::Num(_) => {}
            Expr::Sym(s) => {
                out.insert(s.clone());
            }
            Expr::Neg(e) => e.collect_symbols(out),
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) => {
                a.collect_symbols(out);
                b.collect_symbols(out);
            }
        }
    }

    /// Replaces bound symbols by their values, leaving the rest untouched.
    pub fn substitute(&self, bindings: &BTreeMap<Symbol, Number>) -> Expr {
        let map = |e: &Expr| Box::new(e.substitute(bindings));
        match self {
            Expr::Num(n) => Expr::Num(n.clone()),
            Expr::Sym(s) => match bindings.get(s) {
                Some(v) => Expr::Num(v.clone()),
                None => Expr::Sym(s.clone()),
            },
            Expr::Neg(e) => Expr::Neg(map(e)),
            Expr::Add(a, b) => Expr::Add(map(a), map(b)),
            Expr::Sub(a, b) => Expr::Sub(map(a), map(b)),
            Expr::Mul(a, b) => Expr::Mul(map(a), map(b)),
            Expr::Div(a, b) => Expr::Div(map(a), map(b)),
        }
    }

    /// Bottom-up constant folding plus the additive and multiplicative
    /// identities. Division by a literal zero is left unfolded.
    pub fn simplify(&self) -> Expr {
        match self {
            Expr::Num(_) | Expr::Sym(_) => self.clone(),
            Expr::Neg(e) => match e.simplify() {
                Expr::Num(n) => Expr::Num(-n),
                Expr::Neg(inner) => *inner,
                other => Expr::Neg(Box::new(other)),
            },
            Expr::Add(a, b) => match (a.simplify(), b.simplify()) {
                (Expr::Num(x), Expr::Num(y)) => Expr::Num(x + y),
                (Expr::Num(z), e) | (e, Expr::Num(z)) if z.is_zero() => e,
                (x, y) => Expr::Add(Box::new(x), Box::new(y)),
            },
            Expr::Sub(a, b) => match (a.simplify(), b.simplify()) {
                (Expr::Num(x), Expr::Num(y)) => Expr::Num(x - y),
                (e, Expr::Num(z)) if z.is_zero() => e,
                (Expr::Num(z), e) if z.is_zero() => Expr::Neg(Box::new(e)),
                (x, y) => Expr::Sub(Box::new(x), Box::new(y)),
            },
            Expr::Mul(a, b) => match (a.simplify(), b.simplify()) {
                (Expr::Num(x), Expr::Num(y)) => Expr::Num(x * y),
                (Expr::Num(z), _) | (_, Expr::Num(z)) if z.is_zero() => Expr::Num(Number::zero()),
                (Expr::Num(o), e) | (e, Expr::Num(o)) if o.is_one() => e,
                (x, y) => Expr::Mul(Box::new(x), Box::new(y)),
            },
            Expr::Div(a, b) => match (a.simplify(), b.simplify()) {
                (Expr::Num(x), Expr::Num(y)) => match x.checked_div(&y) {
                    Some(q) => Expr::Num(q),
                    None => Expr::Div(Box::new(Expr::Num(x)), Box::new(Expr::Num(y))),
                },
                (e, Expr::Num(o)) if o.is_one() => e,
                (x, y) => Expr::Div(Box::new(x), Box::new(y)),
            },
        }
    }

    /// Substitutes and simplifies; returns the value when nothing symbolic
    /// remains.
    pub fn evaluate(&self, bindings: &BTreeMap<Symbol, Number>) -> Option<Number> {
        match self.substitute(bindings).simplify() {
            Expr::Num(n) => Some(n),
            _ => None,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(..) | Expr::Sub(..) => 1,
            Expr::Mul(..) | Expr::Div(..) => 2,
            Expr::Neg(_) => 3,
            Expr::Num(_) | Expr::Sym(_) => 4,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(n) => write!(f, "{n}"),
            Expr::Sym(s) => write!(f, "{s}"),
            Expr::Neg(e) => {
                f.write_str("-")?;
                e.fmt_operand(f, 3)
            }
            Expr::Add(a, b) => {
                a.fmt_operand(f, 1)?;
                f.write_str(" + ")?;
                b.fmt_operand(f, 1)
            }
            Expr::Sub(a, b) => {
                a.fmt_operand(f, 1)?;
                f.write_str(" - ")?;
                b.fmt_operand(f, 2)
            }
            Expr::Mul(a, b) => {
                a.fmt_operand(f, 2)?;
                f.write_str("*")?;
                b.fmt_operand(f, 2)
            }
            Expr::Div(a, b) => {
                a.fmt_operand(f, 2)?;
                f.write_str("/")?;
                b.fmt_operand(f, 3)
            }
        }
    }
}

impl From<Symbol> for Expr {
    fn from(value: Symbol) -> Self {
        Expr::Sym(value)
    }
}

impl From<Number> for Expr {
    fn from(value: Number) -> Self {
        Expr::Num(value)
    }
}

impl TryFrom<&ExprAst> for Expr {
    type Error = FrontendError;

    fn try_from(ast: &ExprAst) -> Result<Self, Self::Error> {
        Ok(match ast {
            ExprAst::Number(lit) => Expr::Num(Number::from_literal(lit)?),
            ExprAst::Symbol(name) => Expr::symbol(name),
            ExprAst::Neg(e) => Expr::Neg(Box::new(Expr::try_from(e.as_ref())?)),
            ExprAst::Binary { op, lhs, rhs } => {
                let l = Box::new(Expr::try_from(lhs.as_ref())?);
                let r = Box::new(Expr::try_from(rhs.as_ref())?);
                match op {
                    BinaryOp::Add => Expr::Add(l, r),
                    BinaryOp::Sub => Expr::Sub(l, r),
                    BinaryOp::Mul => Expr::Mul(l, r),
                    BinaryOp::Div => Expr::Div(l, r),
                }
            }
        })
    }
}

impl std::str::FromStr for Expr {
    type Err = FrontendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ast = worldgraph_frontend::parse_reference(s)?;
        Expr::try_from(&ast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bind(pairs: &[(&str, i64)]) -> BTreeMap<Symbol, Number> {
        pairs
            .iter()
            .map(|(k, v)| (Symbol::new(k), Number::from(*v)))
            .collect()
    }

    #[test]
    fn parse_and_display_round_trip() {
        let e: Expr = "x1 - (x2 + 3) * 2".parse().unwrap();
        assert_eq!(e.to_string(), "x1 - (x2 + 3)*2");
        let again: Expr = e.to_string().parse().unwrap();
        assert_eq!(again, e);
    }

    #[test]
    fn evaluate_with_full_bindings() {
        let e: Expr = "x1 + x2 / 4".parse().unwrap();
        assert_eq!(e.evaluate(&bind(&[("x1", 1), ("x2", 2)])).unwrap().to_string(), "3/2");
        assert!(e.evaluate(&bind(&[("x1", 1)])).is_none());
    }

    #[test]
    fn partial_substitution_keeps_residual() {
        let e: Expr = "x1 + x2".parse().unwrap();
        let residual = e.substitute(&bind(&[("x1", 0)])).simplify();
        assert_eq!(residual, Expr::symbol("x2"));
        assert_eq!(e.free_symbols().len(), 2);
    }

    #[test]
    fn division_by_zero_is_not_folded() {
        let e: Expr = "x1 / 0".parse().unwrap();
        assert!(e.evaluate(&bind(&[("x1", 5)])).is_none());
    }
}
