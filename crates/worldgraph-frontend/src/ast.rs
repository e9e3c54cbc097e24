//! Clause AST for the linearization language.
//!
//! Every textual argument is already lowercased and whitespace-normalized.
//! Optional tuple slots written as `none` are represented as `None`.

use std::fmt;

/// Kind of a numeric literal as written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Integer,
    Decimal,
    Fraction,
}

/// A numeric literal kept in source form; conversion happens in the IR layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberLiteral {
    pub text: String,
    pub kind: NumberKind,
}

/// Quantity slot of a clause: a literal or `none`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityArg {
    Number(NumberLiteral),
    Unknown,
}

impl QuantityArg {
    pub fn is_unknown(&self) -> bool {
        matches!(self, QuantityArg::Unknown)
    }
}

/// `(entity, attribute, unit)` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleArgs {
    pub entity: String,
    pub attribute: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerClause {
    pub label: String,
    pub quantity: QuantityArg,
    pub tuple: TupleArgs,
}

/// `transfer ( recipient , sender , q , e , a , u )`; either side may be `none`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferClause {
    pub recipient: Option<String>,
    pub sender: Option<String>,
    pub quantity: QuantityArg,
    pub tuple: TupleArgs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateClause {
    pub label: String,
    pub quantity: QuantityArg,
    pub numerator: TupleArgs,
    pub denominator: TupleArgs,
}

/// One `(label, e, a, u)` group of a part clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartGroup {
    pub label: String,
    pub tuple: TupleArgs,
}

/// First group is the whole, the remaining groups are its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartClause {
    pub whole: PartGroup,
    pub parts: Vec<PartGroup>,
}

/// Shared payload of `difference` and `explicit` clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitClause {
    pub result: String,
    pub argument: String,
    pub quantity: QuantityArg,
    pub result_tuple: TupleArgs,
    pub argument_tuple: TupleArgs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClauseKind {
    Container(ContainerClause),
    Transfer(TransferClause),
    Rate(RateClause),
    Part(PartClause),
    Difference(ExplicitClause),
    Explicit(ExplicitClause),
}

/// A well-formed clause extracted from a linearization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub kind: ClauseKind,
    /// Clause text exactly as matched (lowercased).
    pub text: String,
    /// Byte range within the lowercased input.
    pub span: (usize, usize),
}

impl Clause {
    pub fn keyword(&self) -> &'static str {
        self.kind.keyword()
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, ClauseKind::Container(_))
    }

    /// All free-text arguments, used for vocabulary filtering.
    pub fn text_arguments(&self) -> Vec<&str> {
        let mut out = Vec::new();
        fn push_tuple<'a>(out: &mut Vec<&'a str>, t: &'a TupleArgs) {
            out.push(t.entity.as_str());
            out.extend(t.attribute.as_deref());
            out.extend(t.unit.as_deref());
        }
        match &self.kind {
            ClauseKind::Container(c) => {
                out.push(c.label.as_str());
                push_tuple(&mut out, &c.tuple);
            }
            ClauseKind::Transfer(t) => {
                out.extend(t.recipient.as_deref());
                out.extend(t.sender.as_deref());
                push_tuple(&mut out, &t.tuple);
            }
            ClauseKind::Rate(r) => {
                out.push(r.label.as_str());
                push_tuple(&mut out, &r.numerator);
                push_tuple(&mut out, &r.denominator);
            }
            ClauseKind::Part(p) => {
                for g in std::iter::once(&p.whole).chain(p.parts.iter()) {
                    out.push(g.label.as_str());
                    push_tuple(&mut out, &g.tuple);
                }
            }
            ClauseKind::Difference(e) | ClauseKind::Explicit(e) => {
                out.push(e.result.as_str());
                out.push(e.argument.as_str());
                push_tuple(&mut out, &e.result_tuple);
                push_tuple(&mut out, &e.argument_tuple);
            }
        }
        out
    }
}

impl ClauseKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            ClauseKind::Container(_) => "container",
            ClauseKind::Transfer(_) => "transfer",
            ClauseKind::Rate(_) => "rate",
            ClauseKind::Part(_) => "part",
            ClauseKind::Difference(_) => "difference",
            ClauseKind::Explicit(_) => "explicit",
        }
    }
}

fn opt(s: &Option<String>) -> &str {
    s.as_deref().unwrap_or("none")
}

impl fmt::Display for NumberLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Display for QuantityArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantityArg::Number(n) => write!(f, "{n}"),
            QuantityArg::Unknown => f.write_str("none"),
        }
    }
}

impl fmt::Display for TupleArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} , {} , {}", self.entity, opt(&self.attribute), opt(&self.unit))
    }
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClauseKind::Container(c) => {
                write!(f, "container ( {} , {} , {} )", c.label, c.quantity, c.tuple)
            }
            ClauseKind::Transfer(t) => write!(
                f,
                "transfer ( {} , {} , {} , {} )",
                opt(&t.recipient),
                opt(&t.sender),
                t.quantity,
                t.tuple
            ),
            ClauseKind::Rate(r) => write!(
                f,
                "rate ( {} , {} , {} , {} )",
                r.label, r.quantity, r.numerator, r.denominator
            ),
            ClauseKind::Part(p) => {
                write!(f, "part ( {} , {}", p.whole.label, p.whole.tuple)?;
                for g in &p.parts {
                    write!(f, " , {} , {}", g.label, g.tuple)?;
                }
                f.write_str(" )")
            }
            ClauseKind::Difference(e) | ClauseKind::Explicit(e) => write!(
                f,
                "{} ( {} , {} , {} , {} , {} )",
                self.keyword(),
                e.result,
                e.argument,
                e.quantity,
                e.result_tuple,
                e.argument_tuple
            ),
        }
    }
}

/// Binary operator in a reference expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Parsed reference expression such as `x1 + x2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprAst {
    Number(NumberLiteral),
    Symbol(String),
    Neg(Box<ExprAst>),
    Binary {
        op: BinaryOp,
        lhs: Box<ExprAst>,
        rhs: Box<ExprAst>,
    },
}
