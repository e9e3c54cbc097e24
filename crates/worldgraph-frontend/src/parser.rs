//! # Linearization Parser
//!
//! Extracts well-formed clauses from a linearization string using the Pest
//! grammar in `grammar.pest`, and parses reference expressions.
//!
//! ## Validation
//!
//! A linearization is free text, usually produced by a sequence model, with
//! clauses embedded in it. [`keep_well_formed`] lowercases the input, scans
//! for clause keywords at word boundaries and tries the `clause` rule at each
//! candidate. Matching clauses are returned in order of appearance; text that
//! does not match is silently dropped. Scanning resumes after the end of each
//! accepted clause, so accepted clauses never overlap.
//!
//! When a [`Vocabulary`] is supplied, a clause whose free-text arguments use
//! words outside it is rejected and scanning resumes one byte later.

use crate::ast::*;
use crate::errors::FrontendError;
use crate::vocab::Vocabulary;
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "../grammar.pest"]
pub struct LinearizationParser;

const KEYWORDS: [&str; 6] = [
    "container",
    "transfer",
    "rate",
    "part",
    "difference",
    "explicit",
];

/// Returns every well-formed clause in `input`, in order of appearance.
///
/// # Example
///
/// ```rust,ignore
/// use worldgraph_frontend::keep_well_formed;
///
/// let clauses = keep_well_formed("noise container ( Tank , 5 , water , none , liter ) tail", None);
/// assert_eq!(clauses.len(), 1);
/// assert_eq!(clauses[0].keyword(), "container");
/// ```
pub fn keep_well_formed(input: &str, vocab: Option<&Vocabulary>) -> Vec<Clause> {
    let normalized = input.to_lowercase();
    let mut clauses = Vec::new();
    let mut pos = 0;
    while let Some(start) = next_keyword(&normalized, pos) {
        let rest = &normalized[start..];
        let parsed = LinearizationParser::parse(Rule::clause, rest)
            .ok()
            .and_then(|mut pairs| pairs.next())
            .and_then(|pair| build_clause(pair, start).ok());
        match parsed {
            Some(clause) if vocab.map_or(true, |v| admitted(&clause, v)) => {
                pos = clause.span.1;
                clauses.push(clause);
            }
            // Keywords start with an ASCII letter, so `start + 1` is a char boundary.
            _ => pos = start + 1,
        }
    }
    clauses
}

/// Parses a single clause; the whole input must be the clause.
pub fn parse_clause(input: &str) -> Result<Clause, FrontendError> {
    let normalized = input.trim().to_lowercase();
    let pair = LinearizationParser::parse(Rule::clause, &normalized)
        .map_err(|e| FrontendError::ParseError(e.to_string()))?
        .next()
        .ok_or_else(|| FrontendError::ParseError("empty clause".to_string()))?;
    if pair.as_span().end() != normalized.len() {
        return Err(FrontendError::ParseError(format!(
            "trailing input after clause: '{}'",
            &normalized[pair.as_span().end()..]
        )));
    }
    build_clause(pair, 0)
}

fn admitted(clause: &Clause, vocab: &Vocabulary) -> bool {
    clause.text_arguments().iter().all(|arg| vocab.admits(arg))
}

fn next_keyword(input: &str, from: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    (from..input.len()).find(|&i| {
        input.is_char_boundary(i)
            && (i == 0 || !bytes[i - 1].is_ascii_alphanumeric())
            && KEYWORDS.iter().any(|kw| input[i..].starts_with(kw))
    })
}

fn build_clause(pair: Pair<Rule>, offset: usize) -> Result<Clause, FrontendError> {
    let span = pair.as_span();
    let text = span.as_str().to_string();
    let range = (offset + span.start(), offset + span.end());
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| FrontendError::ParseError("empty clause".to_string()))?;
    let rule = inner.as_rule();
    let mut args = Args(inner.into_inner());
    let kind = match rule {
        Rule::container_clause => ClauseKind::Container(ContainerClause {
            label: args.text()?,
            quantity: args.quantity()?,
            tuple: args.tuple()?,
        }),
        Rule::transfer_clause => ClauseKind::Transfer(TransferClause {
            recipient: args.optional_text()?,
            sender: args.optional_text()?,
            quantity: args.quantity()?,
            tuple: args.tuple()?,
        }),
        Rule::rate_clause => ClauseKind::Rate(RateClause {
            label: args.text()?,
            quantity: args.quantity()?,
            numerator: args.tuple()?,
            denominator: args.tuple()?,
        }),
        Rule::part_clause => {
            let mut groups = Vec::new();
            for g in args.0 {
                let mut ga = Args(g.into_inner());
                groups.push(PartGroup {
                    label: ga.text()?,
                    tuple: ga.tuple()?,
                });
            }
            let mut groups = groups.into_iter();
            let whole = groups
                .next()
                .ok_or_else(|| FrontendError::ParseError("part clause without whole".to_string()))?;
            ClauseKind::Part(PartClause {
                whole,
                parts: groups.collect(),
            })
        }
        Rule::difference_clause => ClauseKind::Difference(args.explicit()?),
        Rule::explicit_clause => ClauseKind::Explicit(args.explicit()?),
        other => {
            return Err(FrontendError::ParseError(format!(
                "unexpected rule {other:?} in clause"
            )))
        }
    };
    Ok(Clause {
        kind,
        text,
        span: range,
    })
}

/// Sequential reader over the argument pairs of one clause.
struct Args<'i>(Pairs<'i, Rule>);

impl<'i> Args<'i> {
    fn next(&mut self, expected: Rule) -> Result<Pair<'i, Rule>, FrontendError> {
        match self.0.next() {
            Some(p) if p.as_rule() == expected => Ok(p),
            Some(p) => Err(FrontendError::ParseError(format!(
                "expected {expected:?}, found {:?}",
                p.as_rule()
            ))),
            None => Err(FrontendError::ParseError(format!(
                "missing argument, expected {expected:?}"
            ))),
        }
    }

    fn text(&mut self) -> Result<String, FrontendError> {
        let p = self.next(Rule::text)?;
        Ok(normalize_text(p.as_str()))
    }

    fn optional_text(&mut self) -> Result<Option<String>, FrontendError> {
        let t = self.text()?;
        Ok(if t == "none" { None } else { Some(t) })
    }

    fn quantity(&mut self) -> Result<QuantityArg, FrontendError> {
        let p = self.next(Rule::quantity)?;
        let inner = p
            .into_inner()
            .next()
            .ok_or_else(|| FrontendError::ParseError("empty quantity".to_string()))?;
        match inner.as_rule() {
            Rule::unknown => Ok(QuantityArg::Unknown),
            Rule::number => Ok(QuantityArg::Number(build_number(inner)?)),
            other => Err(FrontendError::ParseError(format!(
                "unexpected rule {other:?} in quantity"
            ))),
        }
    }

    fn tuple(&mut self) -> Result<TupleArgs, FrontendError> {
        Ok(TupleArgs {
            entity: self.text()?,
            attribute: self.optional_text()?,
            unit: self.optional_text()?,
        })
    }

    fn explicit(&mut self) -> Result<ExplicitClause, FrontendError> {
        Ok(ExplicitClause {
            result: self.text()?,
            argument: self.text()?,
            quantity: self.quantity()?,
            result_tuple: self.tuple()?,
            argument_tuple: self.tuple()?,
        })
    }
}

fn normalize_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn build_number(pair: Pair<Rule>) -> Result<NumberLiteral, FrontendError> {
    let text = pair.as_str().to_string();
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| FrontendError::InvalidLiteral(text.clone()))?;
    let kind = match inner.as_rule() {
        Rule::fraction => NumberKind::Fraction,
        Rule::decimal => NumberKind::Decimal,
        Rule::integer => NumberKind::Integer,
        _ => return Err(FrontendError::InvalidLiteral(text)),
    };
    Ok(NumberLiteral { text, kind })
}

/// Parses a reference expression such as `x3` or `x1 + 2 * x2`.
///
/// Standard precedence applies: unary minus binds tightest, then `*` and `/`,
/// then `+` and `-`, all left-associative.
pub fn parse_reference(source: &str) -> Result<ExprAst, FrontendError> {
    let pair = LinearizationParser::parse(Rule::reference, source.trim())
        .map_err(|e| FrontendError::ParseError(e.to_string()))?
        .next()
        .ok_or_else(|| FrontendError::ParseError("empty reference".to_string()))?;
    let expr = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::expr)
        .ok_or_else(|| FrontendError::ParseError("missing expression".to_string()))?;
    build_expr(expr)
}

fn build_expr(pair: Pair<Rule>) -> Result<ExprAst, FrontendError> {
    match pair.as_rule() {
        Rule::expr | Rule::term => {
            let mut inner = pair.into_inner();
            let first = inner
                .next()
                .ok_or_else(|| FrontendError::ParseError("empty expression".to_string()))?;
            let mut acc = build_expr(first)?;
            while let Some(op_pair) = inner.next() {
                let op = match op_pair.as_str() {
                    "+" => BinaryOp::Add,
                    "-" => BinaryOp::Sub,
                    "*" => BinaryOp::Mul,
                    "/" => BinaryOp::Div,
                    other => {
                        return Err(FrontendError::ParseError(format!("unknown operator '{other}'")))
                    }
                };
                let rhs_pair = inner.next().ok_or_else(|| {
                    FrontendError::ParseError("operator without right operand".to_string())
                })?;
                acc = ExprAst::Binary {
                    op,
                    lhs: Box::new(acc),
                    rhs: Box::new(build_expr(rhs_pair)?),
                };
            }
            Ok(acc)
        }
        Rule::factor => {
            let mut negations = 0usize;
            let mut operand = None;
            for p in pair.into_inner() {
                match p.as_rule() {
                    Rule::neg => negations += 1,
                    _ => operand = Some(build_expr(p)?),
                }
            }
            let mut expr = operand
                .ok_or_else(|| FrontendError::ParseError("missing operand".to_string()))?;
            for _ in 0..negations {
                expr = ExprAst::Neg(Box::new(expr));
            }
            Ok(expr)
        }
        Rule::number => Ok(ExprAst::Number(build_number(pair)?)),
        Rule::symbol => Ok(ExprAst::Symbol(pair.as_str().to_string())),
        other => Err(FrontendError::ParseError(format!(
            "unexpected rule {other:?} in expression"
        ))),
    }
}
