//! # Deterministic Reasoner
//!
//! Resolves the reference of a state by solving the equations its
//! relations induce.
//!
//! ## Algorithm
//!
//! 1. Optionally infer missing part-whole relations (off by default).
//! 2. Take the free symbols of the reference as targets.
//! 3. Assemble equations (see [`crate::engine::equations`]).
//! 4. For each target, try the equations containing it in ascending order
//!    of free-symbol count. An equation with the target as its only symbol
//!    is solved directly; otherwise its other symbols are resolved
//!    recursively first. Equations already on the current recursion path
//!    are skipped, so cyclic systems terminate.
//! 5. Substitute the resolved targets into the reference and simplify.
//!
//! An unresolved target is not an error: the reference comes back as a
//! residual expression.

use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use worldgraph_ir::{Expr, Number, Symbol};

use crate::engine::equations::{assemble_equations, Equation};
use crate::engine::errors::ModelError;
use crate::model::{Container, GraphId, Problem, Relation, RelationType, State};

/// Label of a whole in the attribute slot that marks a total.
const TOTAL_ATTRIBUTE: &str = "total";

#[derive(Debug, Clone, Copy, Default)]
pub struct ReasonerConfig {
    /// Add part-whole relations between containers that look like a part
    /// and its whole before solving.
    pub infer_part_whole: bool,
}

/// Outcome of reasoning over a reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Value(Number),
    Residual(Expr),
}

impl Resolution {
    pub fn value(&self) -> Option<&Number> {
        match self {
            Resolution::Value(n) => Some(n),
            Resolution::Residual(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Value(_))
    }

    pub fn to_expr(&self) -> Expr {
        match self {
            Resolution::Value(n) => Expr::Num(n.clone()),
            Resolution::Residual(e) => e.clone(),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Value(n) => write!(f, "{n}"),
            Resolution::Residual(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeterministicReasoner {
    config: ReasonerConfig,
}

impl DeterministicReasoner {
    pub fn new(config: ReasonerConfig) -> Self {
        DeterministicReasoner { config }
    }

    pub fn config(&self) -> &ReasonerConfig {
        &self.config
    }

    /// Resolves the reference of `state`. Inferred relations, if enabled,
    /// are added to a copy; `state` itself is never modified.
    pub fn reason(&self, state: &State) -> Result<Resolution, ModelError> {
        let reference = state.reference().ok_or(ModelError::MissingReference)?;
        if self.config.infer_part_whole {
            let mut augmented = state.clone();
            infer_part_whole(&mut augmented)?;
            solve(&augmented, reference)
        } else {
            solve(state, reference)
        }
    }

    /// Like [`DeterministicReasoner::reason`], keeping inferred relations
    /// in `state`.
    pub fn reason_mut(&self, state: &mut State) -> Result<Resolution, ModelError> {
        if self.config.infer_part_whole {
            infer_part_whole(state)?;
        }
        let reference = state.reference().ok_or(ModelError::MissingReference)?;
        solve(state, reference)
    }

    /// Resolves an explicit `reference` against `state`, ignoring the
    /// state's own reference.
    pub fn reason_with(&self, state: &State, reference: &Expr) -> Result<Resolution, ModelError> {
        if reference.free_symbols().is_empty() {
            return Err(ModelError::InvalidReference(reference.to_string()));
        }
        if self.config.infer_part_whole {
            let mut augmented = state.clone();
            infer_part_whole(&mut augmented)?;
            solve(&augmented, reference)
        } else {
            solve(state, reference)
        }
    }

    /// Resolves the reference of a determined problem's final state.
    pub fn reason_problem(&self, problem: &Problem) -> Result<Resolution, ModelError> {
        let state = problem.complete_state().ok_or(ModelError::ProblemIncomplete)?;
        self.reason(state)
    }

    /// Reasons over `problem` and records a numeric result as its answer
    /// unless one is already set.
    pub fn solve_problem(&self, problem: &mut Problem) -> Result<Resolution, ModelError> {
        let resolution = self.reason_problem(problem)?;
        if let Resolution::Value(n) = &resolution {
            if problem.answer().is_none() {
                problem.set_answer(n.clone())?;
            }
            #[cfg(feature = "tracing")]
            tracing::info!("problem {}: answer {}", problem.id(), n);
        }
        Ok(resolution)
    }

    /// Solves independent problems, in parallel with the `parallel` feature.
    pub fn solve_all(&self, problems: &mut [Problem]) -> Vec<Result<Resolution, ModelError>> {
        #[cfg(feature = "parallel")]
        {
            problems
                .par_iter_mut()
                .map(|p| self.solve_problem(p))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            problems.iter_mut().map(|p| self.solve_problem(p)).collect()
        }
    }
}

fn solve(state: &State, reference: &Expr) -> Result<Resolution, ModelError> {
    let targets = reference.free_symbols();
    if targets.is_empty() {
        return Err(ModelError::InvalidReference(reference.to_string()));
    }
    let equations = assemble_equations(state)?;
    let mut solver = Solver::new(&equations);
    let mut bindings = BTreeMap::new();
    for target in targets {
        let mut path = Vec::new();
        match solver.resolve(&target, &mut path) {
            Some(value) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("resolved {} = {}", target, value);
                bindings.insert(target, value);
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!("{} left unresolved", target);
            }
        }
    }
    Ok(match reference.substitute(&bindings).simplify() {
        Expr::Num(n) => Resolution::Value(n),
        residual => Resolution::Residual(residual),
    })
}

/// Recursive solver over a fixed equation list.
struct Solver<'a> {
    equations: &'a [Equation],
    /// Free-symbol count per equation, used for ordering.
    widths: Vec<usize>,
    solved: BTreeMap<Symbol, Number>,
}

impl<'a> Solver<'a> {
    fn new(equations: &'a [Equation]) -> Self {
        Solver {
            equations,
            widths: equations
                .iter()
                .map(|e| e.polynomial.free_symbols().len())
                .collect(),
            solved: BTreeMap::new(),
        }
    }

    /// `path` holds the equations on the current recursion path.
    fn resolve(&mut self, target: &Symbol, path: &mut Vec<usize>) -> Option<Number> {
        if let Some(v) = self.solved.get(target) {
            return Some(v.clone());
        }
        let mut candidates: Vec<usize> = (0..self.equations.len())
            .filter(|i| !path.contains(i) && self.equations[*i].polynomial.contains(target))
            .collect();
        candidates.sort_by_key(|i| self.widths[*i]);

        for i in candidates {
            path.push(i);
            let value = self.solve_with(i, target, path);
            path.pop();
            if let Some(v) = value {
                self.solved.insert(target.clone(), v.clone());
                return Some(v);
            }
        }
        None
    }

    fn solve_with(&mut self, i: usize, target: &Symbol, path: &mut Vec<usize>) -> Option<Number> {
        let mut polynomial = self.equations[i].polynomial.clone();
        for other in polynomial.free_symbols() {
            if &other == target {
                continue;
            }
            let value = self.resolve(&other, path)?;
            polynomial = polynomial.substitute(&other, &value);
        }
        polynomial.solve_linear(target)
    }
}

/// Adds part-whole relations for every ordered container pair that looks
/// like a part and its whole and is not already related that way in either
/// direction. Returns the ids of the added relations.
pub fn infer_part_whole(state: &mut State) -> Result<Vec<GraphId>, ModelError> {
    let containers: Vec<Container> = state.containers().cloned().collect();
    let mut added = Vec::new();
    for part in &containers {
        for whole in &containers {
            if part.id == whole.id || part == whole || !is_part_of(part, whole) {
                continue;
            }
            if state.exists_relation(part.id, whole.id, Some(RelationType::PartWhole))
                || state.exists_relation(whole.id, part.id, Some(RelationType::PartWhole))
            {
                continue;
            }
            let id = state.incremented_id();
            state.add_relation(Relation::part_whole(id, part, whole))?;
            #[cfg(feature = "tracing")]
            tracing::debug!("inferred part-whole {} -> {} ({})", part.id, whole.id, id);
            added.push(id);
        }
    }
    Ok(added)
}

/// Same label and entity, the part has an attribute and the whole has none
/// or is marked as a total.
fn is_part_of(part: &Container, whole: &Container) -> bool {
    part.label == whole.label
        && part.tuple.entity == whole.tuple.entity
        && part.tuple.attribute.is_some()
        && whole
            .tuple
            .attribute
            .as_deref()
            .map_or(true, |a| a == TOTAL_ATTRIBUTE)
}
