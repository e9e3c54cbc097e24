//! # Incremental Updater
//!
//! Turns a linearization into the next [`State`] of a [`Problem`].
//!
//! ## Update Model
//!
//! 1. The linearization is filtered down to its well-formed clauses.
//! 2. The previous state is cloned (or a fresh one created for the first span).
//! 3. Clauses are applied left to right. Each clause runs on a scratch copy
//!    of the working state and is committed only if it succeeds; a failing
//!    clause becomes a [`ClauseDiagnostic`] and the next clause proceeds.
//! 4. On the question span, the last clause resolves the reference instead of
//!    adding structure where matching structure already exists. When no
//!    reference results, the most recent variable container (then relation)
//!    becomes the reference.
//!
//! ## Counters
//!
//! Graph ids continue from [`State::incremented_id`]. Fresh variables are
//! named `x{n}` with `n` starting after the largest number embedded in any
//! variable name the state has seen.

use worldgraph_frontend::{
    keep_well_formed, Clause, ClauseKind, ContainerClause, ExplicitClause, PartClause, QuantityArg,
    RateClause, TransferClause, Vocabulary,
};
use worldgraph_ir::{Number, Symbol};

use crate::engine::errors::ModelError;
use crate::model::{
    Container, EntityTuple, ExplicitArgs, GraphId, Problem, Quantity, Relation, RelationType,
    State,
};

/// Options for [`update_world_model`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateConfig {
    /// Reject clauses whose text arguments are not drawn from the problem
    /// text (plus lemmas and special tokens).
    pub enforce_vocab: bool,
}

/// A clause that could not be applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ClauseDiagnostic {
    /// Position among the well-formed clauses.
    pub index: usize,
    /// Clause text as it appeared in the linearization.
    pub clause: String,
    /// Why the clause was skipped.
    pub error: ModelError,
}

/// Outcome of applying one linearization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    /// Number of well-formed clauses found.
    pub clauses: usize,
    /// Number of clauses committed to the state.
    pub applied: usize,
    /// One entry per skipped clause, in clause order.
    pub diagnostics: Vec<ClauseDiagnostic>,
}

impl UpdateReport {
    /// Every well-formed clause was applied.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Builds the state for the next unparsed span of `problem` from `lin` and
/// appends it.
///
/// Fails only when the problem already has a state for every span; clause
/// level failures are reported in the returned [`UpdateReport`].
pub fn update_world_model(
    problem: &mut Problem,
    lin: &str,
    config: &UpdateConfig,
) -> Result<UpdateReport, ModelError> {
    if problem.is_parsed() {
        return Err(ModelError::ProblemComplete);
    }
    let index = problem.states().len();
    let span = problem
        .span(index)
        .ok_or(ModelError::InvalidIndex(index))?
        .to_string();
    let terminal = index + 1 == problem.num_states();

    let vocab = config
        .enforce_vocab
        .then(|| Vocabulary::from_text(&format!("{} {}", problem.body(), problem.question())));
    let clauses = keep_well_formed(lin, vocab.as_ref());

    let mut state = match problem.current_state() {
        Some(previous) => {
            let mut next = previous.clone();
            next.set_span(span);
            next
        }
        None => State::new(problem.id(), span),
    };

    let report = apply_clauses(&mut state, &clauses, terminal);
    if terminal && !state.has_ref() {
        fallback_reference(&mut state)?;
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        "span {} of problem {}: {}/{} clauses applied",
        index,
        problem.id(),
        report.applied,
        report.clauses
    );

    problem.add_state(state)?;
    Ok(report)
}

/// Applies `clauses` to `state` in order. With `terminal`, the last clause
/// resolves the reference.
pub fn apply_clauses(state: &mut State, clauses: &[Clause], terminal: bool) -> UpdateReport {
    let mut updater = StateUpdater::new(state);
    let mut report = UpdateReport {
        clauses: clauses.len(),
        ..UpdateReport::default()
    };

    for (i, clause) in clauses.iter().enumerate() {
        let step = Step {
            is_reference: terminal && i + 1 == clauses.len(),
            prev_is_container: i > 0 && clauses[i - 1].is_container(),
        };
        let counters = updater.clone();
        let mut scratch = state.clone();
        match updater.apply(&mut scratch, clause, step) {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("applied clause {}: {}", i, clause.text);
                *state = scratch;
                report.applied += 1;
            }
            Err(error) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("skipped clause {}: {} ({})", i, clause.text, error);
                updater = counters;
                report.diagnostics.push(ClauseDiagnostic {
                    index: i,
                    clause: clause.text.clone(),
                    error,
                });
            }
        }
    }
    report
}

/// Sets the reference to the most recent variable container, else the most
/// recent variable non-part-whole relation. Leaves the state untouched when
/// neither exists.
fn fallback_reference(state: &mut State) -> Result<(), ModelError> {
    let value = match state.latest_variable_container() {
        Some(c) => Some(c.value()),
        None => state.latest_variable_relation().and_then(Relation::value),
    };
    match value {
        Some(v) => state.set_ref(v),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy)]
struct Step {
    is_reference: bool,
    prev_is_container: bool,
}

/// Id and variable counters for one linearization.
#[derive(Debug, Clone)]
struct StateUpdater {
    next_id: u32,
    next_var: u64,
}

impl StateUpdater {
    fn new(state: &State) -> Self {
        let next_var = state
            .vars()
            .iter()
            .flat_map(Symbol::digit_runs)
            .max()
            .map_or(1, |m| m + 1);
        StateUpdater {
            next_id: state.incremented_id().0,
            next_var,
        }
    }

    fn alloc_id(&mut self) -> GraphId {
        let id = GraphId(self.next_id);
        self.next_id += 1;
        id
    }

    fn fresh_var(&mut self) -> Quantity {
        let symbol = Symbol::numbered(self.next_var);
        self.next_var += 1;
        Quantity::Variable(symbol)
    }

    fn quantity(&mut self, arg: &QuantityArg) -> Result<Quantity, ModelError> {
        match arg {
            QuantityArg::Unknown => Ok(self.fresh_var()),
            QuantityArg::Number(lit) => Ok(Quantity::Known(Number::from_literal(lit)?)),
        }
    }

    fn apply(&mut self, state: &mut State, clause: &Clause, step: Step) -> Result<(), ModelError> {
        match &clause.kind {
            ClauseKind::Container(c) => self.container(state, c, step),
            ClauseKind::Transfer(t) => self.transfer(state, t, step),
            ClauseKind::Rate(r) => self.rate(state, r, step),
            ClauseKind::Part(p) => self.part(state, p),
            ClauseKind::Difference(e) => self.explicit(state, e, RelationType::ExplicitAdd, step),
            ClauseKind::Explicit(e) => self.explicit(state, e, RelationType::ExplicitTimes, step),
        }
    }

    /// Inserts a new container with a fresh variable.
    fn create(&mut self, state: &mut State, label: &str, tuple: EntityTuple) -> Result<Container, ModelError> {
        let quantity = self.fresh_var();
        let container = Container::new(self.alloc_id(), Some(label), quantity, tuple);
        state.add_container(container.clone())?;
        Ok(container)
    }

    /// Most recent strict match, or a new variable container.
    fn resolve_or_create(
        &mut self,
        state: &mut State,
        label: &str,
        tuple: &EntityTuple,
    ) -> Result<Container, ModelError> {
        let existing = state.matching_containers(label, tuple, false).first().map(|c| (*c).clone());
        match existing {
            Some(c) => Ok(c),
            None => self.create(state, label, tuple.clone()),
        }
    }

    fn container(&mut self, state: &mut State, clause: &ContainerClause, step: Step) -> Result<(), ModelError> {
        let tuple = EntityTuple::from(&clause.tuple);
        if step.is_reference {
            return self.container_reference(state, clause, tuple);
        }
        let quantity = self.quantity(&clause.quantity)?;
        if let Quantity::Known(value) = &quantity {
            let holder = state.matching_var_holder(&clause.label, &tuple, false).map(|c| c.id);
            if let Some(id) = holder {
                return state.update_container(id, value.clone());
            }
        }
        let container = Container::new(self.alloc_id(), Some(&clause.label), quantity, tuple);
        state.add_container(container)
    }

    /// Reference for a container clause: a matching variable holder, else
    /// the latest variable container, else the latest variable relation,
    /// else the clause's own container, newly added.
    fn container_reference(
        &mut self,
        state: &mut State,
        clause: &ContainerClause,
        tuple: EntityTuple,
    ) -> Result<(), ModelError> {
        let existing = state
            .matching_var_holder(&clause.label, &tuple, true)
            .or_else(|| state.latest_variable_container())
            .map(Container::value)
            .or_else(|| state.latest_variable_relation().and_then(Relation::value));
        let reference = match existing {
            Some(value) => value,
            None => {
                let quantity = self.quantity(&clause.quantity)?;
                let container = Container::new(self.alloc_id(), Some(&clause.label), quantity, tuple);
                let value = container.value();
                state.add_container(container)?;
                value
            }
        };
        state.set_ref(reference)
    }

    fn transfer(&mut self, state: &mut State, clause: &TransferClause, step: Step) -> Result<(), ModelError> {
        if clause.recipient.is_none() && clause.sender.is_none() {
            return Err(ModelError::InvalidArgument(
                "transfer needs a recipient or a sender".to_string(),
            ));
        }
        let quantity = self.quantity(&clause.quantity)?;
        let tuple = EntityTuple::from(&clause.tuple);
        let sides = [clause.recipient.as_deref(), clause.sender.as_deref()];
        for label in sides.into_iter().flatten() {
            let (before, after) = self.transfer_endpoints(state, label, &tuple, step.prev_is_container)?;
            let relation = Relation::transfer(
                self.alloc_id(),
                &before,
                &after,
                quantity.clone(),
                tuple.clone(),
                clause.recipient.as_deref(),
                clause.sender.as_deref(),
            )?;
            add_or_reference(state, relation, step.is_reference)?;
        }
        Ok(())
    }

    /// Before and after containers of `label` around a transfer.
    fn transfer_endpoints(
        &mut self,
        state: &mut State,
        label: &str,
        tuple: &EntityTuple,
        prev_is_container: bool,
    ) -> Result<(Container, Container), ModelError> {
        let matches: Vec<Container> = state
            .matching_containers(label, tuple, false)
            .into_iter()
            .cloned()
            .collect();
        match matches.as_slice() {
            [] => {
                let before = self.create(state, label, tuple.clone())?;
                let after = self.create(state, label, tuple.clone())?;
                Ok((before, after))
            }
            [only] => {
                let after = self.create(state, label, only.tuple.clone())?;
                Ok((only.clone(), after))
            }
            [latest, previous, rest @ ..] => {
                if !rest.is_empty() {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        "transfer side '{}' has {} matches, using the two most recent",
                        label,
                        matches.len()
                    );
                }
                if prev_is_container {
                    Ok((previous.clone(), latest.clone()))
                } else {
                    let after = self.create(state, label, latest.tuple.clone())?;
                    Ok((latest.clone(), after))
                }
            }
        }
    }

    fn rate(&mut self, state: &mut State, clause: &RateClause, step: Step) -> Result<(), ModelError> {
        let numerator = EntityTuple::from(&clause.numerator);
        let denominator = EntityTuple::from(&clause.denominator);
        let source = self.resolve_or_create(state, &clause.label, &numerator)?;
        let target = self.resolve_or_create(state, &clause.label, &denominator)?;
        let quantity = self.quantity(&clause.quantity)?;
        let relation = Relation::rate(self.alloc_id(), &source, &target, quantity, numerator, denominator);
        add_or_reference(state, relation, step.is_reference)
    }

    fn part(&mut self, state: &mut State, clause: &PartClause) -> Result<(), ModelError> {
        let whole_tuple = EntityTuple::from(&clause.whole.tuple);
        let whole = state
            .matching_containers(&clause.whole.label, &whole_tuple, false)
            .first()
            .copied()
            .or_else(|| state.latest_container())
            .cloned()
            .ok_or_else(|| {
                ModelError::Consistency("part clause needs at least one container".to_string())
            })?;

        for group in &clause.parts {
            let tuple = EntityTuple::from(&group.tuple);
            let part = state
                .matching_containers(&group.label, &tuple, false)
                .first()
                .map(|c| (*c).clone())
                .ok_or_else(|| {
                    ModelError::Consistency(format!(
                        "part container ( {} , {} ) must exist in the world model",
                        group.label, tuple
                    ))
                })?;
            if part.id == whole.id {
                return Err(ModelError::Consistency(format!(
                    "container {} cannot be a part of itself",
                    part.id
                )));
            }
            if state.exists_relation(part.id, whole.id, Some(RelationType::PartWhole)) {
                continue;
            }
            state.add_relation(Relation::part_whole(self.alloc_id(), &part, &whole))?;
        }
        Ok(())
    }

    fn explicit(
        &mut self,
        state: &mut State,
        clause: &ExplicitClause,
        kind: RelationType,
        step: Step,
    ) -> Result<(), ModelError> {
        let res_tuple = EntityTuple::from(&clause.result_tuple);
        let arg_tuple = EntityTuple::from(&clause.argument_tuple);
        let owned = |cs: Vec<&Container>| cs.into_iter().cloned().collect::<Vec<_>>();

        let mut res_matches = owned(state.matching_containers(&clause.result, &res_tuple, false));
        let mut arg_matches = owned(state.matching_containers(&clause.argument, &arg_tuple, false));

        // One side matched strictly: retry the other softly, never reusing
        // a container the matched side claims.
        if arg_matches.is_empty() && !res_matches.is_empty() {
            arg_matches = owned(state.matching_containers(&clause.argument, &arg_tuple, true));
            arg_matches.retain(|c| res_matches.iter().all(|r| r.id != c.id));
        } else if res_matches.is_empty() && !arg_matches.is_empty() {
            res_matches = owned(state.matching_containers(&clause.result, &res_tuple, true));
            res_matches.retain(|c| arg_matches.iter().all(|a| a.id != c.id));
        }

        let result = match res_matches.into_iter().next() {
            Some(c) => c,
            None => self.create(state, &clause.result, res_tuple.clone())?,
        };
        let argument = match arg_matches.into_iter().next() {
            Some(c) => c,
            None => self.create(state, &clause.argument, arg_tuple.clone())?,
        };

        let quantity = self.quantity(&clause.quantity)?;
        let args = ExplicitArgs {
            result: clause.result.clone(),
            argument: clause.argument.clone(),
            result_tuple: res_tuple,
            argument_tuple: arg_tuple,
        };
        let id = self.alloc_id();
        let relation = match kind {
            RelationType::ExplicitTimes => Relation::explicit_times(id, &argument, &result, quantity, args)?,
            _ => Relation::explicit_add(id, &argument, &result, quantity, args)?,
        };
        add_or_reference(state, relation, step.is_reference)
    }
}

/// Adds `relation`, or on the reference clause uses the quantity of an
/// existing structurally equal relation (adding `relation` only when none
/// exists) as the state's reference.
fn add_or_reference(state: &mut State, relation: Relation, is_reference: bool) -> Result<(), ModelError> {
    if !is_reference {
        return state.add_relation(relation);
    }
    let existing = state
        .matching_relations(&relation)
        .first()
        .and_then(|r| r.value());
    let reference = match existing {
        Some(value) => value,
        None => {
            let value = relation.value().ok_or(ModelError::MissingReference)?;
            state.add_relation(relation)?;
            value
        }
    };
    state.set_ref(reference)
}
