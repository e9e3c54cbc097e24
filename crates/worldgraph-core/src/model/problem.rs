//! A word problem as an append-only sequence of states, one per span.

use std::collections::BTreeMap;

use worldgraph_ir::{Expr, Number};

use crate::engine::errors::ModelError;
use crate::model::state::State;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Problem {
    id: String,
    body: String,
    question: String,
    /// Cumulative text spans; the question is always the last one.
    spans: Vec<String>,
    states: Vec<State>,
    answer: Option<Number>,
    metadata: BTreeMap<String, serde_json::Value>,
}

impl Problem {
    /// Creates an unparsed problem. The question is appended to `spans`
    /// unless one of them already equals it, ignoring surrounding
    /// whitespace.
    pub fn new(
        id: impl Into<String>,
        body: impl Into<String>,
        question: impl Into<String>,
        mut spans: Vec<String>,
    ) -> Self {
        let question = question.into();
        if !spans.iter().any(|s| s.trim() == question.trim()) {
            spans.push(question.clone());
        }
        Problem {
            id: id.into(),
            body: body.into(),
            question,
            spans,
            states: Vec::new(),
            answer: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Same text, no states.
    pub fn without_states(&self) -> Problem {
        Problem::new(
            self.id.clone(),
            self.body.clone(),
            self.question.clone(),
            self.spans.clone(),
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn spans(&self) -> &[String] {
        &self.spans
    }

    pub fn span(&self, i: usize) -> Option<&str> {
        self.spans.get(i).map(String::as_str)
    }

    pub fn num_states(&self) -> usize {
        self.spans.len()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, i: usize) -> Option<&State> {
        self.states.get(i)
    }

    /// Every span has a state.
    pub fn is_parsed(&self) -> bool {
        self.states.len() == self.spans.len()
    }

    /// Parsed, and the final state has a reference.
    pub fn is_determined(&self) -> bool {
        self.complete_state().map_or(false, State::has_ref)
    }

    /// Determined, and the final state has an answer.
    pub fn is_solved(&self) -> bool {
        self.is_determined() && self.complete_state().map_or(false, State::has_answer)
    }

    /// Appends the state for the next span.
    pub fn add_state(&mut self, state: State) -> Result<(), ModelError> {
        if self.is_parsed() {
            return Err(ModelError::ProblemComplete);
        }
        self.states.push(state);
        #[cfg(feature = "tracing")]
        if self.is_parsed() {
            tracing::info!("problem {} fully parsed ({} states)", self.id, self.states.len());
        }
        Ok(())
    }

    /// Replaces the already added state at position `i`.
    pub fn update_state(&mut self, i: usize, state: State) -> Result<(), ModelError> {
        let slot = self.states.get_mut(i).ok_or(ModelError::InvalidIndex(i))?;
        *slot = state;
        Ok(())
    }

    /// Most recently added state.
    pub fn current_state(&self) -> Option<&State> {
        self.states.last()
    }

    /// State of the question span, once parsed.
    pub fn complete_state(&self) -> Option<&State> {
        if self.is_parsed() {
            self.states.last()
        } else {
            None
        }
    }

    pub(crate) fn complete_state_mut(&mut self) -> Result<&mut State, ModelError> {
        if !self.is_parsed() {
            return Err(ModelError::ProblemIncomplete);
        }
        self.states.last_mut().ok_or(ModelError::ProblemIncomplete)
    }

    pub fn set_reference(&mut self, reference: Expr) -> Result<(), ModelError> {
        self.complete_state_mut()?.set_ref(reference)
    }

    pub fn reference(&self) -> Option<&Expr> {
        self.complete_state().and_then(State::reference)
    }

    pub fn set_answer(&mut self, answer: Number) -> Result<(), ModelError> {
        self.complete_state_mut()?.set_answer(answer.clone())?;
        self.answer = Some(answer);
        Ok(())
    }

    pub fn answer(&self) -> Option<&Number> {
        self.complete_state()
            .and_then(State::answer)
            .or(self.answer.as_ref())
    }

    pub fn add_metadata<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        self.metadata.extend(entries);
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }
}

/// Spans, answer and states; id and metadata are not compared.
impl PartialEq for Problem {
    fn eq(&self, other: &Self) -> bool {
        self.spans == other.spans && self.answer() == other.answer() && self.states == other.states
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem() -> Problem {
        Problem::new(
            "p1",
            "Tom has 5 apples.",
            "How many now?",
            vec!["Tom has 5 apples.".to_string()],
        )
    }

    #[test]
    fn question_is_appended_to_spans() {
        let p = problem();
        assert_eq!(p.num_states(), 2);
        assert_eq!(p.span(1), Some("How many now?"));
        let q = Problem::new("p", "", "q", vec!["q".to_string()]);
        assert_eq!(q.num_states(), 1);
    }

    #[test]
    fn question_match_ignores_surrounding_whitespace() {
        let p = Problem::new(
            "p",
            "Tom has 5 apples.",
            "How many now?",
            vec!["Tom has 5 apples.".to_string(), " How many now? ".to_string()],
        );
        assert_eq!(p.num_states(), 2);
        assert_eq!(p.question(), "How many now?");
    }

    #[test]
    fn lifecycle_flags() {
        let mut p = problem();
        assert!(!p.is_parsed());
        p.add_state(State::new("p1", "Tom has 5 apples.")).unwrap();
        assert!(p.complete_state().is_none());
        assert_eq!(p.set_reference(Expr::symbol("x1")), Err(ModelError::ProblemIncomplete));
        p.add_state(State::new("p1", "How many now?")).unwrap();
        assert!(p.is_parsed());
        assert!(!p.is_determined());
        p.set_reference(Expr::symbol("x1")).unwrap();
        assert!(p.is_determined());
        assert!(!p.is_solved());
        p.set_answer(Number::from(5)).unwrap();
        assert!(p.is_solved());
        assert_eq!(p.answer(), Some(&Number::from(5)));
        assert_eq!(p.add_state(State::new("p1", "extra")), Err(ModelError::ProblemComplete));
    }

    #[test]
    fn update_state_requires_existing_index() {
        let mut p = problem();
        assert_eq!(p.update_state(0, State::new("p1", "x")), Err(ModelError::InvalidIndex(0)));
        p.add_state(State::new("p1", "a")).unwrap();
        p.update_state(0, State::new("p1", "b")).unwrap();
        assert_eq!(p.current_state().map(State::span), Some("b"));
    }
}
