//! Structural lookups on a [`State`].
//!
//! Every query returns matches most-recent first (descending id). The
//! updater relies on that order for its recency tie-breaks.

use crate::model::container::normalize_label;
use crate::model::{Container, EntityTuple, MatchMode, Relation, State};

impl State {
    /// Containers matching `(label, tuple)` strictly. With `soft`, falls
    /// back to label and entity only when nothing matches strictly.
    pub fn matching_containers(&self, label: &str, tuple: &EntityTuple, soft: bool) -> Vec<&Container> {
        let label = normalize_label(Some(label));
        let mut matches = self.collect_matches(&label, tuple, MatchMode::Strict);
        if matches.is_empty() && soft {
            matches = self.collect_matches(&label, tuple, MatchMode::Soft);
        }
        matches
    }

    /// Containers sharing label and entity, ignoring attribute and unit.
    pub fn matching_containers_le(&self, label: &str, entity: &str) -> Vec<&Container> {
        let label = normalize_label(Some(label));
        self.containers()
            .rev()
            .filter(|c| c.label == label && c.tuple.entity == entity)
            .collect()
    }

    /// Most recent container structurally equal to `probe` that still holds
    /// a variable. With `soft`, falls back to label and entity.
    pub fn matching_var_container(&self, probe: &Container, soft: bool) -> Option<&Container> {
        self.matching_var_holder(&probe.label, &probe.tuple, soft)
    }

    /// Like [`State::matching_var_container`], keyed by label and tuple.
    pub fn matching_var_holder(&self, label: &str, tuple: &EntityTuple, soft: bool) -> Option<&Container> {
        let label = normalize_label(Some(label));
        let find = |mode: MatchMode| {
            self.containers()
                .rev()
                .find(|c| c.is_variable() && c.matches(&label, tuple, mode))
        };
        match find(MatchMode::Strict) {
            Some(c) => Some(c),
            None if soft => find(MatchMode::Soft),
            None => None,
        }
    }

    /// Relations structurally equal to `probe`, ignoring quantity.
    pub fn matching_relations(&self, probe: &Relation) -> Vec<&Relation> {
        self.relations()
            .rev()
            .filter(|r| r.equal_structure(probe))
            .collect()
    }

    /// Highest-id container still holding a variable.
    pub fn latest_variable_container(&self) -> Option<&Container> {
        self.containers().rev().find(|c| c.is_variable())
    }

    /// Highest-id non-part-whole relation still holding a variable.
    pub fn latest_variable_relation(&self) -> Option<&Relation> {
        self.relations()
            .rev()
            .find(|r| !r.is_part_whole() && r.is_variable())
    }

    /// Highest-id container of any kind.
    pub fn latest_container(&self) -> Option<&Container> {
        self.containers().next_back()
    }

    fn collect_matches(&self, label: &str, tuple: &EntityTuple, mode: MatchMode) -> Vec<&Container> {
        self.containers()
            .rev()
            .filter(|c| c.matches(label, tuple, mode))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Container, EntityTuple, GraphId, Quantity, State};

    fn state() -> State {
        let mut s = State::new("p", "span");
        let rows = [
            (1, "tom", Quantity::known(5), EntityTuple::new("apple", Some("red"), None)),
            (2, "tom", Quantity::variable("x1"), EntityTuple::new("apple", Some("red"), None)),
            (3, "tom", Quantity::variable("x2"), EntityTuple::new("apple", Some("green"), None)),
            (4, "ann", Quantity::variable("x3"), EntityTuple::entity_only("apple")),
        ];
        for (id, label, q, t) in rows {
            s.add_container(Container::new(GraphId(id), Some(label), q, t)).unwrap();
        }
        s
    }

    fn ids(cs: Vec<&Container>) -> Vec<u32> {
        cs.into_iter().map(|c| c.id.0).collect()
    }

    #[test]
    fn strict_matches_are_most_recent_first() {
        let s = state();
        let red = EntityTuple::new("apple", Some("red"), None);
        assert_eq!(ids(s.matching_containers("Tom", &red, false)), vec![2, 1]);
    }

    #[test]
    fn soft_fallback_only_without_strict_matches() {
        let s = state();
        let blue = EntityTuple::new("apple", Some("blue"), None);
        assert!(s.matching_containers("tom", &blue, false).is_empty());
        assert_eq!(ids(s.matching_containers("tom", &blue, true)), vec![3, 2, 1]);
        assert_eq!(ids(s.matching_containers_le("tom", "apple")), vec![3, 2, 1]);
    }

    #[test]
    fn var_container_prefers_highest_variable_holder() {
        let s = state();
        let probe = Container::new(
            GraphId(99),
            Some("tom"),
            Quantity::known(7),
            EntityTuple::new("apple", Some("red"), None),
        );
        assert_eq!(s.matching_var_container(&probe, false).map(|c| c.id), Some(GraphId(2)));
        let loose = Container::new(GraphId(99), Some("tom"), Quantity::known(7), EntityTuple::entity_only("apple"));
        assert!(s.matching_var_container(&loose, false).is_none());
        assert_eq!(s.matching_var_container(&loose, true).map(|c| c.id), Some(GraphId(3)));
        assert_eq!(s.latest_variable_container().map(|c| c.id), Some(GraphId(4)));
    }
}
