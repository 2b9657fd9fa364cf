use super::{ArgumentId, ClauseId, DecisionLevel, Sign, UNASSIGNED_DL};
use std::collections::HashMap;

/// An argument of a SETAF instance, together with its mutable search state.
///
/// The id of an argument is stable for the lifetime of the instance; its position is its
/// index in the current branching order and is rewritten by the heuristics pass.
/// The search state (value, decision level, reason, watch lists) is updated by the solver
/// through the owning [`SetafInstance`](super::SetafInstance).
pub struct Argument {
    id: ArgumentId,
    position: usize,
    name: String,
    value: Sign,
    dl: DecisionLevel,
    reason: Option<ClauseId>,
    heuristics_value: f64,
    attacked_by: Vec<ClauseId>,
    watched_in: Vec<ClauseId>,
    watched_in_index: HashMap<ClauseId, usize>,
    watched_attack_index: usize,
    stability_watch: Vec<(ArgumentId, usize)>,
}

impl Argument {
    /// Builds a new unassigned argument with the given id.
    ///
    /// The position is initialised to the id and the display name to the 1-based id.
    pub(crate) fn new(id: ArgumentId) -> Self {
        Argument {
            id,
            position: id,
            name: (id + 1).to_string(),
            value: Sign::Unassigned,
            dl: UNASSIGNED_DL,
            reason: None,
            heuristics_value: 0.0,
            attacked_by: Vec::new(),
            watched_in: Vec::new(),
            watched_in_index: HashMap::new(),
            watched_attack_index: 0,
            stability_watch: Vec::new(),
        }
    }

    /// Returns the id of this argument.
    pub fn id(&self) -> ArgumentId {
        self.id
    }

    /// Returns the position of this argument in the current branching order.
    pub fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    /// Returns the display name of this argument.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the display name of this argument.
    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Returns the current value of this argument, ignoring decision levels.
    pub fn value(&self) -> Sign {
        self.value
    }

    /// Returns the value of this argument at the given decision level.
    ///
    /// An argument assigned at a deeper level than `dl` is reported unassigned.
    pub fn value_at(&self, dl: DecisionLevel) -> Sign {
        if self.dl > dl {
            Sign::Unassigned
        } else {
            self.value
        }
    }

    /// Returns the decision level at which this argument was assigned, or
    /// [`UNASSIGNED_DL`] if it is unassigned.
    pub fn dl(&self) -> DecisionLevel {
        self.dl
    }

    /// Returns the clause that forced the current assignment, if any.
    ///
    /// `None` stands for a guess or an assignment forced at level 0.
    pub fn reason(&self) -> Option<ClauseId> {
        self.reason
    }

    pub(crate) fn set_value(&mut self, value: Sign, dl: DecisionLevel) {
        self.value = value;
        self.dl = dl;
    }

    pub(crate) fn replace_reason(&mut self, reason: Option<ClauseId>) -> Option<ClauseId> {
        std::mem::replace(&mut self.reason, reason)
    }

    /// Resets the value and decision level of this argument.
    ///
    /// The reason is kept; its usage counter is released on the next assignment.
    pub(crate) fn reset(&mut self) {
        self.value = Sign::Unassigned;
        self.dl = UNASSIGNED_DL;
    }

    /// Returns the heuristics score of this argument.
    pub fn heuristics_value(&self) -> f64 {
        self.heuristics_value
    }

    pub(crate) fn set_heuristics_value(&mut self, value: f64) {
        self.heuristics_value = value;
    }

    /// Returns the original attacks directed at this argument.
    pub fn attacked_by(&self) -> &[ClauseId] {
        &self.attacked_by
    }

    pub(crate) fn add_attacked_by(&mut self, clause: ClauseId) {
        self.attacked_by.push(clause);
    }

    /// Returns the number of clauses currently watching this argument.
    pub fn watched_in_len(&self) -> usize {
        self.watched_in.len()
    }

    /// Returns the watching clause at the given index of the watch list.
    pub fn watched_in_at(&self, index: usize) -> ClauseId {
        self.watched_in[index]
    }

    pub(crate) fn add_watched_in(&mut self, clause: ClauseId) {
        self.watched_in_index.insert(clause, self.watched_in.len());
        self.watched_in.push(clause);
    }

    /// Removes the given clause from the watch list by swap-remove, patching the
    /// clause→index map of the displaced entry.
    pub(crate) fn remove_watched_in(&mut self, clause: ClauseId) {
        let index = self
            .watched_in_index
            .remove(&clause)
            .expect("the clause does not watch this argument");
        self.watched_in.swap_remove(index);
        if index < self.watched_in.len() {
            self.watched_in_index.insert(self.watched_in[index], index);
        }
    }

    /// Returns the index into `attacked_by` of the attack serving as stability witness.
    ///
    /// Only meaningful while the argument is assigned [`Sign::Out`](super::Sign).
    pub fn watched_attack_index(&self) -> usize {
        self.watched_attack_index
    }

    pub(crate) fn set_watched_attack_index(&mut self, index: usize) {
        self.watched_attack_index = index;
    }

    /// Returns `true` if no other argument currently relies on this one for stability.
    pub fn stability_watch_is_empty(&self) -> bool {
        self.stability_watch.is_empty()
    }

    pub(crate) fn stability_watch_pop(&mut self) -> Option<(ArgumentId, usize)> {
        self.stability_watch.pop()
    }

    pub(crate) fn stability_watch_push(&mut self, argument: ArgumentId, attack_index: usize) {
        self.stability_watch.push((argument, attack_index));
    }

    #[cfg(test)]
    pub(crate) fn watched_in_position(&self, clause: ClauseId) -> Option<usize> {
        self.watched_in_index.get(&clause).copied()
    }
}

impl std::fmt::Display for Argument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.value {
            Sign::Unassigned => write!(f, "?{}", self.name),
            v => {
                write!(f, "{}{}@{}<-", v, self.name, self.dl)?;
                match self.reason {
                    Some(r) => write!(f, "{}", r),
                    None => write!(f, "guess"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_argument_defaults() {
        let a = Argument::new(2);
        assert_eq!(2, a.id());
        assert_eq!(2, a.position());
        assert_eq!("3", a.name());
        assert_eq!(Sign::Unassigned, a.value());
        assert_eq!(UNASSIGNED_DL, a.dl());
        assert!(a.reason().is_none());
    }

    #[test]
    fn test_value_at_hides_deeper_levels() {
        let mut a = Argument::new(0);
        a.set_value(Sign::In, 3);
        assert_eq!(Sign::Unassigned, a.value_at(2));
        assert_eq!(Sign::In, a.value_at(3));
        assert_eq!(Sign::In, a.value_at(4));
        assert_eq!(Sign::In, a.value());
    }

    #[test]
    fn test_reset_keeps_reason() {
        let mut a = Argument::new(0);
        a.set_value(Sign::Out, 1);
        a.replace_reason(Some(7));
        a.reset();
        assert_eq!(Sign::Unassigned, a.value());
        assert_eq!(UNASSIGNED_DL, a.dl());
        assert_eq!(Some(7), a.reason());
    }

    #[test]
    fn test_watched_in_swap_remove() {
        let mut a = Argument::new(0);
        a.add_watched_in(10);
        a.add_watched_in(11);
        a.add_watched_in(12);
        a.remove_watched_in(10);
        assert_eq!(2, a.watched_in_len());
        assert_eq!(12, a.watched_in_at(0));
        assert_eq!(Some(0), a.watched_in_position(12));
        assert_eq!(Some(1), a.watched_in_position(11));
        a.remove_watched_in(11);
        a.remove_watched_in(12);
        assert_eq!(0, a.watched_in_len());
    }

    #[test]
    fn test_stability_watch_stack() {
        let mut a = Argument::new(0);
        assert!(a.stability_watch_is_empty());
        a.stability_watch_push(4, 0);
        a.stability_watch_push(5, 1);
        assert_eq!(Some((5, 1)), a.stability_watch_pop());
        assert_eq!(Some((4, 0)), a.stability_watch_pop());
        assert!(a.stability_watch_is_empty());
    }

    #[test]
    fn test_display() {
        let mut a = Argument::new(0);
        assert_eq!("?1", a.to_string());
        a.set_value(Sign::Out, 2);
        a.replace_reason(Some(3));
        assert_eq!("-1@2<-3", a.to_string());
        a.set_value(Sign::In, 0);
        a.replace_reason(None);
        assert_eq!("1@0<-guess", a.to_string());
    }
}
