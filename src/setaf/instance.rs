use super::{Argument, ArgumentId, Clause, ClauseId, ClauseType, DecisionLevel, Sign};
use std::collections::VecDeque;

/// A SETAF instance: the owner of all arguments and clauses.
///
/// Arguments and original attacks are created at parse time and never destroyed.
/// Learned clauses are allocated from a recycling pool when possible; a clause marked as
/// forgotten while still referenced moves to the forgotten list and becomes available again
/// once its usage counter reaches zero.
///
/// Arguments and clauses reference each other by index into the two arenas owned by this
/// type, so every mutation that affects a usage counter (watching, unwatching, reason swaps,
/// forgetting, recycling) goes through methods of this type.
pub struct SetafInstance {
    arguments: Vec<Argument>,
    n_attacks: usize,
    clauses: Vec<Clause>,
    required: Vec<(ArgumentId, Sign)>,
    learned: VecDeque<ClauseId>,
    forgotten: Vec<ClauseId>,
    available: Vec<ClauseId>,
    next_clause_id: usize,
}

impl SetafInstance {
    /// Builds a new instance with the given numbers of arguments and attacks.
    ///
    /// The attacks occupy the first `n_attacks` slots of the clause arena, so an attack's
    /// slot index is also its id. Their members are filled in afterwards, normally by a
    /// reader.
    pub fn new(n_arguments: usize, n_attacks: usize) -> Self {
        let arguments = (0..n_arguments).map(Argument::new).collect();
        let clauses = (0..n_attacks)
            .map(|i| Clause::new(i, 0, ClauseType::Attack))
            .collect();
        SetafInstance {
            arguments,
            n_attacks,
            clauses,
            required: Vec::new(),
            learned: VecDeque::new(),
            forgotten: Vec::new(),
            available: Vec::new(),
            next_clause_id: n_attacks,
        }
    }

    /// Returns the number of arguments of this instance.
    pub fn n_arguments(&self) -> usize {
        self.arguments.len()
    }

    /// Returns the number of attacks of this instance.
    pub fn n_attacks(&self) -> usize {
        self.n_attacks
    }

    /// Returns the argument with the given id.
    pub fn argument(&self, id: ArgumentId) -> &Argument {
        &self.arguments[id]
    }

    pub(crate) fn argument_mut(&mut self, id: ArgumentId) -> &mut Argument {
        &mut self.arguments[id]
    }

    /// Returns an iterator over the arguments, in id order.
    pub fn arguments(&self) -> impl Iterator<Item = &Argument> + '_ {
        self.arguments.iter()
    }

    /// Returns the clause stored in the given slot.
    pub fn clause(&self, id: ClauseId) -> &Clause {
        &self.clauses[id]
    }

    /// Adds an entry to the required assignments of this instance.
    pub fn add_required_argument(&mut self, argument: ArgumentId, sign: Sign) {
        self.required.push((argument, sign));
    }

    /// Returns the required assignments of this instance.
    pub fn required_arguments(&self) -> &[(ArgumentId, Sign)] {
        &self.required
    }

    /// Sets the attacked argument of an attack under construction.
    ///
    /// The attack must have no member yet; the argument is recorded as attacked by it.
    pub fn set_attacked(&mut self, attack: ClauseId, argument: ArgumentId) {
        debug_assert!(self.clauses[attack].is_empty());
        self.add_member(attack, argument, Sign::Out);
        self.arguments[argument].add_attacked_by(attack);
    }

    /// Appends a member to a clause, registering the watch when the member is one of the
    /// first two.
    pub fn add_member(&mut self, clause: ClauseId, argument: ArgumentId, sign: Sign) {
        if self.clauses[clause].push_member(argument, sign) {
            self.watch(argument, clause);
        }
    }

    /// Marks an attack under construction as a self-attack.
    pub fn mark_as_self_attack(&mut self, attack: ClauseId) {
        self.clauses[attack].mark_as_self_attack();
    }

    /// Makes `argument` watch `clause`, incrementing the clause's usage counter.
    pub(crate) fn watch(&mut self, argument: ArgumentId, clause: ClauseId) {
        self.clauses[clause].increment_usage();
        self.arguments[argument].add_watched_in(clause);
    }

    /// Removes `clause` from the watch list of `argument`.
    ///
    /// Returns `true` if the usage counter of the clause reached zero; the caller decides
    /// whether to recycle.
    pub(crate) fn unwatch(&mut self, argument: ArgumentId, clause: ClauseId) -> bool {
        self.arguments[argument].remove_watched_in(clause);
        self.clauses[clause].decrement_usage()
    }

    /// Moves one watch of a clause to a new member index.
    ///
    /// Does nothing and returns `false` when the watch already points there; otherwise the
    /// clause leaves the old member's watch list and enters the new member's, and `true` is
    /// returned.
    pub(crate) fn move_watch(&mut self, clause: ClauseId, is_first: bool, index: usize) -> bool {
        let c = &self.clauses[clause];
        let old = if is_first {
            c.first_watch()
        } else {
            c.second_watch()
        };
        if old == index {
            return false;
        }
        let old_argument = c.member(old).0;
        let new_argument = c.member(index).0;
        // The counter dips and rises again; no recycling decision is taken in between.
        self.unwatch(old_argument, clause);
        self.watch(new_argument, clause);
        self.clauses[clause].set_watch_index(is_first, index);
        true
    }

    /// Returns `true` if both watched members of the clause fail to match their expected
    /// sign at the given level.
    ///
    /// Assumes at least one watched member is assigned.
    pub(crate) fn watches_invalidated(&self, clause: ClauseId, dl: DecisionLevel) -> bool {
        let c = &self.clauses[clause];
        let (first_argument, first_sign) = c.member(c.first_watch());
        let (second_argument, second_sign) = c.member(c.second_watch());
        self.arguments[first_argument].value_at(dl) != first_sign
            && self.arguments[second_argument].value_at(dl) != second_sign
    }

    /// Returns `true` if the attack can still become a stability witness: it is not a
    /// self-attack and none of its attackers is Out at the given level.
    pub(crate) fn attack_not_blocked(&self, attack: ClauseId, dl: DecisionLevel) -> bool {
        let c = &self.clauses[attack];
        if c.is_self_attack() {
            return false;
        }
        debug_assert!(c.is_attack());
        c.members()
            .iter()
            .skip(1)
            .all(|&(argument, _)| self.arguments[argument].value_at(dl) != Sign::Out)
    }

    /// Assigns a value to an argument and swaps its reason.
    ///
    /// The new reason's usage counter is incremented before the prior reason's counter is
    /// released, so a clause serving as both survives.
    pub(crate) fn assign(
        &mut self,
        argument: ArgumentId,
        value: Sign,
        dl: DecisionLevel,
        reason: Option<ClauseId>,
    ) {
        if let Some(r) = reason {
            self.clauses[r].increment_usage();
        }
        let prior = self.arguments[argument].replace_reason(reason);
        self.arguments[argument].set_value(value, dl);
        if let Some(p) = prior {
            self.release_reference(p);
        }
    }

    /// Decrements a clause's usage counter, recycling it when the counter reaches zero and
    /// the clause is forgotten.
    pub(crate) fn release_reference(&mut self, clause: ClauseId) {
        if self.clauses[clause].decrement_usage() {
            self.recycle_clause(clause);
        }
    }

    /// Sets the stability witness of an argument and registers the argument on the
    /// stability watch of every attacker of the witness.
    pub(crate) fn set_stability_witness(
        &mut self,
        argument: ArgumentId,
        attack: ClauseId,
        attack_index: usize,
    ) {
        self.arguments[argument].set_watched_attack_index(attack_index);
        for i in 1..self.clauses[attack].len() {
            let (attacker, _) = self.clauses[attack].member(i);
            self.arguments[attacker].stability_watch_push(argument, attack_index);
        }
    }

    pub(crate) fn stability_watch_pop(&mut self, argument: ArgumentId) -> Option<(ArgumentId, usize)> {
        self.arguments[argument].stability_watch_pop()
    }

    pub(crate) fn stability_watch_push(
        &mut self,
        argument: ArgumentId,
        entry: (ArgumentId, usize),
    ) {
        self.arguments[argument].stability_watch_push(entry.0, entry.1);
    }

    /// Returns a fresh learned clause slot, recycling an available one when possible.
    pub(crate) fn new_learned_clause(&mut self, capacity: usize) -> ClauseId {
        let slot = match self.available.pop() {
            Some(slot) => {
                let clause = &mut self.clauses[slot];
                clause.reset(ClauseType::Learned);
                clause.set_id(self.next_clause_id);
                slot
            }
            None => {
                self.clauses
                    .push(Clause::new(self.next_clause_id, capacity, ClauseType::Learned));
                self.clauses.len() - 1
            }
        };
        self.next_clause_id += 1;
        self.learned.push_back(slot);
        slot
    }

    /// Returns the number of learned clauses that have not been forgotten yet.
    pub fn n_learned_clauses(&self) -> usize {
        self.learned.len()
    }

    /// Forgets the given number of learned clauses, oldest first.
    ///
    /// Unreferenced clauses go straight back to the available pool; the others move to the
    /// forgotten list until their last reference is dropped. The forgotten slots are
    /// returned so that the caller can emit proof deletion lines.
    pub(crate) fn forget_clauses(&mut self, mut amount: usize) -> Vec<ClauseId> {
        debug_assert!(amount <= self.learned.len());
        let mut result = Vec::with_capacity(amount);
        while amount > 0 {
            amount -= 1;
            let slot = self
                .learned
                .pop_front()
                .expect("fewer learned clauses than requested");
            if self.clauses[slot].is_not_used() {
                self.available.push(slot);
            } else {
                self.clauses[slot].mark_as_forgotten(self.forgotten.len());
                self.forgotten.push(slot);
            }
            result.push(slot);
        }
        result
    }

    /// Moves a forgotten clause from the forgotten list to the available pool.
    ///
    /// Does nothing if the clause is not marked as forgotten.
    pub(crate) fn recycle_clause(&mut self, clause: ClauseId) {
        if !self.clauses[clause].is_forgotten() {
            return;
        }
        let index = self.clauses[clause].forgotten_index();
        debug_assert!(index < self.forgotten.len());
        self.forgotten.swap_remove(index);
        if index < self.forgotten.len() {
            let displaced = self.forgotten[index];
            self.clauses[displaced].set_forgotten_index(index);
        }
        self.available.push(clause);
    }

    #[cfg(test)]
    pub(crate) fn n_clause_slots(&self) -> usize {
        self.clauses.len()
    }

    #[cfg(test)]
    pub(crate) fn n_available_clauses(&self) -> usize {
        self.available.len()
    }

    #[cfg(test)]
    pub(crate) fn n_forgotten_clauses(&self) -> usize {
        self.forgotten.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance_with_attack() -> SetafInstance {
        // 1 <- {2, 3}
        let mut instance = SetafInstance::new(3, 1);
        instance.set_attacked(0, 0);
        instance.add_member(0, 1, Sign::Out);
        instance.add_member(0, 2, Sign::Out);
        instance
    }

    #[test]
    fn test_attack_construction() {
        let instance = instance_with_attack();
        assert_eq!(3, instance.n_arguments());
        assert_eq!(1, instance.n_attacks());
        let attack = instance.clause(0);
        assert_eq!(0, attack.attacked_argument());
        assert_eq!(3, attack.len());
        assert_eq!(&[0], instance.argument(0).attacked_by());
        // the first two members watch the attack
        assert_eq!(1, instance.argument(0).watched_in_len());
        assert_eq!(1, instance.argument(1).watched_in_len());
        assert_eq!(0, instance.argument(2).watched_in_len());
        assert_eq!(2, attack.usage_counter());
    }

    #[test]
    fn test_move_watch_updates_both_sides() {
        let mut instance = instance_with_attack();
        assert!(instance.move_watch(0, true, 2));
        assert_eq!(0, instance.argument(0).watched_in_len());
        assert_eq!(1, instance.argument(2).watched_in_len());
        assert_eq!(2, instance.clause(0).first_watch());
        assert_eq!(2, instance.clause(0).usage_counter());
        // moving to the current index is a no-op
        assert!(!instance.move_watch(0, true, 2));
    }

    #[test]
    fn test_watches_invalidated() {
        let mut instance = instance_with_attack();
        assert!(!instance.watches_invalidated(0, 0));
        instance.assign(0, Sign::In, 0, None);
        assert!(!instance.watches_invalidated(0, 0));
        instance.assign(1, Sign::In, 0, None);
        assert!(instance.watches_invalidated(0, 0));
    }

    #[test]
    fn test_attack_not_blocked() {
        let mut instance = instance_with_attack();
        assert!(instance.attack_not_blocked(0, 0));
        instance.assign(2, Sign::Out, 0, None);
        assert!(!instance.attack_not_blocked(0, 0));
    }

    #[test]
    fn test_self_attack_is_always_blocked() {
        let mut instance = SetafInstance::new(1, 1);
        instance.set_attacked(0, 0);
        instance.mark_as_self_attack(0);
        assert!(!instance.attack_not_blocked(0, 0));
    }

    #[test]
    fn test_learned_clause_recycling() {
        let mut instance = SetafInstance::new(2, 0);
        let c = instance.new_learned_clause(2);
        assert_eq!(1, instance.n_learned_clauses());
        instance.add_member(c, 0, Sign::In);
        instance.add_member(c, 1, Sign::Out);

        // keep a reference through a reason pointer, then forget
        instance.assign(0, Sign::In, 0, Some(c));
        let forgotten = instance.forget_clauses(1);
        assert_eq!(vec![c], forgotten);
        assert_eq!(0, instance.n_learned_clauses());
        assert_eq!(1, instance.n_forgotten_clauses());
        assert!(instance.clause(c).is_forgotten());

        // dropping the watches leaves the reason as the only reference
        instance.unwatch(0, c);
        assert!(instance.unwatch(1, c));
        instance.recycle_clause(c);
        assert_eq!(0, instance.n_forgotten_clauses());
        assert_eq!(1, instance.n_available_clauses());

        // the slot is reused with a fresh id
        let id_before = instance.clause(c).id();
        let reused = instance.new_learned_clause(1);
        assert_eq!(c, reused);
        assert!(instance.clause(reused).is_empty());
        assert!(instance.clause(reused).id() > id_before);
        assert_eq!(0, instance.n_available_clauses());
    }

    #[test]
    fn test_forget_unreferenced_clause_goes_straight_to_pool() {
        let mut instance = SetafInstance::new(2, 0);
        let c = instance.new_learned_clause(2);
        instance.add_member(c, 0, Sign::In);
        instance.add_member(c, 1, Sign::Out);
        instance.unwatch(0, c);
        instance.unwatch(1, c);
        instance.forget_clauses(1);
        assert_eq!(0, instance.n_forgotten_clauses());
        assert_eq!(1, instance.n_available_clauses());
    }

    #[test]
    fn test_assign_releases_prior_reason() {
        let mut instance = SetafInstance::new(1, 0);
        let c = instance.new_learned_clause(1);
        instance.add_member(c, 0, Sign::Out);
        instance.unwatch(0, c);
        instance.assign(0, Sign::Out, 1, Some(c));
        assert_eq!(1, instance.clause(c).usage_counter());
        instance.argument_mut(0).reset();
        instance.forget_clauses(1);
        assert!(instance.clause(c).is_forgotten());
        // re-assigning drops the stale reason and recycles the forgotten clause
        instance.assign(0, Sign::In, 1, None);
        assert_eq!(1, instance.n_available_clauses());
    }

    #[test]
    fn test_required_arguments() {
        let mut instance = SetafInstance::new(2, 0);
        instance.add_required_argument(1, Sign::Out);
        instance.add_required_argument(0, Sign::In);
        assert_eq!(&[(1, Sign::Out), (0, Sign::In)], instance.required_arguments());
    }
}
