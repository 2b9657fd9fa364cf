use super::{ExtensionEnumerator, ModelHandler};
use crate::io::ProofWriter;
use crate::setaf::{Argument, ArgumentId, ClauseId, DecisionLevel, Heuristics, SetafInstance, Sign};
use crate::utils::{check_signal, InterruptedError};
use std::collections::HashSet;
use std::time::Instant;

enum ProofLineKind {
    Implicit,
    Learned,
    Deleted,
}

/// A CDCL-style solver enumerating the stable extensions of a SETAF instance.
///
/// The solver guesses argument values following the configured [`Heuristics`], propagates
/// them through the attack clauses with two watched arguments per clause, and maintains a
/// stability witness for every rejected argument: an attack on it whose attackers may all
/// still be accepted. Conflicts are analysed into learned clauses driving
/// non-chronological backtracking; the learned clause store is periodically shrunk, oldest
/// clauses first.
///
/// Models are delivered through the registered [`ModelHandler`] as they are found.
///
/// # Example
///
/// ```
/// # use rustaf::{ExtensionEnumerator, SimpleFormatReader, StableEnumerationSolver};
/// let mut instance = SimpleFormatReader
///     .read(&mut "2 1 0\n1 2 0\n".as_bytes())
///     .unwrap();
/// let mut models = Vec::new();
/// let mut solver = StableEnumerationSolver::new(&mut instance);
/// solver.set_model_handler(Box::new(|_, extension| {
///     models.push(extension.iter().map(|a| a.id()).collect::<Vec<usize>>());
/// }));
/// solver.enumerate_extensions().unwrap();
/// drop(solver);
/// assert_eq!(vec![vec![1]], models);
/// ```
pub struct StableEnumerationSolver<'a> {
    instance: &'a mut SetafInstance,
    heuristics: Heuristics,
    max_models: u64,
    forget_percentage: f64,
    growth_rate: f64,
    model_handler: Option<ModelHandler<'a>>,
    proof: Option<ProofWriter<'a>>,
    assigned: Vec<ArgumentId>,
    current_dl: DecisionLevel,
    backjumping_bound: DecisionLevel,
    next_guess_position: usize,
    forget_threshold: f64,
    model_count: u64,
    first_model_time: Option<Instant>,
    percentage_solved: f64,
    scratch_ids: HashSet<ArgumentId>,
    scratch_members: Vec<(ArgumentId, Sign)>,
}

impl<'a> StableEnumerationSolver<'a> {
    /// Builds a new solver for the given instance.
    ///
    /// By default no heuristics is applied, the number of models is unlimited, half of the
    /// learned clauses are forgotten when their number exceeds a threshold that doubles
    /// after each cleaning, no model handler is registered and no proof is written.
    pub fn new(instance: &'a mut SetafInstance) -> Self {
        let n_arguments = instance.n_arguments();
        StableEnumerationSolver {
            instance,
            heuristics: Heuristics::None,
            max_models: 0,
            forget_percentage: 0.5,
            growth_rate: 2.0,
            model_handler: None,
            proof: None,
            assigned: Vec::with_capacity(n_arguments),
            current_dl: 0,
            backjumping_bound: 0,
            next_guess_position: 0,
            forget_threshold: n_arguments as f64,
            model_count: 0,
            first_model_time: None,
            percentage_solved: 0.0,
            scratch_ids: HashSet::new(),
            scratch_members: Vec::new(),
        }
    }

    /// Sets the branching heuristics.
    pub fn set_heuristics(&mut self, heuristics: Heuristics) {
        self.heuristics = heuristics;
    }

    /// Sets the number of models after which the enumeration stops; 0 means no limit.
    pub fn set_max_models(&mut self, max_models: u64) {
        self.max_models = max_models;
    }

    /// Sets the fraction of learned clauses forgotten by a cleaning and the growth rate of
    /// the cleaning threshold.
    pub fn set_forgetting(&mut self, forget_percentage: f64, growth_rate: f64) {
        self.forget_percentage = forget_percentage;
        self.growth_rate = growth_rate;
    }

    /// Registers the callback function called each time a model is found.
    pub fn set_model_handler(&mut self, handler: ModelHandler<'a>) {
        self.model_handler = Some(handler);
    }

    /// Registers the writer receiving the enumeration proof.
    pub fn set_proof_writer(&mut self, writer: ProofWriter<'a>) {
        self.proof = Some(writer);
    }

    /// Returns the number of models found so far.
    pub fn n_models(&self) -> u64 {
        self.model_count
    }

    /// Returns the estimated fraction of the search space that has been explored.
    pub fn percentage_solved(&self) -> f64 {
        self.percentage_solved
    }

    /// Returns the time at which the first model was found, if any.
    pub fn first_model_time(&self) -> Option<Instant> {
        self.first_model_time
    }

    /// Records a full assignment as a model.
    ///
    /// Returns `true` when the requested number of models is reached.
    fn print_assignment(&mut self) -> bool {
        if self.model_count == 0 {
            self.first_model_time = Some(Instant::now());
        }
        self.model_count += 1;
        let model_count = self.model_count;
        let instance = &*self.instance;
        if let Some(handler) = self.model_handler.as_mut() {
            let extension: Vec<&Argument> = instance
                .arguments()
                .filter(|a| a.value() == Sign::In)
                .collect();
            (handler)(model_count, &extension);
        }
        self.max_models == self.model_count
    }

    fn write_proof_clause(&mut self, clause: ClauseId, kind: ProofLineKind) {
        if self.model_count != 0 {
            return;
        }
        let instance = &*self.instance;
        if let Some(proof) = self.proof.as_mut() {
            let literals: Vec<(&str, Sign)> = instance
                .clause(clause)
                .members()
                .iter()
                .map(|&(argument, sign)| (instance.argument(argument).name(), sign))
                .collect();
            match kind {
                ProofLineKind::Implicit => proof.write_implicit_clause(&literals),
                ProofLineKind::Learned => proof.write_learned_clause(&literals),
                ProofLineKind::Deleted => proof.write_deleted_clause(&literals),
            }
        }
    }

    /// Forgets the oldest learned clauses when their number exceeds the current threshold.
    fn check_and_forget_clauses(&mut self) {
        let n_learned = self.instance.n_learned_clauses() as f64;
        if n_learned > self.forget_threshold {
            let amount = (n_learned * self.forget_percentage) as usize;
            let forgotten = self.instance.forget_clauses(amount);
            for clause in forgotten {
                self.write_proof_clause(clause, ProofLineKind::Deleted);
            }
            self.forget_threshold *= self.growth_rate;
        }
    }

    /// Builds the clause stating that `argument` must be In or some attack on it must have
    /// an accepted attacker.
    ///
    /// For each attack on the argument, an attacker that is currently Out is selected,
    /// preferring the one assigned at the highest decision level so that resolution on the
    /// resulting clause remains possible.
    fn build_implicit_clause(&mut self, argument: ArgumentId) -> ClauseId {
        let attack_count = self.instance.argument(argument).attacked_by().len();
        let clause = self.instance.new_learned_clause(attack_count);
        self.instance.add_member(clause, argument, Sign::In);

        self.scratch_ids.clear();
        for attack_index in 0..attack_count {
            let attack = self.instance.argument(argument).attacked_by()[attack_index];
            if self.instance.clause(attack).is_self_attack() {
                continue;
            }
            let mut selected: Option<ArgumentId> = None;
            for i in 1..self.instance.clause(attack).len() {
                let (attacker, sign) = self.instance.clause(attack).member(i);
                let better = match selected {
                    None => true,
                    Some(s) => {
                        self.instance.argument(attacker).dl() > self.instance.argument(s).dl()
                    }
                };
                if better && self.instance.argument(attacker).value_at(self.current_dl) == sign {
                    selected = Some(attacker);
                    if self.instance.argument(attacker).dl() == self.current_dl {
                        break;
                    }
                }
            }
            debug_assert!(selected.is_some());
            if let Some(s) = selected {
                if self.scratch_ids.insert(s) {
                    let sign = self.instance.argument(s).value().flipped();
                    self.instance.add_member(clause, s, sign);
                }
            }
        }

        self.write_proof_clause(clause, ProofLineKind::Implicit);
        clause
    }

    /// Finds a new stability witness for an argument whose current witness got blocked.
    ///
    /// When `for_attack_index` is given, nothing is done unless it is still the witness of
    /// the argument; the search then starts at the following attack. The attacks on the
    /// argument are scanned round-robin; if none of them can serve as witness, the implicit
    /// clause of the argument is built and returned as the conflict.
    fn recompute_watched_attack(
        &mut self,
        argument: ArgumentId,
        for_attack_index: Option<usize>,
    ) -> Option<ClauseId> {
        // nothing to do if the argument is not currently out
        if self.instance.argument(argument).value_at(self.current_dl) != Sign::Out {
            return None;
        }

        let attack_count = self.instance.argument(argument).attacked_by().len();
        if attack_count == 0 {
            return Some(self.build_implicit_clause(argument));
        }

        let mut index = self.instance.argument(argument).watched_attack_index();
        if let Some(blocked_index) = for_attack_index {
            if index != blocked_index {
                return None;
            }
            // the current witness is known to be blocked, start at the next attack
            index += 1;
            if index == attack_count {
                index = 0;
            }
        }

        loop {
            let attack = self.instance.argument(argument).attacked_by()[index];
            if self.instance.attack_not_blocked(attack, self.current_dl) {
                self.instance.set_stability_witness(argument, attack, index);
                return None;
            }
            index += 1;
            if index == attack_count {
                index = 0;
            }
            if index == self.instance.argument(argument).watched_attack_index() {
                break;
            }
        }

        Some(self.build_implicit_clause(argument))
    }

    /// Restores the watched-argument invariant of a clause after an assignment.
    ///
    /// When `argument` is given, only its watch is verified; otherwise both watches are,
    /// one bounded pass each. A watch whose member became unsatisfied is moved to a member
    /// that is unassigned or satisfying; when no such member exists the clause asserts its
    /// other watch, and the result of that propagation is returned.
    ///
    /// `moved` is set when the verified watch left `argument`'s watch list, in which case
    /// the caller must revisit the current index of the list.
    fn check_clause(
        &mut self,
        clause: ClauseId,
        argument: Option<ArgumentId>,
        mut moved: Option<&mut bool>,
    ) -> Option<ClauseId> {
        // unit clauses are self-attacks and are handled at level 0 up front
        debug_assert!(
            self.instance.clause(clause).len() > 1 || !self.instance.clause(clause).is_attack()
        );

        let mut watch_is_first = match argument {
            Some(a) => {
                let c = self.instance.clause(clause);
                c.member(c.first_watch()).0 == a
            }
            None => true,
        };
        let passes = if argument.is_some() { 1 } else { 2 };

        for pass in 0..passes {
            if pass == 1 {
                watch_is_first = !watch_is_first;
            }
            let c = self.instance.clause(clause);
            let (start, other) = if watch_is_first {
                (c.first_watch(), c.second_watch())
            } else {
                (c.second_watch(), c.first_watch())
            };
            let len = c.len();

            let mut watch = start;
            loop {
                if watch != other {
                    let (member, sign) = self.instance.clause(clause).member(watch);
                    if self.instance.argument(member).value() != sign.flipped() {
                        // this member either already satisfies the clause or still could
                        break;
                    }
                }
                watch += 1;
                if watch == len {
                    watch = 0;
                }
                if watch == start {
                    // every member except the other watch is unsatisfied: assert it
                    let (member, sign) = self.instance.clause(clause).member(other);
                    return self.set_and_propagate(member, sign, Some(clause));
                }
            }

            let did_move = self.instance.move_watch(clause, watch_is_first, watch);
            if let Some(m) = moved.as_deref_mut() {
                *m = did_move;
            }
        }

        None
    }

    /// Assigns a value to an argument and propagates its consequences.
    ///
    /// Returns the conflicting clause when the propagation runs into a conflict, `None`
    /// otherwise.
    fn set_and_propagate(
        &mut self,
        argument: ArgumentId,
        value: Sign,
        reason: Option<ClauseId>,
    ) -> Option<ClauseId> {
        let a = self.instance.argument(argument);
        if a.dl() <= self.current_dl {
            if a.value() == value {
                return None;
            }
            // a guess is never made against an existing assignment
            debug_assert!(reason.is_some() || self.current_dl == 0);
            return reason;
        }

        self.assigned.push(argument);
        self.instance.assign(argument, value, self.current_dl, reason);

        // indexed iteration: the watch list is mutated while it is traversed
        let mut i = 0;
        while i < self.instance.argument(argument).watched_in_len() {
            let clause = self.instance.argument(argument).watched_in_at(i);
            if self.instance.clause(clause).is_forgotten() {
                // drop the stale entry; another clause was swapped into index i
                if self.instance.unwatch(argument, clause) {
                    self.instance.recycle_clause(clause);
                }
                continue;
            }
            if self.instance.watches_invalidated(clause, self.current_dl) {
                let mut moved = false;
                if let Some(conflict) = self.check_clause(clause, Some(argument), Some(&mut moved))
                {
                    return Some(conflict);
                }
                if moved {
                    continue;
                }
            }
            i += 1;
        }

        if value == Sign::In {
            return None;
        }

        // the argument is now out: every stability witness it supported is blocked
        while let Some((other, attack_index)) = self.instance.stability_watch_pop(argument) {
            if let Some(conflict) = self.recompute_watched_attack(other, Some(attack_index)) {
                self.instance
                    .stability_watch_push(argument, (other, attack_index));
                return Some(conflict);
            }
        }

        // an out assignment forced by an attack on the argument itself is witnessed by
        // that very attack; anything else requires a witness of its own
        let self_witnessed = reason.is_some_and(|r| {
            let clause = self.instance.clause(r);
            clause.is_attack() && clause.attacked_argument() == argument
        });
        if self_witnessed {
            None
        } else {
            self.recompute_watched_attack(argument, None)
        }
    }

    /// Analyses a conflict, learning a clause and computing the level to backtrack to.
    ///
    /// Returns `None` when the conflict cannot be resolved above level 0, ending the
    /// enumeration. Otherwise the returned clause is the conflicting clause itself (when
    /// it is already asserting, or when a flipped decision caused the conflict) or a
    /// freshly learned clause; the accompanying argument is the UIP to flip, or `None` in
    /// the flip case.
    fn resolve_conflict_and_update_dl(
        &mut self,
        conflicting: ClauseId,
    ) -> Option<(ClauseId, Option<ArgumentId>)> {
        // a flipped decision caused the conflict: no analysis, go down one level
        if self.current_dl == self.backjumping_bound {
            if self.current_dl == 0 {
                return None;
            }
            self.current_dl -= 1;
            self.backjumping_bound = self.current_dl;
            return Some((conflicting, None));
        }

        let members_len = self.instance.clause(conflicting).len();
        let (first, _) = self.instance.clause(conflicting).member(0);
        let mut uip = first;
        let mut highest_dl = self.instance.argument(first).dl();
        let mut second_highest_dl = usize::MAX;
        let mut at_max_dl = 1usize;
        for i in 1..members_len {
            let (argument, _) = self.instance.clause(conflicting).member(i);
            let dl = self.instance.argument(argument).dl();
            if dl > highest_dl {
                uip = argument;
                second_highest_dl = highest_dl;
                highest_dl = dl;
                at_max_dl = 1;
            } else if dl == highest_dl {
                at_max_dl += 1;
                if self.instance.argument(argument).reason().is_some() {
                    uip = argument;
                }
            } else if second_highest_dl == usize::MAX || dl > second_highest_dl {
                second_highest_dl = dl;
            }
        }

        // the highest level in the clause is 0: no further backtracking is possible
        if highest_dl == 0 {
            return None;
        }

        if second_highest_dl > highest_dl {
            second_highest_dl = 0;
        }

        // the conflicting clause is already asserting
        if at_max_dl == 1 {
            self.current_dl = std::cmp::max(self.backjumping_bound, second_highest_dl);
            return Some((conflicting, Some(uip)));
        }

        // resolve: keep the members below the highest level, process the others
        let learned = self.instance.new_learned_clause(1);
        self.scratch_members.clear();
        self.scratch_ids.clear();
        for i in 0..members_len {
            let (argument, sign) = self.instance.clause(conflicting).member(i);
            let inserted = self.scratch_ids.insert(argument);
            debug_assert!(inserted);
            if self.instance.argument(argument).dl() < highest_dl {
                self.instance.add_member(learned, argument, sign);
            } else {
                self.scratch_members.push((argument, sign));
            }
        }
        debug_assert!(!self.scratch_members.is_empty());

        while self.scratch_members.len() > 1 {
            let back = *self.scratch_members.last().expect("the work list is not empty");
            let (pivot, _) = if self.instance.argument(back.0).reason().is_some() {
                self.scratch_members.pop();
                back
            } else {
                // the back entry is the decision literal: resolve on the front instead
                self.scratch_members.swap_remove(0)
            };
            let reason = self
                .instance
                .argument(pivot)
                .reason()
                .expect("a resolution pivot has a reason");
            self.scratch_ids.remove(&pivot);
            for i in 0..self.instance.clause(reason).len() {
                let (member, sign) = self.instance.clause(reason).member(i);
                if member != pivot && self.scratch_ids.insert(member) {
                    let dl = self.instance.argument(member).dl();
                    if dl == highest_dl {
                        self.scratch_members.push((member, sign));
                    } else {
                        debug_assert!(dl < highest_dl);
                        self.instance.add_member(learned, member, sign);
                    }
                }
            }
        }

        // the remaining entry is the UIP; its literal closes the learned clause
        let (last_argument, last_sign) =
            *self.scratch_members.last().expect("the UIP remains in the work list");
        self.instance.add_member(learned, last_argument, last_sign);

        // backtrack to the second highest level of the learned clause, or 0 if the UIP is
        // its only member
        let mut new_highest = 0;
        let mut new_second = 0;
        for i in 0..self.instance.clause(learned).len() {
            let (argument, _) = self.instance.clause(learned).member(i);
            let dl = self.instance.argument(argument).dl();
            if dl > new_highest {
                new_second = new_highest;
                new_highest = dl;
            } else if dl > new_second {
                new_second = dl;
            }
        }
        self.current_dl = std::cmp::max(self.backjumping_bound, new_second);

        self.write_proof_clause(learned, ProofLineKind::Learned);
        Some((learned, Some(last_argument)))
    }

    /// Undoes all the assignments deeper than the current decision level.
    ///
    /// Returns the last popped argument, the decision literal of the uncovered level, and
    /// the value it had.
    fn backtrack_to_current_dl(&mut self) -> (Option<ArgumentId>, Sign) {
        debug_assert!(!self.assigned.is_empty());
        let mut last = None;
        let mut old_sign = Sign::In;
        while let Some(&argument) = self.assigned.last() {
            if self.instance.argument(argument).dl() <= self.current_dl {
                break;
            }
            old_sign = self.instance.argument(argument).value();
            self.instance.argument_mut(argument).reset();
            self.next_guess_position = self
                .next_guess_position
                .min(self.instance.argument(argument).position());
            self.assigned.pop();
            last = Some(argument);
        }
        (last, old_sign)
    }

    /// Resolves a conflict, backtracks and flips until the search can move on.
    ///
    /// Returns `false` when the conflict cannot be resolved above level 0, in which case
    /// the enumeration is finished.
    fn backtrack_for_clause(&mut self, conflicting: ClauseId) -> bool {
        let mut clause = Some(conflicting);
        while let Some(c) = clause {
            let prev_dl = self.current_dl;
            let (resolved, uip) = match self.resolve_conflict_and_update_dl(c) {
                None => return false,
                Some(r) => r,
            };

            if prev_dl != self.current_dl {
                match uip {
                    None => {
                        // flip the decision literal uncovered by the backtracking
                        let (argument, old_sign) = self.backtrack_to_current_dl();
                        let argument =
                            argument.expect("leaving a positive level pops its decision literal");
                        if !self.do_assignment(argument, old_sign.flipped(), None) {
                            return false;
                        }
                    }
                    Some(u) => {
                        let old_sign = self.instance.argument(u).value();
                        self.backtrack_to_current_dl();
                        if !self.do_assignment(u, old_sign.flipped(), Some(resolved)) {
                            return false;
                        }
                    }
                }
            }

            // the clause used for the analysis may now be asserting and propagate further
            clause = self.check_clause(resolved, None, None);
        }
        true
    }

    /// Performs an assignment, resolving the conflicts it may produce.
    ///
    /// Returns `true` iff the search goes on.
    fn do_assignment(&mut self, argument: ArgumentId, sign: Sign, reason: Option<ClauseId>) -> bool {
        match self.set_and_propagate(argument, sign, reason) {
            None => {
                if self.next_guess_position == self.instance.argument(argument).position() {
                    self.next_guess_position += 1;
                }
                true
            }
            Some(conflict) => self.backtrack_for_clause(conflict),
        }
    }

    /// Forces the assignments of the grounded extension before any branching.
    ///
    /// Returns `false` when a forced assignment conflicts, in which case the instance has
    /// no stable extension.
    fn compute_grounded(&mut self) -> bool {
        let n_attacks = self.instance.n_attacks();
        let n_arguments = self.instance.n_arguments();

        // per attack: the number of attackers not yet accepted, or none when the attack is
        // blocked by a rejected attacker, along with the attacked argument
        let mut attacks: Vec<(Option<usize>, ArgumentId)> = Vec::with_capacity(n_attacks);
        // per argument, the attacks in which it occurs as an attacker
        let mut attacking_in: Vec<Vec<ClauseId>> = vec![Vec::new(); n_arguments];
        // per argument, the number of non-blocked attacks directed at it
        let mut incoming_count = vec![0usize; n_arguments];

        for attack in 0..n_attacks {
            let attacked = self.instance.clause(attack).attacked_argument();
            let mut count = 0;
            let mut blocked = false;
            for i in 1..self.instance.clause(attack).len() {
                let (attacker, _) = self.instance.clause(attack).member(i);
                attacking_in[attacker].push(attack);
                if !blocked {
                    match self.instance.argument(attacker).value() {
                        Sign::Out => blocked = true,
                        Sign::Unassigned => count += 1,
                        Sign::In => {}
                    }
                }
            }
            if blocked {
                attacks.push((None, attacked));
            } else {
                incoming_count[attacked] += 1;
                attacks.push((Some(count), attacked));
            }
        }

        // the arguments to assign, with the attack forcing them out or none to force in
        let mut to_do: Vec<(ArgumentId, Option<ClauseId>)> = Vec::new();
        for (argument, &count) in incoming_count.iter().enumerate() {
            if count == 0 {
                to_do.push((argument, None));
            }
        }
        for (attack, &(count, attacked)) in attacks.iter().enumerate() {
            if count == Some(0) {
                to_do.push((attacked, Some(attack)));
            }
        }

        while let Some((argument, reason)) = to_do.pop() {
            let sign = if reason.is_none() { Sign::In } else { Sign::Out };

            if self.proof.is_some()
                && self.instance.argument(argument).value_at(0) == Sign::Unassigned
            {
                self.build_implicit_clause(argument);
            }

            if self.set_and_propagate(argument, sign, reason).is_some() {
                return false;
            }

            for &attack in &attacking_in[argument] {
                let (count, attacked) = &mut attacks[attack];
                let attacked = *attacked;
                if count.is_none() {
                    continue;
                }
                if sign == Sign::Out {
                    // the attack is now blocked for good
                    *count = None;
                    incoming_count[attacked] -= 1;
                    if incoming_count[attacked] == 0 {
                        // its last unblocked attack is gone, the argument must be in
                        to_do.push((attacked, None));
                    }
                } else if let Some(c) = count.as_mut() {
                    *c -= 1;
                    if *c == 0 {
                        // all the attackers are in, the attacked argument must be out
                        to_do.push((attacked, Some(attack)));
                    }
                }
            }
        }

        true
    }

    fn explored_fraction(&self, sorted_arguments: &[ArgumentId], guess_order: &[Sign]) -> f64 {
        let mut fraction = 0.0;
        for (i, &argument) in sorted_arguments.iter().enumerate() {
            if self.instance.argument(argument).value_at(self.current_dl)
                == guess_order[i].flipped()
            {
                fraction += 0.5f64.powi(i as i32 + 1);
            }
        }
        fraction
    }

    /// Runs the stable enumeration, returning the explored fraction of the search space.
    fn enumerate_stable(&mut self) -> Result<f64, InterruptedError> {
        // with no argument, the empty set is the only extension
        if self.instance.n_arguments() == 0 {
            self.print_assignment();
            return Ok(1.0);
        }

        // an argument whose sole attacker in some attack is itself is out
        for attack in 0..self.instance.n_attacks() {
            if self.instance.clause(attack).len() == 1 {
                let attacked = self.instance.clause(attack).attacked_argument();
                if self.set_and_propagate(attacked, Sign::Out, None).is_some() {
                    return Ok(1.0);
                }
            }
        }

        // the assignments required by the caller
        for i in 0..self.instance.required_arguments().len() {
            let (argument, sign) = self.instance.required_arguments()[i];
            if self.instance.argument(argument).value().flipped() == sign
                || self.set_and_propagate(argument, sign, None).is_some()
            {
                return Ok(1.0);
            }
        }

        // the grounded extension is the base of every stable extension
        if !self.compute_grounded() {
            return Ok(1.0);
        }

        let heuristics = self.heuristics;
        let (sorted_arguments, guess_order) = heuristics.apply(self.instance, self.current_dl);

        loop {
            if let Err(interrupted) = check_signal() {
                self.percentage_solved = self.explored_fraction(&sorted_arguments, &guess_order);
                return Err(interrupted);
            }

            self.check_and_forget_clauses();

            if self.next_guess_position == sorted_arguments.len() {
                // a full assignment
                if self.print_assignment() {
                    // the requested number of models is found
                    self.percentage_solved =
                        self.explored_fraction(&sorted_arguments, &guess_order);
                    return Ok(1.0);
                }

                if self.current_dl == 0 {
                    return Ok(1.0);
                }

                // flip the last decision literal
                self.current_dl -= 1;
                self.backjumping_bound = self.current_dl;
                let (argument, old_sign) = self.backtrack_to_current_dl();
                let argument = argument.expect("leaving a positive level pops its decision literal");
                if !self.do_assignment(argument, old_sign.flipped(), None) {
                    return Ok(1.0);
                }
                continue;
            }

            let argument = sorted_arguments[self.next_guess_position];
            if self.instance.argument(argument).value() != Sign::Unassigned {
                self.next_guess_position += 1;
                continue;
            }

            // guess the next argument
            self.current_dl += 1;
            if !self.do_assignment(argument, guess_order[self.next_guess_position], None) {
                return Ok(1.0);
            }
        }
    }
}

impl ExtensionEnumerator for StableEnumerationSolver<'_> {
    fn enumerate_extensions(&mut self) -> Result<(), InterruptedError> {
        let result = self.enumerate_stable();
        if let Ok(fraction) = result {
            self.percentage_solved = fraction;
        }
        if self.model_count == 0 {
            if let Some(proof) = self.proof.as_mut() {
                proof.write_unsatisfiable();
            }
        }
        result.map(|_| ())
    }
}
