use super::{ArgumentId, DecisionLevel, SetafInstance, Sign};
use anyhow::anyhow;
use std::str::FromStr;

/// The branching heuristics of the solver.
///
/// A heuristics mode orders the unassigned arguments before the search starts and provides
/// an initial guess sign for each of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Heuristics {
    /// Keep the arguments in id order.
    None,
    /// Most attacks as an attacker first.
    MaxOutDegree,
    /// Fewest incoming attacks first.
    MinInDegree,
    /// Order by the weighted number of attack paths of length up to `k` through an
    /// argument, longer paths counting exponentially less.
    PathLength(u16),
    /// Like [`Heuristics::PathLength`], corrected by an alternating-sign count of the
    /// paths ending at the argument.
    PathLengthModified(u16),
}

impl FromStr for Heuristics {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => return Ok(Heuristics::None),
            "MaxOutDegree" => return Ok(Heuristics::MaxOutDegree),
            "MinInDegree" => return Ok(Heuristics::MinInDegree),
            _ => {}
        }
        if let Some(param) = s.strip_prefix("PathLengthModified") {
            if let Ok(k) = param.parse::<u16>() {
                return Ok(Heuristics::PathLengthModified(k));
            }
        } else if let Some(param) = s.strip_prefix("PathLength") {
            if let Ok(k) = param.parse::<u16>() {
                return Ok(Heuristics::PathLength(k));
            }
        }
        Err(anyhow!("unknown heuristics: {}", s))
    }
}

/// Returns, for each argument, the arguments involved in some attack directed at it.
fn compute_attackers(instance: &SetafInstance) -> Vec<Vec<ArgumentId>> {
    let mut result = vec![Vec::new(); instance.n_arguments()];
    for attack in 0..instance.n_attacks() {
        let members = instance.clause(attack).members();
        let attacked = members[0].0;
        for &(attacker, _) in &members[1..] {
            result[attacked].push(attacker);
        }
    }
    result
}

/// Computes for each argument the value sum_{i=1..k} p_i / 2^i, where p_i counts the attack
/// paths of length i through the argument.
///
/// One scratch array holds the counts for the previous length while the other is filled
/// with the counts for the current one.
fn compute_path_length(
    instance: &SetafInstance,
    requested_length: u16,
    attackers: &[Vec<ArgumentId>],
) -> Vec<f64> {
    let n = instance.n_arguments();
    let mut values = vec![0.0; n];
    let mut prev = vec![0u64; n];
    let mut working = vec![0u64; n];

    for (i, value) in values.iter_mut().enumerate() {
        let degree = instance.argument(i).heuristics_value();
        prev[i] = degree as u64;
        *value = degree / 2.0;
    }

    for path_length in 2..=requested_length {
        for i in 0..n {
            working[i] = attackers[i].iter().map(|&a| prev[a]).sum();
            values[i] += working[i] as f64 / 2f64.powi(i32::from(path_length));
        }
        std::mem::swap(&mut prev, &mut working);
    }

    values
}

/// Adds to each argument's value the correction sum_{i=1..k} q_i / (-2)^i - d/2, where q_i
/// counts the reversed attack paths of length i and d is the number of incoming attacks.
fn compute_modified_path_length(
    instance: &SetafInstance,
    requested_length: u16,
    values: &mut [f64],
) {
    let n = instance.n_arguments();
    let mut prev = vec![0u64; n];
    let mut working = vec![0u64; n];

    for (i, value) in values.iter_mut().enumerate() {
        let incoming = instance.argument(i).attacked_by().len();
        prev[i] = incoming as u64;
        *value += incoming as f64 / -2.0;
    }

    for path_length in 2..=requested_length {
        for i in 0..n {
            working[i] = instance
                .argument(i)
                .attacked_by()
                .iter()
                .flat_map(|&attack| instance.clause(attack).members()[1..].iter())
                .map(|&(attacker, _)| prev[attacker])
                .sum();
            values[i] += working[i] as f64 / (-2f64).powi(i32::from(path_length));
        }
        std::mem::swap(&mut prev, &mut working);
    }

    for (i, value) in values.iter_mut().enumerate() {
        *value -= (instance.argument(i).attacked_by().len() / 2) as f64;
    }
}

impl Heuristics {
    /// Orders the arguments that are still unassigned at the given level.
    ///
    /// The heuristics values and positions of the instance's arguments are updated; the
    /// sorted argument ids are returned together with an initial guess sign for each.
    pub fn apply(
        &self,
        instance: &mut SetafInstance,
        dl: DecisionLevel,
    ) -> (Vec<ArgumentId>, Vec<Sign>) {
        if let Heuristics::PathLength(k) | Heuristics::PathLengthModified(k) = *self {
            let attackers = compute_attackers(instance);
            let mut values = compute_path_length(instance, k, &attackers);
            if let Heuristics::PathLengthModified(_) = *self {
                compute_modified_path_length(instance, k, &mut values);
            }
            for (i, &value) in values.iter().enumerate() {
                instance.argument_mut(i).set_heuristics_value(value);
            }
        }

        let mut arguments: Vec<ArgumentId> = (0..instance.n_arguments()).collect();

        // project to the arguments without a set value
        let mut i = 0;
        while i < arguments.len() {
            if instance.argument(arguments[i]).value_at(dl) != Sign::Unassigned {
                arguments.swap_remove(i);
            } else {
                i += 1;
            }
        }

        match self {
            Heuristics::None => {}
            Heuristics::MinInDegree => {
                arguments.sort_unstable_by_key(|&a| instance.argument(a).attacked_by().len())
            }
            Heuristics::MaxOutDegree
            | Heuristics::PathLength(_)
            | Heuristics::PathLengthModified(_) => arguments.sort_unstable_by(|&a, &b| {
                instance
                    .argument(b)
                    .heuristics_value()
                    .total_cmp(&instance.argument(a).heuristics_value())
            }),
        }

        for (position, &a) in arguments.iter().enumerate() {
            instance.argument_mut(a).set_position(position);
        }

        let guess_order = vec![Sign::In; arguments.len()];
        (arguments, guess_order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2 <- {1}, 3 <- {1}, 3 <- {2}, with the heuristics values the reader would seed
    fn chain_instance() -> SetafInstance {
        let mut instance = SetafInstance::new(3, 3);
        instance.set_attacked(0, 1);
        instance.add_member(0, 0, Sign::Out);
        instance.set_attacked(1, 2);
        instance.add_member(1, 0, Sign::Out);
        instance.set_attacked(2, 2);
        instance.add_member(2, 1, Sign::Out);
        instance.argument_mut(0).set_heuristics_value(2.0);
        instance.argument_mut(1).set_heuristics_value(1.0);
        instance.argument_mut(2).set_heuristics_value(0.0);
        instance
    }

    #[test]
    fn test_from_str() {
        assert_eq!(Heuristics::None, "None".parse().unwrap());
        assert_eq!(Heuristics::MaxOutDegree, "MaxOutDegree".parse().unwrap());
        assert_eq!(Heuristics::MinInDegree, "MinInDegree".parse().unwrap());
        assert_eq!(Heuristics::PathLength(3), "PathLength3".parse().unwrap());
        assert_eq!(
            Heuristics::PathLengthModified(2),
            "PathLengthModified2".parse().unwrap()
        );
        assert!("PathLength".parse::<Heuristics>().is_err());
        assert!("MaxInDegree".parse::<Heuristics>().is_err());
        assert!("".parse::<Heuristics>().is_err());
    }

    #[test]
    fn test_none_keeps_id_order() {
        let mut instance = chain_instance();
        let (order, guesses) = Heuristics::None.apply(&mut instance, 0);
        assert_eq!(vec![0, 1, 2], order);
        assert_eq!(vec![Sign::In; 3], guesses);
        for (position, &a) in order.iter().enumerate() {
            assert_eq!(position, instance.argument(a).position());
        }
    }

    #[test]
    fn test_none_drops_assigned_arguments() {
        let mut instance = chain_instance();
        instance.assign(1, Sign::Out, 0, None);
        let (order, guesses) = Heuristics::None.apply(&mut instance, 0);
        assert_eq!(vec![0, 2], order);
        assert_eq!(2, guesses.len());
    }

    #[test]
    fn test_max_out_degree() {
        let mut instance = chain_instance();
        let (order, _) = Heuristics::MaxOutDegree.apply(&mut instance, 0);
        assert_eq!(vec![0, 1, 2], order);
    }

    #[test]
    fn test_min_in_degree() {
        let mut instance = chain_instance();
        let (order, _) = Heuristics::MinInDegree.apply(&mut instance, 0);
        // incoming attack counts are 0, 1 and 2
        assert_eq!(vec![0, 1, 2], order);
    }

    #[test]
    fn test_path_length_values() {
        let mut instance = chain_instance();
        let (order, _) = Heuristics::PathLength(2).apply(&mut instance, 0);
        // paths of length 1: 2, 1, 0; length 2 collected per attacked argument: 0, 2, 3
        assert_eq!(1.0, instance.argument(0).heuristics_value());
        assert_eq!(1.0, instance.argument(1).heuristics_value());
        assert_eq!(0.75, instance.argument(2).heuristics_value());
        assert_eq!(2, order[2]);
    }

    #[test]
    fn test_path_length_modified_values() {
        let mut instance = chain_instance();
        let (order, _) = Heuristics::PathLengthModified(1).apply(&mut instance, 0);
        // the length-1 terms minus half of the incoming degree, integer halving included
        assert_eq!(1.0, instance.argument(0).heuristics_value());
        assert_eq!(0.0, instance.argument(1).heuristics_value());
        assert_eq!(-2.0, instance.argument(2).heuristics_value());
        assert_eq!(vec![0, 1, 2], order);
    }
}
