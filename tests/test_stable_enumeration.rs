use rustaf::{
    ArgumentNameIndex, ExtensionEnumerator, Heuristics, ProofWriter, SetafInstance, Sign,
    SimpleFormatReader, StableEnumerationSolver,
};

fn read_instance(text: &str) -> SetafInstance {
    SimpleFormatReader.read(&mut text.as_bytes()).unwrap()
}

fn enumerate(instance: &mut SetafInstance) -> Vec<Vec<usize>> {
    let mut models: Vec<Vec<usize>> = Vec::new();
    {
        let mut solver = StableEnumerationSolver::new(instance);
        solver.set_model_handler(Box::new(|_, extension| {
            models.push(extension.iter().map(|a| a.id()).collect());
        }));
        solver.enumerate_extensions().unwrap();
    }
    models.sort();
    models
}

fn stable_extensions(text: &str) -> Vec<Vec<usize>> {
    enumerate(&mut read_instance(text))
}

/// Computes the stable extensions by brute force, straight from the definition.
fn brute_force_extensions(instance: &SetafInstance) -> Vec<Vec<usize>> {
    let n = instance.n_arguments();
    assert!(n <= 16, "brute force is exponential");
    let mut result = Vec::new();
    for candidate in 0u32..(1 << n) {
        let accepted = |a: usize| candidate & (1 << a) != 0;
        let mut conflict_free = true;
        let mut attacked = vec![false; n];
        for attack in 0..instance.n_attacks() {
            let members = instance.clause(attack).members();
            let mut all_in = members[1..].iter().all(|&(a, _)| accepted(a));
            if instance.clause(attack).is_self_attack() {
                // the attacked argument belongs to the attacker set too
                all_in = all_in && accepted(members[0].0);
            }
            if all_in {
                if accepted(members[0].0) {
                    conflict_free = false;
                    break;
                }
                attacked[members[0].0] = true;
            }
        }
        let stable =
            conflict_free && (0..n).all(|a| accepted(a) || attacked[a]);
        if stable {
            result.push((0..n).filter(|&a| accepted(a)).collect());
        }
    }
    result.sort();
    result
}

#[test]
fn test_two_arguments_no_attacks() {
    assert_eq!(vec![vec![0, 1]], stable_extensions("2 0 0\n"));
}

#[test]
fn test_single_attack() {
    assert_eq!(vec![vec![1]], stable_extensions("2 1 0\n1 2 0\n"));
}

#[test]
fn test_mutual_attack_and_collective_attack() {
    let models = stable_extensions("3 3 0\n1 2 0\n2 1 0\n3 1 2 0\n");
    assert_eq!(vec![vec![0, 2], vec![1, 2]], models);
}

#[test]
fn test_self_attacking_argument_has_no_model() {
    assert_eq!(Vec::<Vec<usize>>::new(), stable_extensions("1 1 0\n1 1 0\n"));
}

#[test]
fn test_grounded_chain() {
    let models = stable_extensions("4 3 0\n3 1 0\n3 2 0\n4 3 0\n");
    assert_eq!(vec![vec![0, 1, 3]], models);
}

#[test]
fn test_subsumed_attack_is_dropped() {
    let instance = read_instance("3 2 0\n3 1 0\n3 1 2 0\n");
    assert_eq!(1, instance.n_attacks());
    let with_subsumed = stable_extensions("3 2 0\n3 1 0\n3 1 2 0\n");
    let without = stable_extensions("3 1 0\n3 1 0\n");
    assert_eq!(without, with_subsumed);
}

#[test]
fn test_enumeration_matches_brute_force() {
    let texts = [
        "2 0 0\n",
        "2 1 0\n1 2 0\n",
        "3 3 0\n1 2 0\n2 1 0\n3 1 2 0\n",
        "4 4 0\n1 2 0\n2 1 0\n3 1 2 0\n4 3 0\n",
        "5 5 0\n1 2 0\n2 1 0\n3 1 2 0\n4 3 5 0\n5 4 0\n",
        "6 6 0\n1 2 0\n2 1 0\n3 4 0\n4 3 0\n5 1 3 0\n6 5 0\n",
        "3 3 0\n2 1 0\n3 2 0\n1 3 0\n",
        "4 5 0\n1 1 2 0\n2 3 0\n3 2 0\n4 2 3 0\n1 4 0\n",
        "5 6 0\n1 2 3 0\n2 1 0\n3 4 0\n4 5 0\n5 4 0\n2 5 0\n",
    ];
    for text in texts {
        let expected = brute_force_extensions(&read_instance(text));
        assert_eq!(expected, stable_extensions(text), "instance {:?}", text);
    }
}

#[test]
fn test_enumeration_matches_brute_force_for_every_heuristics() {
    let text = "6 6 0\n1 2 0\n2 1 0\n3 4 0\n4 3 0\n5 1 3 0\n6 5 0\n";
    let expected = brute_force_extensions(&read_instance(text));
    for heuristics in [
        Heuristics::None,
        Heuristics::MaxOutDegree,
        Heuristics::MinInDegree,
        Heuristics::PathLength(4),
        Heuristics::PathLengthModified(4),
    ] {
        let mut instance = read_instance(text);
        let mut models: Vec<Vec<usize>> = Vec::new();
        {
            let mut solver = StableEnumerationSolver::new(&mut instance);
            solver.set_heuristics(heuristics);
            solver.set_model_handler(Box::new(|_, extension| {
                models.push(extension.iter().map(|a| a.id()).collect());
            }));
            solver.enumerate_extensions().unwrap();
        }
        models.sort();
        assert_eq!(expected, models, "heuristics {:?}", heuristics);
    }
}

#[test]
fn test_descriptions_rename_the_models() {
    let reader = SimpleFormatReader;
    let mut instance = read_instance("2 1 0\n1 2 0\n");
    reader
        .read_descriptions(&mut instance, &mut "1 rain\n2 sprinkler\n".as_bytes())
        .unwrap();
    let mut names: Vec<String> = Vec::new();
    {
        let mut solver = StableEnumerationSolver::new(&mut instance);
        solver.set_model_handler(Box::new(|_, extension| {
            names.extend(extension.iter().map(|a| a.name().to_string()));
        }));
        solver.enumerate_extensions().unwrap();
    }
    assert_eq!(vec!["sprinkler"], names);
}

#[test]
fn test_required_arguments_filter_the_models() {
    let reader = SimpleFormatReader;
    let mut instance = read_instance("2 2 0\n1 2 0\n2 1 0\n");
    let names = ArgumentNameIndex::new();
    reader
        .read_required_arguments(&mut instance, &names, &mut "-2\n".as_bytes())
        .unwrap();
    assert_eq!(&[(1, Sign::Out)], instance.required_arguments());
    assert_eq!(vec![vec![0]], enumerate(&mut instance));
}

#[test]
fn test_required_arguments_may_leave_no_model() {
    let reader = SimpleFormatReader;
    let mut instance = read_instance("2 1 0\n1 2 0\n");
    let names = ArgumentNameIndex::new();
    reader
        .read_required_arguments(&mut instance, &names, &mut "1\n".as_bytes())
        .unwrap();
    assert_eq!(Vec::<Vec<usize>>::new(), enumerate(&mut instance));
}

#[test]
fn test_model_cap() {
    let mut instance = read_instance("3 6 0\n1 2 0\n2 1 0\n3 1 0\n1 3 0\n2 3 0\n3 2 0\n");
    let mut n_models = 0;
    {
        let mut solver = StableEnumerationSolver::new(&mut instance);
        solver.set_max_models(2);
        solver.set_model_handler(Box::new(|_, _| n_models += 1));
        solver.enumerate_extensions().unwrap();
    }
    assert_eq!(2, n_models);
}

#[test]
fn test_unsatisfiable_proof_is_closed_by_zero() {
    let mut buffer = Vec::new();
    let mut instance = read_instance("3 3 0\n2 1 0\n3 2 0\n1 3 0\n");
    {
        let mut solver = StableEnumerationSolver::new(&mut instance);
        solver.set_proof_writer(ProofWriter::new(&mut buffer));
        solver.enumerate_extensions().unwrap();
        assert_eq!(0, solver.n_models());
    }
    let proof = String::from_utf8(buffer).unwrap();
    assert!(proof.ends_with('0'));
    for line in proof[..proof.len() - 1].lines() {
        assert!(line.ends_with(" 0"), "unterminated proof line {:?}", line);
    }
}

#[test]
fn test_no_proof_line_after_the_first_model() {
    let mut buffer = Vec::new();
    let mut instance = read_instance("2 1 0\n1 2 0\n");
    {
        let mut solver = StableEnumerationSolver::new(&mut instance);
        solver.set_proof_writer(ProofWriter::new(&mut buffer));
        solver.enumerate_extensions().unwrap();
        assert_eq!(1, solver.n_models());
    }
    let proof = String::from_utf8(buffer).unwrap();
    // the model exists, so the proof is not closed by a bare 0
    assert!(proof.is_empty() || proof.ends_with('\n'));
}
