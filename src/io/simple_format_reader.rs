use crate::setaf::{ArgumentId, SetafInstance, Sign};
use crate::utils::{check_signal, IdTrie};
use anyhow::{anyhow, Context, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};

/// The mapping from display names to arguments, as read from a description file.
///
/// A name shared by several arguments maps to `None` and cannot be used in a
/// required-arguments file.
pub type ArgumentNameIndex = HashMap<String, Option<ArgumentId>>;

/// A reader for the simple SETAF format.
///
/// Three files share the same line conventions: blank lines and lines starting with `#` are
/// skipped, and a trailing carriage return is tolerated.
///
/// # Instance file
///
/// Integer lines terminated by `0`. The first data line is the preamble
/// `<numArguments> <numAttacks> 0`; each of the `numAttacks` following data lines is an
/// attack `<attackedId> <attackerId>+ 0` with 1-based argument ids. The following content
/// defines a SETAF with three arguments in which arguments 1 and 2 collectively attack
/// argument 3, and argument 3 attacks argument 1:
///
/// ```text
/// 3 2 0
/// 3 1 2 0
/// 1 3 0
/// ```
///
/// An attack whose attacker set is a superset of another attack on the same argument is
/// implied by it and dropped while reading.
///
/// # Description file
///
/// Lines `<argumentId> <name>` where the name is the rest of the line and may contain
/// spaces.
///
/// # Required-arguments file
///
/// Lines `[-]<id>` or `s [-]<name>`; a leading `-` requires the argument to be Out instead
/// of In.
#[derive(Default)]
pub struct SimpleFormatReader;

/// Returns the next data line, skipping blank and comment lines.
fn next_data_line(
    lines: &mut std::iter::Enumerate<std::io::Lines<BufReader<&mut dyn Read>>>,
) -> Result<Option<(usize, String)>> {
    for (index, line) in lines {
        check_signal()?;
        let mut l = line.with_context(|| format!("while reading line with index {}", index))?;
        if l.ends_with('\r') {
            l.pop();
        }
        if l.is_empty() || l.starts_with('#') {
            continue;
        }
        return Ok(Some((index, l)));
    }
    Ok(None)
}

/// Parses a line of whitespace-separated integers terminated by `0`; the terminator is
/// removed from the result.
fn parse_id_line(line: &str) -> Result<Vec<usize>> {
    let mut values = Vec::new();
    for word in line.split_whitespace() {
        let value = word
            .parse::<usize>()
            .map_err(|_| anyhow!("the line {:?} is malformed", line))?;
        values.push(value);
    }
    if values.len() < 2 {
        return Err(anyhow!("the line {:?} contains no values", line));
    }
    if values.pop() != Some(0) {
        return Err(anyhow!("the line {:?} does not end with 0", line));
    }
    Ok(values)
}

impl SimpleFormatReader {
    /// Reads a [`SetafInstance`], dropping subsumed attacks and seeding the heuristics
    /// value of every argument with the number of distinct attacks it occurs in as an
    /// attacker.
    pub fn read(&self, reader: &mut dyn Read) -> Result<SetafInstance> {
        let mut lines = BufReader::new(reader).lines().enumerate();

        let (preamble_index, preamble_line) = next_data_line(&mut lines)?
            .ok_or_else(|| anyhow!("the instance contains no preamble"))?;
        let preamble = parse_id_line(&preamble_line)
            .with_context(|| format!("while reading line with index {}", preamble_index))?;
        if preamble.len() != 2 {
            return Err(anyhow!("the preamble is malformed"));
        }
        let (n_arguments, n_attacks) = (preamble[0], preamble[1]);

        // buffering the attacks makes it possible to sort them by attacker count, so that
        // no attack can be a proper subset of an earlier one
        let mut attack_buffer: Vec<(usize, Vec<usize>, bool)> = Vec::with_capacity(n_attacks);
        while let Some((index, line)) = next_data_line(&mut lines)? {
            if attack_buffer.len() == n_attacks {
                return Err(anyhow!(
                    "the instance contains more attacks than specified in the preamble"
                ));
            }
            let values = parse_id_line(&line)
                .with_context(|| format!("while reading line with index {}", index))?;
            if values.len() < 2 {
                return Err(anyhow!(
                    "the attack {} contains no attacker",
                    attack_buffer.len() + 1
                ));
            }
            for &id in &values {
                if id == 0 || id > n_arguments {
                    return Err(anyhow!(
                        "the attack {} references argument {} that does not exist",
                        attack_buffer.len() + 1,
                        id
                    ));
                }
            }
            attack_buffer.push((values[0], values[1..].to_vec(), false));
        }
        if attack_buffer.len() != n_attacks {
            return Err(anyhow!(
                "the instance contains less attacks than specified in the preamble"
            ));
        }

        attack_buffer.sort_by_key(|(_, members, _)| members.len());

        let mut trie = IdTrie::default();
        let mut subsumed_count = 0;
        for (attacked, members, is_subsumed) in attack_buffer.iter_mut() {
            check_signal()?;
            members.sort_unstable();
            if trie.contains_subset_of(*attacked, members) {
                *is_subsumed = true;
                subsumed_count += 1;
            } else {
                trie.insert(*attacked, members);
            }
        }

        let mut instance = SetafInstance::new(n_arguments, n_attacks - subsumed_count);
        // the epoch of the last attack each argument was added to, used to skip repeated
        // attacker ids within one attack
        let mut occurrence_epoch = vec![0usize; n_arguments];
        let mut attack_count = 0;
        for (attacked_number, members, is_subsumed) in &attack_buffer {
            check_signal()?;
            if *is_subsumed {
                continue;
            }
            instance.set_attacked(attack_count, attacked_number - 1);
            for &member in members {
                if member == *attacked_number {
                    instance.mark_as_self_attack(attack_count);
                } else {
                    let attacker = member - 1;
                    if occurrence_epoch[attacker] < attack_count + 1 {
                        occurrence_epoch[attacker] = attack_count + 1;
                        instance.add_member(attack_count, attacker, Sign::Out);
                        let seen = instance.argument(attacker).heuristics_value();
                        instance.argument_mut(attacker).set_heuristics_value(seen + 1.0);
                    }
                }
            }
            attack_count += 1;
        }

        Ok(instance)
    }

    /// Reads a description file, renaming the referenced arguments.
    ///
    /// The returned index maps each name to its argument, or to `None` when several
    /// arguments got the same name.
    pub fn read_descriptions(
        &self,
        instance: &mut SetafInstance,
        reader: &mut dyn Read,
    ) -> Result<ArgumentNameIndex> {
        let mut lines = BufReader::new(reader).lines().enumerate();
        let mut names = ArgumentNameIndex::new();
        while let Some((index, line)) = next_data_line(&mut lines)? {
            let context = || format!("while reading line with index {}", index);
            let (id_word, name) = line
                .split_once(' ')
                .ok_or_else(|| anyhow!("the line {:?} does not contain a name", line))
                .with_context(context)?;
            let number = id_word
                .parse::<usize>()
                .map_err(|_| anyhow!("the line {:?} does not contain a valid argument id", line))
                .with_context(context)?;
            if number == 0 || number > instance.n_arguments() {
                return Err(anyhow!(
                    "the description file references argument {} that does not exist",
                    number
                ));
            }
            match names.entry(name.to_string()) {
                Entry::Vacant(entry) => {
                    entry.insert(Some(number - 1));
                }
                Entry::Occupied(mut entry) => {
                    entry.insert(None);
                }
            }
            instance.argument_mut(number - 1).set_name(name.to_string());
        }
        Ok(names)
    }

    /// Reads a required-arguments file, adding its entries to the instance.
    pub fn read_required_arguments(
        &self,
        instance: &mut SetafInstance,
        names: &ArgumentNameIndex,
        reader: &mut dyn Read,
    ) -> Result<()> {
        let mut lines = BufReader::new(reader).lines().enumerate();
        while let Some((index, line)) = next_data_line(&mut lines)? {
            let context = || format!("while reading line with index {}", index);
            match line.split_once(' ') {
                None => {
                    let is_positive = !line.starts_with('-');
                    let id_word = if is_positive { &line[..] } else { &line[1..] };
                    if id_word.is_empty() {
                        return Err(anyhow!("the line {:?} does not reference an argument", line))
                            .with_context(context);
                    }
                    let number = id_word
                        .parse::<usize>()
                        .map_err(|_| anyhow!("the argument {:?} is malformed", line))
                        .with_context(context)?;
                    if number == 0 || number > instance.n_arguments() {
                        return Err(anyhow!("the argument {} does not exist", number))
                            .with_context(context);
                    }
                    let sign = if is_positive { Sign::In } else { Sign::Out };
                    instance.add_required_argument(number - 1, sign);
                }
                Some((prefix, rest)) => {
                    if prefix != "s" || line.len() < 3 {
                        return Err(anyhow!("the line {:?} is malformed", line))
                            .with_context(context);
                    }
                    let is_positive = !rest.starts_with('-');
                    let name = if is_positive { rest } else { &rest[1..] };
                    let sign = if is_positive { Sign::In } else { Sign::Out };
                    match names.get(name) {
                        None => {
                            return Err(anyhow!("the argument {:?} does not exist", name))
                                .with_context(context)
                        }
                        Some(None) => {
                            return Err(anyhow!("the argument {:?} is not unique", name))
                                .with_context(context)
                        }
                        Some(Some(argument)) => instance.add_required_argument(*argument, sign),
                    }
                }
            }
        }
        Ok(())
    }
}
