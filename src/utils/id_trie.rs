use crate::setaf::ArgumentId;
use std::collections::HashMap;

#[derive(Default)]
struct Node {
    contained: bool,
    children: HashMap<ArgumentId, usize>,
}

/// A prefix trie over (attacked argument, sorted attacker ids) paths, answering subset
/// queries.
///
/// It is used once, at parse time: attacks are inserted in ascending attacker-set size, and
/// an attack whose attacker set contains a previously inserted set on the same attacked
/// argument is subsumed by it and can be dropped.
#[derive(Default)]
pub struct IdTrie {
    nodes: Vec<Node>,
    roots: HashMap<ArgumentId, usize>,
}

impl IdTrie {
    fn new_node(nodes: &mut Vec<Node>) -> usize {
        nodes.push(Node::default());
        nodes.len() - 1
    }

    /// Inserts the attack on `attacked` with the given sorted attacker ids.
    pub fn insert(&mut self, attacked: ArgumentId, members: &[ArgumentId]) {
        let nodes = &mut self.nodes;
        let mut node = *self
            .roots
            .entry(attacked)
            .or_insert_with(|| Self::new_node(nodes));
        for &member in members {
            let next = self.nodes[node].children.get(&member).copied();
            node = match next {
                Some(child) => child,
                None => {
                    let child = Self::new_node(&mut self.nodes);
                    self.nodes[node].children.insert(member, child);
                    child
                }
            };
        }
        self.nodes[node].contained = true;
    }

    /// Returns `true` if some inserted attack on `attacked` has an attacker set included in
    /// the given sorted attacker ids.
    ///
    /// The traversal walks the trie and the member sequence together; at each node it may
    /// skip the next member or descend to its child, so every subset of the members is
    /// explored.
    pub fn contains_subset_of(&self, attacked: ArgumentId, members: &[ArgumentId]) -> bool {
        let root = match self.roots.get(&attacked) {
            Some(&root) => root,
            None => return false,
        };
        let mut to_process = vec![(root, 0usize)];
        while let Some((node, index)) = to_process.pop() {
            if self.nodes[node].contained {
                return true;
            }
            if index == members.len() {
                continue;
            }
            // skipping the current member may still lead to a subset
            to_process.push((node, index + 1));
            if let Some(&child) = self.nodes[node].children.get(&members[index]) {
                // pushed second so that the walk is depth first
                to_process.push((child, index + 1));
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_trie() {
        let trie = IdTrie::default();
        assert!(!trie.contains_subset_of(0, &[1, 2]));
        assert!(!trie.contains_subset_of(0, &[]));
    }

    #[test]
    fn test_exact_match() {
        let mut trie = IdTrie::default();
        trie.insert(0, &[1, 2]);
        assert!(trie.contains_subset_of(0, &[1, 2]));
    }

    #[test]
    fn test_subset_is_found() {
        let mut trie = IdTrie::default();
        trie.insert(0, &[2, 4]);
        assert!(trie.contains_subset_of(0, &[1, 2, 3, 4]));
        assert!(trie.contains_subset_of(0, &[2, 4, 5]));
        assert!(!trie.contains_subset_of(0, &[2, 3]));
        assert!(!trie.contains_subset_of(0, &[4]));
    }

    #[test]
    fn test_superset_is_not_found() {
        let mut trie = IdTrie::default();
        trie.insert(0, &[1, 2, 3]);
        assert!(!trie.contains_subset_of(0, &[1, 2]));
        assert!(trie.contains_subset_of(0, &[1, 2, 3]));
    }

    #[test]
    fn test_attacked_arguments_are_separated() {
        let mut trie = IdTrie::default();
        trie.insert(0, &[1]);
        assert!(trie.contains_subset_of(0, &[1, 2]));
        assert!(!trie.contains_subset_of(1, &[1, 2]));
    }

    #[test]
    fn test_empty_member_set_subsumes_everything() {
        let mut trie = IdTrie::default();
        trie.insert(0, &[]);
        assert!(trie.contains_subset_of(0, &[]));
        assert!(trie.contains_subset_of(0, &[5, 7]));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut trie = IdTrie::default();
        trie.insert(0, &[1, 3]);
        let nodes_before = trie.nodes.len();
        trie.insert(0, &[1, 3]);
        assert_eq!(nodes_before, trie.nodes.len());
        assert!(trie.contains_subset_of(0, &[1, 2, 3]));
    }

    #[test]
    fn test_several_sets_on_one_argument() {
        let mut trie = IdTrie::default();
        trie.insert(3, &[1, 2]);
        trie.insert(3, &[1, 4]);
        trie.insert(3, &[5]);
        assert!(trie.contains_subset_of(3, &[1, 2]));
        assert!(trie.contains_subset_of(3, &[1, 4, 6]));
        assert!(trie.contains_subset_of(3, &[0, 5]));
        assert!(!trie.contains_subset_of(3, &[1, 6]));
        assert!(!trie.contains_subset_of(3, &[2, 4]));
    }
}
