//! An in-memory reference driver for the SPT operators. A real index host
//! persists nodes as database pages with a WAL; this one keeps them as
//! plain Rust values, so the operator contracts can be exercised and tested
//! without one. It is the part of this crate a real host would not reuse.

use kmer::Kmer;

use crate::error::Result;
use crate::node::{
    Cancellation, ChooseInput, ChooseResult, InnerConsistentInput, NeverCancel, ScanKey,
    SplitTupleOutcome,
};
use crate::operators;

/// A child is either a small bucket of leaf datums (a "page" capped at
/// holding only mutually-identical tuples before it must be split) or a
/// further inner node.
#[derive(Debug, Clone)]
enum Child {
    Leaf(Vec<Kmer>),
    Inner(Box<Node>),
}

#[derive(Debug, Clone, Default)]
struct Node {
    prefix: Option<Kmer>,
    /// Sorted parallel to `entries`'s labels.
    entries: Vec<(i16, Child)>,
}

impl Node {
    fn labels(&self) -> Vec<i16> {
        self.entries.iter().map(|(l, _)| *l).collect()
    }
}

/// A space-partitioned radix trie over K-mers, built entirely from the
/// `operators` module — insertion calls `choose` at every level, search
/// calls `inner_consistent` then `leaf_consistent`.
#[derive(Debug, Clone, Default)]
pub struct SpTrie {
    root: Node,
}

impl SpTrie {
    pub fn new() -> Self {
        SpTrie::default()
    }

    pub fn insert(&mut self, x: &Kmer) -> Result<()> {
        insert_rec(&mut self.root, x, 0, &NeverCancel)
    }

    pub fn insert_with_cancellation(&mut self, x: &Kmer, cancel: &dyn Cancellation) -> Result<()> {
        insert_rec(&mut self.root, x, 0, cancel)
    }

    /// All stored K-mers accepted by every scan key (conjunction),
    /// reconstructed in the order a depth-first descent visits them.
    pub fn search(&self, scan_keys: &[ScanKey]) -> Result<Vec<Kmer>> {
        self.search_with_cancellation(scan_keys, &NeverCancel)
    }

    pub fn search_with_cancellation(
        &self,
        scan_keys: &[ScanKey],
        cancel: &dyn Cancellation,
    ) -> Result<Vec<Kmer>> {
        let mut results = Vec::new();
        search_rec(&self.root, 0, None, scan_keys, cancel, &mut results)?;
        Ok(results)
    }
}

fn insert_rec(node: &mut Node, x: &Kmer, level: u8, cancel: &dyn Cancellation) -> Result<()> {
    let labels = node.labels();
    let input = ChooseInput {
        prefix: node.prefix,
        labels: &labels,
        all_the_same: false,
    };
    let result = operators::choose(x, level, &input)?;

    match result {
        ChooseResult::AddNode {
            label,
            insertion_point,
        } => {
            let rest_datum = remainder_after_label(x, node, level, label);
            node.entries
                .insert(insertion_point, (label, Child::Leaf(vec![rest_datum])));
        }
        ChooseResult::MatchNode {
            node_index,
            rest_datum,
            ..
        } => {
            let label = node.entries[node_index].0;
            // Read the child's current shape first so no mutable borrow of
            // `node.entries[node_index].1` is ever live across the later
            // reassignment below.
            enum Shape {
                Inner,
                MatchingLeaf,
                DivergingLeaf(Vec<Kmer>),
            }
            let shape = match &node.entries[node_index].1 {
                Child::Inner(_) => Shape::Inner,
                Child::Leaf(bucket) if bucket.iter().all(|b| *b == rest_datum) => {
                    Shape::MatchingLeaf
                }
                Child::Leaf(bucket) => Shape::DivergingLeaf(bucket.clone()),
            };

            match shape {
                Shape::Inner => {
                    let new_level = level
                        + node.prefix.map_or(0, |p| p.k())
                        + if label >= 0 { 1 } else { 0 };
                    if let Child::Inner(sub) = &mut node.entries[node_index].1 {
                        insert_rec(sub, x, new_level, cancel)?;
                    }
                }
                Shape::MatchingLeaf => {
                    if let Child::Leaf(bucket) = &mut node.entries[node_index].1 {
                        bucket.push(rest_datum);
                    }
                }
                Shape::DivergingLeaf(mut all) => {
                    all.push(rest_datum);
                    let split = operators::pick_split(&all, cancel)?;
                    let mut new_node = Node {
                        prefix: split.prefix,
                        entries: Vec::new(),
                    };
                    for (i, &child_label) in split.nodes.iter().enumerate() {
                        let members: Vec<Kmer> = (0..all.len())
                            .filter(|&t| split.map_tuples_to_nodes[t] == i)
                            .map(|t| split.leaf_datums[t])
                            .collect();
                        new_node.entries.push((child_label, Child::Leaf(members)));
                    }
                    node.entries[node_index].1 = Child::Inner(Box::new(new_node));
                }
            }
        }
        ChooseResult::SplitTuple(SplitTupleOutcome::Reparent {
            new_prefix,
            old_node_label,
            old_node_prefix,
        }) => {
            let mut old_node = std::mem::take(node);
            old_node.prefix = old_node_prefix;
            node.prefix = new_prefix;
            node.entries = vec![(old_node_label, Child::Inner(Box::new(old_node)))];
            insert_rec(node, x, level, cancel)?;
        }
        ChooseResult::SplitTuple(SplitTupleOutcome::ForceAllTheSame) => {
            unreachable!("this driver never reports all_the_same=true to choose")
        }
    }
    Ok(())
}

/// The tail of `x` still to be stored once `level`, this node's prefix,
/// and (if not a leaf sentinel) one more symbol labeled `label` have all
/// been consumed.
fn remainder_after_label(x: &Kmer, node: &Node, level: u8, label: i16) -> Kmer {
    let consumed = level + node.prefix.map_or(0, |p| p.k()) + if label >= 0 { 1 } else { 0 };
    x.last_k(x.k().saturating_sub(consumed))
}

fn search_rec(
    node: &Node,
    level: u8,
    reconstructed: Option<Kmer>,
    scan_keys: &[ScanKey],
    cancel: &dyn Cancellation,
    results: &mut Vec<Kmer>,
) -> Result<()> {
    let labels = node.labels();
    let input = InnerConsistentInput {
        reconstructed,
        level,
        prefix: node.prefix,
        labels: &labels,
        scan_keys,
    };
    let out = operators::inner_consistent(&input, cancel)?;

    for kept in out.kept {
        let (_, child) = &node.entries[kept.node_index];
        match child {
            Child::Leaf(bucket) => {
                for leaf in bucket {
                    let lc = operators::leaf_consistent(leaf, &kept.reconstructed_value, scan_keys)?;
                    if lc.accepted {
                        results.push(lc.leaf_value);
                    }
                }
            }
            Child::Inner(sub) => {
                search_rec(
                    sub,
                    kept.reconstructed_value.k(),
                    Some(kept.reconstructed_value),
                    scan_keys,
                    cancel,
                    results,
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kmer::QKmer;

    fn insert_all(trie: &mut SpTrie, kmers: &[&str]) {
        for s in kmers {
            trie.insert(&Kmer::parse(s).unwrap()).unwrap();
        }
    }

    #[test]
    fn prefix_query_returns_matching_kmers() {
        let mut trie = SpTrie::new();
        insert_all(&mut trie, &["AAAA", "AACG", "AAGT", "ACGT"]);

        let mut hits: Vec<String> = trie
            .search(&[ScanKey::prefix(Kmer::parse("AA").unwrap())])
            .unwrap()
            .iter()
            .map(|m| m.render())
            .collect();
        hits.sort();
        assert_eq!(hits, vec!["AAAA", "AACG", "AAGT"]);
    }

    #[test]
    fn qkmer_match_returns_every_kmer_it_accepts() {
        let mut trie = SpTrie::new();
        insert_all(&mut trie, &["AAAA", "AACG", "AAGT", "ACGT"]);

        let mut hits: Vec<String> = trie
            .search(&[ScanKey::qkmer_match(QKmer::parse("NNNN").unwrap())])
            .unwrap()
            .iter()
            .map(|m| m.render())
            .collect();
        hits.sort();
        assert_eq!(hits, vec!["AAAA", "AACG", "AAGT", "ACGT"]);
    }

    #[test]
    fn equal_query_returns_only_the_exact_kmer() {
        let mut trie = SpTrie::new();
        insert_all(&mut trie, &["AAAA", "AACG", "AAGT", "ACGT"]);

        let hits: Vec<String> = trie
            .search(&[ScanKey::equal(Kmer::parse("ACGT").unwrap())])
            .unwrap()
            .iter()
            .map(|m| m.render())
            .collect();
        assert_eq!(hits, vec!["ACGT"]);
    }

    #[test]
    fn duplicate_inserts_are_all_returned() {
        let mut trie = SpTrie::new();
        insert_all(&mut trie, &["ACGT", "ACGT", "ACGT"]);
        let hits = trie
            .search(&[ScanKey::equal(Kmer::parse("ACGT").unwrap())])
            .unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn insertion_order_does_not_change_query_results() {
        let forward = ["AAAA", "AACG", "AAGT", "ACGT", "TTTT", "GCTA"];
        let mut backward = forward.to_vec();
        backward.reverse();

        let mut a = SpTrie::new();
        insert_all(&mut a, &forward);
        let mut b = SpTrie::new();
        insert_all(&mut b, &backward);

        let mut hits_a: Vec<String> = a
            .search(&[ScanKey::prefix(Kmer::parse("A").unwrap())])
            .unwrap()
            .iter()
            .map(|m| m.render())
            .collect();
        let mut hits_b: Vec<String> = b
            .search(&[ScanKey::prefix(Kmer::parse("A").unwrap())])
            .unwrap()
            .iter()
            .map(|m| m.render())
            .collect();
        hits_a.sort();
        hits_b.sort();
        assert_eq!(hits_a, hits_b);
    }

    #[test]
    fn no_match_returns_empty() {
        let mut trie = SpTrie::new();
        insert_all(&mut trie, &["ACGT", "TTTT"]);
        let hits = trie
            .search(&[ScanKey::equal(Kmer::parse("GGGG").unwrap())])
            .unwrap();
        assert!(hits.is_empty());
    }
}
