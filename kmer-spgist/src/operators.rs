//! The five SPT operators: `config`, `choose`, `pick_split`,
//! `inner_consistent`, `leaf_consistent`. Pure functions — no I/O, no
//! mutation of caller-owned inputs, every returned K-mer/QK-mer a fresh
//! value owned by the caller.

use std::cmp::Ordering;

use kmer::{common_prefix_len, compare_first_n, Kmer};

use crate::error::{Result, SpgError};
use crate::node::{
    Cancellation, ChooseInput, ChooseResult, InnerConsistentInput, InnerConsistentOutput,
    KeptChild, LeafConsistentOutput, PickSplitOutput, ScanArgument, ScanKey, SpgConfig, Strategy,
    SplitTupleOutcome, ALL_THE_SAME_LABEL, LEAF_LABEL,
};

/// Declares the prefix datum type (K-mer), the 16-bit label type, that
/// leaves can reconstruct the original value, and that long values (beyond
/// 32 symbols) are not supported — K-mers are fixed-size and small.
pub fn config() -> SpgConfig {
    SpgConfig::default()
}

/// The symbol at position `level` of `x`, or the leaf sentinel `-1` when
/// `level` has already consumed all of `x`'s symbols.
fn symbol_or_leaf(x: &Kmer, level: u8) -> i16 {
    if level < x.k() {
        x.symbol_at(level) as i16
    } else {
        LEAF_LABEL
    }
}

/// `choose`: decide how to insert `x` into a node currently reached after
/// consuming `level` symbols from the root.
pub fn choose(x: &Kmer, level: u8, node: &ChooseInput) -> Result<ChooseResult> {
    let tail = x.last_k(x.k().saturating_sub(level));

    match &node.prefix {
        None => choose_no_prefix(x, level, &tail, node),
        Some(p) => {
            let c = common_prefix_len(&tail, p);
            if c == p.k() {
                // tail has p as a prefix: recurse as if the prefix were
                // already consumed.
                choose_no_prefix(x, level + p.k(), &tail.last_k(tail.k() - c), node)
            } else {
                // tail and the node's prefix diverge before p ends.
                let new_prefix = if c > 0 { Some(p.first_k(c)?) } else { None };
                let old_node_label = p.symbol_at(c) as i16;
                let old_node_prefix = if p.k() - c == 1 {
                    None
                } else {
                    Some(p.last_k(p.k() - c - 1))
                };
                Ok(ChooseResult::SplitTuple(SplitTupleOutcome::Reparent {
                    new_prefix,
                    old_node_label,
                    old_node_prefix,
                }))
            }
        }
    }
}

/// Shared tail of both `choose` cases once any node prefix has been
/// accounted for: `effective_level` is `level` (no prefix) or
/// `level + prefix.k` (prefix consumed), and `remaining` is `x`'s tail
/// from that point.
fn choose_no_prefix(
    x: &Kmer,
    effective_level: u8,
    remaining: &Kmer,
    node: &ChooseInput,
) -> Result<ChooseResult> {
    let s = symbol_or_leaf(x, effective_level);
    match node.labels.binary_search(&s) {
        Ok(node_index) => {
            let level_add: u8 = if s == LEAF_LABEL { 0 } else { 1 };
            let rest_datum = remaining.last_k(remaining.k().saturating_sub(level_add));
            if node.all_the_same {
                Ok(ChooseResult::SplitTuple(SplitTupleOutcome::ForceAllTheSame))
            } else {
                Ok(ChooseResult::MatchNode {
                    node_index,
                    level_add,
                    rest_datum,
                })
            }
        }
        Err(insertion_point) => Ok(ChooseResult::AddNode {
            label: s,
            insertion_point,
        }),
    }
}

/// `pick_split`: partition a page of K-mers into the children of one new
/// node.
pub fn pick_split(datums: &[Kmer], cancel: &dyn Cancellation) -> Result<PickSplitOutput> {
    assert!(!datums.is_empty(), "pick_split requires at least one tuple");

    let cpl = if datums.len() == 1 {
        datums[0].k()
    } else {
        let mut min_cpl = datums[0].k();
        for d in &datums[1..] {
            if cancel.is_cancelled() {
                return Ok(PickSplitOutput {
                    prefix: None,
                    nodes: Vec::new(),
                    map_tuples_to_nodes: Vec::new(),
                    leaf_datums: Vec::new(),
                });
            }
            min_cpl = min_cpl.min(common_prefix_len(&datums[0], d));
        }
        min_cpl
    };

    let prefix = if cpl > 0 {
        Some(datums[0].first_k(cpl)?)
    } else {
        None
    };

    let mut labels = Vec::with_capacity(datums.len());
    let mut leaf_datums = Vec::with_capacity(datums.len());
    for m in datums {
        if cancel.is_cancelled() {
            return Ok(PickSplitOutput {
                prefix: None,
                nodes: Vec::new(),
                map_tuples_to_nodes: Vec::new(),
                leaf_datums: Vec::new(),
            });
        }
        let label = if m.k() == cpl {
            LEAF_LABEL
        } else {
            m.symbol_at(cpl) as i16
        };
        labels.push(label);
        let leaf = if cpl < m.k() {
            m.last_k(m.k() - cpl - 1)
        } else {
            m.last_k(0)
        };
        leaf_datums.push(leaf);
    }

    // Stable sort of indices by label to discover distinct labels in
    // ascending order; ties keep input order.
    let mut order: Vec<usize> = (0..datums.len()).collect();
    order.sort_by_key(|&i| labels[i]);

    let mut nodes: Vec<i16> = Vec::new();
    for &i in &order {
        if nodes.last() != Some(&labels[i]) {
            nodes.push(labels[i]);
        }
    }

    let map_tuples_to_nodes: Vec<usize> = labels
        .iter()
        .map(|label| {
            nodes
                .binary_search(label)
                .expect("every label was pushed into nodes above")
        })
        .collect();

    Ok(PickSplitOutput {
        prefix,
        nodes,
        map_tuples_to_nodes,
        leaf_datums,
    })
}

/// `inner_consistent`: decide which children a descent may prune, given one
/// or more scan keys that must all accept a child's candidate reconstructed
/// value.
pub fn inner_consistent(
    input: &InnerConsistentInput,
    cancel: &dyn Cancellation,
) -> Result<InnerConsistentOutput> {
    let rv = match (&input.reconstructed, &input.prefix) {
        (Some(r), Some(p)) => r.concat(p)?,
        (Some(r), None) => *r,
        (None, Some(p)) => *p,
        (None, None) => Kmer::empty(),
    };

    let mut kept = Vec::new();
    for (node_index, &label) in input.labels.iter().enumerate() {
        if cancel.is_cancelled() {
            return Ok(InnerConsistentOutput { kept: Vec::new() });
        }
        if label == ALL_THE_SAME_LABEL {
            // No distinguishing symbol yet: a faithful driver never
            // passes this label to inner_consistent — the node is still
            // mid-split — so conservatively keep it rather than prune a
            // possible match.
            kept.push(KeptChild {
                node_index,
                level_add: 0,
                reconstructed_value: rv,
            });
            continue;
        }
        let candidate = if label >= 0 {
            rv.concat(&Kmer::from_raw(label as u64, 1)?)?
        } else {
            rv
        };

        let mut accept = true;
        for key in input.scan_keys {
            if !scan_key_accepts_candidate(key, &candidate)? {
                accept = false;
                break;
            }
        }
        if accept {
            kept.push(KeptChild {
                node_index,
                level_add: candidate.k() - input.level,
                reconstructed_value: candidate,
            });
        }
    }
    Ok(InnerConsistentOutput { kept })
}

fn scan_key_accepts_candidate(key: &ScanKey, candidate: &Kmer) -> Result<bool> {
    match (key.strategy, &key.argument) {
        (Strategy::Equal, ScanArgument::Kmer(q)) => {
            let n = q.k().min(candidate.k());
            Ok(compare_first_n(q, candidate, n)? == Ordering::Equal && q.k() >= candidate.k())
        }
        (Strategy::Prefix, ScanArgument::Kmer(q)) => {
            let n = q.k().min(candidate.k());
            Ok(compare_first_n(q, candidate, n)? == Ordering::Equal)
        }
        (Strategy::QkmerMatch, ScanArgument::QKmer(q)) => {
            let n = q.k().min(candidate.k());
            Ok(q.contains_prefix(candidate, n)?)
        }
        _ => Err(SpgError::UnknownStrategy),
    }
}

/// `leaf_consistent`: does the fully reconstructed leaf value satisfy every
/// scan key?
pub fn leaf_consistent(
    leaf: &Kmer,
    reconstructed: &Kmer,
    scan_keys: &[ScanKey],
) -> Result<LeafConsistentOutput> {
    let full = reconstructed.concat(leaf)?;
    let mut accepted = true;
    for key in scan_keys {
        let ok = match (key.strategy, &key.argument) {
            (Strategy::Equal, ScanArgument::Kmer(q)) => *q == full,
            (Strategy::Prefix, ScanArgument::Kmer(q)) => full.startswith(q),
            (Strategy::QkmerMatch, ScanArgument::QKmer(q)) => q.contains_equal_length(&full),
            _ => return Err(SpgError::UnknownStrategy),
        };
        if !ok {
            accepted = false;
            break;
        }
    }
    Ok(LeafConsistentOutput {
        recheck: false,
        leaf_value: full,
        accepted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NeverCancel;

    fn empty_node() -> ChooseInput<'static> {
        ChooseInput {
            prefix: None,
            labels: &[],
            all_the_same: false,
        }
    }

    #[test]
    fn choose_on_empty_node_adds_first_child() {
        let x = Kmer::parse("ACGT").unwrap();
        let result = choose(&x, 0, &empty_node()).unwrap();
        match result {
            ChooseResult::AddNode { label, insertion_point } => {
                assert_eq!(label, 0); // 'A' == code 0
                assert_eq!(insertion_point, 0);
            }
            other => panic!("expected AddNode, got {:?}", other),
        }
    }

    #[test]
    fn choose_matches_existing_label() {
        let x = Kmer::parse("ACGT").unwrap();
        let labels = [0i16, 2, 3];
        let input = ChooseInput {
            prefix: None,
            labels: &labels,
            all_the_same: false,
        };
        let result = choose(&x, 0, &input).unwrap();
        match result {
            ChooseResult::MatchNode { node_index, level_add, rest_datum } => {
                assert_eq!(node_index, 0);
                assert_eq!(level_add, 1);
                assert_eq!(rest_datum.render(), "CGT");
            }
            other => panic!("expected MatchNode, got {:?}", other),
        }
    }

    #[test]
    fn choose_splits_when_prefix_diverges() {
        let prefix = Kmer::parse("ACGT").unwrap();
        let input = ChooseInput {
            prefix: Some(prefix),
            labels: &[],
            all_the_same: false,
        };
        let x = Kmer::parse("ACTT").unwrap();
        let result = choose(&x, 0, &input).unwrap();
        match result {
            ChooseResult::SplitTuple(SplitTupleOutcome::Reparent {
                new_prefix,
                old_node_label,
                old_node_prefix,
            }) => {
                assert_eq!(new_prefix.unwrap().render(), "AC");
                assert_eq!(old_node_label, 2); // 'G'
                assert_eq!(old_node_prefix.unwrap().render(), "T");
            }
            other => panic!("expected Reparent, got {:?}", other),
        }
    }

    #[test]
    fn pick_split_groups_by_divergent_symbol() {
        let datums = vec![
            Kmer::parse("AAAA").unwrap(),
            Kmer::parse("AACG").unwrap(),
            Kmer::parse("AAGT").unwrap(),
            Kmer::parse("ACGT").unwrap(),
        ];
        let out = pick_split(&datums, &NeverCancel).unwrap();
        assert_eq!(out.prefix.unwrap().render(), "A");
        // Three distinct symbols follow 'A': A, C, G -> 3 output nodes.
        assert_eq!(out.nodes.len(), 3);
    }

    #[test]
    fn inner_consistent_prunes_branches_outside_prefix() {
        let all = [
            Kmer::parse("AAAA").unwrap(),
            Kmer::parse("AACG").unwrap(),
            Kmer::parse("AAGT").unwrap(),
            Kmer::parse("ACGT").unwrap(),
        ];
        let split = pick_split(&all, &NeverCancel).unwrap();
        let labels = split.nodes.clone();
        let input = InnerConsistentInput {
            reconstructed: None,
            level: 0,
            prefix: split.prefix,
            labels: &labels,
            scan_keys: &[ScanKey::prefix(Kmer::parse("AA").unwrap())],
        };
        let out = inner_consistent(&input, &NeverCancel).unwrap();
        // prefix "AA" should only keep the branch continuing with symbol
        // 'A' (code 0), not 'C' (ACGT's branch).
        assert_eq!(out.kept.len(), 1);
        assert_eq!(out.kept[0].reconstructed_value.render(), "AA");
    }
}
