//! The transient SPT node model and operator input/output types. None of
//! this is persisted by the core; it is rebuilt by the driver on every
//! operator call.

use kmer::{Kmer, QKmer};

/// Child label sentinels, distinguishable from the 2-bit symbol range
/// {0,1,2,3} by using a signed 16-bit label.
pub const LEAF_LABEL: i16 = -1;
pub const ALL_THE_SAME_LABEL: i16 = -2;

/// Capabilities reported by `config`.
#[derive(Debug, Clone, Copy)]
pub struct SpgConfig {
    pub can_return_data: bool,
    pub long_values_ok: bool,
}

impl Default for SpgConfig {
    fn default() -> Self {
        SpgConfig {
            can_return_data: true,
            long_values_ok: false,
        }
    }
}

/// A node as seen by `choose`/`pick_split`: its optional shared prefix and
/// the sorted labels of its current children.
#[derive(Debug, Clone)]
pub struct ChooseInput<'a> {
    pub prefix: Option<Kmer>,
    pub labels: &'a [i16],
    /// True when the driver cannot yet distinguish the node's children
    /// (the "all-the-same" placeholder case).
    pub all_the_same: bool,
}

/// Outcome of `choose`: a tagged sum rather than a struct with a
/// discriminant and partly-unused fields.
#[derive(Debug, Clone)]
pub enum ChooseResult {
    /// Descend into the existing child at `node_index`.
    MatchNode {
        node_index: usize,
        level_add: u8,
        rest_datum: Kmer,
    },
    /// Insert a brand new child labeled `label` at sorted position
    /// `insertion_point`.
    AddNode { label: i16, insertion_point: usize },
    /// Reshape the current node before retrying the insert.
    SplitTuple(SplitTupleOutcome),
}

#[derive(Debug, Clone)]
pub enum SplitTupleOutcome {
    /// The driver could not yet distinguish children and must force a
    /// real split via `pick_split` before retrying.
    ForceAllTheSame,
    /// The current node's prefix diverges from the inserted value before
    /// it ends: reparent the current node under a new one.
    Reparent {
        new_prefix: Option<Kmer>,
        old_node_label: i16,
        old_node_prefix: Option<Kmer>,
    },
}

/// Result of `pick_split`: partitions a page of K-mers into the children of
/// one new node.
#[derive(Debug, Clone)]
pub struct PickSplitOutput {
    pub prefix: Option<Kmer>,
    /// Distinct child labels, in sorted order — one per output node.
    pub nodes: Vec<i16>,
    /// Per input tuple (same order as the input slice), the index into
    /// `nodes` it was assigned to.
    pub map_tuples_to_nodes: Vec<usize>,
    /// Per input tuple, the leaf datum placed in the page.
    pub leaf_datums: Vec<Kmer>,
}

/// Query strategy numbers: the discriminants match the wire numbers
/// exactly, confirmed against `kmer_spgist.c`'s `SPG_STRATEGY_*` constants,
/// so a host can cast a wire strategy number straight in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Strategy {
    Equal = 1,
    Prefix = 2,
    QkmerMatch = 3,
}

impl Strategy {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Strategy::Equal),
            2 => Some(Strategy::Prefix),
            3 => Some(Strategy::QkmerMatch),
            _ => None,
        }
    }
}

/// A scan key's argument: `Equal`/`Prefix` carry a K-mer, `QkmerMatch`
/// carries a QK-mer.
#[derive(Debug, Clone)]
pub enum ScanArgument {
    Kmer(Kmer),
    QKmer(QKmer),
}

#[derive(Debug, Clone)]
pub struct ScanKey {
    pub strategy: Strategy,
    pub argument: ScanArgument,
}

impl ScanKey {
    pub fn equal(q: Kmer) -> Self {
        ScanKey {
            strategy: Strategy::Equal,
            argument: ScanArgument::Kmer(q),
        }
    }

    pub fn prefix(q: Kmer) -> Self {
        ScanKey {
            strategy: Strategy::Prefix,
            argument: ScanArgument::Kmer(q),
        }
    }

    pub fn qkmer_match(q: QKmer) -> Self {
        ScanKey {
            strategy: Strategy::QkmerMatch,
            argument: ScanArgument::QKmer(q),
        }
    }
}

/// Inputs to `inner_consistent`.
#[derive(Debug, Clone)]
pub struct InnerConsistentInput<'a> {
    pub reconstructed: Option<Kmer>,
    pub level: u8,
    pub prefix: Option<Kmer>,
    pub labels: &'a [i16],
    pub scan_keys: &'a [ScanKey],
}

#[derive(Debug, Clone)]
pub struct KeptChild {
    pub node_index: usize,
    pub level_add: u8,
    pub reconstructed_value: Kmer,
}

#[derive(Debug, Clone, Default)]
pub struct InnerConsistentOutput {
    pub kept: Vec<KeptChild>,
}

/// Result of `leaf_consistent`. `recheck` is always `false`: the core never
/// asks the host to double-check a leaf against the original row, since the
/// reconstructed value already fully determines the match.
#[derive(Debug, Clone)]
pub struct LeafConsistentOutput {
    pub recheck: bool,
    pub leaf_value: Kmer,
    pub accepted: bool,
}

/// Cooperative cancellation hook: operators check this at least once per
/// outer loop iteration and return with no partial output if it trips. The
/// core never polls a clock or spawns anything itself — this is purely a
/// callback the driver can wire to its own timeout/abort signal.
pub trait Cancellation {
    fn is_cancelled(&self) -> bool;
}

/// The default, always-live cancellation token for callers (tests, the
/// CLI) that have no cancellation source of their own.
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}
