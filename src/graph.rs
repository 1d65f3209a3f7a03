use crate::cost::{cost, plogp};
use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::{Hash, Hasher};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("weight matrix is not square: row {row} has {got} columns, expected {expected}")]
    NonSquareMatrix {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("frequency vector length {got} does not match matrix dimension {expected}")]
    FrequencyLengthMismatch { expected: usize, got: usize },
    #[error("coordinate list length {got} does not match matrix dimension {expected}")]
    CoordinateLengthMismatch { expected: usize, got: usize },
    #[error("node {index} has invalid relative frequency {value}")]
    InvalidFrequency { index: usize, value: f64 },
    #[error("network needs at least two nodes, got {0}")]
    TooFewNodes(usize),
    #[error("teleport probability {0} is outside [0, 1)")]
    InvalidTeleport(f64),
}

/// A single graph vertex. Identity is the integer index; equality and hashing
/// are structural over (index, x, y) so nodes from two independently built
/// snapshots of the same graph compare equal.
#[derive(Debug, Clone)]
pub struct Node {
    index: u32,
    x: f64,
    y: f64,
    relative_frequency: f64,
    out_edges: FxHashMap<u32, f64>,
    in_edges: FxHashMap<u32, f64>,
}

impl Node {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            x: 0.0,
            y: 0.0,
            relative_frequency: 0.0,
            out_edges: FxHashMap::default(),
            in_edges: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    #[inline]
    pub fn relative_frequency(&self) -> f64 {
        self.relative_frequency
    }

    pub fn set_relative_frequency(&mut self, relative_frequency: f64) {
        self.relative_frequency = relative_frequency;
    }

    /// Outgoing transition weights keyed by target node index.
    #[inline]
    pub fn out_edges(&self) -> &FxHashMap<u32, f64> {
        &self.out_edges
    }

    /// Incoming transition weights keyed by source node index.
    #[inline]
    pub fn in_edges(&self) -> &FxHashMap<u32, f64> {
        &self.in_edges
    }

    pub fn add_outgoing_edge(&mut self, target: u32, weight: f64) {
        self.out_edges.insert(target, weight);
    }

    pub fn add_incoming_edge(&mut self, source: u32, weight: f64) {
        self.in_edges.insert(source, weight);
    }

    #[inline]
    pub fn degree(&self) -> usize {
        self.out_edges.len() + self.in_edges.len()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.x.to_bits() == other.x.to_bits()
            && self.y.to_bits() == other.y.to_bits()
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
    }
}

/// Flat node storage with an index -> slot map. After dead-node removal slot
/// positions no longer match node indices, so all lookups go through `get`.
#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    nodes: Vec<Node>,
    position: FxHashMap<u32, u32>,
}

impl NodeTable {
    fn push(&mut self, node: Node) {
        self.position.insert(node.index, self.nodes.len() as u32);
        self.nodes.push(node);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&Node> {
        self.position
            .get(&index)
            .map(|&slot| &self.nodes[slot as usize])
    }

    fn get_mut(&mut self, index: u32) -> Option<&mut Node> {
        match self.position.get(&index) {
            Some(&slot) => Some(&mut self.nodes[slot as usize]),
            None => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Drops every node with zero in- and out-degree, then rebuilds the
    /// index -> slot map. Returns the number of dropped nodes.
    fn retain_live(&mut self) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.degree() > 0);
        self.position.clear();
        for (slot, node) in self.nodes.iter().enumerate() {
            self.position.insert(node.index, slot as u32);
        }
        before - self.nodes.len()
    }
}

/// A group of nodes treated as one community. The cached statistics are kept
/// consistent with membership by every mutation path.
#[derive(Debug, Clone)]
pub struct Module {
    members: FxHashSet<u32>,
    sum_node_frequencies: f64,
    exit_probability: f64,
    teleport_prob: f64,
    total_nodes: u32,
}

impl Module {
    pub fn singleton(
        node_index: u32,
        table: &NodeTable,
        teleport_prob: f64,
        total_nodes: u32,
    ) -> Self {
        let mut members = FxHashSet::default();
        members.insert(node_index);
        let mut module = Self {
            members,
            sum_node_frequencies: 0.0,
            exit_probability: 0.0,
            teleport_prob,
            total_nodes,
        };
        module.calc_sum_frequencies(table);
        module.calc_exit_probability(table, teleport_prob, total_nodes);
        module
    }

    #[inline]
    pub fn members(&self) -> &FxHashSet<u32> {
        &self.members
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[inline]
    pub fn contains(&self, node_index: u32) -> bool {
        self.members.contains(&node_index)
    }

    #[inline]
    pub fn sum_node_frequencies(&self) -> f64 {
        self.sum_node_frequencies
    }

    #[inline]
    pub fn exit_probability(&self) -> f64 {
        self.exit_probability
    }

    pub fn calc_sum_frequencies(&mut self, table: &NodeTable) -> f64 {
        let mut sum = 0.0;
        for &m in &self.members {
            if let Some(node) = table.get(m) {
                sum += node.relative_frequency();
            }
        }
        self.sum_node_frequencies = sum;
        sum
    }

    /// Probability flow crossing the module boundary per step:
    ///
    /// ```text
    /// q_m = beta * (N - |m|) / (N - 1) * sum_freq
    ///     + (1 - beta) * sum over members of freq(i) * weight(i -> outside)
    /// ```
    ///
    /// The supplied teleport probability and network size are remembered for
    /// later single-node mutations.
    pub fn calc_exit_probability(
        &mut self,
        table: &NodeTable,
        teleport_prob: f64,
        total_nodes: u32,
    ) -> f64 {
        self.teleport_prob = teleport_prob;
        self.total_nodes = total_nodes;

        let teleport_share = teleport_prob * (total_nodes as f64 - self.members.len() as f64)
            / (total_nodes as f64 - 1.0);

        let mut freq_sum = 0.0;
        let mut escape_sum = 0.0;
        for &m in &self.members {
            let node = match table.get(m) {
                Some(n) => n,
                None => continue,
            };
            freq_sum += node.relative_frequency();
            for (&target, &weight) in node.out_edges() {
                if !self.members.contains(&target) {
                    escape_sum += node.relative_frequency() * weight;
                }
            }
        }

        self.exit_probability = teleport_share * freq_sum + (1.0 - teleport_prob) * escape_sum;
        self.exit_probability
    }

    /// Destructively absorbs another module's members and recomputes the
    /// derived statistics against the supplied network parameters.
    pub fn absorb(
        &mut self,
        other: &Module,
        table: &NodeTable,
        teleport_prob: f64,
        total_nodes: u32,
    ) {
        self.members.extend(other.members.iter().copied());
        self.calc_sum_frequencies(table);
        self.calc_exit_probability(table, teleport_prob, total_nodes);
    }

    /// Adds one node and recomputes statistics with the remembered network
    /// parameters. Heat-bath move evaluation calls this on private copies.
    pub fn add_node(&mut self, node_index: u32, table: &NodeTable) {
        self.members.insert(node_index);
        self.recompute(table);
    }

    /// Removes one node and recomputes statistics. Returns whether the node
    /// was a member.
    pub fn remove_node(&mut self, node_index: u32, table: &NodeTable) -> bool {
        let removed = self.members.remove(&node_index);
        self.recompute(table);
        removed
    }

    fn recompute(&mut self, table: &NodeTable) {
        self.calc_sum_frequencies(table);
        let (teleport_prob, total_nodes) = (self.teleport_prob, self.total_nodes);
        self.calc_exit_probability(table, teleport_prob, total_nodes);
    }

    /// Independent copy with an identical membership and statistics snapshot.
    /// Candidate evaluation mutates copies, never the live partitioning.
    pub fn deep_copy(&self) -> Module {
        self.clone()
    }

    /// True iff any node in the smaller module has an outgoing or incoming
    /// edge into the larger module's member set. Cheap reject before a full
    /// cost evaluation: merging disconnected modules never reduces cost.
    pub fn are_connected(a: &Module, b: &Module, table: &NodeTable) -> bool {
        let (smaller, larger) = if a.len() < b.len() { (a, b) } else { (b, a) };
        for &m in &smaller.members {
            let node = match table.get(m) {
                Some(n) => n,
                None => continue,
            };
            if node.out_edges().keys().any(|t| larger.contains(*t)) {
                return true;
            }
            if node.in_edges().keys().any(|s| larger.contains(*s)) {
                return true;
            }
        }
        false
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for Module {}

/// The full graph plus its current partitioning. The partitioning is an
/// arena owned here; engines evaluate candidates on copies and commit through
/// the mutating methods below, so evaluation never races a commit.
#[derive(Debug, Clone)]
pub struct Network {
    table: NodeTable,
    partition: Vec<Module>,
    teleport_prob: f64,
    flat_entropy: f64,
    hierarchical_cost: f64,
}

impl Network {
    /// Builds a network from a square weight matrix and a relative-frequency
    /// vector. Diagonal entries are forced to zero. Coordinates, when given,
    /// are applied positionally before dead-node pruning. Fails fast on any
    /// construction-time contract violation.
    pub fn from_matrix(
        weights: &[Vec<f64>],
        frequencies: &[f64],
        coordinates: Option<&[(f64, f64)]>,
        teleport_prob: f64,
        remove_dead: bool,
    ) -> Result<Self, ModelError> {
        let n = weights.len();
        for (row, cols) in weights.iter().enumerate() {
            if cols.len() != n {
                return Err(ModelError::NonSquareMatrix {
                    row,
                    expected: n,
                    got: cols.len(),
                });
            }
        }
        if frequencies.len() != n {
            return Err(ModelError::FrequencyLengthMismatch {
                expected: n,
                got: frequencies.len(),
            });
        }
        if let Some(coords) = coordinates {
            if coords.len() != n {
                return Err(ModelError::CoordinateLengthMismatch {
                    expected: n,
                    got: coords.len(),
                });
            }
        }
        if n < 2 {
            return Err(ModelError::TooFewNodes(n));
        }
        if !(0.0..1.0).contains(&teleport_prob) {
            return Err(ModelError::InvalidTeleport(teleport_prob));
        }
        for (index, &f) in frequencies.iter().enumerate() {
            if f < 0.0 || !f.is_finite() {
                return Err(ModelError::InvalidFrequency { index, value: f });
            }
        }

        let mut table = NodeTable::default();
        for (i, &freq) in frequencies.iter().enumerate() {
            let mut node = Node::new(i as u32);
            node.set_relative_frequency(freq);
            if let Some(coords) = coordinates {
                node.set_position(coords[i].0, coords[i].1);
            }
            table.push(node);
        }

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let weight = weights[i][j];
                if weight != 0.0 {
                    if let Some(src) = table.get_mut(i as u32) {
                        src.add_outgoing_edge(j as u32, weight);
                    }
                    if let Some(dst) = table.get_mut(j as u32) {
                        dst.add_incoming_edge(i as u32, weight);
                    }
                }
            }
        }

        let mut net = Self {
            table,
            partition: Vec::new(),
            teleport_prob,
            flat_entropy: 0.0,
            hierarchical_cost: 0.0,
        };
        if remove_dead {
            net.table.retain_live();
        }
        if net.table.len() < 2 {
            return Err(ModelError::TooFewNodes(net.table.len()));
        }
        net.flat_entropy = flat_entropy_of(&net.table);
        net.reset_partition();
        Ok(net)
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn nodes(&self) -> &NodeTable {
        &self.table
    }

    /// The live partitioning: disjoint modules whose union is the node set.
    #[inline]
    pub fn partition(&self) -> &[Module] {
        &self.partition
    }

    #[inline]
    pub fn teleport_prob(&self) -> f64 {
        self.teleport_prob
    }

    /// Shannon entropy of the ungrouped visit-frequency distribution; the
    /// unavoidable baseline before any grouping. Constant per frequency
    /// vector.
    #[inline]
    pub fn flat_entropy(&self) -> f64 {
        self.flat_entropy
    }

    /// Most recent map-equation cost committed by an optimizer.
    #[inline]
    pub fn hierarchical_cost(&self) -> f64 {
        self.hierarchical_cost
    }

    /// Permanently discards nodes with zero in- and out-degree, recomputes
    /// the flat entropy, and rebuilds the singleton partitioning so the
    /// partition invariant keeps holding. After this call node slots no
    /// longer match node indices; key by index.
    pub fn remove_dead_nodes(&mut self) -> usize {
        let removed = self.table.retain_live();
        if removed > 0 {
            self.flat_entropy = flat_entropy_of(&self.table);
            self.reset_partition();
        }
        removed
    }

    /// Rebuilds the trivial partitioning of one singleton module per node.
    pub fn reset_partition(&mut self) {
        let total = self.table.len() as u32;
        let mut partition = Vec::with_capacity(self.table.len());
        for node in self.table.iter() {
            partition.push(Module::singleton(
                node.index(),
                &self.table,
                self.teleport_prob,
                total,
            ));
        }
        self.partition = partition;
        self.hierarchical_cost = cost(&self.partition, self.flat_entropy);
    }

    /// Index of the module currently holding a node.
    pub fn module_of(&self, node_index: u32) -> Option<usize> {
        self.partition.iter().position(|m| m.contains(node_index))
    }

    /// Modules with more than one member.
    pub fn significant_module_count(&self) -> usize {
        self.partition.iter().filter(|m| m.len() > 1).count()
    }

    /// Commit phase of the greedy engine: replaces modules `i` and `j`
    /// (i < j) with their merged result and records the new cost.
    pub(crate) fn commit_merge(&mut self, i: usize, j: usize, merged: Module, new_cost: f64) {
        debug_assert!(i < j);
        self.partition.swap_remove(j);
        self.partition.swap_remove(i);
        self.partition.push(merged);
        self.hierarchical_cost = new_cost;
    }

    /// Installs a whole replacement partitioning produced by an engine.
    pub(crate) fn replace_partition(&mut self, partition: Vec<Module>, new_cost: f64) {
        self.partition = partition;
        self.hierarchical_cost = new_cost;
    }

    pub(crate) fn set_hierarchical_cost(&mut self, new_cost: f64) {
        self.hierarchical_cost = new_cost;
    }
}

fn flat_entropy_of(table: &NodeTable) -> f64 {
    let mut entropy = 0.0;
    for node in table.iter() {
        entropy += plogp(node.relative_frequency());
    }
    -entropy
}
