use nodepacker_core::Resource;
use serde::Serialize;
use std::fmt;

/// Default anchor workload family
pub const DEFAULT_ANCHOR_FAMILY: &str = "indexed-search";

/// Default number of anchor replicas one machine should hold
pub const DEFAULT_SIZING_FACTOR: i64 = 2;

/// Configuration for the packer
#[derive(Debug, Clone)]
pub struct PackerConfig {
    /// Workload family whose replicas each get a dedicated node
    pub anchor_family: String,
    /// Machine types are sized to hold this many anchor replicas
    pub sizing_factor: i64,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            anchor_family: DEFAULT_ANCHOR_FAMILY.to_string(),
            sizing_factor: DEFAULT_SIZING_FACTOR,
        }
    }
}

/// A synthetic node and the workloads placed on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeAssignment {
    /// `node-<index>`
    pub id: String,
    /// Workload names in placement order
    pub workloads: Vec<String>,
    /// Capacity left after placement
    pub free: Resource,
}

impl NodeAssignment {
    pub(crate) fn new(index: usize, free: Resource) -> Self {
        Self {
            id: format!("node-{}", index),
            workloads: Vec::new(),
            free,
        }
    }
}

impl fmt::Display for NodeAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: [{}], free {}",
            self.id,
            self.workloads.join(", "),
            self.free
        )
    }
}

/// Result of a packing run
#[derive(Debug, Clone, Serialize)]
pub struct PackingReport {
    pub zone: String,
    pub machine_type: String,
    /// Capacity of one node of `machine_type`
    pub capacity: Resource,
    /// Selector cost of the chosen machine type
    pub cost: f64,
    pub anchor_family: String,
    pub anchor_replicas: usize,
    pub nodes: Vec<NodeAssignment>,
}

impl PackingReport {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Free capacity summed over all nodes
    pub fn total_free(&self) -> Resource {
        self.nodes.iter().map(|n| &n.free).sum()
    }

    /// Name of the node holding `workload`, if any
    pub fn node_of(&self, workload: &str) -> Option<&str> {
        self.nodes
            .iter()
            .find(|n| n.workloads.iter().any(|w| w == workload))
            .map(|n| n.id.as_str())
    }
}

impl fmt::Display for PackingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "replica count for {} is {}",
            self.anchor_family, self.anchor_replicas
        )?;
        writeln!(
            f,
            "cluster with {} nodes of machine type {}",
            self.node_count(),
            self.capacity.clone().with_name(self.machine_type.as_str())
        )?;
        writeln!(f, "Pod assignment as follows:")?;
        for node in &self.nodes {
            writeln!(f, "{}", node)?;
        }
        Ok(())
    }
}
