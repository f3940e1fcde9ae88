use crate::score::{select_with, CostFunction, RelativeCost};
use crate::types::{NodeAssignment, PackerConfig, PackingReport};
use crate::{Result, SchedulerError};
use nodepacker_core::{Machines, Pods, Resource, ZoneMachines};
use tracing::{debug, info, warn};

/// Greedy bin packer.
///
/// Each anchor replica gets a node of its own on the selected machine type;
/// every other workload is placed, largest CPU first, on the node with the
/// most free CPU. Nodes are added until everything fits.
pub struct Packer {
    config: PackerConfig,
    cost: Box<dyn CostFunction>,
}

impl Packer {
    /// Create a packer using [`RelativeCost`] for machine selection
    pub fn new(config: PackerConfig) -> Self {
        Self {
            config,
            cost: Box::new(RelativeCost),
        }
    }

    /// Replace the machine selection cost function
    pub fn with_cost_function(mut self, cost: Box<dyn CostFunction>) -> Self {
        self.cost = cost;
        self
    }

    pub fn config(&self) -> &PackerConfig {
        &self.config
    }

    /// Pack `pods` onto the machines of `zone`
    pub fn pack(&self, pods: &Pods, machines: &Machines, zone: &str) -> Result<PackingReport> {
        let zone_machines = machines
            .get(zone)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| SchedulerError::unknown_zone(zone))?;

        self.pack_zone(pods, zone_machines, zone)
    }

    /// Pack `pods` onto the given machine types, labelling the report with `zone`
    pub fn pack_zone(
        &self,
        pods: &Pods,
        machines: &ZoneMachines,
        zone: &str,
    ) -> Result<PackingReport> {
        let family = self.config.anchor_family.as_str();
        let factor = self.config.sizing_factor;
        if factor < 1 {
            return Err(SchedulerError::invalid_sizing_factor(factor));
        }

        let replicas = anchor_replicas(pods, family)?;
        info!("Replica count for {} is {}", family, replicas.len());

        let (anchor, replica) = replicas[0];
        let target = replica.scaled(factor).ok_or_else(|| {
            SchedulerError::selection_failure(
                zone,
                format!(
                    "{} x {} ({}), which overflows",
                    factor,
                    anchor,
                    replica.human_readable_mem_cpu()
                ),
            )
        })?;
        let best = select_with(self.cost.as_ref(), machines, &target).ok_or_else(|| {
            SchedulerError::selection_failure(
                zone,
                format!(
                    "{} x {} ({})",
                    factor,
                    anchor,
                    target.human_readable_mem_cpu()
                ),
            )
        })?;
        info!(
            "Selected machine type {} ({}) with cost {:.3}",
            best.name,
            best.capacity.human_readable_mem_cpu(),
            best.cost
        );

        let capacity = Resource {
            name: String::new(),
            ..best.capacity.clone()
        };

        if pods.values().any(|r| r.storage > 0) {
            warn!("Storage requests are tracked but not checked against node capacity");
        }

        let mut nodes: Vec<NodeAssignment> = replicas
            .iter()
            .enumerate()
            .map(|(i, (name, demand))| {
                let mut node = NodeAssignment::new(i, &capacity - *demand);
                node.workloads.push(name.to_string());
                node
            })
            .collect();

        let (mut pending, left_out) = remaining_workloads(pods, family, &replicas);
        for name in left_out {
            warn!(
                "Leaving out {}: it shares the {} prefix but is not a counted replica",
                name, family
            );
        }
        pending.sort_by(|a, b| {
            b.1.cpu
                .cmp(&a.1.cpu)
                .then(b.1.memory.cmp(&a.1.memory))
                .then(a.0.cmp(b.0))
        });

        let mut grew = false;
        while !pending.is_empty() {
            let before = pending.len();
            pending.retain(|(name, demand)| !place(&mut nodes, name, demand));

            if pending.len() < before {
                grew = false;
                continue;
            }

            if grew {
                let (name, demand) = pending[0];
                return Err(SchedulerError::placement_deadlock(
                    name,
                    demand.human_readable_mem_cpu(),
                    format!("{} ({})", best.name, capacity.human_readable_mem_cpu()),
                ));
            }

            let node = NodeAssignment::new(nodes.len(), capacity.clone());
            info!(
                "Adding {} for {} unplaced workloads",
                node.id,
                pending.len()
            );
            nodes.push(node);
            grew = true;
        }

        Ok(PackingReport {
            zone: zone.to_string(),
            machine_type: best.name,
            capacity,
            cost: best.cost,
            anchor_family: family.to_string(),
            anchor_replicas: replicas.len(),
            nodes,
        })
    }
}

impl Default for Packer {
    fn default() -> Self {
        Self::new(PackerConfig::default())
    }
}

/// Contiguous replicas `<family>-0`, `<family>-1`, ... or the bare
/// `<family>` workload when it runs a single replica
fn anchor_replicas<'a>(pods: &'a Pods, family: &str) -> Result<Vec<(&'a str, &'a Resource)>> {
    let mut replicas = Vec::new();
    while let Some((name, r)) = pods.get_key_value(format!("{}-{}", family, replicas.len()).as_str())
    {
        replicas.push((name.as_str(), r));
    }

    if replicas.is_empty() {
        if let Some((name, r)) = pods.get_key_value(family) {
            replicas.push((name.as_str(), r));
        }
    }

    if replicas.is_empty() {
        return Err(SchedulerError::anchor_not_found(family));
    }

    Ok(replicas)
}

/// Workloads to pack after the anchor replicas, and the names skipped because
/// they carry the family prefix without being counted replicas
fn remaining_workloads<'a>(
    pods: &'a Pods,
    family: &str,
    replicas: &[(&'a str, &'a Resource)],
) -> (Vec<(&'a str, &'a Resource)>, Vec<&'a str>) {
    let mut pending = Vec::new();
    let mut left_out = Vec::new();

    for (name, demand) in pods {
        if !name.starts_with(family) {
            pending.push((name.as_str(), demand));
        } else if !replicas.iter().any(|(replica, _)| *replica == name.as_str()) {
            left_out.push(name.as_str());
        }
    }

    (pending, left_out)
}

/// Index of the node with the most free CPU, then memory, then the lowest index
fn most_free(nodes: &[NodeAssignment]) -> Option<usize> {
    nodes
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| {
            a.free
                .cpu
                .cmp(&b.free.cpu)
                .then(a.free.memory.cmp(&b.free.memory))
                .then(ib.cmp(ia))
        })
        .map(|(i, _)| i)
}

/// Place `demand` on the most free node if it fits
fn place(nodes: &mut [NodeAssignment], name: &str, demand: &Resource) -> bool {
    let Some(index) = most_free(nodes) else {
        return false;
    };
    let node = &mut nodes[index];

    if !demand.fits_within(&node.free) {
        return false;
    }

    node.free = &node.free - demand;
    node.workloads.push(name.to_string());
    debug!("Placed {} on {}, free {}", name, node.id, node.free);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONE: &str = "us-central1-a";

    fn pods(entries: &[(&str, i64, i64)]) -> Pods {
        entries
            .iter()
            .map(|(name, memory, cpu)| (name.to_string(), Resource::new(*name, *memory, *cpu)))
            .collect()
    }

    fn zone(entries: &[(&str, i64, i64)]) -> ZoneMachines {
        pods(entries)
    }

    fn packer(anchor: &str) -> Packer {
        Packer::new(PackerConfig {
            anchor_family: anchor.to_string(),
            ..PackerConfig::default()
        })
    }

    fn assigned(report: &PackingReport, pods: &Pods) -> Resource {
        report
            .nodes
            .iter()
            .flat_map(|n| n.workloads.iter())
            .filter_map(|w| pods.get(w))
            .sum()
    }

    #[test]
    fn test_pack_end_to_end() {
        let machines = zone(&[("m1", 8000, 4000)]);
        let pods = pods(&[
            ("anchor-0", 1000, 500),
            ("anchor-1", 1000, 500),
            ("w1", 2000, 1000),
        ]);

        let report = packer("anchor").pack_zone(&pods, &machines, ZONE).unwrap();

        assert_eq!(report.machine_type, "m1");
        assert_eq!(report.anchor_replicas, 2);
        assert_eq!(report.node_count(), 2);
        assert_eq!(report.nodes[0].workloads, vec!["anchor-0", "w1"]);
        assert_eq!(report.nodes[1].workloads, vec!["anchor-1"]);
        assert_eq!(report.nodes[0].free, Resource::new("", 5000, 2500));

        let total = &report.total_free() + &assigned(&report, &pods);
        assert_eq!(total, report.capacity.scaled(report.node_count() as i64).unwrap());
    }

    #[test]
    fn test_pack_by_zone() {
        let mut machines = Machines::new();
        machines.insert(ZONE.to_string(), zone(&[("m1", 8000, 4000)]));
        let pods = pods(&[("anchor-0", 1000, 500)]);

        let report = packer("anchor").pack(&pods, &machines, ZONE).unwrap();
        assert_eq!(report.zone, ZONE);
        assert_eq!(report.node_count(), 1);

        let err = packer("anchor")
            .pack(&pods, &machines, "europe-west1-b")
            .unwrap_err();
        assert!(matches!(err, SchedulerError::UnknownZone { .. }));
    }

    #[test]
    fn test_pack_spills_onto_new_node() {
        let machines = zone(&[("m1", 8000, 4000)]);
        let pods = pods(&[("anchor-0", 1000, 500), ("a", 4000, 2000), ("b", 4000, 2000)]);

        let report = packer("anchor").pack_zone(&pods, &machines, ZONE).unwrap();

        assert_eq!(report.node_count(), 2);
        assert_eq!(report.node_of("a"), Some("node-0"));
        assert_eq!(report.node_of("b"), Some("node-1"));
        assert_eq!(report.nodes[1].free, Resource::new("", 4000, 2000));

        let total = &report.total_free() + &assigned(&report, &pods);
        assert_eq!(total, report.capacity.scaled(2).unwrap());
    }

    #[test]
    fn test_pack_order_is_cpu_then_memory_then_name() {
        let machines = zone(&[("m1", 100_000, 100_000)]);
        let pods = pods(&[
            ("anchor-0", 20_000, 20_000),
            ("c", 1000, 1000),
            ("b", 2000, 1000),
            ("a", 1000, 1000),
            ("d", 1000, 3000),
        ]);

        let report = packer("anchor").pack_zone(&pods, &machines, ZONE).unwrap();
        assert_eq!(report.nodes[0].workloads, vec!["anchor-0", "d", "b", "a", "c"]);
    }

    #[test]
    fn test_pack_prefers_most_free_node() {
        let machines = zone(&[("m1", 8000, 4000)]);
        let pods = pods(&[
            ("anchor-0", 1000, 500),
            ("anchor-1", 1000, 500),
            ("x", 1000, 1000),
            ("y", 1000, 1000),
        ]);

        let report = packer("anchor").pack_zone(&pods, &machines, ZONE).unwrap();
        assert_eq!(report.node_of("x"), Some("node-0"));
        assert_eq!(report.node_of("y"), Some("node-1"));
    }

    #[test]
    fn test_pack_deadlock() {
        let machines = zone(&[("m1", 8000, 4000), ("m2", 16000, 8000)]);
        let pods = pods(&[("anchor-0", 1000, 500), ("giant", 1000, 100_000)]);

        let err = packer("anchor").pack_zone(&pods, &machines, ZONE).unwrap_err();
        match err {
            SchedulerError::PlacementDeadlock { workload, .. } => assert_eq!(workload, "giant"),
            other => panic!("expected deadlock, got {:?}", other),
        }
    }

    #[test]
    fn test_pack_selection_failure() {
        let machines = zone(&[("tiny", 1000, 500)]);
        let pods = pods(&[("anchor-0", 1000, 500)]);

        let err = packer("anchor").pack_zone(&pods, &machines, ZONE).unwrap_err();
        assert!(matches!(err, SchedulerError::SelectionFailure { .. }));

        let err = packer("anchor")
            .pack_zone(&pods, &ZoneMachines::new(), ZONE)
            .unwrap_err();
        assert!(matches!(err, SchedulerError::SelectionFailure { .. }));
    }

    #[test]
    fn test_anchor_single_replica_keeps_bare_name() {
        let machines = zone(&[("m1", 8000, 4000)]);
        let pods = pods(&[("anchor", 1000, 500), ("w", 1000, 500)]);

        let report = packer("anchor").pack_zone(&pods, &machines, ZONE).unwrap();
        assert_eq!(report.anchor_replicas, 1);
        assert_eq!(report.nodes[0].workloads, vec!["anchor", "w"]);
    }

    #[test]
    fn test_anchor_not_found() {
        let machines = zone(&[("m1", 8000, 4000)]);
        let pods = pods(&[("web", 1000, 500)]);

        let err = packer("anchor").pack_zone(&pods, &machines, ZONE).unwrap_err();
        assert!(matches!(err, SchedulerError::AnchorNotFound { .. }));
    }

    #[test]
    fn test_anchor_replicas_stop_at_gap() {
        let pods = pods(&[("anchor-0", 1, 1), ("anchor-1", 1, 1), ("anchor-3", 1, 1)]);
        let replicas = anchor_replicas(&pods, "anchor").unwrap();
        assert_eq!(
            replicas.iter().map(|(n, _)| *n).collect::<Vec<_>>(),
            vec!["anchor-0", "anchor-1"]
        );
    }

    #[test]
    fn test_family_prefixed_non_replicas_are_left_out() {
        let pods = pods(&[
            ("anchor-0", 1, 1),
            ("anchor-3", 1, 1),
            ("anchor-indexer", 1, 1),
            ("web", 1, 1),
        ]);
        let replicas = anchor_replicas(&pods, "anchor").unwrap();
        let (pending, left_out) = remaining_workloads(&pods, "anchor", &replicas);

        assert_eq!(
            pending.iter().map(|(n, _)| *n).collect::<Vec<_>>(),
            vec!["web"]
        );
        assert_eq!(left_out, vec!["anchor-3", "anchor-indexer"]);

        let machines = zone(&[("m1", 8000, 4000)]);
        let report = packer("anchor").pack_zone(&pods, &machines, ZONE).unwrap();
        assert_eq!(report.node_of("anchor-3"), None);
        assert_eq!(report.node_of("web"), Some("node-0"));
    }

    #[test]
    fn test_invalid_sizing_factor() {
        let machines = zone(&[("m1", 8000, 4000)]);
        let pods = pods(&[("anchor-0", 1000, 500)]);

        for factor in [0, -1] {
            let packer = Packer::new(PackerConfig {
                anchor_family: "anchor".to_string(),
                sizing_factor: factor,
            });
            let err = packer.pack_zone(&pods, &machines, ZONE).unwrap_err();
            assert!(matches!(err, SchedulerError::InvalidSizingFactor { factor: f } if f == factor));
        }
    }

    #[test]
    fn test_sizing_factor_overflow_is_selection_failure() {
        let machines = zone(&[("m1", 8000, 4000)]);
        let pods = pods(&[("anchor-0", 1000, 500)]);
        let packer = Packer::new(PackerConfig {
            anchor_family: "anchor".to_string(),
            sizing_factor: i64::MAX,
        });

        let err = packer.pack_zone(&pods, &machines, ZONE).unwrap_err();
        assert!(matches!(err, SchedulerError::SelectionFailure { .. }));
    }

    #[test]
    fn test_storage_is_tracked_but_not_enforced() {
        let machines = zone(&[("m1", 8000, 4000)]);
        let mut pods = pods(&[("anchor-0", 1000, 500)]);
        pods.insert(
            "db".to_string(),
            Resource::new("db", 1000, 500).with_storage(1_000_000),
        );

        let report = packer("anchor").pack_zone(&pods, &machines, ZONE).unwrap();
        assert_eq!(report.node_count(), 1);
        assert_eq!(report.nodes[0].free.storage, -1_000_000);
    }

    #[test]
    fn test_pack_is_deterministic() {
        let machines = zone(&[("m1", 8000, 4000), ("m2", 8000, 4000)]);
        let pods = pods(&[
            ("anchor-0", 1000, 500),
            ("anchor-1", 1000, 500),
            ("p", 3000, 1500),
            ("q", 3000, 1500),
            ("r", 3000, 1500),
        ]);

        let first = packer("anchor").pack_zone(&pods, &machines, ZONE).unwrap();
        let second = packer("anchor").pack_zone(&pods, &machines, ZONE).unwrap();
        assert_eq!(first.machine_type, "m1");
        assert_eq!(first.nodes, second.nodes);
    }

    struct Largest;

    impl CostFunction for Largest {
        fn cost(&self, candidate: &Resource, _target: &Resource) -> f64 {
            1.0 / (1.0 + candidate.cpu as f64)
        }

        fn name(&self) -> &str {
            "Largest"
        }
    }

    #[test]
    fn test_pack_with_custom_cost_function() {
        let machines = zone(&[("m1", 8000, 4000), ("m2", 64000, 32000)]);
        let pods = pods(&[("anchor-0", 1000, 500)]);

        let report = packer("anchor")
            .with_cost_function(Box::new(Largest))
            .pack_zone(&pods, &machines, ZONE)
            .unwrap();
        assert_eq!(report.machine_type, "m2");
    }

    #[test]
    fn test_default_packer_uses_indexed_search() {
        let packer = Packer::default();
        assert_eq!(packer.config().anchor_family, "indexed-search");
    }
}
