use nodepacker_core::{Resource, ZoneMachines};
use tracing::debug;

/// Highest cost; a candidate at this cost is never selected
pub const MAX_COST: f64 = 1.0;

/// Cost of running a target demand on a candidate machine type
pub trait CostFunction: Send + Sync {
    /// Cost in `[0, 1]`, lower is a better fit
    fn cost(&self, candidate: &Resource, target: &Resource) -> f64;

    /// Name of the cost function
    fn name(&self) -> &str;
}

/// Worst relative difference over memory and CPU.
///
/// Undersized dimensions cost [`MAX_COST`].
pub struct RelativeCost;

impl CostFunction for RelativeCost {
    fn cost(&self, candidate: &Resource, target: &Resource) -> f64 {
        relative_cost(candidate.memory, target.memory).max(relative_cost(candidate.cpu, target.cpu))
    }

    fn name(&self) -> &str {
        "RelativeCost"
    }
}

/// Chosen machine type
#[derive(Debug, Clone, PartialEq)]
pub struct BestFit {
    pub name: String,
    pub cost: f64,
    /// Capacity of one machine of this type
    pub capacity: Resource,
}

/// `(have - want) / (have + want)`, or 0.0 when both are zero
pub fn relative_difference(have: i64, want: i64) -> f64 {
    let sum = have as f64 + want as f64;
    if sum == 0.0 {
        return 0.0;
    }
    (have as f64 - want as f64) / sum
}

/// Relative difference with negative results raised to [`MAX_COST`]
pub fn relative_cost(have: i64, want: i64) -> f64 {
    let diff = relative_difference(have, want);
    if diff < 0.0 {
        MAX_COST
    } else {
        diff
    }
}

/// Pick the machine type with the lowest [`RelativeCost`] for the target
pub fn select_best_fit(
    candidates: &ZoneMachines,
    target_memory: i64,
    target_cpu: i64,
) -> Option<BestFit> {
    select_with(
        &RelativeCost,
        candidates,
        &Resource::new("", target_memory, target_cpu),
    )
}

/// Pick the candidate with the strictly lowest cost below [`MAX_COST`].
///
/// Candidates are visited in name order, so on equal cost the first name wins.
pub fn select_with(
    cost_fn: &dyn CostFunction,
    candidates: &ZoneMachines,
    target: &Resource,
) -> Option<BestFit> {
    let mut best: Option<BestFit> = None;
    let mut min_cost = MAX_COST;

    for (name, candidate) in candidates {
        let cost = cost_fn.cost(candidate, target);
        debug!(
            "Machine type {} {} cost: {:.4}",
            name,
            cost_fn.name(),
            cost
        );

        if cost < min_cost {
            min_cost = cost;
            best = Some(BestFit {
                name: name.clone(),
                cost,
                capacity: candidate.clone(),
            });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machines(entries: &[(&str, i64, i64)]) -> ZoneMachines {
        entries
            .iter()
            .map(|(name, memory, cpu)| (name.to_string(), Resource::new(*name, *memory, *cpu)))
            .collect()
    }

    #[test]
    fn test_relative_difference_range() {
        let samples = [0, 1, 2, 7, 500, 1000, 123_456, 10_000_000];
        for &a in &samples {
            for &b in &samples {
                let d = relative_difference(a, b);
                if a + b > 0 {
                    assert!((-1.0..=1.0).contains(&d), "{} {} -> {}", a, b, d);
                    if a > 0 {
                        assert!(d > -1.0, "{} {} -> {}", a, b, d);
                    }
                } else {
                    assert_eq!(d, 0.0);
                }
            }
        }
        assert_eq!(relative_difference(3000, 1000), 0.5);
        assert_eq!(relative_difference(1000, 0), 1.0);
    }

    #[test]
    fn test_relative_cost_clamps_undersized() {
        assert_eq!(relative_cost(1000, 2000), MAX_COST);
        assert_eq!(relative_cost(2000, 2000), 0.0);
        assert_eq!(relative_cost(0, 0), 0.0);
        assert_eq!(relative_cost(3000, 1000), 0.5);
    }

    #[test]
    fn test_cost_is_worst_dimension() {
        let cost = RelativeCost.cost(
            &Resource::new("", 8000, 4000),
            &Resource::new("", 2000, 1000),
        );
        assert_eq!(cost, 0.6);
        assert_eq!(RelativeCost.name(), "RelativeCost");
    }

    #[test]
    fn test_select_best_fit() {
        let m = machines(&[
            ("huge", 64000, 16000),
            ("small", 1000, 500),
            ("snug", 4000, 2000),
            ("tall", 4000, 8000),
        ]);

        let best = select_best_fit(&m, 4000, 2000).unwrap();
        assert_eq!(best.name, "snug");
        assert_eq!(best.cost, 0.0);
    }

    #[test]
    fn test_select_never_prefers_clamped() {
        // "a" is closer on memory but undersized on CPU
        let m = machines(&[("a", 2000, 500), ("b", 32000, 16000)]);
        let best = select_best_fit(&m, 2000, 1000).unwrap();
        assert_eq!(best.name, "b");
        assert!(best.cost < MAX_COST);
    }

    #[test]
    fn test_select_tie_breaks_on_name() {
        let m = machines(&[("zeta", 4000, 2000), ("alpha", 4000, 2000)]);
        assert_eq!(select_best_fit(&m, 2000, 1000).unwrap().name, "alpha");
    }

    #[test]
    fn test_select_none() {
        assert!(select_best_fit(&ZoneMachines::new(), 1000, 1000).is_none());

        let m = machines(&[("tiny", 100, 100)]);
        assert!(select_best_fit(&m, 1000, 1000).is_none());
    }

    struct CpuOnly;

    impl CostFunction for CpuOnly {
        fn cost(&self, candidate: &Resource, target: &Resource) -> f64 {
            relative_cost(candidate.cpu, target.cpu)
        }

        fn name(&self) -> &str {
            "CpuOnly"
        }
    }

    #[test]
    fn test_select_with_custom_cost() {
        let m = machines(&[("lowmem", 100, 2000), ("roomy", 8000, 4000)]);
        let target = Resource::new("", 4000, 2000);

        assert_eq!(select_with(&CpuOnly, &m, &target).unwrap().name, "lowmem");
        assert_eq!(select_with(&RelativeCost, &m, &target).unwrap().name, "roomy");
    }
}
