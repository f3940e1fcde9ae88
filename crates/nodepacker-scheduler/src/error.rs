// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Scheduler error type
#[derive(Error, Debug, Diagnostic)]
pub enum SchedulerError {
    /// No machine type in the zone is a usable fit for the sized anchor
    #[error("No machine type in zone {zone} can hold {target}")]
    #[diagnostic(
        code(scheduler::selection_failure),
        help("Fetch machines for another zone or lower the sizing factor")
    )]
    SelectionFailure { zone: String, target: String },

    /// A workload does not fit on an empty node of the chosen machine type
    #[error("Workload {workload} {demand} does not fit on an empty {capacity} node")]
    #[diagnostic(
        code(scheduler::placement_deadlock),
        help("The workload is larger than the chosen machine type; reduce its requests")
    )]
    PlacementDeadlock {
        workload: String,
        demand: String,
        capacity: String,
    },

    /// No replica of the anchor family is loaded
    #[error("No replicas of anchor workload '{family}' found")]
    #[diagnostic(
        code(scheduler::anchor_not_found),
        help("Load manifests containing '{family}' or choose another anchor with --anchor")
    )]
    AnchorNotFound { family: String },

    /// The sizing factor must be a positive replica count
    #[error("Invalid sizing factor {factor}")]
    #[diagnostic(
        code(scheduler::invalid_sizing_factor),
        help("Use a sizing factor of at least 1")
    )]
    InvalidSizingFactor { factor: i64 },

    /// No machines are known for the zone
    #[error("No machines known for zone {zone}")]
    #[diagnostic(
        code(scheduler::unknown_zone),
        help("Run machines_fetch, or switch zone with machines_zone")
    )]
    UnknownZone { zone: String },
}

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

impl SchedulerError {
    /// Create a SelectionFailure error
    pub fn selection_failure(zone: impl Into<String>, target: impl Into<String>) -> Self {
        Self::SelectionFailure {
            zone: zone.into(),
            target: target.into(),
        }
    }

    /// Create a PlacementDeadlock error
    pub fn placement_deadlock(
        workload: impl Into<String>,
        demand: impl Into<String>,
        capacity: impl Into<String>,
    ) -> Self {
        Self::PlacementDeadlock {
            workload: workload.into(),
            demand: demand.into(),
            capacity: capacity.into(),
        }
    }

    /// Create an AnchorNotFound error
    pub fn anchor_not_found(family: impl Into<String>) -> Self {
        Self::AnchorNotFound {
            family: family.into(),
        }
    }

    /// Create an InvalidSizingFactor error
    pub fn invalid_sizing_factor(factor: i64) -> Self {
        Self::InvalidSizingFactor { factor }
    }

    /// Create an UnknownZone error
    pub fn unknown_zone(zone: impl Into<String>) -> Self {
        Self::UnknownZone { zone: zone.into() }
    }
}
