//! Nodepacker Scheduler - machine type selection and bin packing
//!
//! This crate provides:
//! - Best-fit machine type selection (relative cost)
//! - Greedy multi-pass packing of workloads onto synthetic nodes
//! - The packing report returned to the caller

pub mod error;
pub mod packer;
pub mod score;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SchedulerError};
pub use packer::Packer;
pub use score::{select_best_fit, select_with, BestFit, CostFunction, RelativeCost};
pub use types::{NodeAssignment, PackerConfig, PackingReport};
