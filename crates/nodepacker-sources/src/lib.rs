//! Nodepacker Sources - where inventories come from
//!
//! This crate provides:
//! - An async command runner with timeouts
//! - Machine type inventory from `gcloud compute machine-types list`
//! - Workload requests from Kubernetes Deployment and StatefulSet manifests

pub mod command;
pub mod error;
pub mod inventory;
pub mod manifest;

// Re-export commonly used types
pub use command::{exec, CommandOutput};
pub use error::{Result, SourceError};
pub use inventory::{fetch_machines, parse_machine_listing};
pub use manifest::{load_manifest_str, load_manifests};
