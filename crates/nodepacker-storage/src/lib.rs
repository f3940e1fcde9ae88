//! Nodepacker Storage - machine inventory cache
//!
//! This crate provides:
//! - InventoryStore trait for cache abstraction
//! - YAML file implementation (`~/.nodepacker/machines.yaml`)
//! - In-memory implementation

pub mod error;
pub mod memory;
pub mod store;
pub mod yaml_backend;

// Re-export commonly used types
pub use error::{Result, StorageError};
pub use memory::MemoryStore;
pub use store::InventoryStore;
pub use yaml_backend::{default_cache_path, YamlFileStore};
