use crate::{InventoryStore, Result};
use nodepacker_core::Machines;
use std::sync::Mutex;

/// Inventory store that keeps the cache in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    machines: Mutex<Option<Machines>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `machines`
    pub fn with_machines(machines: Machines) -> Self {
        Self {
            machines: Mutex::new(Some(machines)),
        }
    }
}

impl InventoryStore for MemoryStore {
    fn load(&self) -> Result<Option<Machines>> {
        let guard = self.machines.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }

    fn save(&self, machines: &Machines) -> Result<()> {
        let mut guard = self.machines.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(machines.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
