use crate::Result;
use nodepacker_core::Machines;

/// Persistent cache of the machine inventory
pub trait InventoryStore: Send + Sync {
    /// Load the cached inventory, `None` when nothing has been cached yet
    fn load(&self) -> Result<Option<Machines>>;

    /// Replace the cached inventory
    fn save(&self, machines: &Machines) -> Result<()>;

    /// Human readable location, used in log messages
    fn location(&self) -> String;
}
