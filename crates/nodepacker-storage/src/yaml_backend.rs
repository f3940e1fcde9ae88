use crate::{InventoryStore, Result, StorageError};
use nodepacker_core::{from_yaml, to_yaml, Machines};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CACHE_DIR: &str = ".nodepacker";
const CACHE_FILE: &str = "machines.yaml";

/// `~/.nodepacker/machines.yaml`
pub fn default_cache_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(CACHE_DIR).join(CACHE_FILE))
        .ok_or(StorageError::NoHomeDirectory)
}

/// Inventory cache stored as a YAML file
#[derive(Debug, Clone)]
pub struct YamlFileStore {
    path: PathBuf,
}

impl YamlFileStore {
    /// Create a store backed by `path`. The file is not touched until used.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create a store at [`default_cache_path`]
    pub fn open_default() -> Result<Self> {
        default_cache_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, action: &str, err: std::io::Error) -> StorageError {
        StorageError::io_error(
            self.location(),
            format!("Failed to {}: {}", action, err),
            Some(Box::new(err)),
        )
    }
}

impl InventoryStore for YamlFileStore {
    fn load(&self) -> Result<Option<Machines>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No inventory cache at {}", self.location());
                return Ok(None);
            }
            Err(e) => return Err(self.io_error("read inventory cache", e)),
        };

        let machines: Machines = from_yaml(&data)?;
        info!(
            "Loaded {} zones from inventory cache {}",
            machines.len(),
            self.location()
        );
        Ok(Some(machines))
    }

    fn save(&self, machines: &Machines) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error("create cache directory", e))?;
        }

        let data = to_yaml(machines)?;
        fs::write(&self.path, data).map_err(|e| self.io_error("write inventory cache", e))?;

        info!(
            "Saved {} zones to inventory cache {}",
            machines.len(),
            self.location()
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
