use clap::{Args, ValueEnum};
use nodepacker_core::{select, Machines, Pods, Resource, ResourceFilter, SortOrder};
use nodepacker_scheduler::types::{DEFAULT_ANCHOR_FAMILY, DEFAULT_SIZING_FACTOR};
use nodepacker_scheduler::{Packer, PackerConfig, PackingReport, SchedulerError};
use nodepacker_sources::{fetch_machines, load_manifests};
use nodepacker_storage::{InventoryStore, YamlFileStore};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_ZONE: &str = "us-central1-a";

/// Settings shared by every command
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Zone whose machine types are listed and packed onto
    #[arg(long, env = "NODEPACKER_ZONE", default_value = DEFAULT_ZONE, global = true)]
    pub zone: String,

    /// Machine inventory cache (default: ~/.nodepacker/machines.yaml)
    #[arg(long, env = "NODEPACKER_CACHE_FILE", global = true)]
    pub cache_file: Option<PathBuf>,

    /// Workload family whose replicas each get their own node
    #[arg(long, env = "NODEPACKER_ANCHOR", default_value = DEFAULT_ANCHOR_FAMILY, global = true)]
    pub anchor: String,

    /// Machine types are sized to hold this many anchor replicas
    #[arg(
        long,
        default_value_t = DEFAULT_SIZING_FACTOR,
        value_parser = clap::value_parser!(i64).range(1..),
        global = true
    )]
    pub sizing_factor: i64,

    /// Timeout for `gcloud compute machine-types list`
    #[arg(long, default_value_t = 20, global = true)]
    pub fetch_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            zone: DEFAULT_ZONE.to_string(),
            cache_file: None,
            anchor: DEFAULT_ANCHOR_FAMILY.to_string(),
            sizing_factor: DEFAULT_SIZING_FACTOR,
            fetch_timeout_secs: 20,
        }
    }
}

/// Listing order for machine types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    #[default]
    Cpu,
    Mem,
}

impl From<SortKey> for SortOrder {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Cpu => SortOrder::Cpu,
            SortKey::Mem => SortOrder::Memory,
        }
    }
}

/// State carried between commands: current zone, inventories and the cache
pub struct Session {
    zone: String,
    machines: Machines,
    pods: Pods,
    store: Box<dyn InventoryStore>,
    packer: Packer,
    fetch_timeout: Duration,
}

impl Session {
    /// Open a session backed by the YAML cache, loading whatever it holds
    pub fn open(settings: Settings) -> miette::Result<Self> {
        let store = match &settings.cache_file {
            Some(path) => YamlFileStore::new(path),
            None => YamlFileStore::open_default()?,
        };
        Ok(Self::with_store(settings, Box::new(store)))
    }

    /// Open a session over any inventory store
    pub fn with_store(settings: Settings, store: Box<dyn InventoryStore>) -> Self {
        let machines = match store.load() {
            Ok(Some(machines)) => machines,
            Ok(None) => {
                info!(
                    "No machine inventory cached at {}, run machines_fetch",
                    store.location()
                );
                Machines::new()
            }
            Err(e) => {
                warn!("Ignoring unreadable inventory cache: {}", e);
                Machines::new()
            }
        };

        let packer = Packer::new(PackerConfig {
            anchor_family: settings.anchor,
            sizing_factor: settings.sizing_factor,
        });

        Self {
            zone: settings.zone,
            machines,
            pods: Pods::new(),
            store,
            packer,
            fetch_timeout: Duration::from_secs(settings.fetch_timeout_secs),
        }
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn machines(&self) -> &Machines {
        &self.machines
    }

    pub fn pods(&self) -> &Pods {
        &self.pods
    }

    /// Zone names with known machines
    pub fn zones(&self) -> Vec<String> {
        self.machines.keys().cloned().collect()
    }

    /// Switch the current zone; only zones with known machines are accepted
    pub fn set_zone(&mut self, zone: &str) -> miette::Result<()> {
        if !self.machines.contains_key(zone) {
            return Err(SchedulerError::unknown_zone(zone).into());
        }
        self.zone = zone.to_string();
        info!("Current zone set to {}", zone);
        Ok(())
    }

    /// Refresh the inventory from gcloud and write it to the cache
    pub async fn fetch_machines(&mut self) -> miette::Result<()> {
        let machines = fetch_machines(self.fetch_timeout).await?;
        self.replace_machines(machines);
        Ok(())
    }

    fn replace_machines(&mut self, machines: Machines) {
        if let Err(e) = self.store.save(&machines) {
            warn!("Failed to cache machine inventory: {}", e);
        }
        if !machines.contains_key(&self.zone) {
            warn!("Fetched inventory has no machines for zone {}", self.zone);
        }
        self.machines = machines;
    }

    /// Machine types of the current zone passing `filter`
    pub fn machine_rows<F: ResourceFilter + ?Sized>(
        &self,
        order: SortOrder,
        filter: &F,
    ) -> miette::Result<Vec<(&str, &Resource)>> {
        let machines = self
            .machines
            .get(&self.zone)
            .ok_or_else(|| SchedulerError::unknown_zone(&self.zone))?;
        Ok(select(machines, order, filter))
    }

    /// Replace the workloads with those found below `paths`
    pub fn read_manifests<P: AsRef<Path>>(&mut self, paths: &[P]) -> miette::Result<usize> {
        self.pods = load_manifests(paths)?;
        Ok(self.pods.len())
    }

    /// Workloads passing `filter`, by name
    pub fn pod_rows<F: ResourceFilter + ?Sized>(&self, filter: &F) -> Vec<(&str, &Resource)> {
        select(&self.pods, SortOrder::Name, filter)
    }

    /// Requests summed over every loaded workload
    pub fn pod_totals(&self) -> Resource {
        self.pods.values().sum()
    }

    /// Pack the loaded workloads onto the current zone
    pub fn pack(&self) -> miette::Result<PackingReport> {
        Ok(self.packer.pack(&self.pods, &self.machines, &self.zone)?)
    }
}
