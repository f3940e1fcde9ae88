pub mod quantities;

pub use quantities::{format_units, parse_cpu, parse_display_units, parse_memory, parse_storage};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

/// A quantity triple with an optional identity.
///
/// Memory and CPU are fixed-point milli-units of their display unit: memory is
/// stored in megabytes (milli-GB) and CPU in millicores. Storage shares the
/// memory scale. Values are not required to be non-negative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub memory: i64,
    #[serde(default)]
    pub cpu: i64,
    #[serde(default)]
    pub storage: i64,
}

/// Machine type name to capacity, for a single zone
pub type ZoneMachines = BTreeMap<String, Resource>;

/// Machines by zone and machine type name
pub type Machines = BTreeMap<String, ZoneMachines>;

/// Workload name to resource request
pub type Pods = BTreeMap<String, Resource>;

impl Resource {
    /// Create a named resource without storage
    pub fn new(name: impl Into<String>, memory: i64, cpu: i64) -> Self {
        Self {
            name: name.into(),
            memory,
            cpu,
            storage: 0,
        }
    }

    /// Set the storage quantity
    pub fn with_storage(mut self, storage: i64) -> Self {
        self.storage = storage;
        self
    }

    /// Set the identity
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Multiply every quantity by `factor`, dropping the name.
    ///
    /// Returns `None` on overflow.
    pub fn scaled(&self, factor: i64) -> Option<Self> {
        Some(Self {
            name: String::new(),
            memory: self.memory.checked_mul(factor)?,
            cpu: self.cpu.checked_mul(factor)?,
            storage: self.storage.checked_mul(factor)?,
        })
    }

    /// Sum of two resources, dropping the name; `None` on overflow
    pub fn checked_add(&self, rhs: &Resource) -> Option<Self> {
        Some(Self {
            name: String::new(),
            memory: self.memory.checked_add(rhs.memory)?,
            cpu: self.cpu.checked_add(rhs.cpu)?,
            storage: self.storage.checked_add(rhs.storage)?,
        })
    }

    /// Whether this demand fits into `free` on CPU and memory.
    ///
    /// Storage is not compared.
    pub fn fits_within(&self, free: &Resource) -> bool {
        self.cpu <= free.cpu && self.memory <= free.memory
    }

    /// "CPU 4, Mem 15" style summary
    pub fn human_readable_mem_cpu(&self) -> String {
        format!(
            "CPU {}, Mem {}",
            format_units(self.cpu),
            format_units(self.memory)
        )
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cpu = format_units(self.cpu);
        let mem = format_units(self.memory);

        if self.name.is_empty() {
            write!(f, "{{cpu: {}, mem: {} GB}}", cpu, mem)
        } else {
            write!(f, "{{{}, cpu: {}, mem: {} GB}}", self.name, cpu, mem)
        }
    }
}

impl Add for &Resource {
    type Output = Resource;

    fn add(self, rhs: &Resource) -> Resource {
        Resource {
            name: String::new(),
            memory: self.memory.saturating_add(rhs.memory),
            cpu: self.cpu.saturating_add(rhs.cpu),
            storage: self.storage.saturating_add(rhs.storage),
        }
    }
}

impl Add for Resource {
    type Output = Resource;

    fn add(self, rhs: Resource) -> Resource {
        &self + &rhs
    }
}

impl Sub for &Resource {
    type Output = Resource;

    fn sub(self, rhs: &Resource) -> Resource {
        Resource {
            name: String::new(),
            memory: self.memory.saturating_sub(rhs.memory),
            cpu: self.cpu.saturating_sub(rhs.cpu),
            storage: self.storage.saturating_sub(rhs.storage),
        }
    }
}

impl<'a> Sum<&'a Resource> for Resource {
    fn sum<I: Iterator<Item = &'a Resource>>(iter: I) -> Self {
        iter.fold(Resource::default(), |acc, r| &acc + r)
    }
}

impl Sum for Resource {
    fn sum<I: Iterator<Item = Resource>>(iter: I) -> Self {
        iter.fold(Resource::default(), |acc, r| acc + r)
    }
}

/// Ordering used when listing resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Lexicographic by name
    #[default]
    Name,
    /// Ascending CPU, then memory
    Cpu,
    /// Ascending memory, then CPU
    Memory,
}

impl SortOrder {
    /// Compare two entries; equal quantities fall back to the name
    pub fn compare(&self, a: (&str, &Resource), b: (&str, &Resource)) -> Ordering {
        let by_quantity = match self {
            SortOrder::Name => Ordering::Equal,
            SortOrder::Cpu => a.1.cpu.cmp(&b.1.cpu).then(a.1.memory.cmp(&b.1.memory)),
            SortOrder::Memory => a.1.memory.cmp(&b.1.memory).then(a.1.cpu.cmp(&b.1.cpu)),
        };
        by_quantity.then_with(|| a.0.cmp(b.0))
    }
}

/// Return the keys of `resources` ordered by `order`
pub fn sort_names(resources: &BTreeMap<String, Resource>, order: SortOrder) -> Vec<&str> {
    let mut entries: Vec<(&str, &Resource)> =
        resources.iter().map(|(k, v)| (k.as_str(), v)).collect();
    entries.sort_by(|a, b| order.compare(*a, *b));
    entries.into_iter().map(|(k, _)| k).collect()
}

/// A boolean decision over a single resource record
pub trait ResourceFilter {
    /// Whether the record passes the filter
    fn pass(&self, resource: &Resource) -> bool;
}

/// Filter that passes every record
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ResourceFilter for AcceptAll {
    fn pass(&self, _resource: &Resource) -> bool {
        true
    }
}

/// Entries of `resources` in `order` that pass `filter`
pub fn select<'a, F>(
    resources: &'a BTreeMap<String, Resource>,
    order: SortOrder,
    filter: &F,
) -> Vec<(&'a str, &'a Resource)>
where
    F: ResourceFilter + ?Sized,
{
    sort_names(resources, order)
        .into_iter()
        .filter_map(|name| resources.get_key_value(name))
        .filter(|(_, r)| filter.pass(r))
        .map(|(k, r)| (k.as_str(), r))
        .collect()
}
