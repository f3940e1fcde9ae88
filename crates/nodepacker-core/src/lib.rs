//! Nodepacker Core - Fundamental types shared by the nodepacker crates
//!
//! This crate provides:
//! - The `Resource` quantity triple and the machine/pod inventories built from it
//! - Kubernetes quantity parsing and display formatting
//! - Error types with miette diagnostics
//! - Serialization helpers

pub mod error;
pub mod resources;

// Re-export commonly used types
pub use error::{NodepackerError, Result};
pub use resources::{
    select, sort_names, AcceptAll, Machines, Pods, Resource, ResourceFilter, SortOrder,
    ZoneMachines,
};

/// Serialize a value to pretty JSON
pub fn to_json_pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        NodepackerError::serialization_error(
            format!("Failed to serialize to JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Serialize a value to YAML
pub fn to_yaml<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_yaml::to_string(value).map_err(|e| {
        NodepackerError::serialization_error(
            format!("Failed to serialize to YAML: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Deserialize a value from YAML
pub fn from_yaml<T: for<'de> serde::Deserialize<'de>>(data: &str) -> Result<T> {
    serde_yaml::from_str(data).map_err(|e| {
        NodepackerError::serialization_error(
            format!("Failed to deserialize from YAML: {}", e),
            Some(Box::new(e)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_serialization() {
        let mut machines = Machines::new();
        machines
            .entry("us-central1-a".to_string())
            .or_default()
            .insert(
                "n1-standard-4".to_string(),
                Resource::new("n1-standard-4", 15000, 4000),
            );

        let yaml = to_yaml(&machines).unwrap();
        assert!(yaml.contains("n1-standard-4"));
        assert!(yaml.contains("memory: 15000"));

        let deserialized: Machines = from_yaml(&yaml).unwrap();
        assert_eq!(deserialized, machines);
    }

    #[test]
    fn test_json_serialization() {
        let json = to_json_pretty(&Resource::new("web", 2000, 500)).unwrap();
        assert!(json.contains("\"cpu\": 500"));
    }
}
