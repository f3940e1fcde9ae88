use crate::{Result, SourceError};
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{Container, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use nodepacker_core::resources::{parse_cpu, parse_memory, parse_storage};
use nodepacker_core::{Pods, Resource};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Load every Deployment and StatefulSet below `paths`.
///
/// Each path may be a file or a directory; directories are walked in file name
/// order and only `.yaml` / `.yml` files are read. Later definitions of the
/// same workload name replace earlier ones.
pub fn load_manifests<P: AsRef<Path>>(paths: &[P]) -> Result<Pods> {
    let mut pods = Pods::new();

    for root in paths {
        let root = root.as_ref();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                SourceError::manifest_error(
                    root.display().to_string(),
                    format!("Failed to walk directory: {}", e),
                    Some(Box::new(e)),
                )
            })?;

            if !entry.file_type().is_file() || !is_yaml(entry.path()) {
                continue;
            }

            let path = entry.path().display().to_string();
            let data = std::fs::read_to_string(entry.path()).map_err(|e| {
                SourceError::manifest_error(&path, format!("Failed to read: {}", e), Some(Box::new(e)))
            })?;

            for workload in load_manifest_str(&path, &data)? {
                pods.insert(workload.name.clone(), workload);
            }
        }
    }

    info!("Loaded {} workloads from manifests", pods.len());
    Ok(pods)
}

/// Decode the workloads in one (possibly multi-document) manifest.
///
/// `origin` names the source in error messages.
pub fn load_manifest_str(origin: &str, data: &str) -> Result<Vec<Resource>> {
    let mut workloads = Vec::new();

    for document in serde_yaml::Deserializer::from_str(data) {
        let value = serde_yaml::Value::deserialize(document).map_err(|e| {
            SourceError::manifest_error(origin, format!("Invalid YAML: {}", e), Some(Box::new(e)))
        })?;
        if value.is_null() {
            continue;
        }

        let kind = value
            .get("kind")
            .and_then(|k| k.as_str())
            .ok_or_else(|| SourceError::missing_field(origin, "kind"))?
            .to_string();

        let (name, replicas, total) = match kind.as_str() {
            "Deployment" => {
                let deployment: Deployment = decode(origin, value)?;
                let spec = deployment
                    .spec
                    .ok_or_else(|| SourceError::missing_field(origin, "spec"))?;
                let total = template_requests(origin, &spec.template)?;
                (deployment.metadata.name, spec.replicas, total)
            }
            "StatefulSet" => {
                let set: StatefulSet = decode(origin, value)?;
                let spec = set
                    .spec
                    .ok_or_else(|| SourceError::missing_field(origin, "spec"))?;
                let mut total = template_requests(origin, &spec.template)?;
                for claim in spec.volume_claim_templates.iter().flatten() {
                    let requests = claim
                        .spec
                        .as_ref()
                        .and_then(|s| s.resources.as_ref())
                        .and_then(|r| r.requests.as_ref());
                    if let Some(requests) = requests {
                        total = add_requests(origin, &total, &requests_to_resource(origin, requests)?)?;
                    }
                }
                (set.metadata.name, spec.replicas, total)
            }
            other => {
                debug!("Skipping {} in {}", other, origin);
                continue;
            }
        };

        let name = name.ok_or_else(|| SourceError::missing_field(origin, "metadata.name"))?;
        let replicas =
            replicas.ok_or_else(|| SourceError::missing_field(origin, "spec.replicas"))?;

        debug!("{} {} with {} replicas: {}", kind, name, replicas, total);
        workloads.extend(expand_replicas(&name, replicas, &total));
    }

    Ok(workloads)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn decode<T: serde::de::DeserializeOwned>(origin: &str, value: serde_yaml::Value) -> Result<T> {
    serde_yaml::from_value(value).map_err(|e| {
        SourceError::manifest_error(origin, format!("Invalid workload: {}", e), Some(Box::new(e)))
    })
}

/// One replica keeps the bare name; more are named `<name>-<index>`
fn expand_replicas(name: &str, replicas: i32, total: &Resource) -> Vec<Resource> {
    if replicas == 1 {
        return vec![Resource {
            name: name.to_string(),
            ..total.clone()
        }];
    }

    (0..replicas.max(0))
        .map(|i| Resource {
            name: format!("{}-{}", name, i),
            ..total.clone()
        })
        .collect()
}

/// Requests summed over containers and init containers
fn template_requests(origin: &str, template: &PodTemplateSpec) -> Result<Resource> {
    let Some(spec) = template.spec.as_ref() else {
        return Ok(Resource::default());
    };

    let containers: Vec<&Container> = spec
        .containers
        .iter()
        .chain(spec.init_containers.iter().flatten())
        .collect();

    let mut total = Resource::default();
    for container in containers {
        let requests = container
            .resources
            .as_ref()
            .and_then(|r| r.requests.as_ref());
        if let Some(requests) = requests {
            total = add_requests(origin, &total, &requests_to_resource(origin, requests)?)?;
        }
    }
    Ok(total)
}

fn add_requests(origin: &str, total: &Resource, requests: &Resource) -> Result<Resource> {
    total.checked_add(requests).ok_or_else(|| {
        SourceError::invalid_quantity(origin, "summed requests exceed the representable range")
    })
}

fn requests_to_resource(origin: &str, requests: &BTreeMap<String, Quantity>) -> Result<Resource> {
    let quantity = |key: &str, parse: fn(&str) -> nodepacker_core::Result<i64>| -> Result<i64> {
        match requests.get(key) {
            Some(q) => parse(&q.0)
                .map_err(|e| SourceError::invalid_quantity(origin, format!("{}: {}", key, e))),
            None => Ok(0),
        }
    };

    Ok(Resource::new("", quantity("memory", parse_memory)?, quantity("cpu", parse_cpu)?)
        .with_storage(quantity("storage", parse_storage)?))
}
