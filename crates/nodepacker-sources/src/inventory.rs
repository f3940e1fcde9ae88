use crate::command::exec;
use crate::Result;
use nodepacker_core::resources::parse_display_units;
use nodepacker_core::{Machines, Resource};
use std::time::Duration;
use tracing::{info, warn};

const GCLOUD: &str = "gcloud";
const LIST_ARGS: [&str; 3] = ["compute", "machine-types", "list"];

/// Fetch every machine type in every zone from `gcloud`
pub async fn fetch_machines(limit: Duration) -> Result<Machines> {
    let output = exec(GCLOUD, &LIST_ARGS, limit).await?;
    let machines = parse_machine_listing(&output.stdout);

    info!(
        "Fetched {} machine types in {} zones",
        machines.values().map(|m| m.len()).sum::<usize>(),
        machines.len()
    );
    Ok(machines)
}

/// Parse `gcloud compute machine-types list` output.
///
/// Columns are `NAME ZONE CPUS MEMORY_GB`, separated by whitespace. The header
/// and rows with fewer than four columns are skipped, as are rows whose CPU or
/// memory column is not a number.
pub fn parse_machine_listing(text: &str) -> Machines {
    let mut machines = Machines::new();

    for line in text.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 || parts[0] == "NAME" {
            continue;
        }

        let (name, zone) = (parts[0], parts[1]);
        let (cpu, memory) = match (parse_display_units(parts[2]), parse_display_units(parts[3])) {
            (Ok(cpu), Ok(memory)) => (cpu, memory),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Skipping machine type {} in {}: {}", name, zone, e);
                continue;
            }
        };

        machines
            .entry(zone.to_string())
            .or_default()
            .insert(name.to_string(), Resource::new(name, memory, cpu));
    }

    machines
}
