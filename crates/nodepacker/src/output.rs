use nodepacker_core::resources::format_units;
use nodepacker_core::{to_json_pretty, Resource};
use nodepacker_scheduler::PackingReport;
use tabled::settings::{Alignment, Style};
use tabled::{Table, Tabled};

#[derive(Debug, Tabled)]
struct ResourceRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "MEMORY")]
    memory: String,
}

impl ResourceRow {
    fn new(name: &str, resource: &Resource) -> Self {
        Self {
            name: name.to_string(),
            cpu: format_units(resource.cpu),
            memory: format!("{} GB", format_units(resource.memory)),
        }
    }
}

/// Render `(name, resource)` rows as a right aligned table
pub fn resource_table(rows: &[(&str, &Resource)]) -> String {
    let rows: Vec<ResourceRow> = rows
        .iter()
        .map(|(name, resource)| ResourceRow::new(name, resource))
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::blank()).with(Alignment::right());
    table.to_string()
}

pub fn print_resources(rows: &[(&str, &Resource)]) {
    if rows.is_empty() {
        println!("No items found.");
    } else {
        println!("{}", resource_table(rows));
    }
}

pub fn totals_line(total: &Resource) -> String {
    format!(
        "total CPU: {}, total mem: {}",
        format_units(total.cpu),
        format_units(total.memory)
    )
}

pub fn print_report(report: &PackingReport, json: bool) -> miette::Result<()> {
    if json {
        println!("{}", to_json_pretty(report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}
