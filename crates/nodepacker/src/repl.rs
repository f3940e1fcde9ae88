use crate::completer::ReplHelper;
use crate::output::{print_report, print_resources, totals_line};
use crate::session::{Session, SortKey};
use clap::{Parser, Subcommand};
use nodepacker_query::{compile, Predicate};
use rustyline::error::ReadlineError;
use rustyline::history::{DefaultHistory, History};
use rustyline::Editor;
use std::path::PathBuf;
use tracing::debug;

pub const PROMPT: &str = "nodepacker> ";

/// Command names and one line descriptions, as listed by `help`
pub const COMMANDS: &[(&str, &str)] = &[
    ("help", "list available commands"),
    ("exit", "leave the shell (also: quit)"),
    ("machines_fetch", "fetch machine types of every zone from gcloud"),
    ("machines_zone", "show the current zone, or switch to ZONE"),
    ("machines_show", "list machine types of the current zone: [--sort cpu|mem] [FILTER]"),
    ("manifests_read", "read Deployments and StatefulSets below PATH..."),
    ("pods_show", "list loaded workloads and their totals: [FILTER]"),
    ("nodes_pack", "pack the workloads onto the best fitting machine type: [--json]"),
];

#[derive(Debug, Parser)]
#[command(
    name = "nodepacker",
    no_binary_name = true,
    disable_help_subcommand = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Statement {
    #[command(subcommand)]
    command: ReplCommand,
}

#[derive(Debug, PartialEq, Subcommand)]
#[command(rename_all = "snake_case")]
enum ReplCommand {
    Help,
    #[command(alias = "quit")]
    Exit,
    MachinesFetch,
    MachinesZone {
        zone: Option<String>,
    },
    MachinesShow {
        #[arg(long, value_enum, default_value_t = SortKey::Cpu)]
        sort: SortKey,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        filter: Vec<String>,
    },
    ManifestsRead {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    PodsShow {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        filter: Vec<String>,
    },
    NodesPack {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Split a line into words, dropping a trailing `;`
pub fn split_statement(line: &str) -> Vec<String> {
    let mut words: Vec<String> = line.split_whitespace().map(str::to_string).collect();
    if let Some(last) = words.last_mut() {
        if let Some(stripped) = last.strip_suffix(';') {
            *last = stripped.to_string();
        }
        if last.is_empty() {
            words.pop();
        }
    }
    words
}

/// Run the interactive shell until `exit` or end of input
pub async fn run(session: &mut Session) -> miette::Result<()> {
    let mut rl: Editor<ReplHelper, DefaultHistory> =
        Editor::new().map_err(|e| miette::miette!("Failed to start line editor: {}", e))?;
    rl.set_helper(Some(ReplHelper::new(COMMANDS, session.zones())));

    if session.machines().is_empty() {
        println!("No machine types known yet, run machines_fetch");
    }

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let words = split_statement(&line);
                if words.is_empty() {
                    continue;
                }
                record_history(rl.history_mut(), &line);

                match execute(session, &words).await {
                    Ok(Flow::Exit) => break,
                    Ok(Flow::Continue) => {}
                    Err(report) => eprintln!("{:?}", report),
                }

                if let Some(helper) = rl.helper_mut() {
                    helper.set_zones(session.zones());
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(miette::miette!("Failed to read input: {}", e)),
        }
    }

    Ok(())
}

fn record_history<H: History>(history: &mut H, line: &str) {
    if let Err(e) = history.add(line) {
        debug!("Failed to record history entry: {}", e);
    }
}

/// Execute one statement against the session
pub async fn execute(session: &mut Session, words: &[String]) -> miette::Result<Flow> {
    let statement = match Statement::try_parse_from(words) {
        Ok(statement) => statement,
        Err(e) => {
            let _ = e.print();
            return Ok(Flow::Continue);
        }
    };
    debug!("Executing {:?}", statement.command);

    match statement.command {
        ReplCommand::Help => print_help(),
        ReplCommand::Exit => return Ok(Flow::Exit),
        ReplCommand::MachinesFetch => {
            session.fetch_machines().await?;
            println!("Fetched machine types for {} zones", session.zones().len());
        }
        ReplCommand::MachinesZone { zone: None } => println!("{}", session.zone()),
        ReplCommand::MachinesZone { zone: Some(zone) } => {
            session.set_zone(&zone)?;
            println!("Current zone is {}", zone);
        }
        ReplCommand::MachinesShow { sort, filter } => {
            let filter = filter_or_all(&filter);
            print_resources(&session.machine_rows(sort.into(), &filter)?);
        }
        ReplCommand::ManifestsRead { paths } => {
            let count = session.read_manifests(&paths)?;
            println!("Read {} workloads", count);
        }
        ReplCommand::PodsShow { filter } => {
            if session.pods().is_empty() {
                println!("No workloads loaded, run manifests_read");
                return Ok(Flow::Continue);
            }
            let filter = filter_or_all(&filter);
            print_resources(&session.pod_rows(&filter));
            println!();
            println!("{}", totals_line(&session.pod_totals()));
        }
        ReplCommand::NodesPack { json } => print_report(&session.pack()?, json)?,
    }

    Ok(Flow::Continue)
}

/// An unparsable filter is reported and everything is listed instead
fn filter_or_all(words: &[String]) -> Predicate {
    compile(words).unwrap_or_else(|e| {
        eprintln!("{:?}", miette::Report::new(e));
        Predicate::Always
    })
}

fn print_help() {
    for (name, description) in COMMANDS {
        println!("  {:<16} {}", name, description);
    }
}
