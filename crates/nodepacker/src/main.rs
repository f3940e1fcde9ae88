mod completer;
mod output;
mod repl;
mod session;

use clap::{Parser, Subcommand};
use nodepacker_query::compile;
use output::{print_report, print_resources, totals_line};
use session::{Session, Settings, SortKey};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "nodepacker",
    about = "Pick a machine type and pack Kubernetes workloads onto nodes",
    version
)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive shell (the default)
    Repl,
    /// Fetch machine types of every zone from gcloud and cache them
    Fetch,
    /// List machine types of the zone
    Machines {
        /// Sort by CPU or memory, smallest first
        #[arg(long, value_enum, default_value_t = SortKey::Cpu)]
        sort: SortKey,
        /// Filter expression, e.g. `cpu >= 4 & mem < 32`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        filter: Vec<String>,
    },
    /// List workloads read from manifests
    Pods {
        /// Manifest file or directory (repeatable)
        #[arg(long = "manifests", short = 'm', required = true)]
        manifests: Vec<PathBuf>,
        /// Filter expression, e.g. `name ~= '^frontend'`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        filter: Vec<String>,
    },
    /// Pack workloads read from manifests onto nodes of the best machine type
    Pack {
        /// Manifest file or directory (repeatable)
        #[arg(long = "manifests", short = 'm', required = true)]
        manifests: Vec<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    // Logs go to stderr so tables and reports stay clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut session = Session::open(cli.settings)?;

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Repl => repl::run(&mut session).await,
        Commands::Fetch => {
            session.fetch_machines().await?;
            info!("Cached machine types for {} zones", session.zones().len());
            Ok(())
        }
        Commands::Machines { sort, filter } => {
            let filter = compile(&filter)?;
            print_resources(&session.machine_rows(sort.into(), &filter)?);
            Ok(())
        }
        Commands::Pods { manifests, filter } => {
            let filter = compile(&filter)?;
            session.read_manifests(&manifests)?;
            print_resources(&session.pod_rows(&filter));
            println!();
            println!("{}", totals_line(&session.pod_totals()));
            Ok(())
        }
        Commands::Pack { manifests, json } => {
            session.read_manifests(&manifests)?;
            print_report(&session.pack()?, json)
        }
    }
}
