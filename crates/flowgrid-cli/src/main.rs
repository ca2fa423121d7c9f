mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::{actions::ActionsSubcommand, export::ExportFormat, scenario::ScenarioSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "flowgrid",
    about = "Compose API test scenarios from an action catalog, then save and export them",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: flowgrid.yaml in the current directory, if present)
    #[arg(long, global = true, env = "FLOWGRID_CONFIG")]
    config: Option<PathBuf>,

    /// Backend base URL (overrides client.base_url)
    #[arg(long, global = true, env = "FLOWGRID_SERVER")]
    server: Option<String>,

    /// Read action definitions from this file instead of the backend.
    /// Accepts an actions array or an apiList manifest.
    #[arg(long, global = true, env = "FLOWGRID_CATALOG")]
    catalog: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP backend
    Serve {
        /// Port to listen on (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Check that the backend is up
    Health,

    /// Browse the action catalog
    Actions {
        #[command(subcommand)]
        subcommand: ActionsSubcommand,
    },

    /// Edit a scenario draft, or move it to and from the backend
    Scenario {
        #[command(subcommand)]
        subcommand: ScenarioSubcommand,
    },

    /// Export a saved scenario draft as a workbook and/or HTML document
    Export {
        /// Draft file
        draft: PathBuf,
        #[arg(long, value_enum, default_value = "all")]
        format: ExportFormat,
        /// Directory the artifacts are written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = cmd::App::new(cli.config.as_deref(), cli.server, cli.catalog, cli.json)
        .and_then(|app| match cli.command {
            Commands::Serve { port } => cmd::serve::run(app, port),
            Commands::Health => cmd::health::run(&app),
            Commands::Actions { subcommand } => cmd::actions::run(&app, subcommand),
            Commands::Scenario { subcommand } => cmd::scenario::run(&app, subcommand),
            Commands::Export {
                draft,
                format,
                out_dir,
            } => cmd::export::run(&app, &draft, format, &out_dir),
        });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
