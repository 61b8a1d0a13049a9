use clap::{Parser, Subcommand};
use nexusmap::cli::{self as prog_cli, Command, OutputMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nexusmap", version, about = "Compile mapped-entity queries into filter documents", long_about = None)]
struct Cli {
    /// Output format: human, plain or json
    #[arg(long, default_value = "human")]
    format: String,
    /// log4rs YAML file; otherwise NEXUSMAP_LOG_* variables apply
    #[arg(long)]
    log_config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(name = "compile", about = "Compile filters, sort and projection for one entity type")]
    Compile {
        #[arg(long, help = "Schema file (TOML, or JSON when the extension is .json)")]
        schema: PathBuf,
        #[arg(long, help = "Entity type name")]
        entity: String,
        #[arg(long = "filter", help = "Condition and JSON value, e.g. \"height >=4\"")]
        filters: Vec<String>,
        #[arg(long, help = "Sort specification, e.g. \"width,-height\"")]
        order: Option<String>,
        #[arg(long = "project", help = "Projected field, optionally suffixed with :0 or :1")]
        project: Vec<String>,
        #[arg(long, help = "Pass field paths through without schema validation")]
        no_validation: bool,
        #[arg(long, help = "Compiler config file (TOML)")]
        config: Option<PathBuf>,
    },
    #[command(name = "check-schema", about = "Load and validate a schema file")]
    CheckSchema {
        #[arg(long)]
        schema: PathBuf,
    },
}

fn output_mode(s: &str) -> OutputMode {
    match s.to_ascii_lowercase().as_str() {
        "json" => OutputMode::Json,
        "plain" => OutputMode::Plain,
        _ => OutputMode::Human,
    }
}

fn main() {
    let cli = Cli::parse();
    match cli.log_config.as_deref() {
        Some(p) => {
            if let Err(e) = nexusmap::logger::init_path(p) {
                eprintln!("nexusmap: cannot load log config {}: {e}", p.display());
            }
        }
        None => {
            let config_path = match &cli.command {
                Commands::Compile { config, .. } => config.as_deref(),
                Commands::CheckSchema { .. } => None,
            };
            match prog_cli::load_config(config_path) {
                Ok(cfg) => nexusmap::logger::configure_from_config(&cfg),
                Err(e) => {
                    eprintln!("nexusmap: config: {e}");
                    nexusmap::init();
                }
            }
        }
    }
    let cmd = match cli.command {
        Commands::Compile { schema, entity, filters, order, project, no_validation, config } => {
            Command::Compile { schema, entity, filters, order, project, no_validation, config }
        }
        Commands::CheckSchema { schema } => Command::CheckSchema { schema },
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = prog_cli::run_with_format(cmd, output_mode(&cli.format), &mut out) {
        log::error!("command failed: {e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
