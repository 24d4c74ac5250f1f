//! BIOS CLI - Import, verify and check emulator BIOS files

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, import, list, remove, verify, Format};
use config::{BiosConfig, Overrides};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bios")]
#[command(about = "Manage the BIOS files emulator cores need", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (skips the global and project config layers)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Managed store directory
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Directory removed files are moved to
    #[arg(long, global = true)]
    trash: Option<PathBuf>,

    /// Directory of core catalogs (*.bios.toml, *.bios.json)
    #[arg(long, global = true)]
    catalogs: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Import BIOS files (directories are scanned recursively)
    Import {
        /// Files or directories to import
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Only match against this core's BIOS list
        #[arg(long)]
        core: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Verify one stored BIOS file (a file with the wrong checksum is moved to the trash)
    Verify {
        /// Canonical file name
        name: String,

        /// Core whose BIOS list defines the file
        #[arg(long)]
        core: Option<String>,
    },

    /// Check that every required BIOS file for a core is present
    Check {
        /// Core id
        #[arg(long)]
        core: String,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Move a stored BIOS file to the trash
    Remove {
        /// Canonical file name
        name: String,
    },

    /// List known BIOS files and whether they are stored
    List {
        /// Only list this core's BIOS files
        #[arg(long)]
        core: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
}

fn init_tracing(verbose: u8) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "bios_asset={level},bios_cli={level},warn"
        ))
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("warning: logging disabled: {}", e);
    }

    let config = match cli.config.as_deref() {
        Some(path) => BiosConfig::load_from_file(path)?,
        None => BiosConfig::load()?,
    }
    .apply_overrides(Overrides {
        store: cli.store,
        trash: cli.trash,
        catalogs: cli.catalogs,
    });
    tracing::debug!(?config, "resolved configuration");

    let ok = match cli.command {
        Commands::Import { paths, core, format } => {
            import::run(&config, import::ImportArgs { paths, core, format })?;
            true
        }
        Commands::Verify { name, core } => verify::run(&config, &name, core.as_deref())?,
        Commands::Check { core, format } => check::run(&config, &core, format)?,
        Commands::Remove { name } => {
            remove::run(&config, &name)?;
            true
        }
        Commands::List { core, format } => {
            list::run(&config, core.as_deref(), format)?;
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
