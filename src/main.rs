//! wda-install: post-install hook that unpacks WebDriverAgent
//!
//! Run without arguments it extracts `WebDriverAgent.zip` over the package
//! root and makes `WebDriverAgent/Scripts/generate_modules.sh` executable.

use anyhow::Result;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::PathBuf;

use wda_install::InstallLayout;

mod commands;

#[derive(Parser)]
#[command(name = "wda-install")]
#[command(about = "Unpack the bundled WebDriverAgent archive", long_about = None)]
#[command(version)]
struct Cli {
    /// Package root (defaults to the directory above this executable's)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Archive to extract (defaults to <root>/WebDriverAgent.zip)
    #[arg(long, global = true)]
    archive: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the archive and mark the module script executable (default)
    Install {
        /// Show what would be done without making changes
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Expected SHA-256 of the archive, checked before extracting
        #[arg(long, value_name = "HEX")]
        sha256: Option<String>,

        /// Print nothing on success, including the dry-run plan
        #[arg(short, long, conflicts_with = "verbose")]
        quiet: bool,

        /// Print every extracted (or, with --dry-run, planned) file
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check that the package root matches the archive
    Verify {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the archive's entries
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let layout = InstallLayout::resolve(cli.root.as_deref(), cli.archive.as_deref())?;

    match cli.command.unwrap_or(Commands::Install {
        dry_run: false,
        sha256: None,
        quiet: false,
        verbose: false,
    }) {
        Commands::Install {
            dry_run,
            sha256,
            quiet,
            verbose,
        } => {
            if dry_run && !quiet {
                println!("{}", "(DRY-RUN MODE - no changes will be made)".blue());
            }
            let args = commands::install::InstallArgs {
                dry_run,
                quiet,
                verbose,
                sha256,
            };
            commands::install::execute(&layout, &args)?;
        }

        Commands::Verify { json } => {
            commands::verify::execute(&layout, json)?;
        }

        Commands::List => {
            let output = commands::list::execute(&layout)?;
            println!("{}", output);
        }
    }

    Ok(())
}
