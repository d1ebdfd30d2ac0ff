//! Install command - Unpack the bundled archive and mark the script executable

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use super::utils;
use wda_install::installer::{self, archive, ArchiveEntry, InstallOptions};
use wda_install::InstallLayout;

/// Output and behavior switches for the install command
#[derive(Debug, Default, Clone)]
pub struct InstallArgs {
    pub dry_run: bool,
    pub quiet: bool,
    pub verbose: bool,
    pub sha256: Option<String>,
}

/// Execute the install command
pub fn execute(layout: &InstallLayout, args: &InstallArgs) -> Result<()> {
    if args.dry_run {
        return dry_run(layout, args);
    }

    if !args.quiet {
        println!("Installing into: {}", layout.root.display());
        println!("  Archive: {}", layout.archive.display());
    }

    let options = InstallOptions {
        expected_sha256: args.sha256.clone(),
    };
    let report = installer::install(layout, &options)
        .with_context(|| format!("Install into {} failed", layout.root.display()))?;

    if args.quiet {
        return Ok(());
    }

    if args.verbose {
        for path in &report.extracted.written {
            println!("  {}", path.display().dimmed());
        }
    }
    for name in &report.extracted.skipped {
        println!("{} skipped unsafe entry {}", "Warning:".yellow(), name);
    }
    println!(
        "{} {} file(s), {} director(ies), {}",
        "Extracted:".green(),
        report.extracted.files,
        report.extracted.directories,
        utils::format_size(report.extracted.bytes)
    );
    println!(
        "{} {} (755)",
        "Executable:".green(),
        utils::display_relative(&report.script, &layout.root)
    );

    Ok(())
}

/// Show what an install would do without touching the filesystem
fn dry_run(layout: &InstallLayout, args: &InstallArgs) -> Result<()> {
    let entries = installer::list_entries(&layout.archive)?;

    if let Some(expected) = &args.sha256 {
        archive::check_sha256(&layout.archive, expected)?;
        if !args.quiet {
            println!("{} sha256 matches", "Checksum:".green());
        }
    }

    if args.quiet {
        return Ok(());
    }

    let plan = plan(&entries);
    println!(
        "Would extract {} file(s) ({}) from {} into {}",
        plan.files,
        utils::format_size(plan.bytes),
        layout.archive.display(),
        layout.root.display()
    );
    if args.verbose {
        for entry in entries.iter().filter(|e| e.safe && !e.is_dir) {
            println!("  {}", entry.name.dimmed());
        }
    }
    for entry in entries.iter().filter(|e| !e.safe) {
        println!("{} would skip unsafe entry {}", "Warning:".yellow(), entry.name);
    }
    println!(
        "Would set mode 755 on {}",
        utils::display_relative(&layout.script, &layout.root)
    );

    Ok(())
}

/// Totals of what `extract` would write
#[derive(Debug, PartialEq, Eq)]
struct Plan {
    files: usize,
    bytes: u64,
}

fn plan(entries: &[ArchiveEntry]) -> Plan {
    let writable = entries.iter().filter(|e| e.safe && !e.is_dir);
    Plan {
        files: writable.clone().count(),
        bytes: writable.map(|e| e.size).sum(),
    }
}
