//! Verify command - Compare the installed tree against the archive

use anyhow::{bail, Result};
use owo_colors::OwoColorize;

use wda_install::installer;
use wda_install::InstallLayout;

/// Execute the verify command
pub fn execute(layout: &InstallLayout, json: bool) -> Result<()> {
    let report = installer::verify(layout)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Checked {} file(s) under {}", report.checked, layout.root.display());

        for path in &report.missing {
            println!("  {} {}", "Missing:".red(), path.display());
        }
        for m in &report.mismatched {
            println!(
                "  {} {} ({} bytes, expected {})",
                "Modified:".yellow(),
                m.path.display(),
                m.actual_size,
                m.expected_size
            );
        }

        match (report.script_present, report.script_mode) {
            (false, _) => println!("  {} {}", "Missing:".red(), layout.script.display()),
            (true, Some(mode)) if !report.script_ok() => println!(
                "  {} {} has mode {:o}, expected 755",
                "Not executable:".red(),
                layout.script.display(),
                mode
            ),
            _ => {}
        }
    }

    if !report.is_ok() {
        bail!("Installation under {} is incomplete", layout.root.display());
    }

    if !json {
        println!("{}", "Installation OK".green());
    }
    Ok(())
}
