//! List command - Show the archive's entries

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};

use super::utils;
use wda_install::installer::{self, ArchiveEntry};
use wda_install::InstallLayout;

/// Execute the list command, returning the rendered table
pub fn execute(layout: &InstallLayout) -> Result<String> {
    let entries = installer::list_entries(&layout.archive)?;
    Ok(render(&entries))
}

fn render(entries: &[ArchiveEntry]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name"),
        Cell::new("Size"),
        Cell::new("Packed"),
        Cell::new("Mode"),
    ]);

    for entry in entries {
        let size = if entry.is_dir {
            "-".to_string()
        } else {
            utils::format_size(entry.size)
        };
        let mode = entry
            .unix_mode
            .map(|m| format!("{:o}", m & 0o7777))
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(&entry.name),
            Cell::new(size),
            Cell::new(utils::format_size(entry.compressed_size)),
            Cell::new(mode),
        ]);
    }

    let files = entries.iter().filter(|e| !e.is_dir).count();
    format!("{}\n\n{} entries, {} files", table, entries.len(), files)
}
