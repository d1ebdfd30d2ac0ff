//! Install and verify the bundled archive

pub mod archive;
pub mod permissions;

use serde::Serialize;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::config::InstallLayout;
use crate::error::{InstallError, Result};

pub use archive::{extract, list_entries, sha256_file, ArchiveEntry, ExtractStats};
pub use permissions::set_executable;

/// Options for [`install`]
#[derive(Debug, Default, Clone)]
pub struct InstallOptions {
    /// Expected SHA-256 of the archive (hex); checked before extraction
    pub expected_sha256: Option<String>,
}

/// Outcome of a successful install
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub extracted: ExtractStats,
    /// Script that was made executable
    pub script: PathBuf,
}

/// Extract the archive over the package root, then chmod the script to 755
///
/// Any failure aborts the sequence; the script is never touched if extraction
/// did not complete.
pub fn install(layout: &InstallLayout, options: &InstallOptions) -> Result<InstallReport> {
    if let Some(expected) = &options.expected_sha256 {
        archive::check_sha256(&layout.archive, expected)?;
    }

    let extracted = archive::extract(&layout.archive, &layout.root)?;
    permissions::set_executable(&layout.script)?;

    Ok(InstallReport {
        extracted,
        script: layout.script.clone(),
    })
}

/// A file whose on-disk content differs from the archive
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Mismatch {
    pub path: PathBuf,
    pub expected_size: u64,
    pub actual_size: u64,
}

/// Result of comparing the package root against the archive
#[derive(Debug, Default, Clone, Serialize)]
pub struct VerifyReport {
    /// Archive files compared
    pub checked: usize,
    /// Archive files absent under the root
    pub missing: Vec<PathBuf>,
    /// Archive files present with different content
    pub mismatched: Vec<Mismatch>,
    /// Whether the script exists
    pub script_present: bool,
    /// Script permission bits, where the host has them
    pub script_mode: Option<u32>,
    /// Whether the script carries mode 755
    pub script_executable: bool,
}

impl VerifyReport {
    pub fn script_ok(&self) -> bool {
        self.script_present && self.script_executable
    }

    pub fn is_ok(&self) -> bool {
        self.missing.is_empty() && self.mismatched.is_empty() && self.script_ok()
    }
}

/// Check that every archived file is installed unchanged and the script is 755
pub fn verify(layout: &InstallLayout) -> Result<VerifyReport> {
    let mut report = VerifyReport::default();

    archive::for_each_file(&layout.archive, |relative, expected| {
        report.checked += 1;
        let path = layout.root.join(&relative);

        match fs::read(&path) {
            Ok(actual) if actual == expected => {}
            Ok(actual) => report.mismatched.push(Mismatch {
                path: relative,
                expected_size: expected.len() as u64,
                actual_size: actual.len() as u64,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => report.missing.push(relative),
            Err(source) => return Err(InstallError::InstalledRead { path, source }),
        }
        Ok(())
    })?;

    report.script_present = layout.script.is_file();
    if report.script_present {
        report.script_mode = permissions::mode_of(&layout.script)?;
        report.script_executable = permissions::is_executable(&layout.script)?;
    }

    Ok(report)
}
