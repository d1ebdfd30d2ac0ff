//! Error types for the installer

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InstallError>;

/// Everything that can abort an install
#[derive(Debug, Error)]
pub enum InstallError {
    /// Archive is missing or cannot be opened
    #[error("Failed to read archive {}: {source}", path.display())]
    ArchiveRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Archive is not a valid zip or an entry is corrupt
    #[error("Invalid archive {}: {source}", path.display())]
    ArchiveFormat {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Archive digest does not match the expected value
    #[error("Checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Writing an extracted entry failed
    #[error("Failed to write {}: {source}", path.display())]
    ExtractWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An installed file exists but cannot be read back
    #[error("Failed to read installed file {}: {source}", path.display())]
    InstalledRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Expected file is absent after extraction
    #[error("File not found after extraction: {}", path.display())]
    NotFound { path: PathBuf },

    /// chmod failed
    #[error("Failed to change permissions of {}: {source}", path.display())]
    Permission {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Package root could not be determined from the executable location
    #[error("Could not determine package root: {reason}")]
    PackageRoot { reason: String },
}
