//! Install layout and package-root resolution

use std::path::{Path, PathBuf};

use crate::error::{InstallError, Result};

/// Bundled archive file name, expected at the package root
pub const ARCHIVE_NAME: &str = "WebDriverAgent.zip";

/// Path components of the generated script, relative to the package root
pub const SCRIPT_PATH: [&str; 3] = ["WebDriverAgent", "Scripts", "generate_modules.sh"];

/// rwxr-xr-x
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Resolved locations for one install run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    /// Extraction destination
    pub root: PathBuf,
    /// Zip archive to extract
    pub archive: PathBuf,
    /// File made executable after extraction
    pub script: PathBuf,
}

impl InstallLayout {
    /// Layout with the default archive and script locations under `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let archive = root.join(ARCHIVE_NAME);
        let script = SCRIPT_PATH.iter().fold(root.clone(), |p, c| p.join(c));
        Self {
            root,
            archive,
            script,
        }
    }

    /// Replace the archive location, keeping root and script
    pub fn with_archive<P: AsRef<Path>>(mut self, archive: P) -> Self {
        self.archive = archive.as_ref().to_path_buf();
        self
    }

    /// Build a layout from optional CLI overrides
    ///
    /// Without `--root`, the package root is derived from the location of
    /// the running executable (see [`package_root_for`]).
    pub fn resolve(root: Option<&Path>, archive: Option<&Path>) -> Result<Self> {
        let root = match root {
            Some(r) => r.to_path_buf(),
            None => default_package_root()?,
        };
        let layout = Self::new(root);
        Ok(match archive {
            Some(a) => layout.with_archive(a),
            None => layout,
        })
    }
}

/// Package root for the running executable
pub fn default_package_root() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(|e| InstallError::PackageRoot {
        reason: format!("cannot locate current executable: {e}"),
    })?;
    // Follow symlinks such as node_modules/.bin shims back to the real binary
    let exe = exe.canonicalize().unwrap_or(exe);
    package_root_for(&exe)
}

/// The directory one level above the one containing `exe`
///
/// `<root>/scripts/wda-install` resolves to `<root>`.
pub fn package_root_for(exe: &Path) -> Result<PathBuf> {
    exe.parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .ok_or_else(|| InstallError::PackageRoot {
            reason: format!("{} has no grandparent directory", exe.display()),
        })
}
