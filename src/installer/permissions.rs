//! Executable-bit handling

use std::fs;
use std::path::Path;

use crate::config::EXECUTABLE_MODE;
use crate::error::{InstallError, Result};

/// Set `path` to mode 755 (rwxr-xr-x)
///
/// Fails with [`InstallError::NotFound`] if the file is absent. Elsewhere
/// than Unix there are no mode bits to change and only existence is checked.
pub fn set_executable(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(InstallError::NotFound {
            path: path.to_path_buf(),
        });
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(path, fs::Permissions::from_mode(EXECUTABLE_MODE)).map_err(
            |source| InstallError::Permission {
                path: path.to_path_buf(),
                source,
            },
        )?;
    }

    Ok(())
}

/// Permission bits of `path` (lower 12 bits), `None` where the host has no modes
pub fn mode_of(path: &Path) -> Result<Option<u32>> {
    let meta = fs::metadata(path).map_err(|_| InstallError::NotFound {
        path: path.to_path_buf(),
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Ok(Some(meta.permissions().mode() & 0o7777))
    }

    #[cfg(not(unix))]
    {
        let _ = meta;
        Ok(None)
    }
}

/// Whether `path` carries exactly the installer's executable mode
pub fn is_executable(path: &Path) -> Result<bool> {
    Ok(match mode_of(path)? {
        Some(mode) => mode == EXECUTABLE_MODE,
        None => true,
    })
}
