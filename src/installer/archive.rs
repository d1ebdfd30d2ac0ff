//! Zip archive access: extraction, listing and digests

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use crate::error::{InstallError, Result};

/// One entry of the archive's central directory
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Name as stored in the archive
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
    /// Compressed size in bytes
    pub compressed_size: u64,
    /// Whether this is a directory entry
    pub is_dir: bool,
    /// Unix permission bits, when the archive records them
    pub unix_mode: Option<u32>,
    /// Whether the name stays inside the destination; `extract` skips the rest
    pub safe: bool,
}

/// Counters produced by [`extract`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractStats {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
    /// Relative paths of the files written, in archive order
    pub written: Vec<PathBuf>,
    /// Entries skipped because their name would escape the destination
    pub skipped: Vec<String>,
}

/// Upper bound on buffer preallocation from an entry's declared size
const MAX_PREALLOC: u64 = 1 << 20;

pub(crate) fn open(archive_path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(archive_path).map_err(|source| InstallError::ArchiveRead {
        path: archive_path.to_path_buf(),
        source,
    })?;
    ZipArchive::new(file).map_err(|source| InstallError::ArchiveFormat {
        path: archive_path.to_path_buf(),
        source,
    })
}

fn format_err(archive_path: &Path, source: zip::result::ZipError) -> InstallError {
    InstallError::ArchiveFormat {
        path: archive_path.to_path_buf(),
        source,
    }
}

fn write_err(path: &Path, source: io::Error) -> InstallError {
    InstallError::ExtractWrite {
        path: path.to_path_buf(),
        source,
    }
}

/// List every entry in archive order
pub fn list_entries(archive_path: &Path) -> Result<Vec<ArchiveEntry>> {
    let mut archive = open(archive_path)?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let file = archive
            .by_index(i)
            .map_err(|e| format_err(archive_path, e))?;
        entries.push(ArchiveEntry {
            name: file.name().to_string(),
            size: file.size(),
            compressed_size: file.compressed_size(),
            is_dir: file.is_dir(),
            unix_mode: file.unix_mode(),
            safe: file.enclosed_name().is_some(),
        });
    }

    Ok(entries)
}

/// Extract every entry of `archive_path` into `dest`, overwriting existing files
///
/// Entry data is read fully before anything is written for that entry, so a
/// failed CRC check surfaces as [`InstallError::ArchiveFormat`] and never
/// leaves a truncated file behind.
pub fn extract(archive_path: &Path, dest: &Path) -> Result<ExtractStats> {
    let mut archive = open(archive_path)?;
    let mut stats = ExtractStats::default();

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| format_err(archive_path, e))?;

        let relative = match entry.enclosed_name() {
            Some(path) => path.to_owned(),
            None => {
                stats.skipped.push(entry.name().to_string());
                continue;
            }
        };
        let target = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| write_err(&target, e))?;
            stats.directories += 1;
            continue;
        }

        let declared = entry.size();
        let data = read_entry(archive_path, &mut entry, declared)?;
        write_file(&target, &data)?;

        #[cfg(unix)]
        {
            if let Some(mode) = entry.unix_mode() {
                apply_mode(&target, mode)?;
            }
        }

        stats.files += 1;
        stats.bytes += data.len() as u64;
        stats.written.push(relative);
    }

    Ok(stats)
}

/// Read an entry to its end, which makes the zip reader verify its CRC-32
///
/// `declared` comes from the archive header and only sizes the initial buffer.
fn read_entry<R: Read>(archive_path: &Path, entry: &mut R, declared: u64) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(declared.min(MAX_PREALLOC) as usize);
    entry
        .read_to_end(&mut data)
        .map_err(|e| format_err(archive_path, e.into()))?;
    Ok(data)
}

fn write_file(target: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| write_err(parent, e))?;
    }

    // Replace rather than truncate: a read-only file from a previous
    // install cannot be opened for writing.
    if let Ok(meta) = fs::symlink_metadata(target) {
        if !meta.is_dir() {
            fs::remove_file(target).map_err(|e| write_err(target, e))?;
        }
    }

    let mut out = File::create(target).map_err(|e| write_err(target, e))?;
    out.write_all(data).map_err(|e| write_err(target, e))?;
    Ok(())
}

#[cfg(unix)]
fn apply_mode(target: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let bits = mode & 0o7777;
    if bits == 0 {
        return Ok(());
    }
    fs::set_permissions(target, fs::Permissions::from_mode(bits)).map_err(|source| {
        InstallError::Permission {
            path: target.to_path_buf(),
            source,
        }
    })
}

/// Call `f` with the relative path and bytes of each safely-named file entry
///
/// Entries are read one at a time; only the current entry is held in memory.
pub(crate) fn for_each_file<F>(archive_path: &Path, mut f: F) -> Result<()>
where
    F: FnMut(PathBuf, Vec<u8>) -> Result<()>,
{
    let mut archive = open(archive_path)?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| format_err(archive_path, e))?;
        if entry.is_dir() {
            continue;
        }
        let Some(relative) = entry.enclosed_name().map(|p| p.to_owned()) else {
            continue;
        };
        let declared = entry.size();
        let data = read_entry(archive_path, &mut entry, declared)?;
        f(relative, data)?;
    }

    Ok(())
}

/// Lowercase hex SHA-256 of a file
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|source| InstallError::ArchiveRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|source| InstallError::ArchiveRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Compare a file's SHA-256 against `expected` (hex, any case)
pub fn check_sha256(path: &Path, expected: &str) -> Result<()> {
    let actual = sha256_file(path)?;
    let expected = expected.trim().to_ascii_lowercase();
    if actual != expected {
        return Err(InstallError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Build a zip at `path` from (name, content) pairs; names ending in `/` are directories
    pub(crate) fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().unix_permissions(0o644);

        for (name, content) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, options).unwrap();
            } else {
                zip.start_file(*name, options).unwrap();
                zip.write_all(content).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_extract_writes_contents() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.zip");
        write_zip(
            &archive,
            &[
                ("WebDriverAgent/", b""),
                ("WebDriverAgent/README.md", b"hello"),
                ("WebDriverAgent/Scripts/generate_modules.sh", b"#!/bin/sh\n"),
            ],
        );

        let dest = dir.path().join("out");
        fs::create_dir(&dest).unwrap();
        let stats = extract(&archive, &dest).unwrap();

        assert_eq!(stats.files, 2);
        assert_eq!(stats.directories, 1);
        assert_eq!(stats.bytes, 15);
        assert_eq!(
            stats.written,
            vec![
                PathBuf::from("WebDriverAgent/README.md"),
                PathBuf::from("WebDriverAgent/Scripts/generate_modules.sh"),
            ]
        );
        assert!(stats.skipped.is_empty());
        assert_eq!(
            fs::read(dest.join("WebDriverAgent/README.md")).unwrap(),
            b"hello"
        );
        assert_eq!(
            fs::read(dest.join("WebDriverAgent/Scripts/generate_modules.sh")).unwrap(),
            b"#!/bin/sh\n"
        );
    }

    #[test]
    fn test_extract_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.zip");
        write_zip(&archive, &[("a.txt", b"new")]);

        fs::write(dir.path().join("a.txt"), b"old content that is longer").unwrap();
        extract(&archive, dir.path()).unwrap();

        assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"new");
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_overwrites_read_only_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.zip");
        write_zip(&archive, &[("locked.txt", b"fresh")]);

        let locked = dir.path().join("locked.txt");
        fs::write(&locked, b"stale").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o444)).unwrap();

        extract(&archive, dir.path()).unwrap();
        assert_eq!(fs::read(&locked).unwrap(), b"fresh");
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_applies_recorded_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.zip");
        {
            let mut zip = ZipWriter::new(File::create(&archive).unwrap());
            let options = SimpleFileOptions::default().unix_permissions(0o700);
            zip.start_file("tool", options).unwrap();
            zip.write_all(b"x").unwrap();
            zip.finish().unwrap();
        }

        extract(&archive, dir.path()).unwrap();
        let mode = fs::metadata(dir.path().join("tool"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn test_extract_skips_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.zip");
        write_zip(&archive, &[("../escape.txt", b"bad"), ("ok.txt", b"good")]);

        let dest = dir.path().join("out");
        fs::create_dir(&dest).unwrap();
        let stats = extract(&archive, &dest).unwrap();

        assert_eq!(stats.files, 1);
        assert_eq!(stats.skipped, vec!["../escape.txt".to_string()]);
        assert!(!dir.path().join("escape.txt").exists());
        assert!(dest.join("ok.txt").exists());
    }

    #[test]
    fn test_extract_missing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract(&dir.path().join("nope.zip"), dir.path()).unwrap_err();
        assert!(matches!(err, InstallError::ArchiveRead { .. }));
    }

    #[test]
    fn test_extract_not_a_zip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("bogus.zip");
        fs::write(&archive, b"this is not a zip file").unwrap();

        let err = extract(&archive, dir.path()).unwrap_err();
        assert!(matches!(err, InstallError::ArchiveFormat { .. }));
    }

    #[test]
    fn test_extract_file_over_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.zip");
        write_zip(&archive, &[("clash", b"data")]);
        fs::create_dir(dir.path().join("clash")).unwrap();

        let err = extract(&archive, dir.path()).unwrap_err();
        assert!(matches!(err, InstallError::ExtractWrite { .. }));
    }

    #[test]
    fn test_list_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.zip");
        write_zip(&archive, &[("d/", b""), ("d/f.txt", b"12345")]);

        let entries = list_entries(&archive).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "d/");
        assert!(entries[0].is_dir);
        assert_eq!(entries[1].name, "d/f.txt");
        assert_eq!(entries[1].size, 5);
        assert!(!entries[1].is_dir);
        assert!(entries.iter().all(|e| e.safe));
    }

    #[test]
    fn test_list_entries_flags_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.zip");
        write_zip(&archive, &[("../escape.txt", b"bad"), ("ok.txt", b"good")]);

        let entries = list_entries(&archive).unwrap();
        assert!(!entries[0].safe);
        assert!(entries[1].safe);
    }

    #[test]
    fn test_extract_corrupt_entry_data() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.zip");
        let payload: &[u8] = b"#!/bin/bash\necho generating modules\n";
        {
            let mut zip = ZipWriter::new(File::create(&archive).unwrap());
            let options =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
            zip.start_file("WebDriverAgent/Scripts/generate_modules.sh", options)
                .unwrap();
            zip.write_all(payload).unwrap();
            zip.finish().unwrap();
        }

        // Stored entries keep their bytes verbatim; flip one of them
        let mut bytes = fs::read(&archive).unwrap();
        let offset = bytes
            .windows(payload.len())
            .position(|w| w == payload)
            .unwrap();
        bytes[offset + 5] ^= 0xff;
        fs::write(&archive, &bytes).unwrap();

        let dest = dir.path().join("out");
        fs::create_dir(&dest).unwrap();
        let err = extract(&archive, &dest).unwrap_err();

        assert!(matches!(err, InstallError::ArchiveFormat { .. }));
        assert!(!dest
            .join("WebDriverAgent/Scripts/generate_modules.sh")
            .exists());
    }

    #[test]
    fn test_read_entry_ignores_inflated_declared_size() {
        let dir = tempfile::tempdir().unwrap();
        let data = read_entry(&dir.path().join("a.zip"), &mut &b"tiny"[..], u64::MAX).unwrap();
        assert_eq!(data, b"tiny");
        assert!(data.capacity() <= MAX_PREALLOC as usize);
    }

    #[test]
    fn test_for_each_file_visits_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.zip");
        write_zip(
            &archive,
            &[("d/", b""), ("d/a", b"1"), ("../x", b"2"), ("d/b", b"34")],
        );

        let mut seen = Vec::new();
        for_each_file(&archive, |path, data| {
            seen.push((path, data));
            Ok(())
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                (PathBuf::from("d/a"), b"1".to_vec()),
                (PathBuf::from("d/b"), b"34".to_vec()),
            ]
        );
    }

    #[test]
    fn test_sha256_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc");
        fs::write(&path, b"abc").unwrap();

        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_check_sha256() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc");
        fs::write(&path, b"abc").unwrap();

        check_sha256(
            &path,
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD",
        )
        .unwrap();
        let err = check_sha256(&path, "00").unwrap_err();
        assert!(matches!(err, InstallError::ChecksumMismatch { .. }));
    }
}
