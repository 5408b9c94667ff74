//! Whole-file JSON and byte I/O
//!
//! Writes go to a `.tmp` sibling first and are renamed into place, so readers
//! only ever see the old file or the complete new one.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::BackupError;

/// Read JSON from `path`; a missing file reads as `T::default()`
pub fn read_json<T, P>(path: P) -> Result<T, BackupError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path)
        .map_err(|e| BackupError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| BackupError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Sibling path used while a write is in progress
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!("{}.tmp", name))
}

/// A complete temp file waiting to be renamed over its target.
///
/// Dropping it without [`StagedFile::commit`] removes the temp file.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    temp_path: PathBuf,
    pending: bool,
}

impl StagedFile {
    /// The file this one will replace
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename the temp file into place
    pub fn commit(mut self) -> io::Result<()> {
        fs::rename(&self.temp_path, &self.path)?;
        self.pending = false;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.pending {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

/// Write `bytes` to the temp sibling of `path` and fsync it, leaving `path`
/// itself untouched
pub fn stage_bytes(path: &Path, bytes: &[u8]) -> io::Result<StagedFile> {
    if path.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("{} is a directory", path.display()),
        ));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let staged = StagedFile {
        path: path.to_path_buf(),
        temp_path: temp_path_for(path),
        pending: true,
    };

    let file = File::create(&staged.temp_path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;

    Ok(staged)
}

/// Write bytes to a file atomically (write to temp, fsync, then rename)
///
/// The file at `path` is either completely written or not touched at all.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    stage_bytes(path, bytes)?.commit()
}

/// Rename every staged file into place, or none of them.
///
/// If a rename fails, targets already replaced get their previous content
/// back (or are removed if they did not exist) and the remaining temp files
/// are discarded.
pub fn commit_all(staged: Vec<StagedFile>) -> io::Result<()> {
    let mut previous = Vec::with_capacity(staged.len());
    for file in &staged {
        previous.push(if file.path().is_file() {
            Some(fs::read(file.path())?)
        } else {
            None
        });
    }

    let mut replaced: Vec<(PathBuf, Option<Vec<u8>>)> = Vec::with_capacity(staged.len());
    for (file, before) in staged.into_iter().zip(previous) {
        let path = file.path().to_path_buf();
        if let Err(e) = file.commit() {
            for (path, before) in replaced.into_iter().rev() {
                let _ = match before {
                    Some(bytes) => write_bytes_atomic(&path, &bytes),
                    None => fs::remove_file(&path),
                };
            }
            return Err(e);
        }
        replaced.push((path, before));
    }

    Ok(())
}

/// Write JSON to a file atomically
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), BackupError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let bytes = serde_json::to_vec_pretty(data)
        .map_err(|e| BackupError::Storage(format!("Failed to serialize data: {}", e)))?;

    write_bytes_atomic(path, &bytes).map_err(|e| {
        BackupError::Storage(format!("Failed to write {}: {}", path.display(), e))
    })
}
