//! Flat, filename-addressed artifact store implementation
//!
//! This module provides [`ArtifactStore`], the single owner of Depot's
//! artifact directory. All operations are synchronous single filesystem
//! calls; no locking is layered on top of what the filesystem itself
//! provides. Racing `replace` calls are last-writer-wins, racing `put`
//! calls on one name leave exactly one winner because the create is
//! performed with `create_new`.

use crate::StoreError;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Flat filesystem store addressed by artifact filename
///
/// The store holds only the immutable root path after construction; all
/// shared state lives in the filesystem itself.
#[derive(Debug)]
pub struct ArtifactStore {
    /// Root directory containing all artifacts
    root: PathBuf,
}

impl ArtifactStore {
    /// Opens a store rooted at `root`, creating the directory if absent
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidRoot` if the directory (or one of its
    /// parents) cannot be created or the resulting path cannot be
    /// canonicalised.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(root).map_err(|e| {
            StoreError::InvalidRoot(format!(
                "cannot create store root {}: {}",
                root.display(),
                e
            ))
        })?;

        let root = root.canonicalize().map_err(|e| {
            StoreError::InvalidRoot(format!(
                "cannot canonicalise store root {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self { root })
    }

    /// Returns the canonicalised store root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores a new artifact, refusing to overwrite an existing one
    ///
    /// The file is created with `create_new`, so two racing `put` calls for
    /// the same name cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::PathViolation` for an unsafe name,
    /// `StoreError::AlreadyExists` if an artifact with this name is present,
    /// or `StoreError::Io` for any other write failure.
    pub fn put(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.resolve(name)?;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StoreError::AlreadyExists(name.to_owned()),
                _ => StoreError::Io(e),
            })?;

        file.write_all(bytes)?;
        Ok(())
    }

    /// Stores an artifact unconditionally, overwriting any existing one
    ///
    /// # Errors
    ///
    /// Returns `StoreError::PathViolation` for an unsafe name or
    /// `StoreError::Io` for a write failure.
    pub fn replace(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.resolve(name)?;
        fs::write(&path, bytes)?;
        Ok(())
    }

    /// Retrieves an artifact's bytes; `None` signals absence, not an error
    ///
    /// # Errors
    ///
    /// Returns `StoreError::PathViolation` for an unsafe name or
    /// `StoreError::Io` for a read failure other than absence.
    pub fn get(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.resolve(name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Removes an artifact, reporting whether one existed
    ///
    /// Absence is a normal `false` outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::PathViolation` for an unsafe name or
    /// `StoreError::Io` for a removal failure other than absence.
    pub fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let path = self.resolve(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Lists direct file children of the root whose name contains `filter`
    ///
    /// The filter is a literal substring match; an empty filter matches
    /// every artifact. Order is filesystem enumeration order, so callers
    /// that need determinism must sort.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the root cannot be enumerated.
    pub fn list(&self, filter: &str) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                if name.contains(filter) {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    /// Validates an artifact name and resolves it against the store root
    ///
    /// Rejection happens before any filesystem access, so an unsafe name can
    /// never reach the filesystem at all.
    fn resolve(&self, name: &str) -> Result<PathBuf, StoreError> {
        if name.is_empty() {
            return Err(StoreError::PathViolation(
                "artifact name is empty".to_owned(),
            ));
        }

        if name.contains("..") {
            return Err(StoreError::PathViolation(format!(
                "name contains a parent-directory sequence: {name}"
            )));
        }

        if name.contains('/') || name.contains('\\') {
            return Err(StoreError::PathViolation(format!(
                "name contains a path separator: {name}"
            )));
        }

        Ok(self.root.join(name))
    }
}
