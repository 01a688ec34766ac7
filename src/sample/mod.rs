//! Image/label sample moves.
//!
//! A sample is an image plus its label file, paired by stem. Moving a sample
//! goes through [`SampleMove::commit`] so the label always reaches its new
//! name before the image does, and a half-finished move is rolled back.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::PrepError;

/// Paths of one logical sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SamplePaths {
    pub image: PathBuf,
    pub label: PathBuf,
}

impl SamplePaths {
    pub fn new(image: impl Into<PathBuf>, label: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            label: label.into(),
        }
    }
}

/// What a committed move did besides writing the image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The label file was renamed to follow the image.
    pub label_renamed: bool,
}

/// Rewrite of a sample's image, optionally under a new name.
///
/// When `from.image == to.image` the image is overwritten in place and the
/// label is left alone. Extension-only renames keep the label path too; the
/// label is moved only when the stem changes.
#[derive(Clone, Debug)]
pub struct SampleMove {
    pub from: SamplePaths,
    pub to: SamplePaths,
}

impl SampleMove {
    pub fn new(from: SamplePaths, to: SamplePaths) -> Self {
        Self { from, to }
    }

    pub fn renames_image(&self) -> bool {
        self.from.image != self.to.image
    }

    fn moves_label(&self) -> bool {
        self.renames_image() && self.from.label != self.to.label && self.from.label.is_file()
    }

    /// Detect collisions without modifying anything.
    pub fn check(&self) -> Result<(), PrepError> {
        if self.renames_image() && self.to.image.exists() {
            return Err(PrepError::SampleCollision {
                path: self.to.image.clone(),
            });
        }
        if self.moves_label() && self.to.label.exists() {
            return Err(PrepError::SampleCollision {
                path: self.to.label.clone(),
            });
        }
        Ok(())
    }

    /// Write the new image with `write_image` and move the sample.
    ///
    /// Order: stage the image in a temp file beside its destination, rename
    /// the label, publish the image (never clobbering), delete the original
    /// image. A failure after the label rename puts the label back.
    pub fn commit<F>(&self, write_image: F) -> Result<MoveOutcome, PrepError>
    where
        F: FnOnce(&mut File) -> Result<(), PrepError>,
    {
        self.check()?;

        let staged = stage_file(&self.to.image, Some(&self.from.image), write_image)?;

        if !self.renames_image() {
            persist_overwrite(staged, &self.to.image)?;
            return Ok(MoveOutcome::default());
        }

        let label_renamed = self.moves_label();
        if label_renamed {
            if let Some(parent) = self.to.label.parent() {
                fs::create_dir_all(parent).map_err(|source| PrepError::FileWrite {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::rename(&self.from.label, &self.to.label).map_err(|source| {
                PrepError::FileWrite {
                    path: self.to.label.clone(),
                    source,
                }
            })?;
        }

        if let Err(err) = staged.persist_noclobber(&self.to.image) {
            if label_renamed {
                self.restore_label();
            }
            return Err(if err.error.kind() == std::io::ErrorKind::AlreadyExists {
                PrepError::SampleCollision {
                    path: self.to.image.clone(),
                }
            } else {
                PrepError::FileWrite {
                    path: self.to.image.clone(),
                    source: err.error,
                }
            });
        }

        if let Err(source) = fs::remove_file(&self.from.image) {
            if let Err(cleanup) = fs::remove_file(&self.to.image) {
                tracing::error!(
                    "could not remove {} after failed move: {cleanup}",
                    self.to.image.display()
                );
            }
            if label_renamed {
                self.restore_label();
            }
            return Err(PrepError::FileWrite {
                path: self.from.image.clone(),
                source,
            });
        }

        Ok(MoveOutcome { label_renamed })
    }

    fn restore_label(&self) {
        if let Err(err) = fs::rename(&self.to.label, &self.from.label) {
            tracing::error!(
                "could not restore label {} -> {}: {err}",
                self.to.label.display(),
                self.from.label.display()
            );
        }
    }
}

/// Replace `path` with bytes produced by `write`, atomically.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<(), PrepError>
where
    F: FnOnce(&mut File) -> Result<(), PrepError>,
{
    let staged = stage_file(path, Some(path), write)?;
    persist_overwrite(staged, path)
}

/// Replace `path` with `contents`, atomically.
pub fn write_bytes_atomic(path: &Path, contents: &[u8]) -> Result<(), PrepError> {
    write_atomic(path, |file| {
        file.write_all(contents).map_err(|source| PrepError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    })
}

/// Temp files are created 0600; `permissions_from` (when it exists) supplies
/// the mode the published file should carry instead.
fn stage_file<F>(
    target: &Path,
    permissions_from: Option<&Path>,
    write: F,
) -> Result<NamedTempFile, PrepError>
where
    F: FnOnce(&mut File) -> Result<(), PrepError>,
{
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(|source| PrepError::FileWrite {
        path: target.to_path_buf(),
        source,
    })?;
    if let Some(permissions) = permissions_from.and_then(|p| fs::metadata(p).ok()) {
        fs::set_permissions(staged.path(), permissions.permissions()).map_err(|source| {
            PrepError::FileWrite {
                path: target.to_path_buf(),
                source,
            }
        })?;
    }
    write(staged.as_file_mut())?;
    staged
        .as_file_mut()
        .flush()
        .map_err(|source| PrepError::FileWrite {
            path: target.to_path_buf(),
            source,
        })?;
    Ok(staged)
}

fn persist_overwrite(staged: NamedTempFile, path: &Path) -> Result<(), PrepError> {
    staged
        .persist(path)
        .map(|_| ())
        .map_err(|err| PrepError::FileWrite {
            path: path.to_path_buf(),
            source: err.error,
        })
}
