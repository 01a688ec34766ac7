//! On-disk dataset layout.
//!
//! A dataset root normally holds an `images/` tree and a parallel `labels/`
//! tree where `images/<rel>/<stem>.<ext>` pairs with `labels/<rel>/<stem>.txt`.
//! Roots without that split are treated as flat: images are scanned from the
//! root itself and labels are expected next to their image.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::PrepError;
use crate::report::FileIssue;

/// Image extensions picked up by the normalizer scan.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "avif"];
pub const LABEL_EXTENSION: &str = "txt";

/// Dataset directory, relative to the executable, used when no root is given.
pub const DEFAULT_DATASET_DIR: &str = "datasets/lixo_praia";
/// Labels split reclassified by default, relative to the dataset root.
pub const DEFAULT_LABELS_SPLIT: &str = "labels/train";

#[derive(Clone, Debug)]
pub struct DatasetLayout {
    pub root: PathBuf,
    pub images_dir: PathBuf,
    pub labels_dir: Option<PathBuf>,
}

impl DatasetLayout {
    /// Resolve the layout of a dataset root.
    ///
    /// Fails with [`PrepError::DatasetNotFound`] when `root` is not a
    /// directory; every other shape is accepted.
    pub fn discover(root: &Path) -> Result<Self, PrepError> {
        ensure_dir(root)?;

        let images = root.join("images");
        let labels = root.join("labels");
        if images.is_dir() && labels.is_dir() {
            Ok(Self {
                root: root.to_path_buf(),
                images_dir: images,
                labels_dir: Some(labels),
            })
        } else {
            Ok(Self {
                root: root.to_path_buf(),
                images_dir: root.to_path_buf(),
                labels_dir: None,
            })
        }
    }

    /// Label path paired with `image_path`.
    pub fn label_path_for(&self, image_path: &Path) -> PathBuf {
        if let Some(labels_dir) = &self.labels_dir {
            if let Ok(rel) = image_path.strip_prefix(&self.images_dir) {
                return labels_dir.join(rel).with_extension(LABEL_EXTENSION);
            }
        }
        image_path.with_extension(LABEL_EXTENSION)
    }

    /// All scannable images, sorted by path relative to the images tree.
    pub fn image_files(&self) -> Result<FileScan, PrepError> {
        let mut scan = collect_files_with_extensions(&self.images_dir, &IMAGE_EXTENSIONS)?;
        scan.sort_by_rel(&self.images_dir);
        Ok(scan)
    }
}

/// Result of a recursive scan.
///
/// Entries that could not be visited (dangling symlinks, loops, unreadable
/// subdirectories) are kept as issues with their absolute path so the pass
/// can count them and keep going.
#[derive(Clone, Debug, Default)]
pub struct FileScan {
    pub files: Vec<PathBuf>,
    pub issues: Vec<FileIssue>,
}

impl FileScan {
    fn sort_by_rel(&mut self, root: &Path) {
        self.files.sort_by_cached_key(|path| rel_string(root, path));
        self.issues
            .sort_by_cached_key(|issue| rel_string(root, &issue.path));
    }
}

/// Default dataset root: `datasets/lixo_praia` beside the running executable.
pub fn default_dataset_root() -> PathBuf {
    let base = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(DEFAULT_DATASET_DIR)
}

pub fn ensure_dir(path: &Path) -> Result<(), PrepError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(PrepError::DatasetNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Label files under `labels_dir`, sorted by relative path.
pub fn label_files(labels_dir: &Path) -> Result<FileScan, PrepError> {
    let mut scan = collect_files_with_extensions(labels_dir, &[LABEL_EXTENSION])?;
    scan.sort_by_rel(labels_dir);
    Ok(scan)
}

/// Only a failure on `root` itself is fatal.
fn collect_files_with_extensions(
    root: &Path,
    extensions: &[&str],
) -> Result<FileScan, PrepError> {
    let mut scan = FileScan::default();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => match err.path() {
                Some(path) if err.depth() > 0 => {
                    tracing::warn!("Skipping {}: {err}", path.display());
                    scan.issues.push(FileIssue::new(path, err.to_string()));
                    continue;
                }
                _ => {
                    return Err(PrepError::Traversal {
                        path: root.to_path_buf(),
                        message: format!("failed while traversing directory: {err}"),
                    })
                }
            },
        };

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            scan.files.push(entry.path().to_path_buf());
        }
    }

    Ok(scan)
}

pub fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

pub fn rel_string(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

pub fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, Deserialize)]
struct DataYaml {
    names: DataYamlNames,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataYamlNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<usize, String>),
}

/// Class names declared at the dataset root, if any.
///
/// `data.yaml` wins over `classes.txt`. Returns `Ok(None)` when neither file
/// exists.
pub fn read_class_names(root: &Path) -> Result<Option<BTreeMap<usize, String>>, PrepError> {
    let data_yaml = root.join("data.yaml");
    if data_yaml.is_file() {
        let data = fs::read_to_string(&data_yaml).map_err(|source| PrepError::FileRead {
            path: data_yaml.clone(),
            source,
        })?;
        let parsed: DataYaml =
            serde_yaml::from_str(&data).map_err(|source| PrepError::DataYamlParse {
                path: data_yaml.clone(),
                source,
            })?;
        let names = match parsed.names {
            DataYamlNames::Sequence(names) => names.into_iter().enumerate().collect(),
            DataYamlNames::Mapping(mapping) => mapping,
        };
        return Ok(Some(names));
    }

    let classes_txt = root.join("classes.txt");
    if classes_txt.is_file() {
        let data = fs::read_to_string(&classes_txt).map_err(|source| PrepError::FileRead {
            path: classes_txt.clone(),
            source,
        })?;
        let names = data
            .lines()
            .map(str::trim)
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(idx, name)| (idx, name.to_string()))
            .collect();
        return Ok(Some(names));
    }

    Ok(None)
}
