use std::path::PathBuf;
use thiserror::Error;

/// The main error type for yoloprep operations.
///
/// Variants fall into two groups: failures that abort a whole invocation
/// (missing dataset, bad configuration) and failures scoped to a single file
/// (decode, encode, collision). Passes catch the second group per file and
/// record it in their report instead of returning it.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory not found: {}", path.display())]
    DatasetNotFound { path: PathBuf },

    #[error("Failed while scanning {}: {message}", path.display())]
    Traversal { path: PathBuf, message: String },

    #[error("Failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {}: {source}", path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode image {}: {source}", path.display())]
    ImageEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Refusing to overwrite existing file {}", path.display())]
    SampleCollision { path: PathBuf },

    #[error("Failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to parse data.yaml at {}: {source}", path.display())]
    DataYamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize report: {source}")]
    ReportSerialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("Pass finished with {errors} file error(s)")]
    PassFailed { errors: usize },
}
