//! Types shared by the pass reports.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::PrepError;

/// A failure scoped to one file. The pass that produced it kept going.
#[derive(Clone, Debug, Serialize)]
pub struct FileIssue {
    /// The file that failed.
    pub path: PathBuf,
    /// Human-readable cause.
    pub message: String,
}

impl FileIssue {
    pub fn new(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn from_error(path: &Path, err: &PrepError) -> Self {
        Self::new(path, err.to_string())
    }

    /// Re-express the path relative to `base`, as reports print it.
    pub fn relative_to(self, base: &Path) -> Self {
        Self {
            path: PathBuf::from(crate::layout::rel_string(base, &self.path)),
            message: self.message,
        }
    }
}

impl fmt::Display for FileIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// How a report is printed on stdout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Render a report in the requested format.
pub fn render<R>(report: &R, format: ReportFormat) -> Result<String, PrepError>
where
    R: fmt::Display + Serialize,
{
    match format {
        ReportFormat::Text => Ok(report.to_string()),
        ReportFormat::Json => serde_json::to_string_pretty(report)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(|source| PrepError::ReportSerialize { source }),
    }
}
