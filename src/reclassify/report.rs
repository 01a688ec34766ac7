//! Label reclassifier report.

use serde::Serialize;
use std::fmt;

use crate::report::FileIssue;

/// Outcome of one reclassifier pass.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ReclassifyReport {
    pub dry_run: bool,
    pub source_class: u32,
    pub target_class: u32,
    /// Name of the target class from `data.yaml`/`classes.txt`, when known.
    pub target_class_name: Option<String>,
    /// Label files enumerated at scan start, including entries the scan
    /// could not visit.
    pub scanned: usize,
    /// Files whose name matched the category predicate.
    pub matched: usize,
    /// Matched files that had at least one line rewritten.
    pub corrected: usize,
    /// Matched files that needed no change.
    pub already_correct: usize,
    /// Files that could not be visited, read or written.
    pub errors: usize,
    /// Total rewritten lines across corrected files.
    pub lines_rewritten: usize,
    /// Corrected files, relative to the labels directory.
    pub corrected_files: Vec<String>,
    pub issues: Vec<FileIssue>,
}

impl ReclassifyReport {
    pub fn new(source_class: u32, target_class: u32, dry_run: bool) -> Self {
        Self {
            dry_run,
            source_class,
            target_class,
            ..Default::default()
        }
    }

    pub fn add_corrected(&mut self, rel_path: String, lines: usize) {
        self.corrected += 1;
        self.lines_rewritten += lines;
        self.corrected_files.push(rel_path);
    }

    pub fn add_issue(&mut self, issue: FileIssue) {
        self.errors += 1;
        self.issues.push(issue);
    }

    pub fn add_already_correct(&mut self) {
        self.already_correct += 1;
    }
}

impl fmt::Display for ReclassifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run {
            "would correct"
        } else {
            "corrected"
        };

        writeln!(
            f,
            "Matched {} of {} label file(s): {} {}, {} already correct, {} error(s)",
            self.matched,
            self.scanned,
            verb,
            self.corrected,
            self.already_correct,
            self.errors
        )?;

        for file in &self.corrected_files {
            writeln!(f, "  {}", file)?;
        }

        for issue in &self.issues {
            writeln!(f, "  error: {}", issue)?;
        }

        if self.corrected > 0 && !self.dry_run {
            write!(
                f,
                "Class {} rewritten to class {}",
                self.source_class, self.target_class
            )?;
            if let Some(name) = &self.target_class_name {
                write!(f, " ({})", name)?;
            }
            writeln!(f, " on {} line(s).", self.lines_rewritten)?;
        } else if self.corrected == 0 && self.errors == 0 {
            writeln!(f, "No correction was needed.")?;
        }

        Ok(())
    }
}
