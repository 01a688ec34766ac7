//! Label class-index repair.
//!
//! Some label files were annotated with the wrong class. They are recognised
//! by their *filename*, not their contents: a file whose name contains one
//! of the category keywords is assumed to belong to that category. This is a
//! heuristic and misses files that are named differently; the predicate is a
//! [`CategoryMatcher`] so a content-based rule can be plugged in instead.
//!
//! In a selected file every line whose class token equals the source index
//! gets the target index instead. Geometry tokens, line order and line count
//! are untouched. Lines are trimmed and re-terminated with `\n` when a file
//! is rewritten; files with nothing to change are never opened for writing.

mod report;

pub use report::ReclassifyReport;

use std::fs;
use std::path::Path;

use crate::config::ReclassifyConfig;
use crate::error::PrepError;
use crate::layout::{ensure_dir, file_name_lossy, label_files, rel_string};
use crate::report::FileIssue;
use crate::sample::write_bytes_atomic;

/// Decides from a label file's name whether it belongs to the target category.
pub trait CategoryMatcher {
    fn is_target_category(&self, file_name: &str) -> bool;
}

impl<F> CategoryMatcher for F
where
    F: Fn(&str) -> bool,
{
    fn is_target_category(&self, file_name: &str) -> bool {
        self(file_name)
    }
}

/// Case-insensitive substring match against a fixed keyword set.
#[derive(Clone, Debug)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
}

impl KeywordMatcher {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl CategoryMatcher for KeywordMatcher {
    fn is_target_category(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

/// Leading-token substitution of one class index for another.
#[derive(Clone, Debug)]
pub struct ClassRewrite {
    source_token: String,
    target_token: String,
}

/// Result of rewriting a label file's contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewrittenLabel {
    pub text: String,
    pub lines_changed: usize,
}

impl ClassRewrite {
    pub fn new(source_class: u32, target_class: u32) -> Self {
        Self {
            source_token: source_class.to_string(),
            target_token: target_class.to_string(),
        }
    }

    /// Rewrite one line. Returns the trimmed line and whether it changed.
    pub fn rewrite_line(&self, line: &str) -> (String, bool) {
        let trimmed = line.trim();
        match trimmed.strip_prefix(self.source_token.as_str()) {
            Some(rest) if rest.starts_with(char::is_whitespace) => {
                (format!("{}{}", self.target_token, rest), true)
            }
            _ => (trimmed.to_string(), false),
        }
    }

    /// Rewrite every line of a label file.
    pub fn rewrite_content(&self, content: &str) -> RewrittenLabel {
        let mut text = String::with_capacity(content.len() + 1);
        let mut lines_changed = 0;
        for line in content.lines() {
            let (rewritten, changed) = self.rewrite_line(line);
            if changed {
                lines_changed += 1;
            }
            text.push_str(&rewritten);
            text.push('\n');
        }
        RewrittenLabel {
            text,
            lines_changed,
        }
    }
}

/// A configured reclassification pass.
pub struct Reclassifier<M> {
    matcher: M,
    rewrite: ClassRewrite,
    source_class: u32,
    target_class: u32,
    dry_run: bool,
}

impl Reclassifier<KeywordMatcher> {
    pub fn from_config(config: &ReclassifyConfig) -> Result<Self, PrepError> {
        config.validate()?;
        let matcher = KeywordMatcher::new(&config.keywords);
        tracing::debug!("Category keywords: {}", matcher.keywords().join(", "));
        Ok(Self::new(matcher, config.source_class, config.target_class))
    }
}

impl<M: CategoryMatcher> Reclassifier<M> {
    pub fn new(matcher: M, source_class: u32, target_class: u32) -> Self {
        Self {
            matcher,
            rewrite: ClassRewrite::new(source_class, target_class),
            source_class,
            target_class,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Scan `labels_dir` and fix every matching label file.
    ///
    /// Only a missing directory returns `Err`; per-file problems land in the
    /// report.
    pub fn run(&self, labels_dir: &Path) -> Result<ReclassifyReport, PrepError> {
        ensure_dir(labels_dir)?;
        let scan = label_files(labels_dir)?;

        tracing::info!(
            "Scanning {} label file(s) under {}",
            scan.files.len(),
            labels_dir.display()
        );

        let mut report = ReclassifyReport::new(self.source_class, self.target_class, self.dry_run);
        for issue in scan.issues {
            report.scanned += 1;
            report.add_issue(issue.relative_to(labels_dir));
        }
        for path in &scan.files {
            report.scanned += 1;
            let file_name = file_name_lossy(path);
            if !self.matcher.is_target_category(&file_name) {
                continue;
            }
            report.matched += 1;

            let rel = rel_string(labels_dir, path);
            match self.reclassify_file(path) {
                Ok(0) => {
                    tracing::debug!("Already correct: {file_name}");
                    report.add_already_correct();
                }
                Ok(lines) => {
                    tracing::info!(
                        "{}: {file_name} ({lines} line(s))",
                        if self.dry_run { "Would correct" } else { "Corrected" }
                    );
                    report.add_corrected(rel, lines);
                }
                Err(err) => {
                    tracing::warn!("Failed to process {file_name}: {err}");
                    report.add_issue(FileIssue::from_error(Path::new(&rel), &err));
                }
            }
        }

        tracing::info!(
            "Reclassification finished: {} matched, {} corrected, {} error(s)",
            report.matched,
            report.corrected,
            report.errors
        );
        Ok(report)
    }

    /// Returns the number of rewritten lines; zero means the file was left alone.
    fn reclassify_file(&self, path: &Path) -> Result<usize, PrepError> {
        let content = fs::read_to_string(path).map_err(|source| PrepError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let rewritten = self.rewrite.rewrite_content(&content);
        if rewritten.lines_changed > 0 && !self.dry_run {
            write_bytes_atomic(path, rewritten.text.as_bytes())?;
        }
        Ok(rewritten.lines_changed)
    }
}

/// Run the reclassifier described by `config` over `labels_dir`.
pub fn reclassify_labels(
    labels_dir: &Path,
    config: &ReclassifyConfig,
    dry_run: bool,
) -> Result<ReclassifyReport, PrepError> {
    Reclassifier::from_config(config)?
        .dry_run(dry_run)
        .run(labels_dir)
}

/// Fuzz-only entrypoint for the label rewriter.
#[cfg(feature = "fuzzing")]
pub fn fuzz_rewrite_content(input: &str) {
    let rewrite = ClassRewrite::new(0, 1);
    let first = rewrite.rewrite_content(input);
    let second = rewrite.rewrite_content(&first.text);
    assert_eq!(second.lines_changed, 0);
    assert_eq!(first.text.lines().count(), input.lines().count());
}
