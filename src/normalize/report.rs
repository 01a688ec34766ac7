//! Format normalizer report.

use serde::Serialize;
use std::fmt;

use crate::report::FileIssue;

/// Pixel layout of a decoded image, as far as normalization cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelMode {
    /// 8-bit RGB, already what the encoder takes.
    TrueColor,
    /// Carries an alpha channel (RGBA, LA, expanded palettes with transparency).
    Alpha,
    /// Anything else: grayscale, 16-bit or float color.
    Other,
}

impl PixelMode {
    pub fn of(color: image::ColorType) -> Self {
        if color.has_alpha() {
            PixelMode::Alpha
        } else if color == image::ColorType::Rgb8 {
            PixelMode::TrueColor
        } else {
            PixelMode::Other
        }
    }
}

impl fmt::Display for PixelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelMode::TrueColor => write!(f, "rgb"),
            PixelMode::Alpha => write!(f, "alpha"),
            PixelMode::Other => write!(f, "other"),
        }
    }
}

/// One image that was (or, in a dry run, would be) re-encoded.
#[derive(Clone, Debug, Serialize)]
pub struct Conversion {
    /// Original path, relative to the dataset root.
    pub from: String,
    /// Canonical path, relative to the dataset root.
    pub to: String,
    /// Codec detected from the file contents.
    pub codec: String,
    pub mode: PixelMode,
    pub label_renamed: bool,
}

impl Conversion {
    pub fn renamed(&self) -> bool {
        self.from != self.to
    }
}

/// Outcome of one normalizer pass.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NormalizeReport {
    pub dry_run: bool,
    /// Image files enumerated at scan start, including entries the scan
    /// could not visit.
    pub scanned: usize,
    pub converted: usize,
    /// Files that decoded fine and needed nothing.
    pub unchanged: usize,
    pub errors: usize,
    pub conversions: Vec<Conversion>,
    pub issues: Vec<FileIssue>,
}

impl NormalizeReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    pub fn add_conversion(&mut self, conversion: Conversion) {
        self.converted += 1;
        self.conversions.push(conversion);
    }

    pub fn add_unchanged(&mut self) {
        self.unchanged += 1;
    }

    pub fn add_issue(&mut self, issue: FileIssue) {
        self.errors += 1;
        self.issues.push(issue);
    }
}

impl fmt::Display for NormalizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run {
            "would convert"
        } else {
            "converted"
        };

        writeln!(
            f,
            "Scanned {} image(s): {} {}, {} unchanged, {} error(s)",
            self.scanned, verb, self.converted, self.unchanged, self.errors
        )?;

        for conversion in &self.conversions {
            if conversion.renamed() {
                write!(
                    f,
                    "  {} -> {} ({}, {})",
                    conversion.from, conversion.to, conversion.codec, conversion.mode
                )?;
            } else {
                write!(
                    f,
                    "  {} re-encoded in place ({}, {})",
                    conversion.from, conversion.codec, conversion.mode
                )?;
            }
            if conversion.label_renamed {
                write!(f, " [label renamed]")?;
            }
            writeln!(f)?;
        }

        for issue in &self.issues {
            writeln!(f, "  error: {}", issue)?;
        }

        if self.converted == 0 && self.errors == 0 {
            writeln!(f, "No image needed conversion.")?;
        }

        Ok(())
    }
}
