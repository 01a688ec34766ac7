//! Image format normalization.
//!
//! Walks the images tree of a dataset and re-encodes every image whose codec
//! the training pipeline cannot read (AVIF, WEBP) to JPEG. Transparency is
//! flattened onto white, since the detector input is plain RGB. An image that
//! changes extension moves together with its label via
//! [`SampleMove`](crate::sample::SampleMove).
//!
//! Per-file failures (unreadable, undecodable, collisions, write errors) are
//! recorded in the [`NormalizeReport`] and never stop the scan.

mod report;

pub use report::{Conversion, NormalizeReport, PixelMode};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage};

use crate::config::NormalizeOptions;
use crate::error::PrepError;
use crate::layout::{file_name_lossy, rel_string, DatasetLayout};
use crate::report::FileIssue;
use crate::sample::{SampleMove, SamplePaths};

/// Extension written for every normalized image.
pub const CANONICAL_EXTENSION: &str = "jpg";

const PROBLEM_FORMATS: [ImageFormat; 2] = [ImageFormat::Avif, ImageFormat::WebP];
const PROBLEM_EXTENSIONS: [&str; 2] = ["avif", "webp"];

/// What was learned about an image while reading it.
#[derive(Clone, Debug)]
pub struct ImageRecord {
    /// Codec detected from content; falls back to the extension.
    pub format: Option<ImageFormat>,
    pub mode: PixelMode,
}

/// Run the normalizer over the dataset rooted at `root`.
///
/// Only a missing root or invalid options return `Err`.
pub fn normalize_dataset(
    root: &Path,
    opts: &NormalizeOptions,
) -> Result<NormalizeReport, PrepError> {
    opts.validate()?;
    let layout = DatasetLayout::discover(root)?;
    let scan = layout.image_files()?;

    tracing::info!(
        "Scanning {} image(s) under {}",
        scan.files.len(),
        layout.images_dir.display()
    );

    let mut report = NormalizeReport::new(opts.dry_run);
    for issue in scan.issues {
        report.scanned += 1;
        report.add_issue(issue.relative_to(&layout.root));
    }
    for path in &scan.files {
        report.scanned += 1;
        match normalize_image(&layout, path, opts) {
            Ok(Some(conversion)) => {
                tracing::info!(
                    "{} {} -> {}",
                    if opts.dry_run { "Would convert" } else { "Converted" },
                    conversion.from,
                    conversion.to
                );
                report.add_conversion(conversion);
            }
            Ok(None) => {
                tracing::debug!("Already compatible: {}", file_name_lossy(path));
                report.add_unchanged();
            }
            Err(err) => {
                tracing::warn!("Failed to process {}: {err}", file_name_lossy(path));
                let rel = rel_string(&layout.root, path);
                report.add_issue(FileIssue::from_error(Path::new(&rel), &err));
            }
        }
    }

    tracing::info!(
        "Normalization finished: {} converted, {} error(s)",
        report.converted,
        report.errors
    );
    Ok(report)
}

fn normalize_image(
    layout: &DatasetLayout,
    path: &Path,
    opts: &NormalizeOptions,
) -> Result<Option<Conversion>, PrepError> {
    let (record, image) = read_image(path)?;
    if !needs_conversion(record.format, path) {
        return Ok(None);
    }

    let target = canonical_image_path(path);
    let sample_move = SampleMove::new(
        SamplePaths::new(path, layout.label_path_for(path)),
        SamplePaths::new(&target, layout.label_path_for(&target)),
    );

    let mut conversion = Conversion {
        from: rel_string(&layout.root, path),
        to: rel_string(&layout.root, &target),
        codec: codec_name(record.format),
        mode: record.mode,
        label_renamed: false,
    };

    if opts.dry_run {
        sample_move.check()?;
        return Ok(Some(conversion));
    }

    let rgb = flatten_to_rgb(image);
    let outcome =
        sample_move.commit(|file| encode_jpeg(file, &rgb, opts.jpeg_quality, &target))?;
    conversion.label_renamed = outcome.label_renamed;
    Ok(Some(conversion))
}

/// Open and fully decode an image, detecting its codec from content.
pub fn read_image(path: &Path) -> Result<(ImageRecord, DynamicImage), PrepError> {
    let reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|source| PrepError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
    let format = reader.format();
    let image = reader.decode().map_err(|source| PrepError::ImageDecode {
        path: path.to_path_buf(),
        source,
    })?;

    let record = ImageRecord {
        format,
        mode: PixelMode::of(image.color()),
    };
    Ok((record, image))
}

/// True when the codec or the extension is one the trainer cannot take.
///
/// The extension check catches containers whose content sniffing is
/// inconclusive; the codec check catches safe-looking names such as a
/// `.jpg` holding AVIF bytes.
pub fn needs_conversion(format: Option<ImageFormat>, path: &Path) -> bool {
    let bad_codec = format.is_some_and(|f| PROBLEM_FORMATS.contains(&f));
    let bad_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            PROBLEM_EXTENSIONS
                .iter()
                .any(|bad| ext.eq_ignore_ascii_case(bad))
        });
    bad_codec || bad_extension
}

/// Same stem with the canonical extension. A path already ending in `.jpg`
/// (any case) is returned unchanged so it gets overwritten in place.
pub fn canonical_image_path(path: &Path) -> PathBuf {
    let is_canonical = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CANONICAL_EXTENSION));
    if is_canonical {
        path.to_path_buf()
    } else {
        path.with_extension(CANONICAL_EXTENSION)
    }
}

/// Reduce any decoded image to 8-bit RGB, compositing alpha over white.
pub fn flatten_to_rgb(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return match image {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => other.to_rgb8(),
        };
    }

    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut out = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        out.put_pixel(x, y, Rgb([over_white(r, a), over_white(g, a), over_white(b, a)]));
    }
    out
}

fn over_white(channel: u8, alpha: u8) -> u8 {
    let c = u32::from(channel);
    let a = u32::from(alpha);
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

fn encode_jpeg(
    file: &mut File,
    rgb: &RgbImage,
    quality: u8,
    target: &Path,
) -> Result<(), PrepError> {
    let mut writer = BufWriter::new(file);
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, quality))
        .map_err(|source| PrepError::ImageEncode {
            path: target.to_path_buf(),
            source,
        })?;
    writer.flush().map_err(|source| PrepError::FileWrite {
        path: target.to_path_buf(),
        source,
    })
}

fn codec_name(format: Option<ImageFormat>) -> String {
    match format {
        Some(format) => format!("{format:?}").to_uppercase(),
        None => "UNKNOWN".to_string(),
    }
}
