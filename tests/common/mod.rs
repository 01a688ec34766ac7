#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use walkdir::WalkDir;

/// Opaque RGB image filled with one color.
pub fn solid_rgb(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([30, 120, 200])))
}

/// RGBA image: left half fully transparent black, right half opaque red.
pub fn half_transparent(width: u32, height: u32) -> DynamicImage {
    let mut rgba = RgbaImage::new(width, height);
    for (x, _, pixel) in rgba.enumerate_pixels_mut() {
        *pixel = if x < width / 2 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([220, 0, 0, 255])
        };
    }
    DynamicImage::ImageRgba8(rgba)
}

/// Indexed PNG: left half palette entry 0 (fully transparent black), right
/// half entry 1 (opaque red).
pub fn indexed_png_with_transparency(width: u32, height: u32) -> Vec<u8> {
    let indices: Vec<u8> = (0..height)
        .flat_map(|_| (0..width).map(move |x| u8::from(x >= width / 2)))
        .collect();

    let mut bytes = Vec::new();
    let mut encoder = png::Encoder::new(&mut bytes, width, height);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(vec![0, 0, 0, 220, 0, 0]);
    encoder.set_trns(vec![0, 255]);
    let mut writer = encoder.write_header().expect("write png header");
    writer.write_image_data(&indices).expect("write png data");
    writer.finish().expect("finish png");
    bytes
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, format).expect("encode test image");
    bytes.into_inner()
}

/// Write `image` encoded as `format`, whatever extension `path` has.
pub fn write_image(path: &Path, image: &DynamicImage, format: ImageFormat) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, encode(image, format)).expect("write image file");
}

pub fn write_label(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write label file");
}

pub fn create_layout(root: &Path) {
    fs::create_dir_all(root.join("images/train")).expect("create images dir");
    fs::create_dir_all(root.join("labels/train")).expect("create labels dir");
}

/// Codec detected from the file's bytes.
pub fn sniff_format(path: &Path) -> Option<ImageFormat> {
    image::ImageReader::open(path)
        .expect("open image")
        .with_guessed_format()
        .expect("guess format")
        .format()
}

/// Relative path -> bytes for every file under `root`.
pub fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.expect("walk dir"))
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let rel = entry
                .path()
                .strip_prefix(root)
                .expect("strip prefix")
                .to_string_lossy()
                .replace('\\', "/");
            (rel, fs::read(entry.path()).expect("read file"))
        })
        .collect()
}
