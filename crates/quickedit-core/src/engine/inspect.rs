//! Metadata extraction: pixel properties from the decoded image, EXIF tags
//! from the raw container.

use std::io::Cursor;

use exif::{Exif, In, Reader, Tag};
use image::{DynamicImage, ImageFormat};

use super::codec;
use crate::metadata::{ExifSummary, ImageMetadata, Orientation};

/// Describe an image that has already been decoded from `bytes`.
pub fn describe(image: &DynamicImage, format: ImageFormat, bytes: &[u8]) -> ImageMetadata {
    let color = image.color();
    let (width, height) = (image.width(), image.height());

    ImageMetadata {
        format: codec::format_name(format),
        width,
        height,
        color_type: format!("{:?}", color),
        bits_per_pixel: color.bits_per_pixel(),
        has_alpha: color.has_alpha(),
        aspect_ratio: if height == 0 {
            0.0
        } else {
            width as f64 / height as f64
        },
        exif: read_exif(bytes),
    }
}

/// Collect the EXIF fields the editor displays.
///
/// Images without EXIF, or with EXIF that fails to parse, yield an empty
/// summary.
pub fn read_exif(bytes: &[u8]) -> ExifSummary {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            log::trace!("no EXIF: {}", e);
            return ExifSummary::default();
        }
    };

    ExifSummary {
        orientation: get_uint(&exif, Tag::Orientation).and_then(Orientation::from_exif),
        camera_make: get_string(&exif, Tag::Make),
        camera_model: get_string(&exif, Tag::Model),
        date_taken: get_string(&exif, Tag::DateTimeOriginal),
        iso: get_uint(&exif, Tag::PhotographicSensitivity)
            .or_else(|| get_uint(&exif, Tag::ISOSpeed)),
        aperture: get_string(&exif, Tag::FNumber).map(|f| format!("f/{}", f)),
        shutter_speed: get_string(&exif, Tag::ExposureTime).map(|t| format!("{}s", t)),
        focal_length: get_string(&exif, Tag::FocalLength).map(|f| format!("{} mm", f)),
        flash: get_uint(&exif, Tag::Flash).map(format_flash),
        lens_model: get_string(&exif, Tag::LensModel),
        software: get_string(&exif, Tag::Software),
        exposure_program: get_uint(&exif, Tag::ExposureProgram).map(format_exposure_program),
    }
}

fn get_string(exif: &Exif, tag: Tag) -> Option<String> {
    exif.get_field(tag, In::PRIMARY)
        .map(|f| f.display_value().to_string().trim_matches('"').to_string())
}

fn get_uint(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
}

/// Flash is a bitfield: bit 0 fired, bits 3-4 mode (2 = forced off).
fn format_flash(value: u32) -> String {
    let fired = value & 0x01 != 0;
    let mode = (value >> 3) & 0x03;

    match (fired, mode) {
        (_, 2) => "Off".to_string(),
        (true, _) => "Fired".to_string(),
        (false, _) => "Did not fire".to_string(),
    }
}

fn format_exposure_program(value: u32) -> String {
    match value {
        0 => "Not defined".to_string(),
        1 => "Manual".to_string(),
        2 => "Normal program".to_string(),
        3 => "Aperture priority".to_string(),
        4 => "Shutter priority".to_string(),
        5 => "Creative program".to_string(),
        6 => "Action program".to_string(),
        7 => "Portrait mode".to_string(),
        8 => "Landscape mode".to_string(),
        _ => format!("Unknown ({})", value),
    }
}
