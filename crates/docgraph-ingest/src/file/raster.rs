//! Raster images: dimensions, color mode, EXIF fields, OCR text.

use std::io::Cursor;
use std::path::Path;
use std::process::Command;

use ::image::{ColorType, ImageFormat};
use docgraph_store::PropertyValue;
use tracing::{debug, warn};

use docgraph_core::{Error, Result};

use super::{ExtractedContent, Metadata};

/// OCR engine invoked as `tesseract <file> stdout`.
const OCR_COMMAND: &str = "tesseract";

pub(super) fn extract(path: &Path, bytes: &[u8]) -> Result<ExtractedContent> {
    let format = ::image::guess_format(bytes)
        .map_err(|e| Error::Extraction(format!("unrecognized image: {}", e)))?;
    let img = ::image::load_from_memory_with_format(bytes, format)
        .map_err(|e| Error::Extraction(format!("image decode failed: {}", e)))?;

    let mut metadata = Metadata::new();
    metadata.insert("format".into(), format_name(format).into());
    metadata.insert("mode".into(), color_mode(img.color()).into());
    metadata.insert("width".into(), PropertyValue::Int(i64::from(img.width())));
    metadata.insert("height".into(), PropertyValue::Int(i64::from(img.height())));
    read_exif(bytes, &mut metadata);

    Ok(ExtractedContent {
        text: ocr(path),
        metadata,
        ..ExtractedContent::default()
    })
}

fn format_name(format: ImageFormat) -> String {
    format!("{:?}", format).to_uppercase()
}

fn color_mode(color: ColorType) -> String {
    match color {
        ColorType::L8 => "L".into(),
        ColorType::La8 => "LA".into(),
        ColorType::Rgb8 => "RGB".into(),
        ColorType::Rgba8 => "RGBA".into(),
        ColorType::L16 => "I;16".into(),
        other => format!("{:?}", other),
    }
}

/// Primary-IFD EXIF fields as `exif_<Tag>`; images without EXIF add nothing.
fn read_exif(bytes: &[u8], metadata: &mut Metadata) {
    let mut cursor = Cursor::new(bytes);
    let exif = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif,
        Err(e) => {
            debug!("No EXIF data: {}", e);
            return;
        }
    };
    for field in exif.fields().filter(|f| f.ifd_num == exif::In::PRIMARY) {
        let value = field.display_value().with_unit(&exif).to_string();
        metadata.insert(format!("exif_{}", field.tag), value.into());
    }
}

fn ocr(path: &Path) -> String {
    match Command::new(OCR_COMMAND).arg(path).arg("stdout").output() {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).trim().to_string(),
        Ok(out) => {
            warn!(
                "OCR failed for {}: {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            );
            String::new()
        }
        Err(e) => {
            warn!("OCR engine '{}' unavailable ({}), image text left empty", OCR_COMMAND, e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 10, 10]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_image_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        let bytes = png_bytes(4, 3);
        std::fs::write(&path, &bytes).unwrap();

        let content = extract(&path, &bytes).unwrap();
        assert_eq!(content.metadata.get("format"), Some(&PropertyValue::Text("PNG".into())));
        assert_eq!(content.metadata.get("mode"), Some(&PropertyValue::Text("RGB".into())));
        assert_eq!(content.metadata.get("width"), Some(&PropertyValue::Int(4)));
        assert_eq!(content.metadata.get("height"), Some(&PropertyValue::Int(3)));
        assert!(!content.metadata.keys().any(|k| k.starts_with("exif_")));
    }

    #[test]
    fn test_corrupt_image_is_an_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        let err = extract(&path, b"\x89PNG\r\n\x1a\nbroken").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }
}
