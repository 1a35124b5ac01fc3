use crate::sniff::ImageFormat;
use crate::{Result, VitrineError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const JPEG_QUALITY: u8 = 90;

/// Extensions a logical asset stem may carry on disk, probe order for
/// resolution and cleanup scope for stale siblings. `.bin` debug
/// artifacts are deliberately not listed; they are evidence, not assets.
pub const STORED_EXTENSIONS: &[&str] = &["jpg", "png", "webp", "gif", "bmp", "tif"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredImage {
    pub path: PathBuf,
    pub format: ImageFormat,
}

/// Persist `bytes` under `stem` (an extension-less path) with an
/// extension that truthfully reflects the detected format.
///
/// Layered fallback: unknown bytes are diverted to a `<stem>.bin`
/// debug artifact (a previously stored good image stays untouched);
/// jpeg bytes are written verbatim; other formats are re-encoded as
/// JPEG when `prefer_jpeg` is set, with a decode failure falling
/// through to a verbatim write under the true extension.
pub fn normalize(
    bytes: &[u8],
    detected: ImageFormat,
    stem: &Path,
    prefer_jpeg: bool,
) -> Result<StoredImage> {
    if let Some(parent) = stem.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if detected == ImageFormat::Unknown {
        let debug_path = stem.with_extension("bin");
        std::fs::write(&debug_path, bytes)?;
        return Err(VitrineError::UnknownFormat { path: debug_path });
    }

    if detected == ImageFormat::Jpeg {
        let path = stem.with_extension("jpg");
        write_replacing(&path, bytes)?;
        remove_stale_siblings(stem, &path);
        return Ok(StoredImage {
            path,
            format: ImageFormat::Jpeg,
        });
    }

    if prefer_jpeg {
        if let Some(decoder_format) = detected.to_decoder_format() {
            // Corrupt bytes fall through to the verbatim branch below.
            if let Ok(decoded) = image::load_from_memory_with_format(bytes, decoder_format) {
                let encoded = encode_jpeg_on_white(&decoded)?;
                let path = stem.with_extension("jpg");
                write_replacing(&path, &encoded)?;
                remove_stale_siblings(stem, &path);
                return Ok(StoredImage {
                    path,
                    format: ImageFormat::Jpeg,
                });
            }
        }
    }

    let path = stem.with_extension(detected.extension());
    write_replacing(&path, bytes)?;
    remove_stale_siblings(stem, &path);
    Ok(StoredImage {
        path,
        format: detected,
    })
}

/// Flatten any transparency onto an opaque white background and encode
/// as baseline JPEG. Palette transparency arrives here already expanded
/// to an alpha channel by the decoder, so compositing covers it too;
/// alpha is never simply stripped (that is what causes black fringes).
fn encode_jpeg_on_white(decoded: &image::DynamicImage) -> Result<Vec<u8>> {
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb = image::RgbImage::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u32;
        let blend = |channel: u8| -> u8 {
            ((channel as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        rgb.put_pixel(x, y, image::Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }

    let mut out = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder.encode(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)?;
    Ok(out)
}

// Stage to a .part sibling and rename, so a failed write never leaves
// a truncated file under the final name.
fn write_replacing(path: &Path, bytes: &[u8]) -> Result<()> {
    let staged = staged_path(path);
    std::fs::write(&staged, bytes)?;
    std::fs::rename(&staged, path)?;
    Ok(())
}

fn staged_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| "asset".to_string());
    name.push_str(".part");
    path.with_file_name(name)
}

// A stem that was PNG yesterday may arrive as WEBP today; drop the
// leftovers so extension probing never resolves to a stale artifact.
fn remove_stale_siblings(stem: &Path, keep: &Path) {
    for ext in STORED_EXTENSIONS {
        let sibling = stem.with_extension(ext);
        if sibling != *keep && sibling.exists() {
            let _ = std::fs::remove_file(sibling);
        }
    }
}
