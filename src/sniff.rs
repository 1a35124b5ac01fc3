use serde::{Deserialize, Serialize};

/// True image encoding as determined from raw bytes. `Unknown` is a
/// legitimate result (e.g. the fetched bytes are an HTML login wall),
/// consumed as data by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
    Bmp,
    Tiff,
    Unknown,
}

impl ImageFormat {
    /// Extension written for verbatim stores; truthful by construction.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tif",
            ImageFormat::Unknown => "bin",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Unknown => "unknown",
        }
    }

    pub(crate) fn to_decoder_format(self) -> Option<image::ImageFormat> {
        match self {
            ImageFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            ImageFormat::Png => Some(image::ImageFormat::Png),
            ImageFormat::Webp => Some(image::ImageFormat::WebP),
            ImageFormat::Gif => Some(image::ImageFormat::Gif),
            ImageFormat::Bmp => Some(image::ImageFormat::Bmp),
            ImageFormat::Tiff => Some(image::ImageFormat::Tiff),
            ImageFormat::Unknown => None,
        }
    }
}

/// Detect the true encoding of `bytes`, independent of any declared
/// content type or file name. Primary path is magic-number sniffing;
/// if no signature matches, fall back to the decoder's own guess,
/// confirmed by an actual decode. Never errors.
pub fn detect(bytes: &[u8]) -> ImageFormat {
    if let Some(format) = sniff_magic(bytes) {
        return format;
    }

    // Signature tables above cover the common cases; let the decoder
    // have a look at anything else, but only trust a guess that decodes.
    if let Ok(guessed) = image::guess_format(bytes) {
        if image::load_from_memory_with_format(bytes, guessed).is_ok() {
            return match guessed {
                image::ImageFormat::Jpeg => ImageFormat::Jpeg,
                image::ImageFormat::Png => ImageFormat::Png,
                image::ImageFormat::WebP => ImageFormat::Webp,
                image::ImageFormat::Gif => ImageFormat::Gif,
                image::ImageFormat::Bmp => ImageFormat::Bmp,
                image::ImageFormat::Tiff => ImageFormat::Tiff,
                _ => ImageFormat::Unknown,
            };
        }
    }

    ImageFormat::Unknown
}

fn sniff_magic(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(ImageFormat::Jpeg);
    }
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(ImageFormat::Png);
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some(ImageFormat::Webp);
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some(ImageFormat::Gif);
    }
    if bytes.starts_with(b"BM") {
        return Some(ImageFormat::Bmp);
    }
    if bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    {
        return Some(ImageFormat::Tiff);
    }
    None
}
