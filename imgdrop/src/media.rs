//! Content-type sniffing for uploaded payloads.
//!
//! The upload contract only trusts the actual file bytes: the client-supplied
//! filename and declared content type are ignored entirely. Format detection is
//! delegated to [`image::guess_format`], which inspects magic numbers.

use image::ImageFormat;

/// The accepted image formats and their canonical extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
}

impl ImageKind {
    /// Sniff the payload bytes. Returns `None` for anything that is not a
    /// JPEG, PNG or WebP image - including other image formats the `image`
    /// crate understands (GIF, BMP, ...).
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::WebP => Some(ImageKind::Webp),
            _ => None,
        }
    }

    /// Filename extension for stored files of this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Webp => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Webp => "image/webp",
        }
    }
}
