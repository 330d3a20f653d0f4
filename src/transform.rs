//! On-demand asset transformation.
//!
//! Raster images can be resized and transcoded via URL parameters. Every
//! failure fails open: the original bytes and MIME type are returned, since
//! the asset itself is still valid even when the requested variant is not.
//! Vector formats and non-images always pass through untouched.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// Cache directive for asset bytes. Transform parameters are part of the
/// cache key, and stored bytes are immutable once uploaded, so both
/// transformed and passthrough responses are cacheable forever.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// Raster MIME types the pipeline will decode. Vector formats are excluded
/// deliberately.
const RASTER_MIMES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/tiff",
];

/// Output formats the `f` parameter may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    WebP,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::WebP => ImageFormat::WebP,
        }
    }
}

/// Requested format conversion, tracking invalid requests so they can fail
/// open instead of erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatRequest {
    #[default]
    Unchanged,
    Convert(OutputFormat),
    Invalid,
}

/// Crop strategy when both dimensions are given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fit {
    /// Fill the box exactly, cropping overflow (center-anchored).
    #[default]
    Cover,
    /// Fit within the box, preserving aspect ratio.
    Contain,
}

impl Fit {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "contain" => Self::Contain,
            _ => Self::Cover,
        }
    }
}

/// Transform parameters parsed from the request URL.
#[derive(Debug, Clone, Default)]
pub struct TransformParams {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// 1-100, only meaningful for lossy output. Defaults to 80.
    pub quality: Option<u8>,
    pub format: FormatRequest,
    pub fit: Fit,
    /// Accepted for URL compatibility; the resize primitive crops from
    /// center regardless.
    pub gravity: Option<String>,
}

impl TransformParams {
    /// Build from raw query values.
    pub fn from_raw(
        w: Option<u32>,
        h: Option<u32>,
        q: Option<u8>,
        f: Option<&str>,
        fit: Option<&str>,
        g: Option<&str>,
    ) -> Self {
        let format = match f {
            None => FormatRequest::Unchanged,
            Some(raw) => match OutputFormat::parse(raw) {
                Some(fmt) => FormatRequest::Convert(fmt),
                None => FormatRequest::Invalid,
            },
        };
        Self {
            // Zero dimensions are meaningless; treat as absent.
            width: w.filter(|v| *v > 0),
            height: h.filter(|v| *v > 0),
            quality: q,
            format,
            fit: fit.map(Fit::parse).unwrap_or_default(),
            gravity: g.map(String::from),
        }
    }

    /// Whether any actual work was requested.
    pub fn is_noop(&self) -> bool {
        self.width.is_none()
            && self.height.is_none()
            && matches!(self.format, FormatRequest::Unchanged)
    }

    fn clamped_quality(&self) -> u8 {
        self.quality.unwrap_or(80).clamp(1, 100)
    }
}

/// Result of a transform: output bytes, their MIME type, and the cache
/// directive the response must carry.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub bytes: Bytes,
    pub mime_type: String,
    pub cache_control: &'static str,
}

fn is_raster(mime_type: &str) -> bool {
    RASTER_MIMES.contains(&mime_type)
}

/// Apply the requested transform. Never errors: anything that cannot be
/// honored returns the original bytes and MIME type.
pub fn transform(bytes: Bytes, mime_type: &str, params: &TransformParams) -> TransformOutput {
    let passthrough = |bytes: Bytes| TransformOutput {
        bytes,
        mime_type: mime_type.to_string(),
        cache_control: IMMUTABLE_CACHE_CONTROL,
    };

    if params.is_noop() || !is_raster(mime_type) {
        return passthrough(bytes);
    }
    if matches!(params.format, FormatRequest::Invalid) {
        tracing::debug!(mime = %mime_type, "Unsupported output format requested, serving original");
        return passthrough(bytes);
    }

    let img = match image::load_from_memory(&bytes) {
        Ok(img) => img,
        Err(e) => {
            tracing::debug!(mime = %mime_type, error = %e, "Undecodable image, serving original");
            return passthrough(bytes);
        }
    };

    let resized = resize(img, params);

    let output_format = match params.format {
        FormatRequest::Convert(fmt) => fmt.image_format(),
        _ => match ImageFormat::from_mime_type(mime_type) {
            Some(fmt) => fmt,
            None => return passthrough(bytes),
        },
    };

    match encode(&resized, output_format, params.clamped_quality()) {
        Ok(out) => TransformOutput {
            bytes: Bytes::from(out),
            mime_type: output_format.to_mime_type().to_string(),
            cache_control: IMMUTABLE_CACHE_CONTROL,
        },
        Err(e) => {
            tracing::debug!(format = ?output_format, error = %e, "Encode failed, serving original");
            passthrough(bytes)
        }
    }
}

fn resize(img: DynamicImage, params: &TransformParams) -> DynamicImage {
    let (iw, ih) = img.dimensions();
    match (params.width, params.height) {
        (Some(w), Some(h)) => match params.fit {
            Fit::Cover => img.resize_to_fill(w, h, RESIZE_FILTER),
            Fit::Contain => img.resize(w, h, RESIZE_FILTER),
        },
        // Single dimension: preserve aspect ratio through the other axis.
        (Some(w), None) => {
            let h = ((w as u64 * ih as u64) / iw.max(1) as u64).max(1) as u32;
            img.resize_exact(w, h, RESIZE_FILTER)
        }
        (None, Some(h)) => {
            let w = ((h as u64 * iw as u64) / ih.max(1) as u64).max(1) as u32;
            img.resize_exact(w, h, RESIZE_FILTER)
        }
        (None, None) => img,
    }
}

fn encode(
    img: &DynamicImage,
    format: ImageFormat,
    quality: u8,
) -> std::result::Result<Vec<u8>, image::ImageError> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            rgb.write_with_encoder(encoder)?;
        }
        _ => img.write_to(&mut buf, format)?,
    }
    Ok(buf.into_inner())
}
