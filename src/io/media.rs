// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Photo loading, decoding, and pre-preview compression.
//!
//! This module reads the selected photo, decodes it for display, shrinks
//! it for posting, and encodes rasters as JPEG.

use crate::models::settings::{jpeg_quality, CompressionSettings};
use anyhow::{bail, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// A photo as the host holds it: encoded bytes plus upload naming.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: String,
}

/// Decoded pixels ready for texture upload.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Read a photo from disk. Fails if the file is not a recognised image.
pub fn read_source(path: &Path) -> Result<SourceImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string();
    source_from_bytes(bytes, file_name)
}

/// Wrap raw bytes, sniffing the image type from their content.
pub fn source_from_bytes(bytes: Vec<u8>, file_name: String) -> Result<SourceImage> {
    let Ok(format) = image::guess_format(&bytes) else {
        bail!("{} is not an image file", file_name);
    };
    Ok(SourceImage {
        bytes,
        file_name,
        mime: format.to_mime_type().to_string(),
    })
}

/// Decode encoded image bytes, turning the pixels upright per EXIF.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("Failed to read image header")?
        .into_decoder()
        .context("Failed to decode image")?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder).context("Failed to decode image")?;
    if orientation != Orientation::NoTransforms {
        log::debug!("applying EXIF orientation {:?}", orientation);
        img.apply_orientation(orientation);
    }
    Ok(img)
}

/// Decode a photo into straight RGBA for display.
pub fn load_image(source: &SourceImage) -> Result<LoadedImage> {
    let rgba = decode(&source.bytes)?.to_rgba8();
    Ok(LoadedImage {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

/// Encode an RGB raster as JPEG. `quality` is in `(0, 1]`.
pub fn encode_jpeg(image: &RgbImage, quality: f32) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, jpeg_quality(quality))
        .encode_image(image)
        .context("Failed to encode JPEG")?;
    Ok(out)
}

/// Shrink a photo to the posting limits and re-encode it as JPEG.
///
/// Photos already within the limits are re-encoded at their own size; they
/// are never upscaled. The original file name is kept.
pub fn compress_for_post(source: &SourceImage, limits: &CompressionSettings) -> Result<SourceImage> {
    let img = decode(&source.bytes)?;
    let (width, height) = (img.width(), img.height());

    let img = if width > limits.max_width || height > limits.max_height {
        let ratio = (limits.max_width as f32 / width as f32)
            .min(limits.max_height as f32 / height as f32);
        let new_width = ((width as f32 * ratio) as u32).max(1);
        let new_height = ((height as f32 * ratio) as u32).max(1);
        log::debug!("compressing {}x{} -> {}x{}", width, height, new_width, new_height);
        img.resize_exact(new_width, new_height, FilterType::Triangle)
    } else {
        img
    };

    let bytes = encode_jpeg(&img.to_rgb8(), limits.quality)?;
    Ok(SourceImage {
        bytes,
        file_name: source.file_name.clone(),
        mime: "image/jpeg".to_string(),
    })
}

/// Compress a freshly chosen photo, falling back to the original bytes.
///
/// Returns the photo to preview and, on fallback, a message for the user.
pub fn prepare_selected(
    source: SourceImage,
    limits: &CompressionSettings,
) -> (SourceImage, Option<String>) {
    match compress_for_post(&source, limits) {
        Ok(compressed) => {
            log::info!(
                "Compressed {} from {} to {} bytes",
                source.file_name,
                source.bytes.len(),
                compressed.bytes.len()
            );
            (compressed, None)
        }
        Err(e) => {
            log::warn!("Image compression failed, using original: {:#}", e);
            (source, Some("Image compression failed; using the original photo".to_string()))
        }
    }
}
