// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Choosing what gets uploaded.

use crate::io::compositor::merged_image;
use crate::io::media::SourceImage;
use crate::models::surface::SurfaceSnapshot;

/// File name used for merged uploads.
pub const MERGED_FILE_NAME: &str = "merged-image.jpg";

/// The binary the host sends to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPayload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: String,
    /// True when the payload carries baked-in ink.
    pub annotated: bool,
}

/// Build the upload for a submission.
///
/// With no photo there is nothing to upload. Otherwise the merged image is
/// preferred, and any merge failure falls back to the photo unchanged.
pub fn prepare_upload(
    selected: Option<&SourceImage>,
    snapshot: Option<&SurfaceSnapshot>,
    quality: f32,
) -> Option<UploadPayload> {
    let selected = selected?;

    let payload = match merged_image(Some(&selected.bytes), snapshot, quality) {
        Some(bytes) => UploadPayload {
            bytes,
            file_name: MERGED_FILE_NAME.to_string(),
            mime: "image/jpeg".to_string(),
            annotated: true,
        },
        None => UploadPayload {
            bytes: selected.bytes.clone(),
            file_name: selected.file_name.clone(),
            mime: selected.mime.clone(),
            annotated: false,
        },
    };
    Some(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::tests::png_fixture;
    use crate::models::display::DisplayMetadata;
    use crate::models::stroke::StrokeStyle;
    use crate::models::surface::AnnotationSurface;

    fn snapshot() -> SurfaceSnapshot {
        let mut surface = AnnotationSurface::new(StrokeStyle::default());
        surface.provision(DisplayMetadata {
            display_width: 90.0,
            display_height: 160.0,
            offset_x: 0.0,
            offset_y: 0.0,
            image_aspect_ratio: 0.5625,
        });
        surface.snapshot().unwrap()
    }

    #[test]
    fn test_no_image_means_no_upload() {
        assert!(prepare_upload(None, Some(&snapshot()), 0.9).is_none());
    }

    #[test]
    fn test_merged_payload_is_named_jpeg() {
        let source = png_fixture(90, 160, [128, 128, 128]);
        let payload = prepare_upload(Some(&source), Some(&snapshot()), 0.9).unwrap();
        assert!(payload.annotated);
        assert_eq!(payload.file_name, MERGED_FILE_NAME);
        assert_eq!(payload.mime, "image/jpeg");
    }

    #[test]
    fn test_without_surface_uploads_original() {
        let source = png_fixture(90, 160, [128, 128, 128]);
        let payload = prepare_upload(Some(&source), None, 0.9).unwrap();
        assert!(!payload.annotated);
        assert_eq!(payload.bytes, source.bytes);
        assert_eq!(payload.file_name, "photo.png");
        assert_eq!(payload.mime, "image/png");
    }

    #[test]
    fn test_undecodable_photo_uploads_original() {
        let source = SourceImage {
            bytes: b"garbage".to_vec(),
            file_name: "photo.jpg".to_string(),
            mime: "image/jpeg".to_string(),
        };
        let payload = prepare_upload(Some(&source), Some(&snapshot()), 0.9).unwrap();
        assert!(!payload.annotated);
        assert_eq!(payload.bytes, source.bytes);
    }
}
