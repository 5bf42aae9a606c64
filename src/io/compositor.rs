// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Flattening ink into the photo at native resolution.
//!
//! The surface only covers the displayed image region, so scaling it by
//! `native / display` on each axis lands it exactly over the photo; no
//! letterbox offset is involved.

use crate::io::media::{decode, encode_jpeg};
use crate::models::surface::SurfaceSnapshot;
use anyhow::{anyhow, Context, Result};
use image::{RgbImage, RgbaImage};
use tiny_skia::{ColorU8, FilterQuality, IntSize, Pixmap, PixmapPaint, Transform};

/// Merge the ink into the source photo and encode the result as JPEG.
///
/// Returns `None` when there is nothing to merge or any step fails; the
/// caller then uploads the photo unchanged.
pub fn merged_image(
    source: Option<&[u8]>,
    snapshot: Option<&SurfaceSnapshot>,
    quality: f32,
) -> Option<Vec<u8>> {
    let (Some(source), Some(snapshot)) = (source, snapshot) else {
        log::debug!("no annotation to merge");
        return None;
    };

    match merge(source, snapshot, quality) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!("Merge failed, falling back to original image: {:#}", e);
            None
        }
    }
}

fn merge(source: &[u8], snapshot: &SurfaceSnapshot, quality: f32) -> Result<Vec<u8>> {
    let original = decode(source)?.to_rgba8();
    let (original_width, original_height) = original.dimensions();

    let mut output = pixmap_from_rgba(&original)?;

    let meta = &snapshot.metadata;
    if meta.display_width <= 0.0 || meta.display_height <= 0.0 {
        return Err(anyhow!("display size is empty"));
    }
    let scale_x = original_width as f32 / meta.display_width;
    let scale_y = original_height as f32 / meta.display_height;

    output.draw_pixmap(
        0,
        0,
        snapshot.pixmap.as_ref(),
        &PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..Default::default()
        },
        Transform::from_scale(scale_x, scale_y),
        None,
    );

    log::debug!(
        "merged {}x{} ink into {}x{} photo (scale {:.3}, {:.3})",
        snapshot.pixmap.width(),
        snapshot.pixmap.height(),
        original_width,
        original_height,
        scale_x,
        scale_y
    );

    encode_jpeg(&flatten(&output), quality)
}

fn pixmap_from_rgba(image: &RgbaImage) -> Result<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())
        .context("image has no pixels")?;
    let mut data = Vec::with_capacity(image.as_raw().len());
    for px in image.pixels() {
        let [r, g, b, a] = px.0;
        let c = ColorU8::from_rgba(r, g, b, a).premultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Pixmap::from_vec(data, size).context("Failed to allocate output raster")
}

/// Drop alpha for JPEG. Transparent regions come out black.
fn flatten(pixmap: &Pixmap) -> RgbImage {
    let mut out = RgbImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        // Premultiplied color is already composited over black.
        dst.0 = [src.red(), src.green(), src.blue()];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::tests::png_fixture;
    use crate::models::display::{DisplayMetadata, SurfaceRect};
    use crate::models::stroke::{Point, PointerEvent, StrokeCapture, StrokeStyle};
    use crate::models::surface::AnnotationSurface;

    fn tall_surface() -> AnnotationSurface {
        let mut surface = AnnotationSurface::new(StrokeStyle::default());
        surface.provision(DisplayMetadata {
            display_width: 225.0,
            display_height: 400.0,
            offset_x: 37.5,
            offset_y: 0.0,
            image_aspect_ratio: 0.5625,
        });
        surface
    }

    fn is_ink(px: &image::Rgb<u8>) -> bool {
        px[0] > 180 && px[1] < 90 && px[2] < 90
    }

    fn is_gray(px: &image::Rgb<u8>) -> bool {
        (px[0] as i32 - 128).abs() < 20 && (px[1] as i32 - 128).abs() < 20
    }

    #[test]
    fn test_vertical_stroke_scales_to_native() {
        let mut surface = tall_surface();
        let mut capture = StrokeCapture::new();
        let rendered = SurfaceRect::new(37.5, 0.0, 225.0, 400.0);

        // Surface-local (10,10) -> (10,110)
        capture.handle(PointerEvent::Down(Point::new(47.5, 10.0)), &mut surface, rendered);
        capture.handle(PointerEvent::Move(Point::new(47.5, 110.0)), &mut surface, rendered);
        capture.handle(PointerEvent::Up, &mut surface, rendered);

        let source = png_fixture(900, 1600, [128, 128, 128]);
        let snapshot = surface.snapshot().unwrap();
        let merged = merged_image(Some(&source.bytes), Some(&snapshot), 0.9).unwrap();

        let out = decode(&merged).unwrap().to_rgb8();
        assert_eq!(out.dimensions(), (900, 1600));

        for y in [60, 240, 420] {
            assert!(is_ink(out.get_pixel(40, y)), "expected ink at (40, {})", y);
        }
        assert!(is_gray(out.get_pixel(40, 470)));
        assert!(is_gray(out.get_pixel(40, 10)));
        assert!(is_gray(out.get_pixel(80, 240)));
        assert!(is_gray(out.get_pixel(450, 800)));
    }

    #[test]
    fn test_output_matches_native_size_for_any_display() {
        let source = png_fixture(640, 480, [128, 128, 128]);
        for (w, h) in [(64.0, 48.0), (400.0, 300.0), (1280.0, 960.0)] {
            let mut surface = AnnotationSurface::new(StrokeStyle::default());
            surface.provision(DisplayMetadata {
                display_width: w,
                display_height: h,
                offset_x: 0.0,
                offset_y: 0.0,
                image_aspect_ratio: w / h,
            });
            let snapshot = surface.snapshot().unwrap();
            let merged = merged_image(Some(&source.bytes), Some(&snapshot), 0.9).unwrap();
            let out = decode(&merged).unwrap();
            assert_eq!((out.width(), out.height()), (640, 480));
        }
    }

    #[test]
    fn test_blank_ink_leaves_photo_untouched() {
        let surface = tall_surface();
        let source = png_fixture(900, 1600, [128, 128, 128]);
        let merged =
            merged_image(Some(&source.bytes), surface.snapshot().as_ref(), 0.9).unwrap();
        let out = decode(&merged).unwrap().to_rgb8();
        assert!(out.pixels().step_by(997).all(is_gray));
    }

    #[test]
    fn test_missing_inputs_yield_none() {
        let surface = tall_surface();
        let snapshot = surface.snapshot().unwrap();
        let source = png_fixture(90, 160, [128, 128, 128]);

        assert!(merged_image(None, Some(&snapshot), 0.9).is_none());
        assert!(merged_image(Some(&source.bytes), None, 0.9).is_none());
    }

    #[test]
    fn test_decode_failure_yields_none() {
        let surface = tall_surface();
        let snapshot = surface.snapshot().unwrap();
        assert!(merged_image(Some(b"not an image"), Some(&snapshot), 0.9).is_none());
    }
}
