// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The annotation surface and the handle given to the host.
//!
//! The surface is a transparent pixel buffer covering exactly the displayed
//! image region. Its pixel origin is the image's top-left content pixel, so
//! the letterbox bars are never part of it.

use crate::models::display::DisplayMetadata;
use crate::models::stroke::{Point, StrokeStyle};
use image::RgbaImage;
use std::cell::RefCell;
use std::rc::Rc;
use tiny_skia::{Color, PathBuilder, Pixmap, Transform};

/// Pixel buffer plus the geometry it was sized from.
#[derive(Debug)]
pub struct AnnotationSurface {
    pixmap: Option<Pixmap>,
    metadata: Option<DisplayMetadata>,
    style: StrokeStyle,
    /// End of the current ink path, if one is open.
    cursor: Option<Point>,
    /// Bumped on every pixel change so the UI knows when to re-upload.
    revision: u64,
}

impl AnnotationSurface {
    pub fn new(style: StrokeStyle) -> Self {
        Self {
            pixmap: None,
            metadata: None,
            style,
            cursor: None,
            revision: 0,
        }
    }

    /// Reallocate the pixel buffer for new display geometry.
    ///
    /// Reallocating always erases existing ink and drops any open path, even
    /// when the dimensions are unchanged. The stroke style is re-applied.
    pub fn provision(&mut self, metadata: DisplayMetadata) {
        self.pixmap = metadata
            .buffer_size()
            .and_then(|(width, height)| Pixmap::new(width, height));
        self.metadata = Some(metadata);
        self.cursor = None;
        self.revision += 1;

        match self.pixmap {
            Some(ref pixmap) => log::debug!(
                "surface provisioned at {}x{} (offset {:.1}, {:.1})",
                pixmap.width(),
                pixmap.height(),
                metadata.offset_x,
                metadata.offset_y
            ),
            None => log::debug!("surface has no usable pixel size yet"),
        }
    }

    pub fn metadata(&self) -> Option<DisplayMetadata> {
        self.metadata
    }

    pub fn buffer_size(&self) -> Option<(u32, u32)> {
        self.pixmap.as_ref().map(|p| (p.width(), p.height()))
    }

    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Start a new ink path at `at` without drawing anything.
    pub fn begin_path(&mut self, at: Point) {
        self.cursor = Some(at);
    }

    /// Extend the current path to `to` and stroke the new segment.
    ///
    /// With no open path this only moves the cursor, like a fresh path
    /// context would. Returns true when pixels were written.
    pub fn line_to(&mut self, to: Point) -> bool {
        let Some(from) = self.cursor.replace(to) else {
            return false;
        };
        let Some(ref mut pixmap) = self.pixmap else {
            return false;
        };

        let mut pb = PathBuilder::new();
        pb.move_to(from.x, from.y);
        pb.line_to(to.x, to.y);
        let Some(path) = pb.finish() else {
            return false;
        };

        pixmap.stroke_path(
            &path,
            &self.style.paint(),
            &self.style.stroke(),
            Transform::identity(),
            None,
        );
        self.revision += 1;
        true
    }

    /// Close the current path so the next stroke starts fresh.
    pub fn close_path(&mut self) {
        self.cursor = None;
    }

    /// Wipe all ink to transparent. Open paths are left alone.
    pub fn clear(&mut self) {
        if let Some(ref mut pixmap) = self.pixmap {
            pixmap.fill(Color::TRANSPARENT);
            self.revision += 1;
        }
    }

    /// Copy of the pixels and the geometry that produced them.
    pub fn snapshot(&self) -> Option<SurfaceSnapshot> {
        Some(SurfaceSnapshot {
            pixmap: self.pixmap.clone()?,
            metadata: self.metadata?,
        })
    }

    /// True when no pixel carries any ink.
    #[cfg(test)]
    pub fn is_blank(&self) -> bool {
        self.pixmap
            .as_ref()
            .map_or(true, |p| p.pixels().iter().all(|px| px.alpha() == 0))
    }

    /// Alpha of one buffer pixel, zero when out of range.
    #[cfg(test)]
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.pixmap
            .as_ref()
            .and_then(|p| p.pixel(x, y))
            .map_or(0, |px| px.alpha())
    }
}

/// Frozen copy of the surface taken when a submission begins.
#[derive(Debug, Clone)]
pub struct SurfaceSnapshot {
    pub pixmap: Pixmap,
    pub metadata: DisplayMetadata,
}

/// Shared handle to the live surface, passed to the host.
///
/// Everything runs on the UI thread, so a plain `Rc<RefCell<_>>` is enough.
#[derive(Debug, Clone)]
pub struct SurfaceHandle {
    inner: Rc<RefCell<AnnotationSurface>>,
}

impl SurfaceHandle {
    pub fn new(style: StrokeStyle) -> Self {
        Self {
            inner: Rc::new(RefCell::new(AnnotationSurface::new(style))),
        }
    }

    /// Erase all ink.
    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
        log::info!("annotation cleared");
    }

    /// Current ink as straight RGBA, or `None` before the surface has a size.
    pub fn pixel_data(&self) -> Option<RgbaImage> {
        let surface = self.inner.borrow();
        let pixmap = surface.pixmap()?;
        let mut raw = Vec::with_capacity(pixmap.data().len());
        for px in pixmap.pixels() {
            let c = px.demultiply();
            raw.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(pixmap.width(), pixmap.height(), raw)
    }

    pub fn display_metadata(&self) -> Option<DisplayMetadata> {
        self.inner.borrow().metadata()
    }

    pub fn snapshot(&self) -> Option<SurfaceSnapshot> {
        self.inner.borrow().snapshot()
    }

    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision()
    }

    pub(crate) fn with_surface<R>(&self, f: impl FnOnce(&mut AnnotationSurface) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(width: f32, height: f32) -> DisplayMetadata {
        DisplayMetadata {
            display_width: width,
            display_height: height,
            offset_x: 0.0,
            offset_y: 0.0,
            image_aspect_ratio: width / height,
        }
    }

    fn inked(handle: &SurfaceHandle) {
        handle.with_surface(|s| {
            s.begin_path(Point::new(2.0, 2.0));
            s.line_to(Point::new(30.0, 30.0));
            s.close_path();
        });
    }

    #[test]
    fn test_provision_sizes_buffer() {
        let handle = SurfaceHandle::new(StrokeStyle::default());
        assert!(handle.snapshot().is_none());

        handle.with_surface(|s| s.provision(metadata(400.0, 225.0)));
        assert_eq!(handle.with_surface(|s| s.buffer_size()), Some((400, 225)));
        assert_eq!(handle.display_metadata(), Some(metadata(400.0, 225.0)));
    }

    #[test]
    fn test_reprovision_erases_ink() {
        let handle = SurfaceHandle::new(StrokeStyle::default());
        handle.with_surface(|s| s.provision(metadata(64.0, 64.0)));
        inked(&handle);
        assert!(!handle.with_surface(|s| s.is_blank()));

        // Same size still reallocates.
        handle.with_surface(|s| s.provision(metadata(64.0, 64.0)));
        assert!(handle.with_surface(|s| s.is_blank()));
    }

    #[test]
    fn test_clear_through_handle() {
        let handle = SurfaceHandle::new(StrokeStyle::default());
        handle.with_surface(|s| s.provision(metadata(64.0, 64.0)));
        inked(&handle);

        let other = handle.clone();
        other.clear();
        assert!(handle.with_surface(|s| s.is_blank()));
    }

    #[test]
    fn test_pixel_data_is_straight_red() {
        let handle = SurfaceHandle::new(StrokeStyle::default());
        handle.with_surface(|s| s.provision(metadata(64.0, 64.0)));
        inked(&handle);

        let img = handle.pixel_data().unwrap();
        assert_eq!(img.dimensions(), (64, 64));
        let px = img.get_pixel(16, 16);
        assert!(px[3] > 200);
        assert_eq!(px[0], 255);
        assert_eq!(px[1], 0);
        assert_eq!(img.get_pixel(60, 2)[3], 0);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let handle = SurfaceHandle::new(StrokeStyle::default());
        handle.with_surface(|s| s.provision(metadata(64.0, 64.0)));
        let snapshot = handle.snapshot().unwrap();

        inked(&handle);
        assert!(snapshot.pixmap.pixels().iter().all(|px| px.alpha() == 0));
    }

    #[test]
    fn test_degenerate_metadata_leaves_no_buffer() {
        let handle = SurfaceHandle::new(StrokeStyle::default());
        handle.with_surface(|s| s.provision(metadata(0.5, 10.0)));
        assert!(handle.pixel_data().is_none());
        assert!(handle.snapshot().is_none());
        assert!(handle.display_metadata().is_some());
    }
}
