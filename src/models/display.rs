// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Display geometry value types.
//!
//! These describe where the source photo ends up once it has been
//! letterboxed into its container, and where the annotation surface is
//! drawn on screen.

/// A width/height pair in floating-point pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when both sides are strictly positive and finite.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// How the source image is letterboxed inside its container.
///
/// Produced by [`crate::util::geometry::letterbox`]. Each layout pass
/// replaces the previous value wholesale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMetadata {
    pub display_width: f32,
    pub display_height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub image_aspect_ratio: f32,
}

impl DisplayMetadata {
    /// Pixel-buffer dimensions for a surface covering the displayed image.
    ///
    /// Fractional sizes are truncated, matching how a raster surface takes
    /// integer dimensions. Returns `None` when either side would be zero.
    pub fn buffer_size(&self) -> Option<(u32, u32)> {
        let width = self.display_width.max(0.0) as u32;
        let height = self.display_height.max(0.0) as u32;
        if width == 0 || height == 0 {
            None
        } else {
            Some((width, height))
        }
    }
}

/// On-screen bounding rectangle of the rendered annotation surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}
