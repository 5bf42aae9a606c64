// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the letterbox calculation that sizes the annotation
//! surface, and the mapping from viewport coordinates into the surface's
//! pixel-buffer coordinates.

use crate::models::display::{DisplayMetadata, Size, SurfaceRect};
use crate::models::stroke::Point;

/// Fit an image of `natural` size inside `container`, preserving aspect ratio.
///
/// The image is scaled to the limiting dimension and centered along the
/// other axis. Returns `None` while either size is degenerate (image not
/// loaded yet, zero-sized container), so callers keep whatever metadata
/// they already had.
pub fn letterbox(container: Size, natural: Size) -> Option<DisplayMetadata> {
    if !container.is_usable() || !natural.is_usable() {
        return None;
    }

    let image_aspect_ratio = natural.width / natural.height;
    let container_aspect_ratio = container.width / container.height;

    let metadata = if image_aspect_ratio > container_aspect_ratio {
        // Image is wider - fit to width
        let display_height = container.width / image_aspect_ratio;
        DisplayMetadata {
            display_width: container.width,
            display_height,
            offset_x: 0.0,
            offset_y: (container.height - display_height) / 2.0,
            image_aspect_ratio,
        }
    } else {
        // Image is taller - fit to height
        let display_width = container.height * image_aspect_ratio;
        DisplayMetadata {
            display_width,
            display_height: container.height,
            offset_x: (container.width - display_width) / 2.0,
            offset_y: 0.0,
            image_aspect_ratio,
        }
    };

    Some(metadata)
}

/// Convert a viewport position into surface pixel-buffer coordinates.
///
/// `rendered` is the surface's on-screen rectangle and `buffer` its pixel
/// dimensions. The offset from the rectangle's top-left is scaled by
/// `buffer / rendered` on each axis so ink stays under the pointer when the
/// two sizes diverge (device pixel ratio, or a buffer truncated to whole
/// pixels). Returns `None` if the rendered rectangle is empty.
pub fn map_to_surface(client: Point, rendered: SurfaceRect, buffer: (u32, u32)) -> Option<Point> {
    if rendered.width <= 0.0 || rendered.height <= 0.0 {
        return None;
    }

    let scale_x = buffer.0 as f32 / rendered.width;
    let scale_y = buffer.1 as f32 / rendered.height;

    Some(Point::new(
        (client.x - rendered.left) * scale_x,
        (client.y - rendered.top) * scale_y,
    ))
}
