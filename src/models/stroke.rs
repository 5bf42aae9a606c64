// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Free-hand stroke capture.
//!
//! Ink is immediate-mode: pointer input is turned straight into pixels on
//! the [`AnnotationSurface`]. There is no stroke log, so no undo or redo.

use crate::models::display::SurfaceRect;
use crate::models::surface::AnnotationSurface;
use crate::util::geometry::map_to_surface;
use serde::{Deserialize, Serialize};

/// A 2D point in floating-point pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Ink appearance. Caps and joins are always round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeStyle {
    /// Straight (non-premultiplied) RGBA.
    pub color: [u8; 4],
    pub width: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: [255, 0, 0, 255],
            width: 3.0,
        }
    }
}

impl StrokeStyle {
    pub(crate) fn paint(&self) -> tiny_skia::Paint<'static> {
        let [r, g, b, a] = self.color;
        let mut paint = tiny_skia::Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;
        paint
    }

    pub(crate) fn stroke(&self) -> tiny_skia::Stroke {
        tiny_skia::Stroke {
            width: self.width,
            line_cap: tiny_skia::LineCap::Round,
            line_join: tiny_skia::LineJoin::Round,
            ..Default::default()
        }
    }
}

/// Whether a stroke is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeState {
    #[default]
    Idle,
    Drawing,
}

/// Pointer input in viewport coordinates.
///
/// Mouse and touch both arrive here; for touch only the primary contact is
/// ever reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up,
    Leave,
}

/// State machine turning pointer input into ink on a surface.
#[derive(Debug, Default)]
pub struct StrokeCapture {
    state: StrokeState,
}

impl StrokeCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StrokeState {
        self.state
    }

    /// Feed one pointer event. `rendered` is where the surface currently sits
    /// on screen. Returns true when the surface's pixels changed.
    pub fn handle(
        &mut self,
        event: PointerEvent,
        surface: &mut AnnotationSurface,
        rendered: SurfaceRect,
    ) -> bool {
        match (self.state, event) {
            (StrokeState::Idle, PointerEvent::Down(pos)) => {
                let Some(point) = Self::locate(pos, surface, rendered) else {
                    // No usable pixel buffer yet
                    return false;
                };
                surface.begin_path(point);
                self.state = StrokeState::Drawing;
                log::debug!("stroke started at ({:.1}, {:.1})", point.x, point.y);
                false
            }
            (StrokeState::Drawing, PointerEvent::Move(pos)) => {
                match Self::locate(pos, surface, rendered) {
                    Some(point) => surface.line_to(point),
                    None => false,
                }
            }
            (StrokeState::Drawing, PointerEvent::Up | PointerEvent::Leave) => {
                surface.close_path();
                self.state = StrokeState::Idle;
                log::debug!("stroke finished");
                false
            }
            _ => false,
        }
    }

    fn locate(pos: Point, surface: &AnnotationSurface, rendered: SurfaceRect) -> Option<Point> {
        let buffer = surface.buffer_size()?;
        map_to_surface(pos, rendered, buffer)
    }
}
