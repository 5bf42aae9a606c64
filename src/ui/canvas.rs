// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Preview canvas with the ink overlay.
//!
//! This module shows the selected photo letterboxed in the available space,
//! keeps the annotation surface sized and positioned over it, and turns
//! pointer input into strokes.

use crate::models::display::{DisplayMetadata, Size, SurfaceRect};
use crate::models::stroke::{Point, PointerEvent, StrokeCapture, StrokeState, StrokeStyle};
use crate::models::surface::SurfaceHandle;
use crate::ui::layout::LayoutWatcher;

/// Callback told about the surface whenever it is provisioned or torn down.
pub type SurfaceReady = Box<dyn FnMut(Option<SurfaceHandle>)>;

/// One photo's annotation session, from selection until submit or change.
pub struct PreviewSession {
    id: u64,
    photo: Option<egui::TextureHandle>,
    natural: Option<Size>,
    surface: SurfaceHandle,
    capture: StrokeCapture,
    watcher: LayoutWatcher,
    /// Ink texture and the surface revision it was built from.
    ink: Option<(u64, egui::TextureHandle)>,
    pointer: PointerTracker,
    on_surface_ready: SurfaceReady,
}

impl PreviewSession {
    pub fn new(id: u64, style: StrokeStyle, on_surface_ready: SurfaceReady) -> Self {
        log::info!("Preview session {} started", id);
        Self {
            id,
            photo: None,
            natural: None,
            surface: SurfaceHandle::new(style),
            capture: StrokeCapture::new(),
            watcher: LayoutWatcher::new(),
            ink: None,
            pointer: PointerTracker::default(),
            on_surface_ready,
        }
    }

    /// The photo finished decoding for display.
    pub fn image_loaded(&mut self, texture: egui::TextureHandle, width: u32, height: u32) {
        self.natural = Some(Size::new(width as f32, height as f32));
        self.photo = Some(texture);
    }

    /// Erase all ink on this session's surface.
    pub fn request_clear(&self) {
        self.surface.clear();
    }

    /// Stop watching layout and withdraw the surface from the host.
    pub fn teardown(&mut self) {
        self.watcher.detach();
        self.ink = None;
        (self.on_surface_ready)(None);
        log::info!("Preview session {} ended", self.id);
    }

    /// Draw the preview and process pointer input.
    pub fn show(&mut self, ui: &mut egui::Ui) {
        let available = ui.available_size();
        let (container, _) = ui.allocate_exact_size(available, egui::Sense::hover());
        ui.painter()
            .rect_filled(container, 0.0, egui::Color32::from_gray(40));

        self.track_layout(container);

        let Some(meta) = self.watcher.metadata() else {
            ui.put(
                container,
                egui::Label::new(
                    egui::RichText::new("Loading image...").color(egui::Color32::WHITE),
                ),
            );
            return;
        };

        let image_rect = image_rect(container, &meta);
        let full_uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

        if let Some(ref photo) = self.photo {
            ui.painter()
                .image(photo.id(), image_rect, full_uv, egui::Color32::WHITE);
        }

        // Claiming the drag keeps enclosing widgets from panning or scrolling.
        let response = ui.interact(
            image_rect,
            ui.id().with(("ink_surface", self.id)),
            egui::Sense::drag(),
        );
        if response.hovered() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
        }

        let rendered = SurfaceRect::new(
            image_rect.min.x,
            image_rect.min.y,
            image_rect.width(),
            image_rect.height(),
        );
        let events = self.pointer.events(ui.ctx(), image_rect, self.capture.state());
        for event in events {
            let capture = &mut self.capture;
            self.surface
                .with_surface(|surface| capture.handle(event, surface, rendered));
        }

        self.refresh_ink(ui.ctx());
        if let Some((_, ref ink)) = self.ink {
            ui.painter()
                .image(ink.id(), image_rect, full_uv, egui::Color32::WHITE);
        }
    }

    fn track_layout(&mut self, container: egui::Rect) {
        let size = Size::new(container.width(), container.height());
        let recomputed = if self.watcher.is_attached() {
            self.watcher.observe(size, self.natural)
        } else {
            self.watcher.attach(self.id, size, self.natural)
        };

        if let Some(meta) = recomputed {
            self.surface.with_surface(|surface| surface.provision(meta));
            (self.on_surface_ready)(Some(self.surface.clone()));
        }
    }

    fn refresh_ink(&mut self, ctx: &egui::Context) {
        let revision = self.surface.revision();
        if matches!(self.ink, Some((seen, _)) if seen == revision) {
            return;
        }

        let image = self.surface.with_surface(|surface| {
            surface.pixmap().map(|pixmap| {
                egui::ColorImage::from_rgba_premultiplied(
                    [pixmap.width() as usize, pixmap.height() as usize],
                    pixmap.data(),
                )
            })
        });

        let previous = self.ink.take();
        self.ink = image.map(|image| match previous {
            Some((_, mut texture)) => {
                texture.set(image, egui::TextureOptions::LINEAR);
                (revision, texture)
            }
            None => (
                revision,
                ctx.load_texture("ink_surface", image, egui::TextureOptions::LINEAR),
            ),
        });
    }
}

/// Screen rectangle of the letterboxed photo inside `container`.
fn image_rect(container: egui::Rect, meta: &DisplayMetadata) -> egui::Rect {
    egui::Rect::from_min_size(
        container.min + egui::vec2(meta.offset_x, meta.offset_y),
        egui::vec2(meta.display_width, meta.display_height),
    )
}

/// Translates egui pointer input into stroke events, one frame at a time.
///
/// egui folds touch into the pointer, following the first contact only.
#[derive(Debug, Default)]
struct PointerTracker {
    /// Position of the last `Down` or `Move` handed out.
    last_sent: Option<egui::Pos2>,
}

impl PointerTracker {
    /// Read this frame's input. A move is reported whenever the pointer
    /// position differs from the last one sent, however slowly it travels.
    fn events(
        &mut self,
        ctx: &egui::Context,
        surface_rect: egui::Rect,
        state: StrokeState,
    ) -> Vec<PointerEvent> {
        let to_point = |pos: egui::Pos2| Point::new(pos.x, pos.y);

        ctx.input(|input| {
            let pointer = &input.pointer;
            let mut events = Vec::new();
            let mut drawing = state == StrokeState::Drawing;

            if !drawing && pointer.primary_pressed() {
                if let Some(pos) = pointer.interact_pos().filter(|p| surface_rect.contains(*p)) {
                    events.push(PointerEvent::Down(to_point(pos)));
                    self.last_sent = Some(pos);
                    drawing = true;
                }
            }

            if !drawing {
                return events;
            }

            match pointer.latest_pos() {
                Some(pos) if surface_rect.contains(pos) => {
                    if self.last_sent != Some(pos) {
                        events.push(PointerEvent::Move(to_point(pos)));
                        self.last_sent = Some(pos);
                    }
                    if pointer.primary_released() {
                        events.push(PointerEvent::Up);
                        self.last_sent = None;
                    }
                }
                _ => {
                    events.push(PointerEvent::Leave);
                    self.last_sent = None;
                }
            }

            events
        })
    }
}
