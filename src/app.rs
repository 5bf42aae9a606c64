// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The application is the host of the annotation engine: it owns the
//! selected photo and the submission lifecycle, hands the photo to a
//! preview session, holds the surface handle the session gives back, and
//! turns a submit into an upload payload.

use crate::io::media::{self, LoadedImage, SourceImage};
use crate::io::submission::{prepare_upload, UploadPayload};
use crate::models::settings::Settings;
use crate::models::surface::SurfaceHandle;
use crate::ui::canvas::PreviewSession;
use crate::ui::toolbar::{self, ToolbarAction};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver};

/// Progress messages from the background photo loader.
enum LoaderMessage {
    /// The photo was read and compressed; display decoding continues.
    Selected(SourceImage, Option<String>),
    Decoded(LoadedImage),
    Failed(String),
}

/// Main application state.
pub struct RedlineApp {
    settings: Settings,

    /// Photo that will be uploaded, after compression
    selected: Option<SourceImage>,

    /// Annotation session for the selected photo
    session: Option<PreviewSession>,

    /// Surface handle most recently offered by the session
    surface: Rc<RefCell<Option<SurfaceHandle>>>,

    /// Counter for preview session ids
    session_counter: u64,

    /// Receiver for background photo loading
    image_loader: Option<Receiver<LoaderMessage>>,

    /// Receiver for the background merge
    merge_worker: Option<Receiver<Option<UploadPayload>>>,

    /// Loading state message
    loading_message: Option<String>,

    /// Last message for the user
    status: Option<String>,
}

impl RedlineApp {
    /// Create a new application instance.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            selected: None,
            session: None,
            surface: Rc::new(RefCell::new(None)),
            session_counter: 0,
            image_loader: None,
            merge_worker: None,
            loading_message: None,
            status: None,
        }
    }

    fn busy(&self) -> bool {
        self.image_loader.is_some() || self.merge_worker.is_some()
    }

    /// Read, compress, and decode a photo on a background thread.
    fn load_photo(&mut self, path: PathBuf) {
        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);
        self.loading_message = Some("Loading image...".to_string());
        let limits = self.settings.compression;

        std::thread::spawn(move || {
            let source = match media::read_source(&path) {
                Ok(source) => source,
                Err(e) => {
                    let _ = sender.send(LoaderMessage::Failed(format!("{:#}", e)));
                    return;
                }
            };

            let (source, warning) = media::prepare_selected(source, &limits);
            let decoded = media::load_image(&source);
            let _ = sender.send(LoaderMessage::Selected(source, warning));

            let message = match decoded {
                Ok(image) => {
                    log::info!("Loaded image: {} ({}x{})", path.display(), image.width, image.height);
                    LoaderMessage::Decoded(image)
                }
                Err(e) => LoaderMessage::Failed(format!("{:#}", e)),
            };
            let _ = sender.send(message);
        });
    }

    /// Replace the current photo and start a fresh preview session.
    fn select_photo(&mut self, source: SourceImage) {
        self.end_session();
        self.session_counter += 1;

        let slot = Rc::clone(&self.surface);
        let on_surface_ready = Box::new(move |handle: Option<SurfaceHandle>| {
            *slot.borrow_mut() = handle;
        });

        self.session = Some(PreviewSession::new(
            self.session_counter,
            self.settings.stroke,
            on_surface_ready,
        ));
        self.selected = Some(source);
    }

    fn end_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.teardown();
        }
    }

    fn poll_loader(&mut self, ctx: &egui::Context) {
        let Some(ref receiver) = self.image_loader else {
            return;
        };
        let messages: Vec<LoaderMessage> = receiver.try_iter().collect();

        let mut finished = false;
        for message in messages {
            match message {
                LoaderMessage::Selected(source, warning) => {
                    self.status = warning;
                    self.select_photo(source);
                }
                LoaderMessage::Decoded(image) => {
                    let size = [image.width as usize, image.height as usize];
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &image.pixels);
                    let texture =
                        ctx.load_texture("photo", color_image, egui::TextureOptions::LINEAR);
                    if let Some(ref mut session) = self.session {
                        session.image_loaded(texture, image.width, image.height);
                    }
                    finished = true;
                }
                LoaderMessage::Failed(e) => {
                    log::error!("Failed to load image: {}", e);
                    self.status = Some(format!("Could not open photo: {}", e));
                    // A photo that cannot be shown cannot be annotated.
                    self.end_session();
                    self.selected = None;
                    finished = true;
                }
            }
        }

        if finished {
            self.image_loader = None;
            self.loading_message = None;
        }
    }

    /// Snapshot the ink now and merge on a background thread.
    fn submit(&mut self) {
        let Some(selected) = self.selected.clone() else {
            self.status = Some("Choose a photo first".to_string());
            return;
        };

        let snapshot = match *self.surface.borrow() {
            Some(ref handle) => {
                match ink_coverage(handle) {
                    Some(0) | None => log::info!("Submitting without any ink drawn"),
                    Some(inked) => log::debug!("submitting with {} inked pixels", inked),
                }
                if let Some(meta) = handle.display_metadata() {
                    log::debug!(
                        "ink captured at {:.1}x{:.1} display size",
                        meta.display_width,
                        meta.display_height
                    );
                }
                handle.snapshot()
            }
            None => None,
        };
        let quality = self.settings.output_quality;

        let (sender, receiver) = channel();
        self.merge_worker = Some(receiver);
        self.loading_message = Some("Preparing upload...".to_string());

        std::thread::spawn(move || {
            let payload = prepare_upload(Some(&selected), snapshot.as_ref(), quality);
            let _ = sender.send(payload);
        });
    }

    fn poll_merge(&mut self) {
        let Some(ref receiver) = self.merge_worker else {
            return;
        };
        let Ok(payload) = receiver.try_recv() else {
            return;
        };
        self.merge_worker = None;
        self.loading_message = None;

        let Some(payload) = payload else {
            self.status = Some("Choose a photo first".to_string());
            return;
        };

        if !payload.annotated {
            log::warn!("Uploading photo without annotation");
        }

        // The network upload is out of this tool's hands; a save dialog
        // stands in for it.
        let path = rfd::FileDialog::new()
            .set_file_name(payload.file_name.as_str())
            .save_file();
        self.finish_submission(payload, path);
    }

    /// Deliver a prepared payload to `path`. No path means the user backed
    /// out, and the session stays open for another try.
    fn finish_submission(&mut self, payload: UploadPayload, path: Option<PathBuf>) {
        let Some(path) = path else {
            log::info!("Submission cancelled");
            self.status = Some("Submission cancelled".to_string());
            return;
        };

        match std::fs::write(&path, &payload.bytes) {
            Ok(()) => {
                log::info!(
                    "Submitted {} ({}, {} bytes) to {}",
                    payload.file_name,
                    payload.mime,
                    payload.bytes.len(),
                    path.display()
                );
                self.status = Some("Report submitted".to_string());
                self.end_session();
                self.selected = None;
            }
            Err(e) => {
                log::error!("Failed to write upload: {}", e);
                self.status = Some("Upload failed, please try again".to_string());
            }
        }
    }

    /// Write the active settings to a YAML or JSON file.
    fn export_settings(&self, path: PathBuf) {
        let extension = path.extension().and_then(|s| s.to_str());
        let result = match extension {
            Some("yaml") | Some("yml") => {
                crate::io::serialization::export_yaml(&self.settings, &path)
            }
            Some("json") => crate::io::serialization::export_json(&self.settings, &path),
            _ => {
                log::error!("Unsupported file extension: {:?}", extension);
                return;
            }
        };

        match result {
            Ok(_) => log::info!("Exported settings to {}", path.display()),
            Err(e) => log::error!("Failed to export settings: {}", e),
        }
    }

    fn choose_photo(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["jpg", "jpeg", "png", "bmp", "webp", "gif", "tiff", "tif"])
            .pick_file()
        {
            self.load_photo(path);
        }
    }
}

/// Number of surface pixels carrying ink, `None` before the surface is sized.
fn ink_coverage(handle: &SurfaceHandle) -> Option<usize> {
    let pixels = handle.pixel_data()?;
    Some(pixels.pixels().filter(|px| px[3] > 0).count())
}

impl eframe::App for RedlineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loader(ctx);
        self.poll_merge();

        // Keep polling while background work is running
        if self.busy() {
            ctx.request_repaint();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Choose Photo...").clicked() {
                        self.choose_photo();
                        ui.close_menu();
                    }
                    ui.separator();
                    ui.menu_button("Export Settings", |ui| {
                        if ui.button("Export as YAML...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("YAML", &["yaml", "yml"])
                                .set_file_name("redline.yaml")
                                .save_file()
                            {
                                self.export_settings(path);
                            }
                            ui.close_menu();
                        }
                        if ui.button("Export as JSON...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("JSON", &["json"])
                                .set_file_name("redline.json")
                                .save_file()
                            {
                                self.export_settings(path);
                            }
                            ui.close_menu();
                        }
                    });
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });

        // Toolbar
        let action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, self.session.is_some(), self.busy()))
            .inner;

        match action {
            ToolbarAction::ChoosePhoto => self.choose_photo(),
            ToolbarAction::ClearInk => {
                if let Some(ref session) = self.session {
                    session.request_clear();
                }
            }
            ToolbarAction::Submit => self.submit(),
            ToolbarAction::None => {}
        }

        // Status line
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| match (&self.loading_message, &self.status) {
                (Some(message), _) => {
                    ui.spinner();
                    ui.label(message);
                }
                (None, Some(status)) => {
                    ui.label(status);
                }
                (None, None) => {
                    ui.label(if self.selected.is_some() { "Ready" } else { "No photo selected" });
                }
            });
        });

        // Main canvas (center)
        egui::CentralPanel::default().show(ctx, |ui| match self.session {
            Some(ref mut session) => session.show(ui),
            None => {
                ui.centered_and_justified(|ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        ui.heading(
                            egui::RichText::new("Redline")
                                .size(32.0)
                                .color(egui::Color32::from_gray(200)),
                        );
                        ui.label(
                            egui::RichText::new("Mark up a hazard photo before reporting it")
                                .color(egui::Color32::from_gray(180)),
                        );
                    });
                });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::tests::png_fixture;
    use crate::models::display::DisplayMetadata;
    use crate::models::stroke::{Point, StrokeStyle};

    fn payload() -> UploadPayload {
        UploadPayload {
            bytes: vec![1, 2, 3, 4],
            file_name: "merged-image.jpg".to_string(),
            mime: "image/jpeg".to_string(),
            annotated: true,
        }
    }

    /// App with a photo selected and its preview session open.
    fn app_with_photo() -> RedlineApp {
        let mut app = RedlineApp::new(Settings::default());
        app.select_photo(png_fixture(8, 8, [0, 0, 0]));
        app
    }

    #[test]
    fn test_decode_failure_ends_session() {
        let mut app = RedlineApp::new(Settings::default());
        let (sender, receiver) = channel();
        app.image_loader = Some(receiver);
        app.loading_message = Some("Loading image...".to_string());

        sender
            .send(LoaderMessage::Selected(png_fixture(8, 8, [0, 0, 0]), None))
            .unwrap();
        sender
            .send(LoaderMessage::Failed("Failed to decode image".to_string()))
            .unwrap();
        app.poll_loader(&egui::Context::default());

        assert!(app.session.is_none());
        assert!(app.selected.is_none());
        assert!(app.surface.borrow().is_none());
        assert!(app.image_loader.is_none());
        assert!(app.loading_message.is_none());
        assert!(app.status.as_deref().unwrap().starts_with("Could not open photo"));
    }

    #[test]
    fn test_read_failure_sets_status() {
        let mut app = RedlineApp::new(Settings::default());
        let (sender, receiver) = channel();
        app.image_loader = Some(receiver);

        sender
            .send(LoaderMessage::Failed("Failed to read photo.png".to_string()))
            .unwrap();
        app.poll_loader(&egui::Context::default());

        assert!(app.session.is_none());
        assert!(!app.busy());
        assert!(app.status.is_some());
    }

    #[test]
    fn test_cancelled_save_keeps_session() {
        let mut app = app_with_photo();
        app.finish_submission(payload(), None);

        assert_eq!(app.status.as_deref(), Some("Submission cancelled"));
        assert!(app.session.is_some());
        assert!(app.selected.is_some());
    }

    #[test]
    fn test_saved_submission_resets() {
        let mut app = app_with_photo();
        let path = std::env::temp_dir().join(format!("redline-{}-submit.jpg", std::process::id()));

        app.finish_submission(payload(), Some(path.clone()));
        let written = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(written, vec![1, 2, 3, 4]);
        assert_eq!(app.status.as_deref(), Some("Report submitted"));
        assert!(app.session.is_none());
        assert!(app.selected.is_none());
    }

    #[test]
    fn test_failed_write_keeps_session() {
        let mut app = app_with_photo();
        let path = std::env::temp_dir()
            .join(format!("redline-{}-missing", std::process::id()))
            .join("merged-image.jpg");

        app.finish_submission(payload(), Some(path));

        assert_eq!(app.status.as_deref(), Some("Upload failed, please try again"));
        assert!(app.session.is_some());
    }

    #[test]
    fn test_ink_coverage_counts_inked_pixels() {
        let handle = SurfaceHandle::new(StrokeStyle::default());
        assert_eq!(ink_coverage(&handle), None);

        handle.with_surface(|s| {
            s.provision(DisplayMetadata {
                display_width: 32.0,
                display_height: 32.0,
                offset_x: 0.0,
                offset_y: 0.0,
                image_aspect_ratio: 1.0,
            })
        });
        assert_eq!(ink_coverage(&handle), Some(0));

        handle.with_surface(|s| {
            s.begin_path(Point::new(4.0, 16.0));
            s.line_to(Point::new(28.0, 16.0));
        });
        let inked = ink_coverage(&handle).unwrap();
        assert!(inked > 0 && inked < 32 * 32);
    }
}
