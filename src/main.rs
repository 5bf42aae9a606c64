// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Redline - photo markup for hazard reports
//!
//! A desktop tool for drawing free-hand red ink over a photo and flattening
//! the ink into the photo at its native resolution before it is uploaded.

mod app;
mod io;
mod models;
mod ui;
mod util;

use anyhow::Result;
use app::RedlineApp;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let settings = io::serialization::load_settings();

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 720.0])
            .with_min_inner_size([480.0, 360.0])
            .with_title("Redline"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Redline",
        options,
        Box::new(move |_cc| Ok(Box::new(RedlineApp::new(settings)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
