// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with the host's photo actions.

/// What the user asked for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    ChoosePhoto,
    ClearInk,
    Submit,
}

/// Display the toolbar. `busy` disables everything while a load or submit
/// is in flight.
pub fn show(ui: &mut egui::Ui, has_preview: bool, busy: bool) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;
        ui.add_enabled_ui(!busy, |ui| {
            let choose_label = if has_preview { "Change photo" } else { "Choose photo..." };
            if ui.button(choose_label).clicked() {
                action = ToolbarAction::ChoosePhoto;
            }

            if has_preview {
                if ui.button("Clear drawing").clicked() {
                    action = ToolbarAction::ClearInk;
                }

                ui.separator();

                if ui.button("Submit").clicked() {
                    action = ToolbarAction::Submit;
                }
            }
        });

        ui.separator();

        let hint = if has_preview {
            "Drag on the photo to draw"
        } else {
            "Choose a photo to report"
        };
        ui.label(egui::RichText::new(hint).italics().weak());
    });

    action
}
