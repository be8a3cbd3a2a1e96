use eframe::egui;
use egui::Color32;

use crate::app::StudioApp;
use crate::command::Command;

pub fn tools_panel(app: &mut StudioApp, ctx: &egui::Context) {
    egui::TopBottomPanel::top("tools_panel").show(ctx, |ui| {
        ui.horizontal_wrapped(|ui| {
            let can_undo = app.editor.history.can_undo();
            let can_redo = app.editor.history.can_redo();

            if ui
                .add_enabled(can_undo, egui::Button::new("⟲ Undo"))
                .clicked()
            {
                app.dispatch(Command::Undo);
            }
            if ui
                .add_enabled(can_redo, egui::Button::new("⟳ Redo"))
                .clicked()
            {
                app.dispatch(Command::Redo);
            }

            ui.separator();

            if app.editor.crop.is_active() {
                if ui.button("✔ Apply crop").clicked() {
                    app.dispatch(Command::ApplyCrop);
                }
                if ui.button("✖ Cancel crop").clicked() {
                    app.dispatch(Command::CancelCrop);
                }
            } else if ui.button("✂ Crop").clicked() {
                app.dispatch(Command::StartCrop);
            }

            ui.separator();

            if ui.button("Text").clicked() {
                app.dispatch(Command::AddText {
                    content: "New text".into(),
                    font_size: 32.0,
                    color: Color32::WHITE,
                    position: ctx.screen_rect().center(),
                });
            }
            if ui.button("Group").clicked() {
                app.dispatch(Command::GroupSelection);
            }
            if ui.button("Ungroup").clicked() {
                app.dispatch(Command::UngroupSelection);
            }
            if ui.button("Delete").clicked() {
                app.dispatch(Command::DeleteSelection);
            }

            ui.separator();

            if ui.button("⬇ Export").clicked() {
                app.export();
            }
        });

        if let Some(status) = &app.status {
            ui.label(egui::RichText::new(status).weak());
        }
    });
}
