use eframe::egui;

use crate::app::StudioApp;
use crate::command::Command;
use crate::scene::{Entity, EntityKind};

struct LayerRow {
    id: usize,
    name: String,
    kind: EntityKind,
    visible: bool,
    locked: bool,
    depth: usize,
    top_level: bool,
}

fn collect_rows(entities: &[Entity], depth: usize, rows: &mut Vec<LayerRow>) {
    // Topmost entity first, like the stacking order reads visually.
    for entity in entities.iter().rev() {
        rows.push(LayerRow {
            id: entity.id(),
            name: entity.name.clone(),
            kind: entity.kind(),
            visible: entity.visible,
            locked: entity.locked,
            depth,
            top_level: depth == 0,
        });
        if let Some(children) = entity.children() {
            collect_rows(children, depth + 1, rows);
        }
    }
}

pub fn layers_panel(app: &mut StudioApp, ctx: &egui::Context) {
    egui::SidePanel::right("layers_panel")
        .default_width(230.0)
        .show(ctx, |ui| {
            ui.heading("Layers");
            ui.separator();

            let mut rows = Vec::new();
            collect_rows(app.editor.scene.entities(), 0, &mut rows);

            egui::ScrollArea::vertical().show(ui, |ui| {
                for row in rows {
                    ui.horizontal(|ui| {
                        ui.add_space(row.depth as f32 * 14.0);

                        if app.editing_layer == Some(row.id) {
                            let response = ui.text_edit_singleline(&mut app.rename_buffer);
                            let committed = response.lost_focus()
                                || ui.input(|i| i.key_pressed(egui::Key::Enter));
                            if committed {
                                app.editing_layer = None;
                                app.dispatch(Command::RenameEntity {
                                    id: row.id,
                                    name: app.rename_buffer.clone(),
                                });
                            }
                        } else {
                            let selected = app.editor.scene.is_selected(row.id);
                            let label = ui
                                .selectable_label(selected, &row.name)
                                .on_hover_text(row.kind.as_str());
                            if label.clicked() && row.top_level && !row.locked {
                                app.editor.scene.select_only(row.id);
                            }
                            if label.double_clicked() {
                                app.editing_layer = Some(row.id);
                                app.rename_buffer = row.name.clone();
                            }
                        }

                        let eye = if row.visible { "👁" } else { "‒" };
                        if ui.small_button(eye).clicked() {
                            app.dispatch(Command::ToggleVisibility { id: row.id });
                        }
                        let lock = if row.locked { "🔒" } else { "🔓" };
                        if ui.small_button(lock).clicked() {
                            app.dispatch(Command::ToggleLock { id: row.id });
                        }
                        if row.top_level {
                            if ui.small_button("⬆").clicked() {
                                app.dispatch(Command::Restack {
                                    id: row.id,
                                    delta: 1,
                                });
                            }
                            if ui.small_button("⬇").clicked() {
                                app.dispatch(Command::Restack {
                                    id: row.id,
                                    delta: -1,
                                });
                            }
                        }
                        if row.kind == EntityKind::Group && row.top_level {
                            if ui.small_button("Ungroup").clicked() {
                                app.editor.scene.select_only(row.id);
                                app.dispatch(Command::UngroupSelection);
                            }
                        }
                    });
                }
            });
        });
}
