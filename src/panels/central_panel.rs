use eframe::egui;
use egui::{Key, Sense};

use crate::app::{Interaction, StudioApp};
use crate::command::Command;
use crate::widgets::{Corner, ResizeHandle};

pub fn central_panel(app: &mut StudioApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let canvas_rect = ui.available_rect_before_wrap();

        if app.file_handler.check_for_dropped_files(ctx) {
            for command in app.file_handler.process_dropped_files(canvas_rect) {
                app.dispatch(command);
            }
        }

        let response = ui.allocate_rect(canvas_rect, Sense::click_and_drag());
        let painter = ui.painter_at(canvas_rect);
        app.renderer.render(ctx, &painter, &app.editor.scene);

        // Corner handles for the single selected entity (or crop overlay).
        if let Some(selected) = app.editor.scene.selected_single() {
            let id = selected.id();
            let locked = selected.locked;
            if let Some(rect) = app.editor.scene.bounding_rect(id) {
                if !locked {
                    for corner in Corner::ALL {
                        let handle = ResizeHandle::new(id, corner, corner.on(rect), 8.0);
                        if handle.show(ui).drag_started() {
                            app.interaction = Some(Interaction::Resize { id, corner });
                        }
                    }
                }
            }
        }

        if response.drag_started() && app.interaction.is_none() {
            if let Some(pos) = response.interact_pointer_pos() {
                match app.hit_test(pos) {
                    Some(id) => {
                        app.editor.scene.select_only(id);
                        app.interaction = Some(Interaction::Move { id });
                    }
                    None => app.editor.scene.clear_selection(),
                }
            }
        } else if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                match app.hit_test(pos) {
                    Some(id) => app.editor.scene.select_only(id),
                    None => app.editor.scene.clear_selection(),
                }
            }
        }

        let delta = ctx.input(|i| i.pointer.delta());
        if delta != egui::Vec2::ZERO {
            match app.interaction {
                Some(Interaction::Move { id }) => {
                    if let Some(entity) = app.editor.scene.find_mut(id) {
                        if !entity.locked {
                            entity.position += delta;
                            app.editor.scene.request_redraw();
                        }
                    }
                }
                Some(Interaction::Resize { id, corner }) => {
                    app.resize_entity(id, corner, delta);
                }
                None => {}
            }
        }

        // One history snapshot per completed move/resize.
        if ctx.input(|i| i.pointer.any_released()) {
            if let Some(Interaction::Move { id } | Interaction::Resize { id, .. }) =
                app.interaction.take()
            {
                app.editor.scene.notify_modified(id);
                app.editor.pump_history();
            }
        }

        handle_keyboard(app, ctx);
    });
}

fn handle_keyboard(app: &mut StudioApp, ctx: &egui::Context) {
    if ctx.wants_keyboard_input() {
        return;
    }
    struct Keys {
        undo: bool,
        redo: bool,
        copy: bool,
        paste: bool,
        group: bool,
        ungroup: bool,
        select_all: bool,
        delete: bool,
    }
    let keys = ctx.input(|i| {
        let ctrl = i.modifiers.command;
        Keys {
            undo: ctrl && !i.modifiers.shift && i.key_pressed(Key::Z),
            redo: (ctrl && i.modifiers.shift && i.key_pressed(Key::Z))
                || (ctrl && i.key_pressed(Key::Y)),
            copy: ctrl && i.key_pressed(Key::C),
            paste: ctrl && i.key_pressed(Key::V),
            group: ctrl && i.key_pressed(Key::G),
            ungroup: ctrl && i.key_pressed(Key::U),
            select_all: ctrl && i.key_pressed(Key::A),
            delete: i.key_pressed(Key::Delete) || i.key_pressed(Key::Backspace),
        }
    });

    if keys.undo {
        app.dispatch(Command::Undo);
    }
    if keys.redo {
        app.dispatch(Command::Redo);
    }
    if keys.copy {
        app.dispatch(Command::Copy);
    }
    if keys.paste {
        app.dispatch(Command::Paste);
    }
    if keys.group {
        app.dispatch(Command::GroupSelection);
    }
    if keys.ungroup {
        app.dispatch(Command::UngroupSelection);
    }
    if keys.select_all {
        app.dispatch(Command::SelectAll);
    }
    if keys.delete {
        app.dispatch(Command::DeleteSelection);
    }
}
