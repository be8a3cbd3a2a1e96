use eframe::egui;

use crate::command::{Command, CommandContext};
use crate::export;
use crate::file_handler::FileHandler;
use crate::panels;
use crate::renderer::Renderer;
use crate::scene::geometry;
use crate::widgets::Corner;

/// Pointer interaction in flight on the canvas.
#[derive(Clone, Copy, Debug)]
pub enum Interaction {
    Move { id: usize },
    Resize { id: usize, corner: Corner },
}

/// The eframe application: command context plus UI-side state.
pub struct StudioApp {
    pub(crate) editor: CommandContext,
    pub(crate) renderer: Renderer,
    pub(crate) file_handler: FileHandler,
    pub(crate) interaction: Option<Interaction>,
    pub(crate) status: Option<String>,
    pub(crate) editing_layer: Option<usize>,
    pub(crate) rename_buffer: String,
}

impl StudioApp {
    /// Called once before the first frame.
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let editor =
            CommandContext::new().expect("snapshotting an empty scene cannot fail");
        Self {
            editor,
            renderer: Renderer::new(),
            file_handler: FileHandler::new(),
            interaction: None,
            status: None,
            editing_layer: None,
            rename_buffer: String::new(),
        }
    }

    /// Run a command, translating failures into the status line.
    pub(crate) fn dispatch(&mut self, command: Command) {
        log::debug!("dispatch: {command:?}");
        if let Err(err) = command.execute(&mut self.editor) {
            self.status = Some(err.to_string());
        }
    }

    /// Flatten the current view to a PNG next to the executable.
    pub(crate) fn export(&mut self) {
        match export::export_current_view(&mut self.editor.scene) {
            Ok(exported) => {
                #[cfg(not(target_arch = "wasm32"))]
                if let Err(err) = std::fs::write(&exported.filename, &exported.png) {
                    self.status = Some(format!("failed to save {}: {err}", exported.filename));
                    return;
                }
                self.status = Some(format!(
                    "exported {} ({}x{})",
                    exported.filename, exported.width, exported.height
                ));
            }
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    /// Topmost selectable entity under the pointer.
    pub(crate) fn hit_test(&self, pos: egui::Pos2) -> Option<usize> {
        for entity in self.editor.scene.entities().iter().rev() {
            if entity.locked || !entity.visible {
                continue;
            }
            if geometry::bounding_rect(entity).contains(pos) {
                return Some(entity.id());
            }
        }
        None
    }

    /// Drag one corner of an entity's bounds; the opposite corner stays
    /// anchored. Scale absorbs the size change.
    pub(crate) fn resize_entity(&mut self, id: usize, corner: Corner, delta: egui::Vec2) {
        let Some(rect) = self.editor.scene.bounding_rect(id) else {
            return;
        };
        let anchor = corner.anchor(rect);
        let moving = corner.on(rect) + delta;
        let new_w = (moving.x - anchor.x).abs().max(10.0);
        let new_h = (moving.y - anchor.y).abs().max(10.0);

        if let Some(entity) = self.editor.scene.find_mut(id) {
            if entity.locked {
                return;
            }
            let natural = entity.natural_size();
            if natural.x <= 0.0 || natural.y <= 0.0 {
                return;
            }
            entity.scale = egui::vec2(new_w / natural.x, new_h / natural.y);
            entity.position =
                egui::pos2((anchor.x + moving.x) / 2.0, (anchor.y + moving.y) / 2.0);
            self.editor.scene.request_redraw();
        }
    }
}

impl eframe::App for StudioApp {
    /// Called each time the UI needs repainting.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        panels::tools_panel(self, ctx);
        panels::layers_panel(self, ctx);
        panels::central_panel(self, ctx);

        if self.editor.scene.take_redraw_request() {
            ctx.request_repaint();
        }
    }
}
