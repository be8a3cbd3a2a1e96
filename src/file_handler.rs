use std::sync::Arc;

use eframe::egui;

use crate::command::Command;

/// Turns files dropped onto the window into editor commands.
pub struct FileHandler {
    dropped_files: Vec<egui::DroppedFile>,
}

impl FileHandler {
    pub fn new() -> Self {
        Self {
            dropped_files: Vec::new(),
        }
    }

    /// Process any newly dropped files from the UI context.
    /// Returns true if any new files arrived this frame.
    pub fn check_for_dropped_files(&mut self, ctx: &egui::Context) -> bool {
        let mut new_dropped_files = false;
        ctx.input(|i| {
            if !i.raw.dropped_files.is_empty() {
                self.dropped_files = i.raw.dropped_files.clone();
                new_dropped_files = true;
            }
        });
        new_dropped_files
    }

    /// Drain the queued files and return the commands to execute. Dropped
    /// images land centered in the canvas, scaled down to fit.
    pub fn process_dropped_files(&mut self, canvas_rect: egui::Rect) -> Vec<Command> {
        let mut commands = Vec::new();
        for file in self.dropped_files.drain(..) {
            let file_name = if let Some(path) = &file.path {
                path.display().to_string()
            } else if !file.name.is_empty() {
                file.name.clone()
            } else {
                "unknown".to_owned()
            };

            if !Self::is_image_file(&file) {
                log::warn!("dropped file is not a supported type: {}", file_name);
                continue;
            }

            let Some(bytes) = Self::read_file(&file) else {
                log::warn!("could not read dropped file: {}", file_name);
                continue;
            };

            commands.push(Command::AddImage {
                name: file_name,
                bytes: Arc::new(bytes),
                position: canvas_rect.center(),
                fit_within: Some(canvas_rect.size() * 0.9),
            });
        }
        commands
    }

    fn is_image_file(file: &egui::DroppedFile) -> bool {
        if file.mime.starts_with("image/") {
            return true;
        }
        let name = file
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| file.name.clone());
        let lower = name.to_lowercase();
        ["png", "jpg", "jpeg", "gif", "bmp", "webp"]
            .iter()
            .any(|ext| lower.ends_with(&format!(".{ext}")))
    }

    fn read_file(file: &egui::DroppedFile) -> Option<Vec<u8>> {
        if let Some(bytes) = &file.bytes {
            return Some(bytes.to_vec());
        }
        #[cfg(not(target_arch = "wasm32"))]
        if let Some(path) = &file.path {
            return std::fs::read(path).ok();
        }
        None
    }
}

impl Default for FileHandler {
    fn default() -> Self {
        Self::new()
    }
}
