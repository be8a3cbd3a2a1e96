use egui::vec2;

use crate::error::EditorResult;
use crate::scene::{EntityRecord, Scene};

/// Editor-local clipboard.
///
/// Each editor owns its clipboard through the command context, so multiple
/// instances (and tests) cannot interfere with each other. Content is held
/// as structural records, the same deep form history snapshots use.
#[derive(Default)]
pub struct Clipboard {
    content: Vec<EntityRecord>,
    paste_offset: f32,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Capture the current selection. Returns false when nothing usable is
    /// selected.
    pub fn copy_from(&mut self, scene: &Scene) -> EditorResult<bool> {
        let mut records = Vec::new();
        for id in scene.selected_ids() {
            if let Some(entity) = scene.find(*id) {
                records.push(EntityRecord::from_entity(entity)?);
            }
        }
        if records.is_empty() {
            return Ok(false);
        }
        self.content = records;
        self.paste_offset = 0.0;
        Ok(true)
    }

    /// Materialize the clipboard into the scene with fresh ids. Every
    /// successive paste lands a further (+10, +10) from the copied
    /// position. The pasted entities become the selection.
    pub fn paste_into(&mut self, scene: &mut Scene) -> EditorResult<Vec<usize>> {
        if self.content.is_empty() {
            return Ok(Vec::new());
        }
        self.paste_offset += 10.0;
        let mut ids = Vec::new();
        for record in &self.content {
            let mut entity = record.to_entity()?;
            entity.reassign_ids();
            entity.position += vec2(self.paste_offset, self.paste_offset);
            ids.push(scene.insert_top(entity));
        }
        scene.select_many(ids.clone());
        Ok(ids)
    }
}
