mod clipboard;

pub use clipboard::Clipboard;

use std::sync::Arc;

use egui::{Color32, Pos2, Vec2};

use crate::crop::CropManager;
use crate::error::EditorResult;
use crate::history::History;
use crate::scene::geometry::Frame;
use crate::scene::{Entity, Scene, ShapePayload};

/// Everything a command needs to run: the scene, the history manager, the
/// crop manager, and the clipboard. One context per editor instance.
pub struct CommandContext {
    pub scene: Scene,
    pub history: History,
    pub crop: CropManager,
    pub clipboard: Clipboard,
}

impl CommandContext {
    pub fn new() -> EditorResult<Self> {
        let scene = Scene::new();
        let mut history = History::new();
        history.initialize(&scene)?;
        Ok(Self {
            scene,
            history,
            crop: CropManager::new(),
            clipboard: Clipboard::new(),
        })
    }

    /// Drain pending scene notifications into the history manager. Called
    /// after every primitive mutation so each one lands its own snapshot.
    pub fn pump_history(&mut self) {
        for event in self.scene.take_events() {
            if let Err(err) = self.history.on_scene_event(&self.scene, &event) {
                log::warn!("history snapshot dropped: {err}");
            }
        }
    }
}

/// Commands the UI can dispatch against the editor.
#[derive(Clone)]
pub enum Command {
    AddImage {
        name: String,
        bytes: Arc<Vec<u8>>,
        position: Pos2,
        /// Scale oversized images down so they fit inside this box.
        fit_within: Option<Vec2>,
    },
    AddText {
        content: String,
        font_size: f32,
        color: Color32,
        position: Pos2,
    },
    AddShape {
        name: String,
        shape: ShapePayload,
        position: Pos2,
    },
    DeleteSelection,
    GroupSelection,
    UngroupSelection,
    Copy,
    Paste,
    SelectAll,
    Undo,
    Redo,
    StartCrop,
    ApplyCrop,
    CancelCrop,
    ToggleVisibility { id: usize },
    ToggleLock { id: usize },
    RenameEntity { id: usize, name: String },
    Restack { id: usize, delta: isize },
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::AddImage { name, bytes, .. } => f
                .debug_struct("AddImage")
                .field("name", name)
                .field("bytes", &bytes.len())
                .finish(),
            Command::AddText { content, .. } => {
                f.debug_struct("AddText").field("content", content).finish()
            }
            Command::AddShape { name, .. } => {
                f.debug_struct("AddShape").field("name", name).finish()
            }
            Command::DeleteSelection => write!(f, "DeleteSelection"),
            Command::GroupSelection => write!(f, "GroupSelection"),
            Command::UngroupSelection => write!(f, "UngroupSelection"),
            Command::Copy => write!(f, "Copy"),
            Command::Paste => write!(f, "Paste"),
            Command::SelectAll => write!(f, "SelectAll"),
            Command::Undo => write!(f, "Undo"),
            Command::Redo => write!(f, "Redo"),
            Command::StartCrop => write!(f, "StartCrop"),
            Command::ApplyCrop => write!(f, "ApplyCrop"),
            Command::CancelCrop => write!(f, "CancelCrop"),
            Command::ToggleVisibility { id } => {
                f.debug_struct("ToggleVisibility").field("id", id).finish()
            }
            Command::ToggleLock { id } => f.debug_struct("ToggleLock").field("id", id).finish(),
            Command::RenameEntity { id, name } => f
                .debug_struct("RenameEntity")
                .field("id", id)
                .field("name", name)
                .finish(),
            Command::Restack { id, delta } => f
                .debug_struct("Restack")
                .field("id", id)
                .field("delta", delta)
                .finish(),
        }
    }
}

impl Command {
    pub fn execute(&self, ctx: &mut CommandContext) -> EditorResult<()> {
        match self {
            Command::AddImage {
                name,
                bytes,
                position,
                fit_within,
            } => {
                let mut entity = Entity::new_image(name.clone(), Arc::clone(bytes), *position)?;
                if let Some(max) = fit_within {
                    let size = entity.natural_size();
                    if size.x > max.x || size.y > max.y {
                        let factor = (max.x / size.x).min(max.y / size.y);
                        entity.scale = Vec2::splat(factor);
                    }
                }
                let id = ctx.scene.insert_top(entity);
                ctx.scene.select_only(id);
                ctx.scene.request_redraw();
                ctx.pump_history();
                Ok(())
            }
            Command::AddText {
                content,
                font_size,
                color,
                position,
            } => {
                let entity =
                    Entity::new_text("Text", content.clone(), *font_size, *color, *position);
                let id = ctx.scene.insert_top(entity);
                ctx.scene.select_only(id);
                ctx.scene.request_redraw();
                ctx.pump_history();
                Ok(())
            }
            Command::AddShape {
                name,
                shape,
                position,
            } => {
                let entity = Entity::new_shape(name.clone(), shape.clone(), *position);
                let id = ctx.scene.insert_top(entity);
                ctx.scene.select_only(id);
                ctx.scene.request_redraw();
                ctx.pump_history();
                Ok(())
            }
            Command::DeleteSelection => {
                let ids = ctx.scene.selected_ids().to_vec();
                for id in ids {
                    ctx.scene.remove(id);
                    ctx.pump_history();
                }
                ctx.scene.clear_selection();
                ctx.scene.request_redraw();
                Ok(())
            }
            Command::GroupSelection => group_selection(ctx),
            Command::UngroupSelection => ungroup_selection(ctx),
            Command::Copy => {
                ctx.clipboard.copy_from(&ctx.scene)?;
                Ok(())
            }
            Command::Paste => {
                ctx.clipboard.paste_into(&mut ctx.scene)?;
                ctx.scene.request_redraw();
                ctx.pump_history();
                Ok(())
            }
            Command::SelectAll => {
                let ids: Vec<usize> = ctx.scene.entities().iter().map(Entity::id).collect();
                if !ids.is_empty() {
                    ctx.scene.select_many(ids);
                    ctx.scene.request_redraw();
                }
                Ok(())
            }
            Command::Undo => {
                ctx.pump_history();
                ctx.history.undo(&mut ctx.scene)?;
                Ok(())
            }
            Command::Redo => {
                ctx.pump_history();
                ctx.history.redo(&mut ctx.scene)?;
                Ok(())
            }
            Command::StartCrop => {
                let result = ctx.crop.start_cropping(&mut ctx.scene);
                ctx.pump_history();
                result
            }
            Command::ApplyCrop => {
                let result = ctx.crop.apply_crop(&mut ctx.scene).map(|_| ());
                ctx.pump_history();
                result
            }
            Command::CancelCrop => {
                let result = ctx.crop.cancel_crop(&mut ctx.scene);
                ctx.pump_history();
                result
            }
            Command::ToggleVisibility { id } => {
                if let Some(entity) = ctx.scene.find_mut(*id) {
                    let next = !entity.visible;
                    entity.set_visible_recursive(next);
                    ctx.scene.notify_visibility(*id);
                    ctx.scene.request_redraw();
                }
                ctx.pump_history();
                Ok(())
            }
            Command::ToggleLock { id } => {
                if let Some(entity) = ctx.scene.find_mut(*id) {
                    let next = !entity.locked;
                    entity.set_locked_recursive(next);
                    if next && ctx.scene.is_selected(*id) {
                        ctx.scene.clear_selection();
                    }
                    ctx.scene.notify_modified(*id);
                    ctx.scene.request_redraw();
                }
                ctx.pump_history();
                Ok(())
            }
            Command::RenameEntity { id, name } => {
                if let Some(entity) = ctx.scene.find_mut(*id) {
                    entity.name = name.clone();
                    ctx.scene.notify_modified(*id);
                }
                ctx.pump_history();
                Ok(())
            }
            Command::Restack { id, delta } => {
                if ctx.scene.restack(*id, *delta) {
                    ctx.scene.request_redraw();
                }
                ctx.pump_history();
                Ok(())
            }
        }
    }
}

/// Collapse the selected top-level entities into one group positioned at
/// the selection's center. Children are re-based into group-local
/// coordinates; the group becomes the selection.
fn group_selection(ctx: &mut CommandContext) -> EditorResult<()> {
    let selected = ctx.scene.selected_ids().to_vec();
    // Group in stacking order, not selection order.
    let ordered: Vec<usize> = ctx
        .scene
        .entities()
        .iter()
        .map(Entity::id)
        .filter(|id| selected.contains(id))
        .collect();
    if ordered.len() <= 1 {
        return Ok(());
    }

    let mut bounds = egui::Rect::NOTHING;
    for id in &ordered {
        if let Some(rect) = ctx.scene.bounding_rect(*id) {
            bounds = bounds.union(rect);
        }
    }
    let center = bounds.center();

    let mut children = Vec::with_capacity(ordered.len());
    for id in ordered {
        if let Some(mut entity) = ctx.scene.remove(id) {
            entity.position -= center.to_vec2();
            children.push(entity);
        }
        ctx.pump_history();
    }

    let group = Entity::new_group(format!("Group {}", ctx.scene.len() + 1), children, center);
    let group_id = ctx.scene.insert_top(group);
    ctx.pump_history();
    ctx.scene.select_only(group_id);
    ctx.scene.request_redraw();
    Ok(())
}

/// Dissolve the selected group: children return to the top level with
/// their composed world transforms and become a multi-selection.
fn ungroup_selection(ctx: &mut CommandContext) -> EditorResult<()> {
    let Some(group) = ctx.scene.selected_single() else {
        return Ok(());
    };
    if !group.is_group() {
        return Ok(());
    }
    let group_id = group.id();
    let frame = Frame::IDENTITY.child(group);
    let (flip_x, flip_y) = (group.flip_x, group.flip_y);

    let Some(group) = ctx.scene.remove(group_id) else {
        return Ok(());
    };
    ctx.pump_history();

    let crate::scene::Payload::Group(children) = group.payload else {
        return Ok(());
    };
    let mut ids = Vec::new();
    for mut child in children {
        crate::scene::geometry::compose_child_into(&frame, &mut child);
        child.flip_x ^= flip_x;
        child.flip_y ^= flip_y;
        ids.push(ctx.scene.insert_top(child));
        ctx.pump_history();
    }
    ctx.scene.select_many(ids);
    ctx.scene.request_redraw();
    Ok(())
}
