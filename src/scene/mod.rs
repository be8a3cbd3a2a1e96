pub mod entity;
pub mod geometry;
pub mod record;

pub use entity::{Entity, EntityKind, ImagePayload, Payload, ShapePayload, TextPayload};
pub use record::{EntityRecord, MAX_GROUP_DEPTH, PayloadRecord};

use egui::Rect;

use crate::error::{EditorError, EditorResult};
use crate::scene::geometry::Frame;

/// Structural change notifications, drained by the command layer after each
/// mutation and fed to the history manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneEvent {
    Added { id: usize },
    Removed { id: usize },
    Modified { id: usize },
    /// Visibility toggles repaint but do not qualify as history mutations.
    VisibilityChanged { id: usize },
    SelectionChanged,
}

impl SceneEvent {
    /// Whether the history manager should snapshot in response.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SceneEvent::Added { .. } | SceneEvent::Removed { .. } | SceneEvent::Modified { .. }
        )
    }
}

/// The retained scene: an ordered list of entities (index 0 = bottom of the
/// stacking order), the active selection, and a queue of pending change
/// notifications.
///
/// The scene is the single shared mutable resource of the editor; all
/// mutation happens on the UI thread, one logical operation at a time.
#[derive(Default)]
pub struct Scene {
    entities: Vec<Entity>,
    selection: Vec<usize>,
    events: Vec<SceneEvent>,
    muted: usize,
    redraw_requested: bool,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Insert an entity at the top of the stacking order.
    pub fn insert_top(&mut self, entity: Entity) -> usize {
        let id = entity.id();
        self.entities.push(entity);
        self.push_event(SceneEvent::Added { id });
        id
    }

    /// Remove an entity anywhere in the scene. Groups left empty by the
    /// removal are removed as well, cascading upward.
    pub fn remove(&mut self, id: usize) -> Option<Entity> {
        let mut removed_groups = Vec::new();
        let found = remove_in(&mut self.entities, id, &mut removed_groups)?;
        self.selection
            .retain(|s| *s != id && !removed_groups.contains(s));
        self.push_event(SceneEvent::Removed { id });
        for group_id in removed_groups {
            self.push_event(SceneEvent::Removed { id: group_id });
        }
        Some(found)
    }

    /// Remove every entity. One removal notification per top-level entity.
    pub fn clear(&mut self) {
        let drained: Vec<usize> = self.entities.iter().map(Entity::id).collect();
        self.entities.clear();
        self.selection.clear();
        for id in drained {
            self.push_event(SceneEvent::Removed { id });
        }
    }

    pub fn find(&self, id: usize) -> Option<&Entity> {
        find_in(&self.entities, id)
    }

    pub fn find_mut(&mut self, id: usize) -> Option<&mut Entity> {
        find_in_mut(&mut self.entities, id)
    }

    pub fn contains(&self, id: usize) -> bool {
        self.find(id).is_some()
    }

    /// Index of a top-level entity in the stacking order.
    pub fn index_of(&self, id: usize) -> Option<usize> {
        self.entities.iter().position(|e| e.id() == id)
    }

    /// Move a top-level entity one step up or down the stacking order.
    pub fn restack(&mut self, id: usize, delta: isize) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let target = index as isize + delta;
        if target < 0 || target as usize >= self.entities.len() {
            return false;
        }
        self.entities.swap(index, target as usize);
        self.push_event(SceneEvent::Modified { id });
        true
    }

    /// Announce that an entity was mutated in place (moved, resized,
    /// renamed, transformed).
    pub fn notify_modified(&mut self, id: usize) {
        self.push_event(SceneEvent::Modified { id });
    }

    /// Announce a visibility toggle; repaints but does not enter history.
    pub fn notify_visibility(&mut self, id: usize) {
        self.push_event(SceneEvent::VisibilityChanged { id });
    }

    // --- selection ------------------------------------------------------

    pub fn selected_ids(&self) -> &[usize] {
        &self.selection
    }

    /// The single selected entity, if exactly one is selected.
    pub fn selected_single(&self) -> Option<&Entity> {
        match self.selection.as_slice() {
            [id] => self.find(*id),
            _ => None,
        }
    }

    pub fn select_only(&mut self, id: usize) {
        if self.contains(id) {
            self.selection = vec![id];
            self.push_event(SceneEvent::SelectionChanged);
        }
    }

    pub fn select_many(&mut self, ids: Vec<usize>) {
        self.selection = ids.into_iter().filter(|id| self.contains(*id)).collect();
        self.push_event(SceneEvent::SelectionChanged);
    }

    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.push_event(SceneEvent::SelectionChanged);
        }
    }

    pub fn is_selected(&self, id: usize) -> bool {
        self.selection.contains(&id)
    }

    // --- geometry -------------------------------------------------------

    /// Screen-space bounding rectangle of an entity anywhere in the scene,
    /// composed with its ancestors' transforms.
    pub fn bounding_rect(&self, id: usize) -> Option<Rect> {
        rect_search(&self.entities, id, &Frame::IDENTITY)
    }

    // --- events ---------------------------------------------------------

    /// Run `f` with change notifications suppressed. Notifications resume
    /// when `f` returns, even if it returns an error; this is the replay
    /// guard that keeps undo/redo from recording itself.
    pub fn with_muted<R>(&mut self, f: impl FnOnce(&mut Scene) -> R) -> R {
        self.muted += 1;
        let result = f(self);
        self.muted -= 1;
        result
    }

    pub fn take_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    fn push_event(&mut self, event: SceneEvent) {
        if self.muted == 0 {
            self.events.push(event);
        }
    }

    pub fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    // --- records --------------------------------------------------------

    /// Serialize every top-level entity (stacking order preserved).
    pub fn to_records(&self) -> EditorResult<Vec<EntityRecord>> {
        self.entities.iter().map(EntityRecord::from_entity).collect()
    }

    /// Replace the scene contents from serialized records, preserving
    /// order. The selection is discarded.
    pub fn load_records(&mut self, records: &[EntityRecord]) -> EditorResult<()> {
        self.clear();
        for record in records {
            let entity = record.to_entity()?;
            self.insert_top(entity);
        }
        Ok(())
    }

    /// Serialize the whole scene to a JSON document.
    pub fn to_json(&self) -> EditorResult<String> {
        let records = self.to_records()?;
        serde_json::to_string_pretty(&records).map_err(|e| EditorError::Serde(e.to_string()))
    }

    /// Load a scene previously saved with [`Scene::to_json`].
    pub fn load_json(&mut self, json: &str) -> EditorResult<()> {
        let records: Vec<EntityRecord> =
            serde_json::from_str(json).map_err(|e| EditorError::Serde(e.to_string()))?;
        self.load_records(&records)
    }
}

fn find_in(list: &[Entity], id: usize) -> Option<&Entity> {
    for entity in list {
        if entity.id() == id {
            return Some(entity);
        }
        if let Some(children) = entity.children() {
            if let Some(found) = find_in(children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn find_in_mut(list: &mut [Entity], id: usize) -> Option<&mut Entity> {
    for entity in list {
        if entity.id() == id {
            return Some(entity);
        }
        if let Some(children) = entity.children_mut() {
            if let Some(found) = find_in_mut(children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn remove_in(
    list: &mut Vec<Entity>,
    id: usize,
    removed_groups: &mut Vec<usize>,
) -> Option<Entity> {
    if let Some(index) = list.iter().position(|e| e.id() == id) {
        return Some(list.remove(index));
    }
    for index in 0..list.len() {
        let Some(children) = list[index].children_mut() else {
            continue;
        };
        if let Some(found) = remove_in(children, id, removed_groups) {
            // Never leave an empty group behind.
            if children.is_empty() {
                removed_groups.push(list[index].id());
                list.remove(index);
            }
            return Some(found);
        }
    }
    None
}

fn rect_search(list: &[Entity], id: usize, frame: &Frame) -> Option<Rect> {
    for entity in list {
        if entity.id() == id {
            return Some(geometry::bounding_rect_in(entity, frame));
        }
        if let Some(children) = entity.children() {
            if let Some(rect) = rect_search(children, id, &frame.child(entity)) {
                return Some(rect);
            }
        }
    }
    None
}
