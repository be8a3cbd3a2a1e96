use std::sync::Arc;

use egui::{Color32, Pos2, pos2, vec2};
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};
use crate::scene::entity::{Entity, ImagePayload, Payload, ShapePayload};

/// Nesting limit for group cloning. Recursion past this depth aborts the
/// snapshot instead of corrupting history with a partial clone.
pub const MAX_GROUP_DEPTH: usize = 32;

/// Plain structural form of an entity, recursive for groups.
///
/// This is the unit of history snapshots, clipboard content, and document
/// persistence: it is a deep copy by construction, so later mutation of the
/// live entity can never alter it. Id and name are carried through so a
/// reconstructed entity keeps its identity across undo/redo replays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: usize,
    pub name: String,
    pub position: (f32, f32),
    pub scale: (f32, f32),
    pub rotation_deg: f32,
    pub flip_x: bool,
    pub flip_y: bool,
    pub visible: bool,
    pub locked: bool,
    pub payload: PayloadRecord,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PayloadRecord {
    Image {
        source: Arc<Vec<u8>>,
        pixel_width: u32,
        pixel_height: u32,
    },
    Text {
        content: String,
        font_size: f32,
        color: [u8; 4],
        width: f32,
        height: f32,
    },
    Shape {
        width: f32,
        height: f32,
        fill: [u8; 4],
        stroke: [u8; 4],
        stroke_width: f32,
        dashed: bool,
    },
    Group {
        children: Vec<EntityRecord>,
    },
}

fn color_to_array(color: Color32) -> [u8; 4] {
    color.to_array()
}

fn color_from_array(rgba: [u8; 4]) -> Color32 {
    Color32::from_rgba_premultiplied(rgba[0], rgba[1], rgba[2], rgba[3])
}

impl EntityRecord {
    /// Serialize an entity to its plain structural form.
    pub fn from_entity(entity: &Entity) -> EditorResult<Self> {
        Self::from_entity_at(entity, 0)
    }

    fn from_entity_at(entity: &Entity, depth: usize) -> EditorResult<Self> {
        if depth > MAX_GROUP_DEPTH {
            return Err(EditorError::Snapshot(format!(
                "group nesting exceeds {MAX_GROUP_DEPTH} levels"
            )));
        }
        let payload = match &entity.payload {
            Payload::Image(img) => PayloadRecord::Image {
                source: Arc::clone(&img.source),
                pixel_width: img.pixel_width,
                pixel_height: img.pixel_height,
            },
            Payload::Text(text) => PayloadRecord::Text {
                content: text.content.clone(),
                font_size: text.font_size,
                color: color_to_array(text.color),
                width: text.width,
                height: text.height,
            },
            Payload::Shape(shape) => PayloadRecord::Shape {
                width: shape.width,
                height: shape.height,
                fill: color_to_array(shape.fill),
                stroke: color_to_array(shape.stroke),
                stroke_width: shape.stroke_width,
                dashed: shape.dashed,
            },
            Payload::Group(children) => PayloadRecord::Group {
                children: children
                    .iter()
                    .map(|child| Self::from_entity_at(child, depth + 1))
                    .collect::<EditorResult<Vec<_>>>()?,
            },
        };
        Ok(Self {
            id: entity.id(),
            name: entity.name.clone(),
            position: (entity.position.x, entity.position.y),
            scale: (entity.scale.x, entity.scale.y),
            rotation_deg: entity.rotation_deg,
            flip_x: entity.flip_x,
            flip_y: entity.flip_y,
            visible: entity.visible,
            locked: entity.locked,
            payload,
        })
    }

    /// Reconstruct a live entity, preserving id and name.
    pub fn to_entity(&self) -> EditorResult<Entity> {
        self.to_entity_at(0)
    }

    fn to_entity_at(&self, depth: usize) -> EditorResult<Entity> {
        if depth > MAX_GROUP_DEPTH {
            return Err(EditorError::Snapshot(format!(
                "group nesting exceeds {MAX_GROUP_DEPTH} levels"
            )));
        }
        let position: Pos2 = pos2(self.position.0, self.position.1);
        let mut entity = match &self.payload {
            PayloadRecord::Image {
                source,
                pixel_width,
                pixel_height,
            } => {
                // Dimensions were validated when the payload was first
                // decoded; reconstruction must not re-decode every replay.
                let payload = ImagePayload {
                    source: Arc::clone(source),
                    pixel_width: *pixel_width,
                    pixel_height: *pixel_height,
                    revision: 0,
                };
                Entity::with_payload(self.name.as_str(), position, Payload::Image(payload))
            }
            PayloadRecord::Text {
                content,
                font_size,
                color,
                width,
                height,
            } => {
                let mut e = Entity::new_text(
                    self.name.as_str(),
                    content.clone(),
                    *font_size,
                    color_from_array(*color),
                    position,
                );
                if let Payload::Text(text) = &mut e.payload {
                    text.width = *width;
                    text.height = *height;
                }
                e
            }
            PayloadRecord::Shape {
                width,
                height,
                fill,
                stroke,
                stroke_width,
                dashed,
            } => Entity::new_shape(
                self.name.as_str(),
                ShapePayload {
                    width: *width,
                    height: *height,
                    fill: color_from_array(*fill),
                    stroke: color_from_array(*stroke),
                    stroke_width: *stroke_width,
                    dashed: *dashed,
                },
                position,
            ),
            PayloadRecord::Group { children } => {
                let children = children
                    .iter()
                    .map(|child| child.to_entity_at(depth + 1))
                    .collect::<EditorResult<Vec<_>>>()?;
                Entity::new_group(self.name.as_str(), children, position)
            }
        };
        entity.set_id(self.id);
        entity.name = self.name.clone();
        entity.scale = vec2(self.scale.0, self.scale.1);
        entity.rotation_deg = self.rotation_deg;
        entity.flip_x = self.flip_x;
        entity.flip_y = self.flip_y;
        entity.visible = self.visible;
        entity.locked = self.locked;
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::entity::ShapePayload;

    fn shape_at(x: f32, y: f32) -> Entity {
        Entity::new_shape(
            "shape",
            ShapePayload {
                width: 12.0,
                height: 8.0,
                fill: Color32::RED,
                stroke: Color32::WHITE,
                stroke_width: 2.0,
                dashed: true,
            },
            pos2(x, y),
        )
    }

    /// Deterministic pseudo-random walk so the nesting shapes vary without
    /// pulling in a rand dependency.
    fn xorshift(state: &mut u32) -> u32 {
        let mut x = *state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        *state = x;
        x
    }

    fn build_tree(seed: &mut u32, depth: usize) -> Entity {
        let n = 1 + (xorshift(seed) % 3) as usize;
        let mut children = Vec::new();
        for i in 0..n {
            let x = (xorshift(seed) % 200) as f32 - 100.0;
            let y = (xorshift(seed) % 200) as f32 - 100.0;
            if depth > 0 && xorshift(seed) % 2 == 0 {
                children.push(build_tree(seed, depth - 1));
            } else {
                let mut leaf = shape_at(x, y);
                leaf.rotation_deg = (xorshift(seed) % 360) as f32;
                leaf.scale = vec2(1.0 + (i as f32) * 0.5, 1.0);
                leaf.flip_x = xorshift(seed) % 2 == 0;
                children.push(leaf);
            }
        }
        Entity::new_group("group", children, pos2(10.0, 20.0))
    }

    fn assert_structurally_equal(a: &Entity, b: &Entity) {
        assert_eq!(a.id(), b.id());
        assert_eq!(a.name, b.name);
        assert_eq!(a.position, b.position);
        assert_eq!(a.scale, b.scale);
        assert_eq!(a.rotation_deg, b.rotation_deg);
        assert_eq!(a.flip_x, b.flip_x);
        assert_eq!(a.flip_y, b.flip_y);
        assert_eq!(a.kind(), b.kind());
        match (a.children(), b.children()) {
            (Some(ca), Some(cb)) => {
                assert_eq!(ca.len(), cb.len());
                for (x, y) in ca.iter().zip(cb.iter()) {
                    assert_structurally_equal(x, y);
                }
            }
            (None, None) => {}
            _ => panic!("group/non-group mismatch"),
        }
    }

    #[test]
    fn clone_roundtrip_preserves_nested_groups() {
        let mut seed = 0x5EED_1234;
        for _ in 0..20 {
            let tree = build_tree(&mut seed, 4);
            let record = EntityRecord::from_entity(&tree).unwrap();
            let rebuilt = record.to_entity().unwrap();
            assert_structurally_equal(&tree, &rebuilt);
        }
    }

    #[test]
    fn record_is_immune_to_later_mutation() {
        let mut entity = shape_at(5.0, 5.0);
        let record = EntityRecord::from_entity(&entity).unwrap();
        entity.position = pos2(999.0, 999.0);
        entity.name = "renamed".into();
        assert_eq!(record.position, (5.0, 5.0));
        assert_eq!(record.name, "shape");
    }

    #[test]
    fn runaway_nesting_is_rejected() {
        let mut inner = shape_at(0.0, 0.0);
        for _ in 0..(MAX_GROUP_DEPTH + 2) {
            inner = Entity::new_group("g", vec![inner], pos2(0.0, 0.0));
        }
        assert!(matches!(
            EntityRecord::from_entity(&inner),
            Err(EditorError::Snapshot(_))
        ));
    }

    #[test]
    fn records_serialize_to_json() {
        let record = EntityRecord::from_entity(&shape_at(1.0, 2.0)).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        let back: EntityRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
