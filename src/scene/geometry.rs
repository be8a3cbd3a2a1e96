use egui::{Pos2, Rect, Vec2, pos2, vec2};

use crate::scene::entity::{Entity, Payload};

/// Accumulated ancestor transform applied to an entity's local coordinates.
///
/// Scale is applied in the parent's axes before rotation, which is how the
/// retained scene composes nested group transforms.
#[derive(Clone, Copy, Debug)]
pub struct Frame {
    pub origin: Pos2,
    pub scale: Vec2,
    pub rotation_deg: f32,
}

impl Frame {
    pub const IDENTITY: Self = Self {
        origin: pos2(0.0, 0.0),
        scale: vec2(1.0, 1.0),
        rotation_deg: 0.0,
    };

    /// Map a local offset from this frame's origin into world space.
    pub fn apply(&self, local: Vec2) -> Pos2 {
        let scaled = vec2(local.x * self.scale.x, local.y * self.scale.y);
        let (sin, cos) = self.rotation_deg.to_radians().sin_cos();
        self.origin
            + vec2(
                scaled.x * cos - scaled.y * sin,
                scaled.x * sin + scaled.y * cos,
            )
    }

    /// The frame a child entity's own children see.
    pub fn child(&self, entity: &Entity) -> Frame {
        Frame {
            origin: self.apply(entity.position.to_vec2()),
            scale: vec2(
                self.scale.x * entity.scale.x,
                self.scale.y * entity.scale.y,
            ),
            rotation_deg: self.rotation_deg + entity.rotation_deg,
        }
    }
}

/// Screen-space axis-aligned bounding rectangle of an entity, honoring its
/// rotation and every ancestor transform carried in `parent`.
pub fn bounding_rect_in(entity: &Entity, parent: &Frame) -> Rect {
    let frame = parent.child(entity);
    match &entity.payload {
        Payload::Group(children) => {
            let mut rect = Rect::NOTHING;
            for child in children {
                rect = rect.union(bounding_rect_in(child, &frame));
            }
            rect
        }
        _ => {
            let half = entity.natural_size() / 2.0;
            let corners = [
                vec2(-half.x, -half.y),
                vec2(half.x, -half.y),
                vec2(half.x, half.y),
                vec2(-half.x, half.y),
            ];
            let mut rect = Rect::NOTHING;
            for corner in corners {
                rect.extend_with(frame.apply(corner));
            }
            rect
        }
    }
}

/// Bounding rectangle of a top-level entity.
pub fn bounding_rect(entity: &Entity) -> Rect {
    bounding_rect_in(entity, &Frame::IDENTITY)
}

/// Bounding rectangle with the entity's own rotation ignored.
///
/// Crop measurement runs in this frame: the overlay rectangle is compared
/// against the image's unrotated box, so the crop region maps onto the same
/// source pixels regardless of the image's current angle.
pub fn unrotated_bounding_rect(entity: &Entity) -> Rect {
    Rect::from_center_size(entity.position, entity.display_size())
}

/// Union of a group's children boxes in the group's local space.
pub fn group_local_bounds(group: &Entity) -> Rect {
    let mut rect = Rect::NOTHING;
    if let Some(children) = group.children() {
        for child in children {
            rect = rect.union(bounding_rect_in(child, &Frame::IDENTITY));
        }
    }
    if rect.is_negative() {
        Rect::from_center_size(pos2(0.0, 0.0), Vec2::ZERO)
    } else {
        rect
    }
}

/// World transform of one entity located anywhere in the scene, composed
/// with its ancestors. Used when dissolving a group back to the top level.
pub fn compose_child_into(parent_frame: &Frame, child: &mut Entity) {
    child.position = parent_frame.apply(child.position.to_vec2());
    child.scale = vec2(
        child.scale.x * parent_frame.scale.x,
        child.scale.y * parent_frame.scale.y,
    );
    child.rotation_deg += parent_frame.rotation_deg;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::entity::ShapePayload;
    use egui::Color32;

    fn shape(w: f32, h: f32, pos: Pos2) -> Entity {
        Entity::new_shape(
            "s",
            ShapePayload {
                width: w,
                height: h,
                fill: Color32::WHITE,
                stroke: Color32::BLACK,
                stroke_width: 1.0,
                dashed: false,
            },
            pos,
        )
    }

    #[test]
    fn unrotated_box_matches_display_size() {
        let mut e = shape(40.0, 20.0, pos2(100.0, 50.0));
        e.scale = vec2(2.0, 1.0);
        let rect = bounding_rect(&e);
        assert_eq!(rect, Rect::from_center_size(pos2(100.0, 50.0), vec2(80.0, 20.0)));
    }

    #[test]
    fn rotation_grows_the_aabb() {
        let mut e = shape(40.0, 20.0, pos2(0.0, 0.0));
        e.rotation_deg = 90.0;
        let rect = bounding_rect(&e);
        assert!((rect.width() - 20.0).abs() < 1e-3);
        assert!((rect.height() - 40.0).abs() < 1e-3);
    }

    #[test]
    fn nested_child_inherits_group_transform() {
        let child = shape(10.0, 10.0, pos2(20.0, 0.0));
        let mut group = Entity::new_group("g", vec![child], pos2(100.0, 100.0));
        group.rotation_deg = 90.0;
        let rect = bounding_rect(&group);
        // child center lands at (100, 120) after the group's rotation
        assert!((rect.center().x - 100.0).abs() < 1e-3);
        assert!((rect.center().y - 120.0).abs() < 1e-3);
    }
}
