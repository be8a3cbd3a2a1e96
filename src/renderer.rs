use std::collections::HashMap;

use egui::emath::Rot2;
use egui::{
    Align2, Color32, Context, FontId, Mesh, Painter, Rect, Shape as EguiShape, Stroke,
    TextureHandle, TextureOptions, pos2, vec2,
};

use crate::scene::geometry::Frame;
use crate::scene::{Entity, ImagePayload, Payload, Scene};

const SELECTION_STROKE: Stroke = Stroke {
    width: 1.5,
    color: Color32::from_rgb(124, 58, 237),
};

/// Paints the live scene into the central panel.
///
/// Image textures are cached by (entity id, payload revision) so replacing
/// a payload (crop, undo of a crop) invalidates the old texture naturally.
pub struct Renderer {
    textures: HashMap<(usize, u64), TextureHandle>,
}

impl Renderer {
    const MAX_CACHED_TEXTURES: usize = 64;

    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
        }
    }

    pub fn render(&mut self, ctx: &Context, painter: &Painter, scene: &Scene) {
        for entity in scene.entities() {
            self.draw_entity(ctx, painter, entity, &Frame::IDENTITY);
        }
        for id in scene.selected_ids() {
            if let Some(rect) = scene.bounding_rect(*id) {
                painter.rect_stroke(rect, 0.0, SELECTION_STROKE);
            }
        }
    }

    fn draw_entity(&mut self, ctx: &Context, painter: &Painter, entity: &Entity, parent: &Frame) {
        if !entity.visible {
            return;
        }
        let frame = parent.child(entity);
        match &entity.payload {
            Payload::Group(children) => {
                for child in children {
                    self.draw_entity(ctx, painter, child, &frame);
                }
            }
            Payload::Image(img) => {
                let Some(texture) = self.texture_for(ctx, entity.id(), img) else {
                    return;
                };
                let size = vec2(
                    img.pixel_width as f32 * frame.scale.x,
                    img.pixel_height as f32 * frame.scale.y,
                );
                let rect = Rect::from_center_size(frame.origin, size);
                let (mut u0, mut u1) = (0.0, 1.0);
                let (mut v0, mut v1) = (0.0, 1.0);
                if entity.flip_x {
                    std::mem::swap(&mut u0, &mut u1);
                }
                if entity.flip_y {
                    std::mem::swap(&mut v0, &mut v1);
                }
                let mut mesh = Mesh::with_texture(texture.id());
                mesh.add_rect_with_uv(
                    rect,
                    Rect::from_min_max(pos2(u0, v0), pos2(u1, v1)),
                    Color32::WHITE,
                );
                if frame.rotation_deg != 0.0 {
                    mesh.rotate(Rot2::from_angle(frame.rotation_deg.to_radians()), rect.center());
                }
                painter.add(EguiShape::mesh(mesh));
            }
            Payload::Shape(shape) => {
                let half = vec2(shape.width / 2.0, shape.height / 2.0);
                let corners: Vec<egui::Pos2> = [
                    vec2(-half.x, -half.y),
                    vec2(half.x, -half.y),
                    vec2(half.x, half.y),
                    vec2(-half.x, half.y),
                ]
                .into_iter()
                .map(|corner| frame.apply(corner))
                .collect();

                if shape.dashed {
                    painter.add(EguiShape::convex_polygon(
                        corners.clone(),
                        shape.fill,
                        Stroke::NONE,
                    ));
                    let stroke = Stroke::new(shape.stroke_width, shape.stroke);
                    for i in 0..4 {
                        let segment = [corners[i], corners[(i + 1) % 4]];
                        painter.extend(EguiShape::dashed_line(&segment, stroke, 5.0, 5.0));
                    }
                } else {
                    painter.add(EguiShape::convex_polygon(
                        corners,
                        shape.fill,
                        Stroke::new(shape.stroke_width, shape.stroke),
                    ));
                }
            }
            Payload::Text(text) => {
                painter.text(
                    frame.origin,
                    Align2::CENTER_CENTER,
                    &text.content,
                    FontId::proportional(text.font_size * frame.scale.y),
                    text.color,
                );
            }
        }
    }

    fn texture_for(
        &mut self,
        ctx: &Context,
        entity_id: usize,
        img: &ImagePayload,
    ) -> Option<TextureHandle> {
        let key = (entity_id, img.revision);
        if let Some(handle) = self.textures.get(&key) {
            return Some(handle.clone());
        }
        let rgba = match img.decode() {
            Ok(rgba) => rgba,
            Err(err) => {
                log::warn!("cannot decode image payload for entity {entity_id}: {err}");
                return None;
            }
        };
        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [rgba.width() as usize, rgba.height() as usize],
            rgba.as_flat_samples().as_slice(),
        );
        if self.textures.len() >= Self::MAX_CACHED_TEXTURES {
            self.textures.clear();
        }
        let handle = ctx.load_texture(
            format!("entity_{entity_id}_v{}", img.revision),
            color_image,
            TextureOptions::LINEAR,
        );
        self.textures.insert(key, handle.clone());
        Some(handle)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
