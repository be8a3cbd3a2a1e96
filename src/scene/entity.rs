use std::io::Cursor;
use std::sync::Arc;

use egui::{Color32, Pos2, Vec2};
use image::RgbaImage;

use crate::error::{EditorError, EditorResult};
use crate::id_generator::generate_id;

/// A drawable unit on the canvas.
///
/// Position is the entity's center in canvas space. Children of a group
/// store their position relative to the group's center; their effective
/// transform is the composition of their own transform with every
/// ancestor's. Ownership is strictly top-down: a group owns its children.
#[derive(Clone, Debug)]
pub struct Entity {
    id: usize,
    pub name: String,
    pub position: Pos2,
    pub scale: Vec2,
    pub rotation_deg: f32,
    pub flip_x: bool,
    pub flip_y: bool,
    pub visible: bool,
    pub locked: bool,
    pub payload: Payload,
}

/// Entity kind discriminant, used for matching and layer UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Image,
    Text,
    Shape,
    Group,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Image => "image",
            EntityKind::Text => "text",
            EntityKind::Shape => "shape",
            EntityKind::Group => "group",
        }
    }
}

#[derive(Clone, Debug)]
pub enum Payload {
    Image(ImagePayload),
    Text(TextPayload),
    Shape(ShapePayload),
    Group(Vec<Entity>),
}

/// Raster payload. The encoded source bytes are kept around as the source
/// of truth: crop and export always re-decode from them rather than
/// trusting any cached texture.
#[derive(Clone, Debug)]
pub struct ImagePayload {
    pub source: Arc<Vec<u8>>,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Texture cache generation for this payload.
    pub revision: u64,
}

impl ImagePayload {
    /// Validate encoded bytes and read the native pixel dimensions.
    pub fn from_bytes(source: Arc<Vec<u8>>) -> EditorResult<Self> {
        let decoded = image::load_from_memory(&source)
            .map_err(|e| EditorError::ImageDecode(e.to_string()))?;
        Ok(Self {
            source,
            pixel_width: decoded.width(),
            pixel_height: decoded.height(),
            revision: 0,
        })
    }

    /// Encode raw pixels as PNG and wrap them in a fresh payload.
    pub fn from_rgba(pixels: &RgbaImage) -> EditorResult<Self> {
        let mut bytes = Vec::new();
        pixels
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| EditorError::ImageEncode(e.to_string()))?;
        Ok(Self {
            source: Arc::new(bytes),
            pixel_width: pixels.width(),
            pixel_height: pixels.height(),
            revision: 0,
        })
    }

    /// Decode the stored source bytes into raw pixels.
    pub fn decode(&self) -> EditorResult<RgbaImage> {
        let decoded = image::load_from_memory(&self.source)
            .map_err(|e| EditorError::ImageDecode(e.to_string()))?;
        Ok(decoded.to_rgba8())
    }
}

#[derive(Clone, Debug)]
pub struct TextPayload {
    pub content: String,
    pub font_size: f32,
    pub color: Color32,
    /// Layout box, so geometry works without a UI context.
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Debug)]
pub struct ShapePayload {
    pub width: f32,
    pub height: f32,
    pub fill: Color32,
    pub stroke: Color32,
    pub stroke_width: f32,
    pub dashed: bool,
}

impl Entity {
    pub(crate) fn with_payload(name: impl Into<String>, position: Pos2, payload: Payload) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            position,
            scale: Vec2::splat(1.0),
            rotation_deg: 0.0,
            flip_x: false,
            flip_y: false,
            visible: true,
            locked: false,
            payload,
        }
    }

    pub fn new_image(
        name: impl Into<String>,
        source: Arc<Vec<u8>>,
        position: Pos2,
    ) -> EditorResult<Self> {
        let payload = ImagePayload::from_bytes(source)?;
        Ok(Self::with_payload(name, position, Payload::Image(payload)))
    }

    pub fn new_text(
        name: impl Into<String>,
        content: impl Into<String>,
        font_size: f32,
        color: Color32,
        position: Pos2,
    ) -> Self {
        let content = content.into();
        // Rough proportional metrics; the layout box only drives geometry.
        let width = (content.chars().count() as f32 * font_size * 0.6).max(font_size);
        let height = font_size * 1.2;
        Self::with_payload(
            name,
            position,
            Payload::Text(TextPayload {
                content,
                font_size,
                color,
                width,
                height,
            }),
        )
    }

    pub fn new_shape(name: impl Into<String>, shape: ShapePayload, position: Pos2) -> Self {
        Self::with_payload(name, position, Payload::Shape(shape))
    }

    /// Children keep their own transforms, interpreted relative to the
    /// group's center.
    pub fn new_group(name: impl Into<String>, children: Vec<Entity>, position: Pos2) -> Self {
        Self::with_payload(name, position, Payload::Group(children))
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Restore a specific id when reconstructing from a record.
    pub(crate) fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    /// Give this entity (and any children) fresh ids, e.g. after a paste.
    pub fn reassign_ids(&mut self) {
        self.id = generate_id();
        if let Payload::Group(children) = &mut self.payload {
            for child in children {
                child.reassign_ids();
            }
        }
    }

    pub fn kind(&self) -> EntityKind {
        match &self.payload {
            Payload::Image(_) => EntityKind::Image,
            Payload::Text(_) => EntityKind::Text,
            Payload::Shape(_) => EntityKind::Shape,
            Payload::Group(_) => EntityKind::Group,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.payload, Payload::Group(_))
    }

    pub fn as_image(&self) -> Option<&ImagePayload> {
        match &self.payload {
            Payload::Image(img) => Some(img),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&[Entity]> {
        match &self.payload {
            Payload::Group(children) => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Entity>> {
        match &mut self.payload {
            Payload::Group(children) => Some(children),
            _ => None,
        }
    }

    /// Unscaled size of the entity's own box. For groups this is the union
    /// of the children's local bounding boxes.
    pub fn natural_size(&self) -> Vec2 {
        match &self.payload {
            Payload::Image(img) => Vec2::new(img.pixel_width as f32, img.pixel_height as f32),
            Payload::Text(text) => Vec2::new(text.width, text.height),
            Payload::Shape(shape) => Vec2::new(shape.width, shape.height),
            Payload::Group(_) => crate::scene::geometry::group_local_bounds(self).size(),
        }
    }

    /// Size as displayed, before any ancestor transforms.
    pub fn display_size(&self) -> Vec2 {
        let natural = self.natural_size();
        Vec2::new(natural.x * self.scale.x, natural.y * self.scale.y)
    }

    /// Recursively set visibility, matching how layer toggles cascade into
    /// group contents.
    pub fn set_visible_recursive(&mut self, visible: bool) {
        self.visible = visible;
        if let Payload::Group(children) = &mut self.payload {
            for child in children {
                child.set_visible_recursive(visible);
            }
        }
    }

    pub fn set_locked_recursive(&mut self, locked: bool) {
        self.locked = locked;
        if let Payload::Group(children) = &mut self.payload {
            for child in children {
                child.set_locked_recursive(locked);
            }
        }
    }
}
