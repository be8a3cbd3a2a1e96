use std::sync::{Arc, OnceLock};

use egui::{Color32, Rect, pos2, vec2};
use tiny_skia::{
    FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Shader, Stroke, StrokeDash, Transform,
};

use crate::error::{EditorError, EditorResult};
use crate::scene::geometry::Frame;
use crate::scene::{Entity, Payload, TextPayload};

/// Flatten entities (given back-to-front) into a pixmap covering `region`
/// of canvas space.
pub fn render_entities(entities: &[Entity], region: Rect) -> EditorResult<Pixmap> {
    let width = region.width().round().max(1.0) as u32;
    let height = region.height().round().max(1.0) as u32;
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        EditorError::Render(format!("cannot allocate a {width}x{height} surface"))
    })?;

    // Shift canvas space so the region's corner lands at the pixmap origin.
    let root = Frame {
        origin: pos2(-region.min.x, -region.min.y),
        scale: vec2(1.0, 1.0),
        rotation_deg: 0.0,
    };
    for entity in entities {
        draw_entity(&mut pixmap, entity, &root)?;
    }
    Ok(pixmap)
}

fn draw_entity(pixmap: &mut Pixmap, entity: &Entity, parent: &Frame) -> EditorResult<()> {
    if !entity.visible {
        return Ok(());
    }
    let frame = parent.child(entity);
    if !frame.origin.x.is_finite() || !frame.origin.y.is_finite() {
        log::warn!("skipping '{}': non-finite transform", entity.name);
        return Ok(());
    }
    match &entity.payload {
        Payload::Group(children) => {
            for child in children {
                draw_entity(pixmap, child, &frame)?;
            }
        }
        Payload::Image(img) => {
            let rgba = img.decode()?;
            let src = pixmap_from_rgba(&rgba)?;
            let ts = leaf_transform(entity, &frame, rgba.width() as f32, rgba.height() as f32);
            pixmap.draw_pixmap(0, 0, src.as_ref(), &PixmapPaint::default(), ts, None);
        }
        Payload::Shape(shape) => {
            let Some(rect) =
                tiny_skia::Rect::from_xywh(-shape.width / 2.0, -shape.height / 2.0, shape.width, shape.height)
            else {
                log::warn!("skipping shape '{}': degenerate geometry", entity.name);
                return Ok(());
            };
            let mut pb = PathBuilder::new();
            pb.push_rect(rect);
            let Some(path) = pb.finish() else {
                return Ok(());
            };
            let ts = leaf_transform(entity, &frame, shape.width, shape.height);

            if shape.fill.a() > 0 {
                pixmap.fill_path(&path, &solid_paint(shape.fill), FillRule::Winding, ts, None);
            }
            if shape.stroke.a() > 0 && shape.stroke_width > 0.0 {
                let stroke = Stroke {
                    width: shape.stroke_width,
                    dash: if shape.dashed {
                        StrokeDash::new(vec![5.0, 5.0], 0.0)
                    } else {
                        None
                    },
                    ..Stroke::default()
                };
                pixmap.stroke_path(&path, &solid_paint(shape.stroke), &stroke, ts, None);
            }
        }
        Payload::Text(text) => {
            let ts = leaf_transform(entity, &frame, text.width, text.height);
            draw_text(pixmap, text, ts)?;
        }
    }
    Ok(())
}

/// Source-space to pixmap transform for a leaf whose own box is `w`x`h`:
/// center the box on the origin, apply combined scale (flips fold in as
/// negative factors), rotate, then move to the composed world center.
fn leaf_transform(entity: &Entity, frame: &Frame, w: f32, h: f32) -> Transform {
    let mut scale_x = frame.scale.x;
    let mut scale_y = frame.scale.y;
    if entity.flip_x {
        scale_x = -scale_x;
    }
    if entity.flip_y {
        scale_y = -scale_y;
    }
    Transform::from_translate(-w / 2.0, -h / 2.0)
        .post_concat(Transform::from_scale(scale_x, scale_y))
        .post_concat(Transform::from_rotate(frame.rotation_deg))
        .post_concat(Transform::from_translate(frame.origin.x, frame.origin.y))
}

fn solid_paint(color: Color32) -> Paint<'static> {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Paint {
        shader: Shader::SolidColor(tiny_skia::Color::from_rgba8(r, g, b, a)),
        anti_alias: true,
        ..Paint::default()
    }
}

fn pixmap_from_rgba(img: &image::RgbaImage) -> EditorResult<Pixmap> {
    let mut pixmap = Pixmap::new(img.width(), img.height())
        .ok_or_else(|| EditorError::Render("zero-sized image payload".into()))?;
    for (dst, px) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = px.0;
        *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

fn font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    Arc::clone(FONTS.get_or_init(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Arc::new(db)
    }))
}

/// Text runs go through a one-element SVG document so glyph shaping and
/// font fallback stay out of this crate.
fn draw_text(pixmap: &mut Pixmap, text: &TextPayload, ts: Transform) -> EditorResult<()> {
    let w = text.width.max(1.0);
    let h = text.height.max(1.0);
    let [r, g, b, a] = text.color.to_srgba_unmultiplied();
    let svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\">\
         <text x=\"50%\" y=\"50%\" dominant-baseline=\"central\" text-anchor=\"middle\" \
         font-family=\"sans-serif\" font-size=\"{size}\" fill=\"#{r:02x}{g:02x}{b:02x}\" \
         fill-opacity=\"{alpha}\">{content}</text></svg>",
        size = text.font_size,
        alpha = a as f32 / 255.0,
        content = xml_escape(&text.content),
    );

    let mut options = usvg::Options::default();
    options.fontdb = font_database();
    let tree = usvg::Tree::from_str(&svg, &options)
        .map_err(|e| EditorError::Render(format!("text run: {e}")))?;
    resvg::render(&tree, ts, &mut pixmap.as_mut());
    Ok(())
}

fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
