use std::sync::Arc;

use egui::Rect;

use crate::error::{EditorError, EditorResult};
use crate::render::raster;
use crate::scene::geometry;
use crate::scene::{Entity, EntityRecord, ImagePayload, Payload, Scene};
use crate::util::time;

const FILE_PREFIX: &str = "export";

/// Result of a flattening export: an encoded PNG plus the generated
/// filename (`export-<selection|canvas>-<epoch seconds>.png`).
pub struct ExportedImage {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// Flatten the current selection, or the whole scene, to a PNG.
///
/// With a single entity selected, only that entity is rasterized, at its
/// own bounds. Otherwise the union bounding box of every top-level entity
/// is exported and the active selection is discarded first.
///
/// Rasterization never reads from the live scene: a parallel temporary
/// scene is built in which every image payload has been reloaded through
/// the validating decoder and every other entity is structurally cloned.
/// The temporary scene is dropped as soon as the pixels are encoded.
pub fn export_current_view(scene: &mut Scene) -> EditorResult<ExportedImage> {
    if scene.is_empty() {
        return Err(EditorError::EmptyCanvas);
    }

    let twin = build_exportable_entities(scene)?;

    let selected_id = scene.selected_single().map(Entity::id);
    let (entities, region, tag): (&[Entity], Rect, &str) = match selected_id
        .and_then(|id| twin.iter().position(|e| e.id() == id))
    {
        Some(index) => {
            let entity = &twin[index..=index];
            (entity, geometry::bounding_rect(&entity[0]), "selection")
        }
        None => {
            let region = content_bounds(&twin)?;
            scene.clear_selection();
            (twin.as_slice(), region, "canvas")
        }
    };

    let pixmap = raster::render_entities(entities, region)?;
    let png = pixmap
        .encode_png()
        .map_err(|e| EditorError::ImageEncode(e.to_string()))?;

    Ok(ExportedImage {
        filename: format!("{FILE_PREFIX}-{tag}-{}.png", time::timestamp_secs()),
        width: pixmap.width(),
        height: pixmap.height(),
        png,
    })
}

/// Reconstruct every top-level entity for rasterization: image payloads are
/// re-decoded from their source bytes, everything else round-trips through
/// its structural record.
fn build_exportable_entities(scene: &Scene) -> EditorResult<Vec<Entity>> {
    scene.entities().iter().map(clone_for_export).collect()
}

fn clone_for_export(entity: &Entity) -> EditorResult<Entity> {
    match &entity.payload {
        Payload::Image(img) => {
            let reloaded = ImagePayload::from_bytes(Arc::clone(&img.source))?;
            let mut copy = entity.clone();
            copy.payload = Payload::Image(reloaded);
            Ok(copy)
        }
        Payload::Group(children) => {
            let rebuilt = children
                .iter()
                .map(clone_for_export)
                .collect::<EditorResult<Vec<_>>>()?;
            let mut copy = entity.clone();
            copy.payload = Payload::Group(rebuilt);
            Ok(copy)
        }
        _ => EntityRecord::from_entity(entity)?.to_entity(),
    }
}

/// Union bounding box of every top-level entity. Entities whose geometry
/// cannot be measured are skipped with a warning rather than aborting the
/// export.
fn content_bounds(entities: &[Entity]) -> EditorResult<Rect> {
    let mut bounds = Rect::NOTHING;
    let mut measured = 0usize;
    for entity in entities {
        let rect = geometry::bounding_rect(entity);
        if !rect.is_finite() || rect.is_negative() {
            log::warn!(
                "skipping '{}' while measuring export bounds: malformed geometry",
                entity.name
            );
            continue;
        }
        bounds = bounds.union(rect);
        measured += 1;
    }
    if measured == 0 {
        return Err(EditorError::Render("no measurable content".into()));
    }
    Ok(bounds)
}
