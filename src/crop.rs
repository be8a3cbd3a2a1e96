use std::sync::Arc;

use egui::Color32;

use crate::error::{EditorError, EditorResult};
use crate::scene::geometry;
use crate::scene::{Entity, EntityKind, ImagePayload, Payload, Scene, ShapePayload};

/// Transient state of one interactive crop: the image being cropped and
/// the overlay rectangle the user drags into place.
struct CropSession {
    image_id: usize,
    overlay_id: usize,
}

/// Drives an interactive crop: overlay placement, screen-to-source
/// projection, pixel extraction, and replacement of the original image.
///
/// At most one session is active at a time. The session is fully discarded
/// on both apply and cancel.
#[derive(Default)]
pub struct CropManager {
    session: Option<CropSession>,
}

impl CropManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Id of the live overlay rectangle, for UI highlighting.
    pub fn overlay_id(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.overlay_id)
    }

    /// Begin a crop on the currently selected image.
    ///
    /// Fails without touching the scene when the selection is not a single
    /// image entity. The overlay starts out covering the image's current
    /// screen-space bounds and becomes the active selection so the user can
    /// resize it with the normal handles.
    pub fn start_cropping(&mut self, scene: &mut Scene) -> EditorResult<()> {
        if self.session.is_some() {
            // A stale session would orphan its overlay; fold it first.
            self.cancel_crop(scene)?;
        }

        let image = scene
            .selected_single()
            .filter(|e| e.kind() == EntityKind::Image)
            .ok_or(EditorError::NoImageSelected)?;
        let image_id = image.id();
        let bounds = scene
            .bounding_rect(image_id)
            .ok_or(EditorError::CropTargetMissing)?;

        let overlay = Entity::new_shape(
            "Crop",
            ShapePayload {
                width: bounds.width(),
                height: bounds.height(),
                fill: Color32::from_black_alpha(77),
                stroke: Color32::WHITE,
                stroke_width: 2.0,
                dashed: true,
            },
            bounds.center(),
        );
        let overlay_id = scene.insert_top(overlay);
        scene.select_only(overlay_id);
        scene.request_redraw();

        self.session = Some(CropSession {
            image_id,
            overlay_id,
        });
        Ok(())
    }

    /// Extract the overlay-covered pixels from the image's native
    /// resolution and swap the result in for the original.
    ///
    /// The overlay is measured against the image's unrotated bounding box,
    /// so the selected region maps onto the same source pixels whatever the
    /// image's current angle. The crop bakes the current scale into pixel
    /// dimensions: the replacement entity comes back at unit scale with the
    /// original rotation and flip flags restored.
    ///
    /// On any failure the scene is left exactly as it was.
    pub fn apply_crop(&mut self, scene: &mut Scene) -> EditorResult<usize> {
        let session = self.session.as_ref().ok_or(EditorError::NoCropSession)?;
        let (image_id, overlay_id) = (session.image_id, session.overlay_id);

        let image = scene
            .find(image_id)
            .ok_or(EditorError::CropTargetMissing)?;
        let payload = image.as_image().ok_or(EditorError::CropTargetMissing)?;
        let (native_w, native_h) = (payload.pixel_width, payload.pixel_height);
        let source = Arc::clone(&payload.source);
        let name = image.name.clone();
        let rotation = image.rotation_deg;
        let (flip_x, flip_y) = (image.flip_x, image.flip_y);

        let image_rect = geometry::unrotated_bounding_rect(image);
        let overlay_rect = scene
            .bounding_rect(overlay_id)
            .ok_or(EditorError::CropTargetMissing)?;
        if image_rect.width() <= 0.0 || image_rect.height() <= 0.0 {
            return Err(EditorError::EmptyCropRegion);
        }

        // Overlay position and size as fractions of the displayed image,
        // projected back onto the native pixel grid. Dividing by the
        // displayed extent cancels the current scale factor.
        let crop_x = (overlay_rect.min.x - image_rect.min.x) / image_rect.width() * native_w as f32;
        let crop_y = (overlay_rect.min.y - image_rect.min.y) / image_rect.height() * native_h as f32;
        let crop_w = overlay_rect.width() / image_rect.width() * native_w as f32;
        let crop_h = overlay_rect.height() / image_rect.height() * native_h as f32;

        let x0 = crop_x.round().clamp(0.0, native_w as f32) as u32;
        let y0 = crop_y.round().clamp(0.0, native_h as f32) as u32;
        let x1 = (crop_x + crop_w).round().clamp(0.0, native_w as f32) as u32;
        let y1 = (crop_y + crop_h).round().clamp(0.0, native_h as f32) as u32;
        if x1 <= x0 || y1 <= y0 {
            return Err(EditorError::EmptyCropRegion);
        }

        // Re-decode from the stored source bytes rather than any cached
        // texture, then copy out the region at native resolution.
        let decoded = image::load_from_memory(&source)
            .map_err(|e| EditorError::ImageDecode(e.to_string()))?
            .to_rgba8();
        let cropped = image::imageops::crop_imm(&decoded, x0, y0, x1 - x0, y1 - y0).to_image();
        let new_payload = ImagePayload::from_rgba(&cropped)?;

        // The session could have been torn down while the pixel work was in
        // flight; never mutate a scene the session no longer owns.
        let still_live = self
            .session
            .as_ref()
            .is_some_and(|s| s.image_id == image_id && s.overlay_id == overlay_id);
        if !still_live || !scene.contains(image_id) || !scene.contains(overlay_id) {
            return Err(EditorError::NoCropSession);
        }

        let mut replacement =
            Entity::with_payload(name, overlay_rect.center(), Payload::Image(new_payload));
        replacement.rotation_deg = rotation;
        replacement.flip_x = flip_x;
        replacement.flip_y = flip_y;

        scene.remove(image_id);
        scene.remove(overlay_id);
        let new_id = scene.insert_top(replacement);
        scene.select_only(new_id);
        scene.request_redraw();
        self.session = None;
        Ok(new_id)
    }

    /// Tear down the session, removing only the overlay. The image is left
    /// untouched.
    pub fn cancel_crop(&mut self, scene: &mut Scene) -> EditorResult<()> {
        let session = self.session.take().ok_or(EditorError::NoCropSession)?;
        scene.remove(session.overlay_id);
        scene.request_redraw();
        Ok(())
    }
}
