use egui::{Color32, CursorIcon, Id, Pos2, Rect, Response, Stroke, Ui, Vec2};

/// Represents a corner of a selection box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Corner::TopLeft => "top_left",
            Corner::TopRight => "top_right",
            Corner::BottomLeft => "bottom_left",
            Corner::BottomRight => "bottom_right",
        }
    }

    pub fn cursor_icon(&self) -> CursorIcon {
        match self {
            Corner::TopLeft | Corner::BottomRight => CursorIcon::ResizeNwSe,
            Corner::TopRight | Corner::BottomLeft => CursorIcon::ResizeNeSw,
        }
    }

    /// This corner's position on a rectangle.
    pub fn on(&self, rect: Rect) -> Pos2 {
        match self {
            Corner::TopLeft => rect.left_top(),
            Corner::TopRight => rect.right_top(),
            Corner::BottomLeft => rect.left_bottom(),
            Corner::BottomRight => rect.right_bottom(),
        }
    }

    /// The opposite corner, which stays fixed while this one is dragged.
    pub fn anchor(&self, rect: Rect) -> Pos2 {
        match self {
            Corner::TopLeft => rect.right_bottom(),
            Corner::TopRight => rect.left_bottom(),
            Corner::BottomLeft => rect.right_top(),
            Corner::BottomRight => rect.left_top(),
        }
    }
}

/// A draggable corner handle for resizing the selected entity or the crop
/// overlay.
pub struct ResizeHandle {
    entity_id: usize,
    corner: Corner,
    position: Pos2,
    size: f32,
}

impl ResizeHandle {
    pub fn new(entity_id: usize, corner: Corner, position: Pos2, size: f32) -> Self {
        Self {
            entity_id,
            corner,
            position,
            size,
        }
    }

    /// Show the resize handle and return the response
    pub fn show(&self, ui: &mut Ui) -> Response {
        let id = Id::new(("resize_handle", self.entity_id, self.corner.as_str()));
        let rect = Rect::from_center_size(self.position, Vec2::splat(self.size));

        ui.painter()
            .rect_filled(rect, 2.0, Color32::from_rgb(124, 58, 237));
        ui.painter()
            .rect_stroke(rect, 2.0, Stroke::new(1.0, Color32::WHITE));

        ui.interact(rect, id, egui::Sense::click_and_drag())
            .on_hover_cursor(self.corner.cursor_icon())
    }

    pub fn corner(&self) -> Corner {
        self.corner
    }
}
