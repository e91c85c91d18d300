use glam::Vec2;
use lumen_common::Size;

/// A raw event delivered by the host window or page.
///
/// Positions are in surface pixels with the origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMove { client_x: f32, client_y: f32 },
    /// Primary button pressed or released.
    PointerButton { pressed: bool },
    /// Absolute scroll offset of the host document, in pixels.
    Scroll { scroll_y: f32 },
}

/// Map a pixel position to normalized device coordinates: x and y in
/// [-1, 1], +y up.
pub fn normalize_pointer(client_x: f32, client_y: f32, viewport: Size) -> Vec2 {
    let width = viewport.width.max(1) as f32;
    let height = viewport.height.max(1) as f32;
    Vec2::new(
        (client_x / width) * 2.0 - 1.0,
        -(client_y / height) * 2.0 + 1.0,
    )
}
