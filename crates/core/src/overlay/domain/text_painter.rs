use crate::shared::frame::Frame;

/// Domain interface for measuring and drawing a line of text.
///
/// `draw` anchors at the top-left of the text box and must clip anything
/// falling outside the frame.
pub trait TextPainter: Send {
    /// `(width, height)` in pixels of `text` rendered at `px` pixels.
    fn measure(&self, text: &str, px: f32) -> (u32, u32);

    fn draw(&self, frame: &mut Frame, text: &str, x: i32, y: i32, px: f32, color: [u8; 3]);
}
