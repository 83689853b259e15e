use ab_glyph::{FontVec, PxScale};
use image::{ImageBuffer, Rgb};

use crate::overlay::domain::text_painter::TextPainter;
use crate::shared::frame::Frame;

/// Rasterises text with a TrueType/OpenType font directly into the frame
/// buffer. Glyph pixels outside the frame are clipped.
pub struct GlyphTextPainter {
    font: FontVec,
}

impl GlyphTextPainter {
    pub fn new(font: FontVec) -> Self {
        Self { font }
    }
}

impl TextPainter for GlyphTextPainter {
    fn measure(&self, text: &str, px: f32) -> (u32, u32) {
        imageproc::drawing::text_size(PxScale::from(px), &self.font, text)
    }

    fn draw(&self, frame: &mut Frame, text: &str, x: i32, y: i32, px: f32, color: [u8; 3]) {
        let (width, height) = (frame.width(), frame.height());
        let Some(mut canvas) =
            ImageBuffer::<Rgb<u8>, &mut [u8]>::from_raw(width, height, frame.data_mut())
        else {
            log::warn!("Text skipped: frame buffer does not match {width}x{height} RGB");
            return;
        };
        imageproc::drawing::draw_text_mut(
            &mut canvas,
            Rgb(color),
            x,
            y,
            PxScale::from(px),
            &self.font,
            text,
        );
    }
}
