pub mod overlay_renderer;
pub mod text_painter;
