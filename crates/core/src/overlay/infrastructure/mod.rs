pub mod font_resolver;
pub mod glyph_text_painter;
