use ndarray::{s, Axis};

use crate::overlay::domain::text_painter::TextPainter;
use crate::shared::constants::BRIGHTNESS_THRESHOLD;
use crate::shared::frame::Frame;
use crate::shared::region::{PixelRect, ResultSet};

/// Tunables for overlay legibility.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayStyle {
    /// Box height (display pixels) at which text is drawn at `base_font_px`.
    pub reference_height: f64,
    /// Lower bound on the height-derived font scale.
    pub min_font_scale: f64,
    pub base_font_px: f32,
    /// Background luma above which text is black.
    pub brightness_threshold: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            reference_height: 30.0,
            min_font_scale: 0.4,
            base_font_px: 24.0,
            brightness_threshold: BRIGHTNESS_THRESHOLD,
        }
    }
}

impl OverlayStyle {
    pub fn font_px(&self, box_height: u32) -> f32 {
        let scale = (box_height as f64 / self.reference_height).max(self.min_font_scale);
        (scale * self.base_font_px as f64) as f32
    }
}

/// Paints translated text over its source region on a display frame.
///
/// Each region's background colour is sampled from the frame before drawing
/// so the overlay blends with the original UI element, and the text colour
/// is picked for contrast against it.
pub struct OverlayRenderer {
    painter: Box<dyn TextPainter>,
    style: OverlayStyle,
}

impl OverlayRenderer {
    pub fn new(painter: Box<dyn TextPainter>, style: OverlayStyle) -> Self {
        Self { painter, style }
    }

    /// Draws every region of `results` onto `frame`, mapping detection
    /// coordinates with `scale_factor`. Returns the number of regions drawn.
    ///
    /// Regions with an empty translation or no visible area are skipped.
    pub fn render(&self, frame: &mut Frame, results: &ResultSet, scale_factor: f64) -> usize {
        if results.is_empty() {
            return 0;
        }
        if frame.channels() != 3 {
            log::warn!(
                "Overlay skipped: expected RGB frame, got {} channels",
                frame.channels()
            );
            return 0;
        }

        let mut drawn = 0;
        for region in &results.regions {
            if region.translated.is_empty() {
                continue;
            }
            let Some(rect) = region
                .rect()
                .scaled(scale_factor)
                .clamped_to(frame.width(), frame.height())
            else {
                continue;
            };
            self.draw_region(frame, rect, &region.translated);
            drawn += 1;
        }
        drawn
    }

    fn draw_region(&self, frame: &mut Frame, rect: PixelRect, text: &str) {
        let background = sample_background(frame, rect);
        let color = contrasting_text_color(background, self.style.brightness_threshold);
        fill_rect(frame, rect, background);

        let px = self.style.font_px(rect.height as u32);
        let (tw, th) = self.painter.measure(text, px);
        let tx = rect.x + ((rect.width - tw as i32) / 2).max(0);
        let ty = rect.y + ((rect.height - th as i32) / 2).max(0);
        self.painter.draw(frame, text, tx, ty, px, color);
    }
}

/// Mean colour of `rect`, averaged over rows then columns. `rect` must
/// already be clamped to the frame.
pub fn sample_background(frame: &Frame, rect: PixelRect) -> [u8; 3] {
    let (x0, y0) = (rect.x as usize, rect.y as usize);
    let (x1, y1) = (x0 + rect.width as usize, y0 + rect.height as usize);
    let pixels = frame.as_ndarray();
    let roi = pixels.slice(s![y0..y1, x0..x1, ..]).mapv(f64::from);

    let mean = roi
        .mean_axis(Axis(0))
        .and_then(|per_column| per_column.mean_axis(Axis(0)));
    match mean {
        Some(m) => [m[0] as u8, m[1] as u8, m[2] as u8],
        None => [0, 0, 0],
    }
}

/// ITU-R BT.601 luma.
pub fn luma(rgb: [u8; 3]) -> f64 {
    0.299 * rgb[0] as f64 + 0.587 * rgb[1] as f64 + 0.114 * rgb[2] as f64
}

pub fn contrasting_text_color(background: [u8; 3], threshold: f64) -> [u8; 3] {
    if luma(background) > threshold {
        [0, 0, 0]
    } else {
        [255, 255, 255]
    }
}

fn fill_rect(frame: &mut Frame, rect: PixelRect, rgb: [u8; 3]) {
    let (x0, y0) = (rect.x as usize, rect.y as usize);
    let (x1, y1) = (x0 + rect.width as usize, y0 + rect.height as usize);
    let mut pixels = frame.as_ndarray_mut();
    let mut roi = pixels.slice_mut(s![y0..y1, x0..x1, ..]);
    for (c, value) in rgb.iter().enumerate() {
        roi.slice_mut(s![.., .., c]).fill(*value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::region::{DetectedRegion, TranslatedRegion};
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, PartialEq)]
    struct DrawCall {
        text: String,
        x: i32,
        y: i32,
        px: f32,
        color: [u8; 3],
    }

    /// Measures every glyph as `px / 2` wide and `px` tall.
    struct RecordingPainter {
        calls: Arc<Mutex<Vec<DrawCall>>>,
    }

    impl TextPainter for RecordingPainter {
        fn measure(&self, text: &str, px: f32) -> (u32, u32) {
            ((text.chars().count() as f32 * px / 2.0) as u32, px as u32)
        }

        fn draw(&self, _frame: &mut Frame, text: &str, x: i32, y: i32, px: f32, color: [u8; 3]) {
            self.calls.lock().unwrap().push(DrawCall {
                text: text.to_string(),
                x,
                y,
                px,
                color,
            });
        }
    }

    fn renderer() -> (OverlayRenderer, Arc<Mutex<Vec<DrawCall>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let painter = RecordingPainter {
            calls: calls.clone(),
        };
        (
            OverlayRenderer::new(Box::new(painter), OverlayStyle::default()),
            calls,
        )
    }

    fn region(x: i32, y: i32, w: i32, h: i32, translated: &str) -> TranslatedRegion {
        TranslatedRegion {
            region: DetectedRegion {
                text: "原文".to_string(),
                rect: PixelRect::new(x, y, w, h),
                confidence: 0.9,
            },
            translated: translated.to_string(),
        }
    }

    fn results(regions: Vec<TranslatedRegion>) -> ResultSet {
        ResultSet {
            regions,
            source_width: 640,
            source_height: 480,
            cycle: 1,
        }
    }

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 3] {
        let v = frame.as_ndarray();
        [v[[y, x, 0]], v[[y, x, 1]], v[[y, x, 2]]]
    }

    #[test]
    fn test_white_background_gets_black_text() {
        let (r, calls) = renderer();
        let mut frame = Frame::filled(640, 480, [255, 255, 255], 0);

        let drawn = r.render(&mut frame, &results(vec![region(10, 10, 100, 30, "Hello")]), 1.0);

        assert_eq!(drawn, 1);
        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].color, [0, 0, 0]);
        assert_eq!(calls[0].text, "Hello");
        assert_eq!(pixel(&frame, 50, 20), [255, 255, 255]);
    }

    #[test]
    fn test_dark_background_gets_white_text() {
        let (r, calls) = renderer();
        let mut frame = Frame::filled(640, 480, [20, 20, 60], 0);

        r.render(&mut frame, &results(vec![region(10, 10, 100, 30, "Yes")]), 1.0);

        assert_eq!(calls.lock().unwrap()[0].color, [255, 255, 255]);
    }

    #[test]
    fn test_roi_filled_with_average_colour() {
        let (r, _) = renderer();
        let mut frame = Frame::filled(100, 100, [0, 0, 0], 0);
        // Right half of the ROI white, left half black → mean 127.
        {
            let mut v = frame.as_ndarray_mut();
            v.slice_mut(s![0..10, 5..10, ..]).fill(255);
        }

        r.render(&mut frame, &results(vec![region(0, 0, 10, 10, "x")]), 1.0);

        assert_eq!(pixel(&frame, 0, 0), [127, 127, 127]);
        assert_eq!(pixel(&frame, 9, 9), [127, 127, 127]);
        assert_eq!(pixel(&frame, 10, 0), [0, 0, 0]);
    }

    #[test]
    fn test_negative_origin_is_clamped() {
        let (r, calls) = renderer();
        let mut frame = Frame::filled(640, 480, [255, 255, 255], 0);

        let drawn = r.render(&mut frame, &results(vec![region(-5, -5, 50, 50, "Hi")]), 1.0);

        assert_eq!(drawn, 1);
        let calls = calls.lock().unwrap();
        assert!(calls[0].x >= 0 && calls[0].y >= 0);
    }

    #[rstest]
    #[case::zero_width(region(10, 10, 0, 30, "a"))]
    #[case::negative_height(region(10, 10, 30, -3, "a"))]
    #[case::fully_left(region(-200, 10, 100, 30, "a"))]
    #[case::fully_below(region(10, 900, 100, 30, "a"))]
    #[case::empty_translation(region(10, 10, 100, 30, ""))]
    fn test_skipped_regions(#[case] r: TranslatedRegion) {
        let (renderer, calls) = renderer();
        let mut frame = Frame::filled(640, 480, [90, 90, 90], 0);
        let before = frame.data().to_vec();

        assert_eq!(renderer.render(&mut frame, &results(vec![r]), 1.0), 0);
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(frame.data(), &before[..]);
    }

    #[test]
    fn test_overhanging_region_stays_in_bounds() {
        let (r, _) = renderer();
        let mut frame = Frame::filled(64, 48, [200, 200, 200], 0);

        let drawn = r.render(&mut frame, &results(vec![region(60, 40, 500, 500, "edge")]), 1.0);

        assert_eq!(drawn, 1);
        assert_eq!(frame.data().len(), 64 * 48 * 3);
    }

    #[test]
    fn test_scale_factor_applied_to_geometry() {
        let (r, calls) = renderer();
        let mut frame = Frame::filled(320, 240, [255, 255, 255], 0);

        // 100x30 box at (100, 50) halves to 50x15 at (50, 25).
        r.render(&mut frame, &results(vec![region(100, 50, 100, 30, "ab")]), 0.5);

        let call = calls.lock().unwrap()[0].clone();
        let px = OverlayStyle::default().font_px(15);
        assert_relative_eq!(call.px, px);
        let (tw, th) = ((2.0 * px / 2.0) as i32, px as i32);
        assert_eq!(call.x, 50 + (50 - tw) / 2);
        assert_eq!(call.y, 25 + ((15 - th) / 2).max(0));
    }

    #[test]
    fn test_wide_text_clamped_to_left_edge() {
        let (r, calls) = renderer();
        let mut frame = Frame::filled(640, 480, [255, 255, 255], 0);

        r.render(
            &mut frame,
            &results(vec![region(100, 100, 20, 30, "a very long translation")]),
            1.0,
        );

        let call = calls.lock().unwrap()[0].clone();
        assert_eq!(call.x, 100);
        assert_eq!(call.y, 100 + ((30 - call.px as i32) / 2).max(0));
    }

    #[test]
    fn test_non_rgb_frame_untouched() {
        let (r, calls) = renderer();
        let mut frame = Frame::new(vec![7u8; 640 * 480], 640, 480, 1, 0);

        assert_eq!(r.render(&mut frame, &results(vec![region(10, 10, 100, 30, "Hi")]), 1.0), 0);
        assert!(calls.lock().unwrap().is_empty());
        assert!(frame.data().iter().all(|&b| b == 7));
    }

    #[test]
    fn test_empty_result_set_is_noop() {
        let (r, _) = renderer();
        let mut frame = Frame::filled(64, 48, [1, 2, 3], 0);
        assert_eq!(r.render(&mut frame, &ResultSet::default(), 1.0), 0);
    }

    #[rstest]
    #[case::short_box(6, 0.4 * 24.0)]
    #[case::reference_box(30, 24.0)]
    #[case::tall_box(60, 48.0)]
    fn test_font_px_from_height(#[case] h: u32, #[case] expected: f32) {
        assert_relative_eq!(OverlayStyle::default().font_px(h), expected, epsilon = 1e-4);
    }

    #[rstest]
    #[case::white([255, 255, 255], [0, 0, 0])]
    #[case::black([0, 0, 0], [255, 255, 255])]
    #[case::light_yellow([250, 240, 120], [0, 0, 0])]
    #[case::mid_grey([120, 120, 120], [255, 255, 255])]
    #[case::pure_blue([0, 0, 255], [255, 255, 255])]
    fn test_contrasting_text_color(#[case] bg: [u8; 3], #[case] expected: [u8; 3]) {
        assert_eq!(contrasting_text_color(bg, BRIGHTNESS_THRESHOLD), expected);
    }

    #[test]
    fn test_luma_weights() {
        assert_relative_eq!(luma([255, 255, 255]), 255.0, epsilon = 1e-9);
        assert_relative_eq!(luma([100, 0, 0]), 29.9, epsilon = 1e-9);
    }
}
