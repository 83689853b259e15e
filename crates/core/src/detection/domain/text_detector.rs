use crate::detection::domain::recognition_engine::{RawTextBox, RecognitionEngine};
use crate::shared::constants::{DEFAULT_MAX_DETECTION_DIMENSION, DEFAULT_MIN_CONFIDENCE};
use crate::shared::frame::Frame;
use crate::shared::region::{DetectedRegion, PixelRect};

/// Tunables for [`TextDetector`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorConfig {
    /// Boxes below this normalised confidence are dropped.
    pub min_confidence: f64,
    /// Longest frame side handed to the engine; larger frames are downscaled.
    pub max_dimension: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            max_dimension: DEFAULT_MAX_DETECTION_DIMENSION,
        }
    }
}

/// Runs OCR over a frame and reports regions in that frame's resolution.
///
/// Never fails the caller: a recognition error is logged and yields an empty
/// detection set, so one bad cycle cannot break the render loop.
pub struct TextDetector {
    engine: Box<dyn RecognitionEngine>,
    config: DetectorConfig,
}

impl TextDetector {
    pub fn new(engine: Box<dyn RecognitionEngine>, config: DetectorConfig) -> Self {
        Self { engine, config }
    }

    pub fn detect(&mut self, frame: &Frame) -> Vec<DetectedRegion> {
        let scale = downscale_factor(frame.width(), frame.height(), self.config.max_dimension);

        let raw = if scale < 1.0 {
            let w = ((frame.width() as f64 * scale).round() as u32).max(1);
            let h = ((frame.height() as f64 * scale).round() as u32).max(1);
            let small = frame.resized(w, h);
            // Map back using the actual resampled ratio, not the requested one.
            let sx = frame.width() as f64 / w as f64;
            let sy = frame.height() as f64 / h as f64;
            self.engine
                .recognize(&small)
                .map(|boxes| boxes.into_iter().map(|b| rescale(b, sx, sy)).collect())
        } else {
            self.engine.recognize(frame)
        };

        let boxes = match raw {
            Ok(boxes) => boxes,
            Err(e) => {
                log::warn!("Text recognition failed on frame {}: {e}", frame.index());
                return Vec::new();
            }
        };

        boxes
            .into_iter()
            .filter(|b| b.confidence >= self.config.min_confidence)
            .filter(|b| !b.text.trim().is_empty())
            .map(|b| DetectedRegion {
                rect: PixelRect::from_points(&b.points),
                text: b.text,
                confidence: b.confidence,
            })
            .collect()
    }
}

/// Factor (≤ 1.0) that brings the longest side down to `max_dimension`.
fn downscale_factor(width: u32, height: u32, max_dimension: u32) -> f64 {
    let longest = width.max(height);
    if max_dimension == 0 || longest <= max_dimension {
        1.0
    } else {
        max_dimension as f64 / longest as f64
    }
}

fn rescale(mut b: RawTextBox, sx: f64, sy: f64) -> RawTextBox {
    for p in b.points.iter_mut() {
        p.0 *= sx;
        p.1 *= sy;
    }
    b
}
