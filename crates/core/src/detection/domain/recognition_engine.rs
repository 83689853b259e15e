use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("failed to prepare image for recognition: {0}")]
    Prepare(String),
    #[error("failed to launch recognition engine: {0}")]
    Launch(#[source] std::io::Error),
    #[error("recognition engine exited with {status}: {stderr}")]
    Engine { status: String, stderr: String },
    #[error("unreadable recognition output: {0}")]
    Output(String),
}

/// One raw (box, text, confidence) triple as produced by an OCR engine.
#[derive(Clone, Debug, PartialEq)]
pub struct RawTextBox {
    /// Corner points, clockwise from top-left, in the coordinates of the
    /// frame passed to the engine.
    pub points: [(f64, f64); 4],
    pub text: String,
    /// Normalised to `[0, 1]`; engines with percentage scores divide by 100.
    pub confidence: f64,
}

impl RawTextBox {
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64, text: String, confidence: f64) -> Self {
        Self {
            points: [
                (x, y),
                (x + width, y),
                (x + width, y + height),
                (x, y + height),
            ],
            text,
            confidence,
        }
    }
}

/// Domain interface for text recognition.
///
/// Implementations may hold model state, hence `&mut self`.
pub trait RecognitionEngine: Send {
    fn recognize(&mut self, frame: &Frame) -> Result<Vec<RawTextBox>, RecognitionError>;
}
