use crate::shared::frame::Frame;

/// Display collaborator: receives every rendered frame.
pub trait FrameSink: Send {
    fn present(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}

/// Sink that drops frames, for headless runs that only need the log.
pub struct NullFrameSink;

impl FrameSink for NullFrameSink {
    fn present(&mut self, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
