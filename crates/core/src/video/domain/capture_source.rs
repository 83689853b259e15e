use crate::shared::frame::Frame;

/// A capture device (or file) the user can pick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Opaque handle passed back to [`CaptureSource::start`]: a device node
    /// such as `/dev/video0`, or a video file path.
    pub id: String,
    pub name: String,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Domain interface for a live frame source.
///
/// Frames are delivered as independent RGB copies; the source never reuses
/// the buffer of a frame it has already handed out.
pub trait CaptureSource: Send {
    fn list_devices(&self) -> Vec<DeviceDescriptor>;

    /// Opens `device`, stopping any current capture first. Returns `false`
    /// when the device cannot be opened.
    fn start(&mut self, device: &DeviceDescriptor) -> bool;

    /// Next frame, or `None` when none is available this tick.
    fn get_frame(&mut self) -> Option<Frame>;

    /// Releases the device. Safe to call when not started.
    fn stop(&mut self);

    /// `false` before `start`, after `stop`, and once a finite source is
    /// exhausted.
    fn is_active(&self) -> bool;
}
