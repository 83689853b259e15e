use std::path::{Path, PathBuf};

use crate::shared::constants::{CAPTURE_HEIGHT, CAPTURE_WIDTH};
use crate::shared::frame::Frame;
use crate::video::domain::capture_source::{CaptureSource, DeviceDescriptor};

const DEV_ROOT: &str = "/dev";
const V4L_SYSFS_ROOT: &str = "/sys/class/video4linux";

struct ActiveCapture {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    flushing: bool,
}

/// Captures from a V4L2 device node or a video file via ffmpeg-next.
///
/// Devices are asked for 1280×720; files play at their native size. Every
/// decoded frame is converted to RGB24.
pub struct FfmpegCaptureSource {
    active: Option<ActiveCapture>,
    requested_size: (u32, u32),
    frame_index: usize,
    dev_root: PathBuf,
    sysfs_root: PathBuf,
}

// Safety: FfmpegCaptureSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegCaptureSource {}

impl FfmpegCaptureSource {
    pub fn new() -> Self {
        Self {
            active: None,
            requested_size: (CAPTURE_WIDTH, CAPTURE_HEIGHT),
            frame_index: 0,
            dev_root: PathBuf::from(DEV_ROOT),
            sysfs_root: PathBuf::from(V4L_SYSFS_ROOT),
        }
    }

    pub fn with_requested_size(mut self, width: u32, height: u32) -> Self {
        self.requested_size = (width, height);
        self
    }

    /// Overrides where `list_devices` looks for device nodes and their
    /// sysfs names.
    pub fn with_device_roots(mut self, dev_root: PathBuf, sysfs_root: PathBuf) -> Self {
        self.dev_root = dev_root;
        self.sysfs_root = sysfs_root;
        self
    }

    fn open(&self, id: &str) -> Result<ActiveCapture, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = if is_device_node(id) {
            ffmpeg_next::device::register_all();
            let mut options = ffmpeg_next::Dictionary::new();
            let (w, h) = self.requested_size;
            options.set("video_size", &format!("{w}x{h}"));
            ffmpeg_next::format::input_with_dictionary(&id, options)?
        } else {
            ffmpeg_next::format::input(&id)?
        };

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        Ok(ActiveCapture {
            ictx,
            decoder,
            scaler,
            stream_index,
            width,
            height,
            flushing: false,
        })
    }

    fn device_name(&self, node: &str) -> Option<String> {
        let path = self.sysfs_root.join(node).join("name");
        std::fs::read_to_string(path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

impl Default for FfmpegCaptureSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSource for FfmpegCaptureSource {
    fn list_devices(&self) -> Vec<DeviceDescriptor> {
        let Ok(entries) = std::fs::read_dir(&self.dev_root) else {
            return Vec::new();
        };
        let mut nodes: Vec<(u32, String)> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name().to_str()?.to_string();
                let number = name.strip_prefix("video")?.parse::<u32>().ok()?;
                Some((number, name))
            })
            .collect();
        nodes.sort();

        nodes
            .into_iter()
            .map(|(number, node)| {
                let name = self
                    .device_name(&node)
                    .unwrap_or_else(|| format!("Camera {number}"));
                let id = self.dev_root.join(&node).to_string_lossy().into_owned();
                DeviceDescriptor::new(id, name)
            })
            .collect()
    }

    fn start(&mut self, device: &DeviceDescriptor) -> bool {
        self.stop();
        match self.open(&device.id) {
            Ok(active) => {
                log::info!(
                    "Capturing {} ({}) at {}x{}",
                    device.name,
                    device.id,
                    active.width,
                    active.height
                );
                self.active = Some(active);
                self.frame_index = 0;
                true
            }
            Err(e) => {
                log::warn!("Failed to open {}: {e}", device.id);
                false
            }
        }
    }

    fn get_frame(&mut self) -> Option<Frame> {
        let active = self.active.as_mut()?;
        match active.next_rgb() {
            Some(pixels) => {
                let frame = Frame::new(pixels, active.width, active.height, 3, self.frame_index);
                self.frame_index += 1;
                Some(frame)
            }
            None => {
                log::info!("Capture ended after {} frames", self.frame_index);
                self.active = None;
                None
            }
        }
    }

    fn stop(&mut self) {
        if self.active.take().is_some() {
            log::debug!("Capture stopped");
        }
    }

    fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

impl ActiveCapture {
    /// Decodes until one frame is produced; `None` at end of stream.
    fn next_rgb(&mut self) -> Option<Vec<u8>> {
        if let Some(pixels) = self.try_receive() {
            return Some(pixels);
        }
        if self.flushing {
            return None;
        }

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                return self.try_receive();
            };
            if stream.index() != self.stream_index {
                continue;
            }
            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet: {e}");
                continue;
            }
            if let Some(pixels) = self.try_receive() {
                return Some(pixels);
            }
        }
    }

    fn try_receive(&mut self) -> Option<Vec<u8>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        self.decoder.receive_frame(&mut decoded).ok()?;
        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = self.scaler.run(&decoded, &mut rgb) {
            log::warn!("Pixel conversion failed: {e}");
            return None;
        }
        Some(packed_rgb(&rgb, self.width, self.height))
    }
}

fn is_device_node(id: &str) -> bool {
    Path::new(id).starts_with(DEV_ROOT)
}

/// Copies an RGB24 ffmpeg frame into a tightly packed buffer, dropping the
/// per-row stride padding.
fn packed_rgb(
    rgb: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}
