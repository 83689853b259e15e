use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::video::domain::frame_sink::FrameSink;

/// Writes every `every`-th presented frame to `<dir>/frame_<index>.png`.
pub struct ImageSnapshotSink {
    dir: PathBuf,
    every: u64,
    presented: u64,
    written: u64,
}

impl ImageSnapshotSink {
    pub fn new(dir: &Path, every: u64) -> Result<Self, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            every: every.max(1),
            presented: 0,
            written: 0,
        })
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    fn path_for(&self, frame: &Frame) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", frame.index()))
    }
}

impl FrameSink for ImageSnapshotSink {
    fn present(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let due = self.presented % self.every == 0;
        self.presented += 1;
        if !due {
            return Ok(());
        }
        if frame.channels() != 3 {
            return Err(format!("cannot snapshot {}-channel frame", frame.channels()).into());
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;
        let path = self.path_for(frame);
        img.save(&path)?;
        self.written += 1;
        log::debug!("Wrote snapshot {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_every_nth_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ImageSnapshotSink::new(dir.path(), 3).unwrap();

        for i in 0..7 {
            sink.present(&Frame::filled(16, 8, [10, 20, 30], i)).unwrap();
        }

        assert_eq!(sink.written(), 3);
        assert!(dir.path().join("frame_000000.png").exists());
        assert!(dir.path().join("frame_000003.png").exists());
        assert!(dir.path().join("frame_000006.png").exists());
        assert!(!dir.path().join("frame_000001.png").exists());
    }

    #[test]
    fn test_snapshot_preserves_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ImageSnapshotSink::new(dir.path(), 1).unwrap();

        sink.present(&Frame::filled(20, 10, [50, 100, 200], 4)).unwrap();

        let img = image::open(dir.path().join("frame_000004.png"))
            .unwrap()
            .to_rgb8();
        assert_eq!(img.dimensions(), (20, 10));
        assert_eq!(img.get_pixel(5, 5).0, [50, 100, 200]);
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let mut sink = ImageSnapshotSink::new(&nested, 1).unwrap();

        sink.present(&Frame::filled(4, 4, [0, 0, 0], 0)).unwrap();

        assert!(nested.join("frame_000000.png").exists());
    }

    #[test]
    fn test_rejects_non_rgb_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ImageSnapshotSink::new(dir.path(), 1).unwrap();
        let gray = Frame::new(vec![0u8; 16], 4, 4, 1, 0);

        assert!(sink.present(&gray).is_err());
        assert_eq!(sink.written(), 0);
    }
}
