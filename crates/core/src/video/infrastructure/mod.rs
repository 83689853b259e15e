pub mod ffmpeg_capture_source;
pub mod image_snapshot_sink;
