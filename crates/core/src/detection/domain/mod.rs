pub mod recognition_engine;
pub mod text_detector;
