pub mod translation_cache;
pub mod translation_engine;
