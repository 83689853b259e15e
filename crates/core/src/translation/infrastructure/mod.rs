pub mod google_translate_engine;
pub mod libretranslate_engine;
pub mod lru_translation_cache;
