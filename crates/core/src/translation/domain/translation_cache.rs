use std::collections::HashMap;

use crate::translation::domain::translation_engine::TranslationError;

/// Callback performing the actual translation on a cache miss.
pub type TranslateFn<'a> = dyn FnMut(&str) -> Result<String, TranslationError> + 'a;

/// Memoizes source text → translation.
///
/// On a hit `translate` is not called. On a miss it is called once; a
/// successful result is stored, a failure returns `text` unchanged and is
/// not stored, so the next sighting of the same text tries again.
pub trait TranslationCache: Send {
    fn get_or_translate(&mut self, text: &str, translate: &mut TranslateFn<'_>) -> String;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded exact-match cache. On-screen UI text is a small vocabulary, so
/// growth for the process lifetime is acceptable.
#[derive(Debug, Default)]
pub struct MemoryTranslationCache {
    entries: HashMap<String, String>,
}

impl MemoryTranslationCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TranslationCache for MemoryTranslationCache {
    fn get_or_translate(&mut self, text: &str, translate: &mut TranslateFn<'_>) -> String {
        if let Some(hit) = self.entries.get(text) {
            return hit.clone();
        }
        match translate(text) {
            Ok(translated) => {
                self.entries.insert(text.to_string(), translated.clone());
                translated
            }
            Err(e) => {
                log::warn!("Translation failed for {text:?}, showing original: {e}");
                text.to_string()
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
