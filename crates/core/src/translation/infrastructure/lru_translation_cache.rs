use std::num::NonZeroUsize;

use lru::LruCache;

use crate::translation::domain::translation_cache::{TranslateFn, TranslationCache};

/// Bounded cache that evicts the least recently shown text first.
///
/// For sources whose vocabulary keeps growing (scrolling dialogue, chat)
/// where the unbounded cache would grow without limit.
pub struct LruTranslationCache {
    entries: LruCache<String, String>,
}

impl LruTranslationCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

impl TranslationCache for LruTranslationCache {
    fn get_or_translate(&mut self, text: &str, translate: &mut TranslateFn<'_>) -> String {
        if let Some(hit) = self.entries.get(text) {
            return hit.clone();
        }
        match translate(text) {
            Ok(translated) => {
                if let Some((evicted, _)) = self.entries.push(text.to_string(), translated.clone()) {
                    if evicted != text {
                        log::debug!("Evicted cached translation for {evicted:?}");
                    }
                }
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
