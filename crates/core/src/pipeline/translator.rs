use crate::detection::domain::text_detector::TextDetector;
use crate::pipeline::language_filter::LanguageFilter;
use crate::shared::constants::{DEFAULT_SOURCE_LANGUAGE, DEFAULT_TARGET_LANGUAGE};
use crate::shared::frame::Frame;
use crate::shared::region::{ResultSet, TranslatedRegion};
use crate::translation::domain::translation_cache::TranslationCache;
use crate::translation::domain::translation_engine::TranslationEngine;

/// Source and target language codes for a [`Translator`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_LANGUAGE, DEFAULT_TARGET_LANGUAGE)
    }
}

/// One translate cycle: detect → filter → cache-or-translate.
///
/// Owns its cache; a translator is used by exactly one worker at a time.
pub struct Translator {
    detector: TextDetector,
    filter: Box<dyn LanguageFilter>,
    cache: Box<dyn TranslationCache>,
    engine: Box<dyn TranslationEngine>,
    languages: LanguagePair,
}

impl Translator {
    pub fn new(
        detector: TextDetector,
        filter: Box<dyn LanguageFilter>,
        cache: Box<dyn TranslationCache>,
        engine: Box<dyn TranslationEngine>,
        languages: LanguagePair,
    ) -> Self {
        Self {
            detector,
            filter,
            cache,
            engine,
            languages,
        }
    }

    pub fn languages(&self) -> &LanguagePair {
        &self.languages
    }

    pub fn cached_translations(&self) -> usize {
        self.cache.len()
    }

    /// Runs one full cycle over `frame` and stamps the set with `cycle`.
    /// Regions keep detection order and geometry; regions rejected by the
    /// filter are dropped.
    pub fn process_frame(&mut self, frame: &Frame, cycle: u64) -> ResultSet {
        let detected = self.detector.detect(frame);
        let found = detected.len();

        let engine = &self.engine;
        let languages = &self.languages;
        let mut translate =
            |text: &str| engine.translate(text, &languages.source, &languages.target);

        let mut regions = Vec::with_capacity(found);
        for region in detected {
            if !self.filter.matches(&region.text) {
                continue;
            }
            let translated = self.cache.get_or_translate(&region.text, &mut translate);
            regions.push(TranslatedRegion { region, translated });
        }

        log::debug!(
            "Cycle {}: {} detected, {} kept, {} cached",
            cycle,
            found,
            regions.len(),
            self.cache.len()
        );

        ResultSet {
            regions,
            source_width: frame.width(),
            source_height: frame.height(),
            cycle,
        }
    }
}
