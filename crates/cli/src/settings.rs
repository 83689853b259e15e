use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use live_translate_core::detection::infrastructure::tesseract_engine::{
    DEFAULT_PAGE_SEGMENTATION_MODE, DEFAULT_TESSERACT_LANGUAGE,
};
use live_translate_core::shared::constants::{
    CAPTURE_HEIGHT, CAPTURE_WIDTH, DEFAULT_CYCLE_TIMEOUT, DEFAULT_DISPATCH_INTERVAL,
    DEFAULT_MAX_DETECTION_DIMENSION, DEFAULT_MIN_CONFIDENCE, DEFAULT_SOURCE_LANGUAGE,
    DEFAULT_TARGET_LANGUAGE,
};
use live_translate_core::translation::infrastructure::libretranslate_engine::DEFAULT_LIBRETRANSLATE_ENDPOINT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TranslationBackend {
    Libre,
    Google,
}

impl std::fmt::Display for TranslationBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslationBackend::Libre => write!(f, "LibreTranslate"),
            TranslationBackend::Google => write!(f, "Google Translate"),
        }
    }
}

/// Persisted user preferences. Missing fields fall back to defaults so
/// older files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub device: Option<String>,
    /// Resolution requested from live devices.
    pub capture_width: u32,
    pub capture_height: u32,
    pub display_width: Option<u32>,
    pub interval_secs: f64,
    /// `0` disables the watchdog.
    pub cycle_timeout_secs: f64,
    pub confidence: f64,
    pub max_dimension: u32,
    pub source: String,
    pub target: String,
    pub ocr_lang: String,
    /// Tesseract page segmentation mode.
    pub psm: u32,
    /// Tesseract executable; `tesseract` on `PATH` when absent.
    pub tesseract: Option<PathBuf>,
    pub backend: TranslationBackend,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub font: Option<PathBuf>,
    /// Bounded LRU cache size; unbounded when absent.
    pub cache_capacity: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device: None,
            capture_width: CAPTURE_WIDTH,
            capture_height: CAPTURE_HEIGHT,
            display_width: None,
            interval_secs: DEFAULT_DISPATCH_INTERVAL.as_secs_f64(),
            cycle_timeout_secs: DEFAULT_CYCLE_TIMEOUT.as_secs_f64(),
            confidence: DEFAULT_MIN_CONFIDENCE,
            max_dimension: DEFAULT_MAX_DETECTION_DIMENSION,
            source: DEFAULT_SOURCE_LANGUAGE.to_string(),
            target: DEFAULT_TARGET_LANGUAGE.to_string(),
            ocr_lang: DEFAULT_TESSERACT_LANGUAGE.to_string(),
            psm: DEFAULT_PAGE_SEGMENTATION_MODE,
            tesseract: None,
            backend: TranslationBackend::Libre,
            endpoint: DEFAULT_LIBRETRANSLATE_ENDPOINT.to_string(),
            api_key: None,
            font: None,
            cache_capacity: None,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("LiveTranslate").join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Unreadable or malformed files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(json) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring malformed settings {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = Self::config_path().ok_or("could not determine config directory")?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
