mod settings;

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use live_translate_core::detection::domain::text_detector::{DetectorConfig, TextDetector};
use live_translate_core::detection::infrastructure::tesseract_engine::TesseractEngine;
use live_translate_core::overlay::domain::overlay_renderer::{OverlayRenderer, OverlayStyle};
use live_translate_core::overlay::infrastructure::font_resolver;
use live_translate_core::overlay::infrastructure::glyph_text_painter::GlyphTextPainter;
use live_translate_core::pipeline::infrastructure::threaded_translate_worker::{
    BuildError, ThreadedTranslateWorker, TranslatorFactory,
};
use live_translate_core::pipeline::language_filter::ScriptFilter;
use live_translate_core::pipeline::live_translate_use_case::{
    LiveTranslateConfig, LiveTranslateUseCase,
};
use live_translate_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use live_translate_core::pipeline::pipeline_scheduler::{
    PipelineScheduler, SchedulerConfig, SystemClock,
};
use live_translate_core::pipeline::translator::{LanguagePair, Translator};
use live_translate_core::shared::constants::DEFAULT_TICK_INTERVAL;
use live_translate_core::translation::domain::translation_cache::{
    MemoryTranslationCache, TranslationCache,
};
use live_translate_core::translation::domain::translation_engine::TranslationEngine;
use live_translate_core::translation::infrastructure::google_translate_engine::GoogleTranslateEngine;
use live_translate_core::translation::infrastructure::libretranslate_engine::LibreTranslateEngine;
use live_translate_core::translation::infrastructure::lru_translation_cache::LruTranslationCache;
use live_translate_core::video::domain::capture_source::{CaptureSource, DeviceDescriptor};
use live_translate_core::video::domain::frame_sink::{FrameSink, NullFrameSink};
use live_translate_core::video::infrastructure::ffmpeg_capture_source::FfmpegCaptureSource;
use live_translate_core::video::infrastructure::image_snapshot_sink::ImageSnapshotSink;

use settings::{Settings, TranslationBackend};

const MAX_PAGE_SEGMENTATION_MODE: u32 = 13;

/// Detects foreign-language text in live video and overlays translations.
///
/// Unset options fall back to the saved settings file, then to defaults.
#[derive(Parser, Debug)]
#[command(name = "live-translate")]
struct Cli {
    /// Capture device node (e.g. /dev/video0). Defaults to the first device found.
    #[arg(long)]
    device: Option<String>,

    /// Width requested from live capture devices.
    #[arg(long)]
    capture_width: Option<u32>,

    /// Height requested from live capture devices.
    #[arg(long)]
    capture_height: Option<u32>,

    /// Play a video file instead of a live device.
    #[arg(long, conflicts_with = "device")]
    input: Option<PathBuf>,

    /// List capture devices and exit.
    #[arg(long)]
    list_devices: bool,

    /// Directory for PNG snapshots of the overlaid output.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write every Nth presented frame when --output is set.
    #[arg(long, default_value = "30")]
    snapshot_every: u64,

    /// Display width in pixels; height keeps the aspect ratio.
    #[arg(long)]
    display_width: Option<u32>,

    /// Seconds between translate cycle dispatches.
    #[arg(long)]
    interval: Option<f64>,

    /// OCR confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Longest frame side passed to OCR; larger frames are downscaled.
    #[arg(long)]
    max_dimension: Option<u32>,

    /// Source language code (e.g. ja).
    #[arg(long)]
    source: Option<String>,

    /// Target language code (e.g. en).
    #[arg(long)]
    target: Option<String>,

    /// Tesseract language pack (e.g. jpn).
    #[arg(long)]
    ocr_lang: Option<String>,

    /// Tesseract page segmentation mode (0-13; 11 finds sparse text).
    #[arg(long)]
    psm: Option<u32>,

    /// Path to the tesseract executable.
    #[arg(long)]
    tesseract: Option<PathBuf>,

    /// Translation service.
    #[arg(long, value_enum)]
    backend: Option<TranslationBackend>,

    /// LibreTranslate server URL.
    #[arg(long)]
    endpoint: Option<String>,

    /// API key for the translation service.
    #[arg(long)]
    api_key: Option<String>,

    /// TrueType/OpenType font for overlay text.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Bound the translation cache to this many entries (LRU).
    #[arg(long)]
    cache_capacity: Option<usize>,

    /// Seconds before a hung translate cycle is abandoned (0 disables).
    #[arg(long)]
    cycle_timeout: Option<f64>,

    /// Stop after this many render ticks.
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Persist the effective options as the new defaults.
    #[arg(long)]
    save_settings: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.list_devices {
        print_devices(&FfmpegCaptureSource::new());
        return Ok(());
    }

    let settings = merge(Settings::load(), &cli);
    validate(&settings, &cli)?;
    if cli.save_settings {
        let path = settings.save()?;
        log::info!("Settings saved to {}", path.display());
    }

    let capture = FfmpegCaptureSource::new()
        .with_requested_size(settings.capture_width, settings.capture_height);

    let device = select_device(&cli, &settings, &capture)?;

    let factory = translator_factory(&settings);
    // Build once up front so configuration errors surface before capture starts.
    factory().map_err(|e| e.to_string())?;

    let font_path = font_resolver::resolve(settings.font.as_deref())?;
    log::info!("Overlay font: {}", font_path.display());
    let painter = GlyphTextPainter::new(font_resolver::load(&font_path)?);
    let renderer = OverlayRenderer::new(Box::new(painter), OverlayStyle::default());

    let scheduler = PipelineScheduler::new(
        scheduler_config(&settings),
        Box::new(SystemClock),
        ThreadedTranslateWorker::spawner(factory),
    );

    let sink: Box<dyn FrameSink> = match &cli.output {
        Some(dir) => Box::new(ImageSnapshotSink::new(dir, cli.snapshot_every)?),
        None => Box::new(NullFrameSink),
    };

    log::info!(
        "Translating {} → {} via {}",
        settings.source,
        settings.target,
        settings.backend
    );

    let mut use_case = LiveTranslateUseCase::new(
        Box::new(capture),
        scheduler,
        renderer,
        sink,
        Box::new(StdoutPipelineLogger::default()),
    );
    let config = LiveTranslateConfig {
        display_width: settings.display_width,
        tick_interval: DEFAULT_TICK_INTERVAL,
        max_ticks: cli.max_ticks,
        ..LiveTranslateConfig::default()
    };
    let stats = use_case.execute(&device, &config)?;

    log::info!(
        "Session ended: {} ticks, {} cycles dispatched, {} published, {} abandoned",
        stats.ticks,
        stats.dispatched,
        stats.cycles_published,
        stats.abandoned
    );
    if let Some(dir) = &cli.output {
        log::info!("Snapshots written to {}", dir.display());
    }
    Ok(())
}

/// Command-line values override saved settings field by field.
fn merge(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(device) = &cli.device {
        settings.device = Some(device.clone());
    }
    if let Some(v) = cli.capture_width {
        settings.capture_width = v;
    }
    if let Some(v) = cli.capture_height {
        settings.capture_height = v;
    }
    if cli.display_width.is_some() {
        settings.display_width = cli.display_width;
    }
    if let Some(v) = cli.interval {
        settings.interval_secs = v;
    }
    if let Some(v) = cli.cycle_timeout {
        settings.cycle_timeout_secs = v;
    }
    if let Some(v) = cli.confidence {
        settings.confidence = v;
    }
    if let Some(v) = cli.max_dimension {
        settings.max_dimension = v;
    }
    if let Some(v) = &cli.source {
        settings.source = v.clone();
    }
    if let Some(v) = &cli.target {
        settings.target = v.clone();
    }
    if let Some(v) = &cli.ocr_lang {
        settings.ocr_lang = v.clone();
    }
    if let Some(v) = cli.psm {
        settings.psm = v;
    }
    if cli.tesseract.is_some() {
        settings.tesseract = cli.tesseract.clone();
    }
    if let Some(v) = cli.backend {
        settings.backend = v;
    }
    if let Some(v) = &cli.endpoint {
        settings.endpoint = v.clone();
    }
    if cli.api_key.is_some() {
        settings.api_key = cli.api_key.clone();
    }
    if cli.font.is_some() {
        settings.font = cli.font.clone();
    }
    if cli.cache_capacity.is_some() {
        settings.cache_capacity = cli.cache_capacity;
    }
    settings
}

fn validate(settings: &Settings, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&settings.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            settings.confidence
        )
        .into());
    }
    if !settings.interval_secs.is_finite() || settings.interval_secs < 0.0 {
        return Err(format!(
            "Interval must be a non-negative number of seconds, got {}",
            settings.interval_secs
        )
        .into());
    }
    if !settings.cycle_timeout_secs.is_finite() || settings.cycle_timeout_secs < 0.0 {
        return Err(format!(
            "Cycle timeout must be a non-negative number of seconds, got {}",
            settings.cycle_timeout_secs
        )
        .into());
    }
    if settings.capture_width == 0 || settings.capture_height == 0 {
        return Err("Capture size must be positive".into());
    }
    if settings.psm > MAX_PAGE_SEGMENTATION_MODE {
        return Err(format!(
            "Page segmentation mode must be 0-{MAX_PAGE_SEGMENTATION_MODE}, got {}",
            settings.psm
        )
        .into());
    }
    if settings.display_width == Some(0) {
        return Err("Display width must be positive".into());
    }
    if settings.cache_capacity == Some(0) {
        return Err("Cache capacity must be positive".into());
    }
    if ScriptFilter::for_language(&settings.source).is_none() {
        return Err(format!(
            "Unsupported source language '{}' (expected ja, ko or zh)",
            settings.source
        )
        .into());
    }
    if settings.backend == TranslationBackend::Google && settings.api_key.is_none() {
        return Err("The google backend requires --api-key".into());
    }
    if let Some(input) = &cli.input {
        if !input.exists() {
            return Err(format!("Input file not found: {}", input.display()).into());
        }
    }
    if cli.snapshot_every == 0 {
        return Err("--snapshot-every must be at least 1".into());
    }
    Ok(())
}

fn select_device(
    cli: &Cli,
    settings: &Settings,
    capture: &dyn CaptureSource,
) -> Result<DeviceDescriptor, Box<dyn std::error::Error>> {
    if let Some(input) = &cli.input {
        return Ok(file_device(input));
    }
    let devices = capture.list_devices();
    if let Some(id) = &settings.device {
        let found = devices.iter().find(|d| &d.id == id).cloned();
        return Ok(found.unwrap_or_else(|| DeviceDescriptor::new(id.clone(), id.clone())));
    }
    devices
        .into_iter()
        .next()
        .ok_or_else(|| "No capture devices found; pass --device or --input".into())
}

fn file_device(path: &Path) -> DeviceDescriptor {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    DeviceDescriptor::new(path.to_string_lossy(), name)
}

fn print_devices(capture: &dyn CaptureSource) {
    let devices = capture.list_devices();
    if devices.is_empty() {
        println!("No capture devices found.");
    }
    for d in devices {
        println!("{}\t{}", d.id, d.name);
    }
}

fn scheduler_config(settings: &Settings) -> SchedulerConfig {
    SchedulerConfig {
        interval: Duration::from_secs_f64(settings.interval_secs),
        cycle_timeout: (settings.cycle_timeout_secs > 0.0)
            .then(|| Duration::from_secs_f64(settings.cycle_timeout_secs)),
    }
}

fn translator_factory(settings: &Settings) -> TranslatorFactory {
    let settings = settings.clone();
    Arc::new(move || -> Result<Translator, BuildError> {
        let mut ocr =
            TesseractEngine::new(&settings.ocr_lang).with_page_segmentation_mode(settings.psm);
        if let Some(binary) = &settings.tesseract {
            ocr = ocr.with_binary(binary.clone());
        }
        let detector = TextDetector::new(
            Box::new(ocr),
            DetectorConfig {
                min_confidence: settings.confidence,
                max_dimension: settings.max_dimension,
            },
        );
        let filter = ScriptFilter::for_language(&settings.source)
            .ok_or_else(|| format!("unsupported source language '{}'", settings.source))?;
        let cache: Box<dyn TranslationCache> =
            match settings.cache_capacity.and_then(NonZeroUsize::new) {
                Some(capacity) => Box::new(LruTranslationCache::new(capacity)),
                None => Box::new(MemoryTranslationCache::new()),
            };
        let engine: Box<dyn TranslationEngine> = match settings.backend {
            TranslationBackend::Libre => Box::new(LibreTranslateEngine::new(
                &settings.endpoint,
                settings.api_key.clone(),
            )?),
            TranslationBackend::Google => Box::new(GoogleTranslateEngine::new(
                settings.api_key.clone().ok_or("google backend requires an API key")?,
            )?),
        };
        Ok(Translator::new(
            detector,
            Box::new(filter),
            cache,
            engine,
            LanguagePair::new(&settings.source, &settings.target),
        ))
    })
}
