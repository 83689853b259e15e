use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::pipeline_scheduler::{DispatchOutcome, PipelineScheduler};
use crate::pipeline::translate_worker::CycleOutcome;
use crate::shared::constants::DEFAULT_TICK_INTERVAL;
use crate::shared::frame::Frame;
use crate::video::domain::capture_source::{CaptureSource, DeviceDescriptor};
use crate::video::domain::frame_sink::FrameSink;

/// Render-loop tunables.
#[derive(Clone, Debug)]
pub struct LiveTranslateConfig {
    /// Width frames are presented at; height keeps the aspect ratio.
    /// `None` presents at capture resolution.
    pub display_width: Option<u32>,
    pub tick_interval: Duration,
    /// Stop after this many render ticks.
    pub max_ticks: Option<u64>,
    /// Set from another thread (e.g. a Ctrl-C handler) to end the loop.
    pub cancelled: Arc<AtomicBool>,
}

impl Default for LiveTranslateConfig {
    fn default() -> Self {
        Self {
            display_width: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
            max_ticks: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// What one session did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub ticks: u64,
    pub frames: u64,
    pub dispatched: u64,
    pub cycles_published: u64,
    pub abandoned: u64,
}

/// Live pipeline: capture → schedule → overlay latest results → present.
///
/// Runs on the caller's thread. Translate cycles happen on the scheduler's
/// worker, so a slow cycle only delays when new overlays appear, never a
/// render tick.
pub struct LiveTranslateUseCase {
    capture: Box<dyn CaptureSource>,
    scheduler: PipelineScheduler,
    renderer: OverlayRenderer,
    sink: Box<dyn FrameSink>,
    logger: Box<dyn PipelineLogger>,
}

impl LiveTranslateUseCase {
    pub fn new(
        capture: Box<dyn CaptureSource>,
        scheduler: PipelineScheduler,
        renderer: OverlayRenderer,
        sink: Box<dyn FrameSink>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            capture,
            scheduler,
            renderer,
            sink,
            logger,
        }
    }

    pub fn execute(
        &mut self,
        device: &DeviceDescriptor,
        config: &LiveTranslateConfig,
    ) -> Result<SessionStats, Box<dyn std::error::Error>> {
        if !self.capture.start(device) {
            return Err(format!("Could not open capture device {}", device.id).into());
        }
        self.logger.info(&format!("Live translation started on {}", device.name));

        let mut stats = SessionStats::default();
        loop {
            if config.cancelled.load(Ordering::Relaxed) {
                self.logger.info("Cancelled");
                break;
            }
            if config.max_ticks.is_some_and(|max| stats.ticks >= max) {
                break;
            }

            let tick_start = Instant::now();
            match self.capture.get_frame() {
                Some(frame) => {
                    stats.frames += 1;
                    self.render_tick(frame, config, &mut stats);
                }
                None if !self.capture.is_active() => {
                    self.logger.info("Capture source ended");
                    break;
                }
                None => {}
            }

            stats.ticks += 1;
            self.logger.tick(stats.ticks);

            let remaining = config.tick_interval.saturating_sub(tick_start.elapsed());
            if !remaining.is_zero() {
                std::thread::sleep(remaining);
            }
        }

        self.capture.stop();
        stats.abandoned = self.scheduler.abandoned_cycles();
        self.logger.summary();
        Ok(stats)
    }

    fn render_tick(&mut self, frame: Frame, config: &LiveTranslateConfig, stats: &mut SessionStats) {
        if self.scheduler.tick(&frame) == DispatchOutcome::Dispatched {
            stats.dispatched += 1;
        }
        for report in self.scheduler.drain_reports() {
            self.logger
                .timing("translate_cycle", report.elapsed.as_secs_f64() * 1000.0);
            if let CycleOutcome::Published { regions } = report.outcome {
                stats.cycles_published += 1;
                self.logger.metric("regions", regions as f64);
            }
        }

        let results = self.scheduler.latest();
        let mut display = match config.display_width {
            Some(w) if w != frame.width() && frame.width() > 0 => {
                let h = (frame.height() as f64 * w as f64 / frame.width() as f64).round() as u32;
                frame.resized(w, h)
            }
            _ => frame,
        };

        let render_start = Instant::now();
        let scale = results.scale_for(display.width());
        self.renderer.render(&mut display, &results, scale);
        self.logger
            .timing("render", render_start.elapsed().as_secs_f64() * 1000.0);

        if let Err(e) = self.sink.present(&display) {
            log::warn!("Failed to present frame {}: {e}", display.index());
        }
    }
}
