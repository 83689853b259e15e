use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for render-loop and translate-cycle events.
///
/// Keeps the live loop free of any particular output mechanism; the CLI
/// reports through `log`, tests discard everything.
pub trait PipelineLogger: Send {
    /// Called once per render tick with the running tick count.
    fn tick(&mut self, ticks: u64);

    /// Record how long a named stage took (e.g. `render`, `translate_cycle`).
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. region count).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn tick(&mut self, _ticks: u64) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running aggregate for one stage or metric. A live session has no end
/// frame count, so individual samples are not kept.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningStats {
    pub count: u64,
    pub total: f64,
    pub max: f64,
}

impl RunningStats {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
        self.max = if self.count == 1 { value } else { self.max.max(value) };
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// CLI logger: periodic throughput heartbeat plus an exit summary.
///
/// The heartbeat is emitted every `report_every` ticks.
pub struct StdoutPipelineLogger {
    report_every: u64,
    timings: HashMap<String, RunningStats>,
    metrics: HashMap<String, RunningStats>,
    start_time: Instant,
    ticks: u64,
}

impl StdoutPipelineLogger {
    pub fn new(report_every: u64) -> Self {
        Self {
            report_every: report_every.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            ticks: 0,
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Session summary ({} ticks, {elapsed_s:.1}s):",
            self.ticks
        )];

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));
        for (stage, stats) in stages {
            lines.push(format!(
                "  {stage:16}: avg {:7.1}ms  max {:7.1}ms  n={}",
                stats.mean(),
                stats.max,
                stats.count
            ));
        }

        let mut names: Vec<_> = self.metrics.iter().collect();
        names.sort_by(|a, b| a.0.cmp(b.0));
        for (name, stats) in names {
            lines.push(format!("  {name}: avg {:.1} max {:.0}", stats.mean(), stats.max));
        }

        if self.ticks > 0 && elapsed_s > 0.0 {
            lines.push(format!(
                "  Render rate: {:.1} ticks/s",
                self.ticks as f64 / elapsed_s
            ));
        }

        Some(lines.join("\n"))
    }

    pub fn timing_stats(&self, stage: &str) -> Option<RunningStats> {
        self.timings.get(stage).copied()
    }

    pub fn metric_stats(&self, name: &str) -> Option<RunningStats> {
        self.metrics.get(name).copied()
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(500)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn tick(&mut self, ticks: u64) {
        self.ticks = ticks;
        if ticks % self.report_every == 0 {
            let rate = ticks as f64 / self.start_time.elapsed().as_secs_f64().max(f64::EPSILON);
            let cycles = self
                .timings
                .get("translate_cycle")
                .map(|s| s.count)
                .unwrap_or(0);
            log::info!("Rendered {ticks} ticks ({rate:.1}/s), {cycles} translate cycles");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
