use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::pipeline::result_slot::ResultSlot;
use crate::pipeline::translate_worker::{
    CycleOutcome, CycleReport, TranslateJob, TranslateWorker, WorkerSpawner,
};
use crate::shared::constants::{DEFAULT_CYCLE_TIMEOUT, DEFAULT_DISPATCH_INTERVAL};
use crate::shared::frame::Frame;
use crate::shared::region::ResultSet;

/// Time source for throttling and the watchdog.
pub trait Clock: Send {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Minimum time between two dispatches, measured dispatch to dispatch.
    pub interval: Duration,
    /// Cycles running longer than this are abandoned. `None` disables the
    /// watchdog.
    pub cycle_timeout: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_DISPATCH_INTERVAL,
            cycle_timeout: Some(DEFAULT_CYCLE_TIMEOUT),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Translating { generation: u64, since: Instant },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A snapshot of the frame was sent to the worker.
    Dispatched,
    /// Idle, but the interval since the last dispatch has not elapsed.
    Throttled,
    /// A cycle is already in flight.
    Busy,
}

/// Decouples the render loop from the slow translate cycle.
///
/// At most one cycle is in flight. `tick` never blocks: it reaps finished
/// cycles, enforces the watchdog, and dispatches when idle and the interval
/// has elapsed. Results are read with [`PipelineScheduler::latest`].
///
/// Dropping the scheduler does not wait for an in-flight cycle; its
/// results are discarded with the worker.
pub struct PipelineScheduler {
    config: SchedulerConfig,
    clock: Box<dyn Clock>,
    spawner: WorkerSpawner,
    worker: Box<dyn TranslateWorker>,
    slot: Arc<ResultSlot>,
    state: SchedulerState,
    last_dispatch: Option<Instant>,
    generation: u64,
    reports: Vec<CycleReport>,
    abandoned: u64,
}

impl PipelineScheduler {
    pub fn new(config: SchedulerConfig, clock: Box<dyn Clock>, spawner: WorkerSpawner) -> Self {
        let slot = Arc::new(ResultSlot::new());
        let worker = spawner(Arc::clone(&slot));
        Self {
            config,
            clock,
            spawner,
            worker,
            slot,
            state: SchedulerState::Idle,
            last_dispatch: None,
            generation: 0,
            reports: Vec::new(),
            abandoned: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_translating(&self) -> bool {
        matches!(self.state, SchedulerState::Translating { .. })
    }

    /// Number of cycles the watchdog has given up on.
    pub fn abandoned_cycles(&self) -> u64 {
        self.abandoned
    }

    /// Latest published results. Never blocks on a running cycle.
    pub fn latest(&self) -> Arc<ResultSet> {
        self.slot.latest()
    }

    /// Reaps finished cycles, replaces a worker that died mid-cycle and
    /// applies the watchdog.
    pub fn poll(&mut self) {
        while let Some(report) = self.worker.try_completed() {
            if let SchedulerState::Translating { generation, .. } = self.state {
                if generation == report.generation {
                    self.state = SchedulerState::Idle;
                }
            }
            match report.outcome {
                CycleOutcome::Published { regions } => log::debug!(
                    "Cycle {} published {regions} regions in {:?}",
                    report.generation,
                    report.elapsed
                ),
                CycleOutcome::Discarded => {
                    log::debug!("Cycle {} finished late; discarded", report.generation)
                }
                CycleOutcome::Panicked => {
                    log::warn!("Cycle {} panicked; keeping previous results", report.generation)
                }
            }
            self.reports.push(report);
        }

        if let SchedulerState::Translating { generation, .. } = self.state {
            if !self.worker.is_alive() {
                log::warn!("Translate worker exited during cycle {generation}; restarting it");
                self.worker = (self.spawner)(Arc::clone(&self.slot));
                self.state = SchedulerState::Idle;
            }
        }

        if let (SchedulerState::Translating { generation, since }, Some(timeout)) =
            (self.state, self.config.cycle_timeout)
        {
            if self.clock.now().saturating_duration_since(since) >= timeout {
                log::warn!(
                    "Cycle {generation} exceeded {timeout:?}; abandoning it and restarting the worker"
                );
                self.slot.abandon_through(generation);
                self.worker = (self.spawner)(Arc::clone(&self.slot));
                self.state = SchedulerState::Idle;
                self.abandoned += 1;
            }
        }
    }

    /// Called once per render tick with the current frame.
    pub fn tick(&mut self, frame: &Frame) -> DispatchOutcome {
        self.poll();

        if self.is_translating() {
            return DispatchOutcome::Busy;
        }
        let now = self.clock.now();
        if let Some(last) = self.last_dispatch {
            if now.saturating_duration_since(last) < self.config.interval {
                return DispatchOutcome::Throttled;
            }
        }

        let generation = self.generation + 1;
        let job = TranslateJob {
            generation,
            frame: frame.clone(),
        };
        // The attempt counts as a dispatch either way so a dead worker is
        // retried at the normal cadence.
        self.last_dispatch = Some(now);
        if !self.worker.submit(job) {
            log::warn!("Translate worker unavailable; restarting it");
            self.worker = (self.spawner)(Arc::clone(&self.slot));
            return DispatchOutcome::Throttled;
        }

        self.generation = generation;
        self.state = SchedulerState::Translating {
            generation,
            since: now,
        };
        DispatchOutcome::Dispatched
    }

    /// Completion reports gathered since the last call.
    pub fn drain_reports(&mut self) -> Vec<CycleReport> {
        std::mem::take(&mut self.reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::region::{DetectedRegion, PixelRect, TranslatedRegion};
    use rstest::rstest;
    use std::sync::Mutex;

    #[derive(Clone)]
    struct ManualClock {
        now: Arc<Mutex<Instant>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                now: Arc::new(Mutex::new(Instant::now())),
            }
        }

        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    /// Shared view of every fake worker the scheduler has spawned.
    #[derive(Default)]
    struct Workers {
        spawned: usize,
        jobs: Vec<(usize, u64, usize)>,
        pending: Vec<(usize, CycleReport)>,
        slots: Vec<Arc<ResultSlot>>,
        refuse: bool,
        dead: Vec<usize>,
    }

    struct FakeWorker {
        id: usize,
        shared: Arc<Mutex<Workers>>,
    }

    impl TranslateWorker for FakeWorker {
        fn submit(&mut self, job: TranslateJob) -> bool {
            let mut w = self.shared.lock().unwrap();
            if w.refuse {
                return false;
            }
            w.jobs.push((self.id, job.generation, job.frame.index()));
            true
        }

        fn try_completed(&mut self) -> Option<CycleReport> {
            let mut w = self.shared.lock().unwrap();
            let pos = w.pending.iter().position(|(id, _)| *id == self.id)?;
            Some(w.pending.remove(pos).1)
        }

        fn is_alive(&self) -> bool {
            !self.shared.lock().unwrap().dead.contains(&self.id)
        }
    }

    struct Harness {
        scheduler: PipelineScheduler,
        clock: ManualClock,
        workers: Arc<Mutex<Workers>>,
    }

    impl Harness {
        fn new(config: SchedulerConfig) -> Self {
            let clock = ManualClock::new();
            let workers = Arc::new(Mutex::new(Workers::default()));
            let shared = workers.clone();
            let spawner: WorkerSpawner = Box::new(move |slot: Arc<ResultSlot>| {
                let mut w = shared.lock().unwrap();
                w.spawned += 1;
                w.slots.push(slot);
                let worker: Box<dyn TranslateWorker> = Box::new(FakeWorker {
                    id: w.spawned,
                    shared: shared.clone(),
                });
                worker
            });
            let scheduler = PipelineScheduler::new(config, Box::new(clock.clone()), spawner);
            Self {
                scheduler,
                clock,
                workers,
            }
        }

        /// Simulates the current worker finishing `generation`.
        fn complete(&self, generation: u64, text: &str) {
            let mut w = self.workers.lock().unwrap();
            let id = w.spawned;
            let slot = w.slots[id - 1].clone();
            let published = slot.publish(generation, result_set(generation, text));
            let outcome = if published {
                CycleOutcome::Published { regions: 1 }
            } else {
                CycleOutcome::Discarded
            };
            w.pending.push((
                id,
                CycleReport {
                    generation,
                    outcome,
                    elapsed: Duration::from_millis(100),
                },
            ));
        }

        fn jobs(&self) -> Vec<(usize, u64, usize)> {
            self.workers.lock().unwrap().jobs.clone()
        }
    }

    fn result_set(cycle: u64, text: &str) -> ResultSet {
        ResultSet {
            regions: vec![TranslatedRegion {
                region: DetectedRegion {
                    text: text.to_string(),
                    rect: PixelRect::new(0, 0, 10, 10),
                    confidence: 0.9,
                },
                translated: text.to_uppercase(),
            }],
            source_width: 640,
            source_height: 480,
            cycle,
        }
    }

    fn frame(index: usize) -> Frame {
        Frame::filled(8, 8, [0, 0, 0], index)
    }

    fn no_watchdog() -> SchedulerConfig {
        SchedulerConfig {
            cycle_timeout: None,
            ..SchedulerConfig::default()
        }
    }

    #[test]
    fn test_first_tick_dispatches_immediately() {
        let mut h = Harness::new(no_watchdog());

        assert_eq!(h.scheduler.tick(&frame(0)), DispatchOutcome::Dispatched);
        assert!(h.scheduler.is_translating());
        assert_eq!(h.jobs(), vec![(1, 1, 0)]);
    }

    #[test]
    fn test_busy_while_cycle_in_flight() {
        let mut h = Harness::new(no_watchdog());
        h.scheduler.tick(&frame(0));

        for i in 1..=50 {
            h.clock.advance(Duration::from_millis(100));
            assert_eq!(h.scheduler.tick(&frame(i)), DispatchOutcome::Busy);
        }
        assert_eq!(h.jobs().len(), 1);
    }

    #[test]
    fn test_schedule_across_two_seconds_of_ticks() {
        // 200 ticks at 10 ms with each cycle taking 100 ms: one dispatch per
        // 500 ms interval, never two in flight.
        let mut h = Harness::new(no_watchdog());
        let mut dispatched_at = Vec::new();
        let mut in_flight: Option<(u64, u64)> = None;

        for t in 0..200u64 {
            if let Some((generation, started)) = in_flight {
                if t - started >= 10 {
                    h.complete(generation, "はい");
                    in_flight = None;
                }
            }
            if h.scheduler.tick(&frame(t as usize)) == DispatchOutcome::Dispatched {
                assert!(in_flight.is_none());
                dispatched_at.push(t);
                in_flight = Some((dispatched_at.len() as u64, t));
            }
            h.clock.advance(Duration::from_millis(10));
        }

        assert_eq!(dispatched_at, vec![0, 50, 100, 150]);
    }

    #[test]
    fn test_completion_returns_to_idle_and_publishes() {
        let mut h = Harness::new(no_watchdog());
        h.scheduler.tick(&frame(0));
        h.complete(1, "こんにちは");

        h.clock.advance(Duration::from_millis(10));
        assert_eq!(h.scheduler.tick(&frame(1)), DispatchOutcome::Throttled);

        assert_eq!(h.scheduler.state(), SchedulerState::Idle);
        let latest = h.scheduler.latest();
        assert_eq!(latest.regions[0].translated, "こんにちは".to_uppercase());
        assert_eq!(h.scheduler.drain_reports().len(), 1);
        assert!(h.scheduler.drain_reports().is_empty());
    }

    #[test]
    fn test_slow_cycle_dispatches_immediately_after_completion() {
        // Interval is measured from dispatch, so a cycle longer than the
        // interval is followed by an immediate redispatch.
        let mut h = Harness::new(no_watchdog());
        h.scheduler.tick(&frame(0));
        h.clock.advance(Duration::from_millis(800));
        h.complete(1, "遅い");

        assert_eq!(h.scheduler.tick(&frame(1)), DispatchOutcome::Dispatched);
    }

    #[rstest]
    #[case::just_before(Duration::from_millis(499), DispatchOutcome::Throttled)]
    #[case::exactly_interval(Duration::from_millis(500), DispatchOutcome::Dispatched)]
    #[case::well_after(Duration::from_secs(3), DispatchOutcome::Dispatched)]
    fn test_interval_boundary(#[case] wait: Duration, #[case] expected: DispatchOutcome) {
        let mut h = Harness::new(no_watchdog());
        h.scheduler.tick(&frame(0));
        h.complete(1, "a");
        h.scheduler.poll();

        h.clock.advance(wait);

        assert_eq!(h.scheduler.tick(&frame(1)), expected);
    }

    #[test]
    fn test_latest_unchanged_while_translating() {
        let mut h = Harness::new(no_watchdog());
        h.scheduler.tick(&frame(0));
        h.complete(1, "一");
        h.clock.advance(Duration::from_millis(600));
        h.scheduler.tick(&frame(1));

        assert!(h.scheduler.is_translating());
        assert_eq!(h.scheduler.latest().cycle, 1);
    }

    #[test]
    fn test_watchdog_abandons_hung_cycle() {
        let mut h = Harness::new(SchedulerConfig {
            interval: Duration::from_millis(500),
            cycle_timeout: Some(Duration::from_secs(10)),
        });
        h.scheduler.tick(&frame(0));

        h.clock.advance(Duration::from_secs(9));
        assert_eq!(h.scheduler.tick(&frame(1)), DispatchOutcome::Busy);

        h.clock.advance(Duration::from_secs(1));
        assert_eq!(h.scheduler.tick(&frame(2)), DispatchOutcome::Dispatched);

        assert_eq!(h.scheduler.abandoned_cycles(), 1);
        assert_eq!(h.workers.lock().unwrap().spawned, 2);
        assert_eq!(h.jobs(), vec![(1, 1, 0), (2, 2, 2)]);
    }

    #[test]
    fn test_late_result_from_abandoned_cycle_is_discarded() {
        let mut h = Harness::new(SchedulerConfig {
            interval: Duration::from_millis(500),
            cycle_timeout: Some(Duration::from_secs(1)),
        });
        h.scheduler.tick(&frame(0));
        h.clock.advance(Duration::from_secs(2));
        h.scheduler.poll();

        // The abandoned cycle finally finishes on its old slot handle.
        let stale = h.workers.lock().unwrap().slots[0].clone();
        assert!(!stale.publish(1, result_set(1, "古い")));
        assert!(h.scheduler.latest().is_empty());
    }

    #[test]
    fn test_refused_submit_respawns_worker() {
        let mut h = Harness::new(no_watchdog());
        h.workers.lock().unwrap().refuse = true;

        assert_eq!(h.scheduler.tick(&frame(0)), DispatchOutcome::Throttled);
        assert!(!h.scheduler.is_translating());
        assert_eq!(h.workers.lock().unwrap().spawned, 2);

        h.workers.lock().unwrap().refuse = false;
        h.clock.advance(Duration::from_millis(500));
        assert_eq!(h.scheduler.tick(&frame(1)), DispatchOutcome::Dispatched);
        assert_eq!(h.jobs(), vec![(2, 1, 1)]);
    }

    #[test]
    fn test_worker_dying_mid_cycle_is_replaced_without_watchdog() {
        let mut h = Harness::new(no_watchdog());
        h.scheduler.tick(&frame(0));
        h.workers.lock().unwrap().dead.push(1);

        h.clock.advance(Duration::from_millis(500));
        assert_eq!(h.scheduler.tick(&frame(1)), DispatchOutcome::Dispatched);

        assert_eq!(h.workers.lock().unwrap().spawned, 2);
        assert_eq!(h.jobs(), vec![(1, 1, 0), (2, 2, 1)]);
        assert_eq!(h.scheduler.abandoned_cycles(), 0);
    }

    #[test]
    fn test_idle_dead_worker_left_for_next_dispatch() {
        let mut h = Harness::new(no_watchdog());
        h.workers.lock().unwrap().dead.push(1);

        h.scheduler.poll();

        assert_eq!(h.workers.lock().unwrap().spawned, 1);
    }

    #[test]
    fn test_panicked_cycle_keeps_previous_results() {
        let mut h = Harness::new(no_watchdog());
        h.scheduler.tick(&frame(0));
        h.complete(1, "前");
        h.clock.advance(Duration::from_millis(500));
        h.scheduler.tick(&frame(1));
        {
            let mut w = h.workers.lock().unwrap();
            w.pending.push((
                1,
                CycleReport {
                    generation: 2,
                    outcome: CycleOutcome::Panicked,
                    elapsed: Duration::from_millis(5),
                },
            ));
        }

        h.scheduler.poll();

        assert_eq!(h.scheduler.state(), SchedulerState::Idle);
        assert_eq!(h.scheduler.latest().cycle, 1);
    }
}
