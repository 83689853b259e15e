use std::sync::Arc;
use std::time::Duration;

use crate::pipeline::result_slot::ResultSlot;
use crate::shared::frame::Frame;

/// One translate cycle handed to a worker.
pub struct TranslateJob {
    pub generation: u64,
    /// Owned snapshot; the render loop keeps drawing on its own frame.
    pub frame: Frame,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Results were swapped into the slot.
    Published { regions: usize },
    /// The cycle finished after being abandoned; its results were dropped.
    Discarded,
    /// The cycle panicked; nothing was published. Sent even when the worker
    /// exits afterwards.
    Panicked,
}

/// Completion notice sent back by a worker after each job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleReport {
    pub generation: u64,
    pub outcome: CycleOutcome,
    pub elapsed: Duration,
}

/// Domain interface for whatever runs translate cycles off the render path.
pub trait TranslateWorker: Send {
    /// Hands a job to the worker without blocking. Returns `false` if the
    /// worker can no longer accept work.
    fn submit(&mut self, job: TranslateJob) -> bool;

    /// Next completion report, if any, without blocking.
    fn try_completed(&mut self) -> Option<CycleReport>;

    /// `false` once the worker has stopped and will never report again.
    /// Only reflects what `try_completed` has observed so far.
    fn is_alive(&self) -> bool;
}

/// Builds a fresh worker publishing into the given slot.
pub type WorkerSpawner = Box<dyn Fn(Arc<ResultSlot>) -> Box<dyn TranslateWorker> + Send>;
