use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};

use crate::pipeline::result_slot::ResultSlot;
use crate::pipeline::translate_worker::{
    CycleOutcome, CycleReport, TranslateJob, TranslateWorker, WorkerSpawner,
};
use crate::pipeline::translator::Translator;

pub type BuildError = Box<dyn std::error::Error + Send + Sync>;

/// Builds the translator a worker thread owns. Called again after a
/// panicking cycle and for every replacement worker.
pub type TranslatorFactory = Arc<dyn Fn() -> Result<Translator, BuildError> + Send + Sync>;

/// Runs translate cycles on one dedicated thread (a pool of size one).
///
/// Layout: `scheduler → [job] → worker → publish to slot → [report] → scheduler`
///
/// The thread is never joined. Dropping the handle closes the job channel;
/// the thread exits after its current cycle, if any.
pub struct ThreadedTranslateWorker {
    job_tx: Sender<TranslateJob>,
    report_rx: Receiver<CycleReport>,
    disconnected: bool,
}

impl ThreadedTranslateWorker {
    pub fn spawn(factory: TranslatorFactory, slot: Arc<ResultSlot>) -> Self {
        let (job_tx, job_rx) = crossbeam_channel::bounded::<TranslateJob>(1);
        let (report_tx, report_rx) = crossbeam_channel::unbounded::<CycleReport>();
        std::thread::spawn(move || run_worker(factory, slot, job_rx, report_tx));
        Self {
            job_tx,
            report_rx,
            disconnected: false,
        }
    }

    /// Spawner for [`PipelineScheduler`](crate::pipeline::pipeline_scheduler::PipelineScheduler)
    /// that starts a fresh threaded worker from `factory` each time.
    pub fn spawner(factory: TranslatorFactory) -> WorkerSpawner {
        Box::new(move |slot: Arc<ResultSlot>| {
            let worker: Box<dyn TranslateWorker> =
                Box::new(ThreadedTranslateWorker::spawn(Arc::clone(&factory), slot));
            worker
        })
    }
}

impl TranslateWorker for ThreadedTranslateWorker {
    fn submit(&mut self, job: TranslateJob) -> bool {
        match self.job_tx.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("Translate worker still has a queued job; refusing dispatch");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.disconnected = true;
                false
            }
        }
    }

    fn try_completed(&mut self) -> Option<CycleReport> {
        match self.report_rx.try_recv() {
            Ok(report) => Some(report),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.disconnected = true;
                None
            }
        }
    }

    fn is_alive(&self) -> bool {
        !self.disconnected
    }
}

fn run_worker(
    factory: TranslatorFactory,
    slot: Arc<ResultSlot>,
    job_rx: Receiver<TranslateJob>,
    report_tx: Sender<CycleReport>,
) {
    let Some(mut translator) = build(&factory) else {
        return;
    };

    for job in job_rx {
        let start = Instant::now();
        let mut exhausted = false;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            translator.process_frame(&job.frame, job.generation)
        }));

        let outcome = match result {
            Ok(results) => {
                let regions = results.len();
                if slot.publish(job.generation, results) {
                    CycleOutcome::Published { regions }
                } else {
                    CycleOutcome::Discarded
                }
            }
            Err(payload) => {
                log::error!(
                    "Translate cycle {} panicked: {}",
                    job.generation,
                    panic_message(payload.as_ref())
                );
                match build(&factory) {
                    Some(fresh) => translator = fresh,
                    None => exhausted = true,
                }
                CycleOutcome::Panicked
            }
        };

        let report = CycleReport {
            generation: job.generation,
            outcome,
            elapsed: start.elapsed(),
        };
        if report_tx.send(report).is_err() || exhausted {
            break;
        }
    }
}

fn build(factory: &TranslatorFactory) -> Option<Translator> {
    match factory() {
        Ok(translator) => Some(translator),
        Err(e) => {
            log::error!("Failed to build translator: {e}");
            None
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
