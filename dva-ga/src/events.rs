//! Worker to host event stream and host to worker commands (spec section
//! 6, "External interfaces").

use crate::metrics::{BenchmarkRecord, GenerationMetrics};

/// Typed events posted from the worker thread to the host, strictly
/// ordered: `GenerationMetrics` generations increase monotonically,
/// `Progress` percentages never decrease.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Progress(u8),
    Status(String),
    GenerationMetrics(GenerationMetrics),
    Benchmark(BenchmarkRecord),
    /// Terminal: best individual, its (cache-bypassing) fitness, and the
    /// full metrics history.
    Finished { best_genes: Vec<f64>, best_fitness: f64, history: Vec<GenerationMetrics> },
    /// Terminal: a run-level error ended the worker.
    Error(String),
}

/// Host-held idempotent flags the worker polls at its checkpoints (spec
/// section 5, "Suspension points"). `pause`/`resume` share one boolean
/// guarded by a condvar so the worker can block without busy-waiting;
/// `abort` is a plain atomic since it is only ever set, never unset.
pub struct WorkerHandle {
    paused: std::sync::Arc<(std::sync::Mutex<bool>, std::sync::Condvar)>,
    aborted: std::sync::Arc<std::sync::atomic::AtomicBool>,
    events: std::sync::mpsc::Receiver<WorkerEvent>,
    join: Option<std::thread::JoinHandle<()>>,
}

impl WorkerHandle {
    pub(crate) fn new(
        paused: std::sync::Arc<(std::sync::Mutex<bool>, std::sync::Condvar)>,
        aborted: std::sync::Arc<std::sync::atomic::AtomicBool>,
        events: std::sync::mpsc::Receiver<WorkerEvent>,
        join: std::thread::JoinHandle<()>,
    ) -> Self {
        WorkerHandle { paused, aborted, events, join: Some(join) }
    }

    /// Idempotent: setting pause while already paused is a no-op.
    pub fn pause(&self) {
        let (lock, cvar) = &*self.paused;
        let mut guard = lock.lock().unwrap();
        *guard = true;
        cvar.notify_all();
    }

    /// Idempotent: resuming an already-running worker is a no-op.
    pub fn resume(&self) {
        let (lock, cvar) = &*self.paused;
        let mut guard = lock.lock().unwrap();
        *guard = false;
        cvar.notify_all();
    }

    /// Idempotent: aborting an already-aborted worker is a no-op.
    pub fn abort(&self) {
        self.aborted.store(true, std::sync::atomic::Ordering::SeqCst);
        self.resume(); // wake a paused worker so it can observe the abort.
    }

    /// Blocking receive of the next event.
    pub fn recv(&self) -> Option<WorkerEvent> {
        self.events.recv().ok()
    }

    /// Non-blocking receive; `None` if no event is queued yet.
    pub fn try_recv(&self) -> Option<WorkerEvent> {
        self.events.try_recv().ok()
    }

    /// Block until the worker thread has fully exited (after a terminal
    /// event has been observed). Joining twice is a no-op.
    pub fn join(&mut self) {
        if let Some(handle) = self.join.take() {
            let _ = handle.join();
        }
    }
}
