use crate::upload::{UploadProgress, UploadStatus, progress::advance};

use std::{
    ops::RangeInclusive,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use rand::{Rng, RngCore, SeedableRng, rngs::StdRng};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, interval_at},
};
use tracing::{debug, info, instrument};

/// Timing and randomness bounds of a simulated upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSettings {
    /// Interval between progress ticks.
    pub tick: Duration,
    /// Range the failure threshold is drawn from. Values above 100 let the
    /// upload succeed.
    pub failure_threshold: RangeInclusive<u32>,
    /// Range each tick's increment is drawn from.
    pub step: RangeInclusive<u32>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(500),
            failure_threshold: 30..=89,
            step: 3..=12,
        }
    }
}

/// Simulates a long-running transfer that fails part-way at random.
///
/// Shares nothing with capture or storage. Every tick is checked against a
/// generation counter under the state lock, so once [`UploadSimulator::reset`]
/// returns no earlier run can change the state again.
pub struct UploadSimulator {
    settings: UploadSettings,
    rng: StdRng,
    state: Arc<watch::Sender<UploadProgress>>,
    generation: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl UploadSimulator {
    /// Creates an idle simulator seeded from OS entropy.
    pub fn new(settings: UploadSettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    /// Creates an idle simulator with a caller-supplied random source.
    pub fn with_rng(settings: UploadSettings, rng: StdRng) -> Self {
        let (state, _) = watch::channel(UploadProgress::default());

        Self {
            settings,
            rng,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    /// Current progress.
    pub fn progress(&self) -> UploadProgress {
        self.state.borrow().clone()
    }

    /// Whether a run is ticking.
    pub fn is_uploading(&self) -> bool {
        self.state.borrow().status == UploadStatus::Uploading
    }

    /// Receiver that observes every progress change.
    pub fn subscribe(&self) -> watch::Receiver<UploadProgress> {
        self.state.subscribe()
    }

    /// Starts a run from zero, cancelling any run in progress.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip(self))]
    pub fn start(&mut self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.abort_task();

        let threshold = sample(&mut self.rng, &self.settings.failure_threshold);
        let task_rng = StdRng::seed_from_u64(self.rng.next_u64());

        self.state.send_replace(UploadProgress::started());

        self.task = Some(tokio::spawn(run_upload(
            Arc::clone(&self.state),
            Arc::clone(&self.generation),
            generation,
            threshold,
            self.settings.clone(),
            task_rng,
        )));

        info!(threshold, "Upload started");
    }

    /// Cancels any pending tick and clears progress and failure.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.abort_task();
        self.state.send_replace(UploadProgress::default());
        debug!("Upload reset");
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for UploadSimulator {
    fn drop(&mut self) {
        self.abort_task();
    }
}

async fn run_upload(
    state: Arc<watch::Sender<UploadProgress>>,
    current_generation: Arc<AtomicU64>,
    generation: u64,
    threshold: u32,
    settings: UploadSettings,
    mut rng: StdRng,
) {
    let mut ticker = interval_at(Instant::now() + settings.tick, settings.tick);

    loop {
        ticker.tick().await;
        let step = sample(&mut rng, &settings.step);

        let mut finished = false;
        state.send_if_modified(|progress| {
            if current_generation.load(Ordering::SeqCst) != generation {
                finished = true;
                return false;
            }
            progress.apply(advance(progress.percent, step, threshold));
            finished = progress.status != UploadStatus::Uploading;
            true
        });

        if finished {
            let progress = state.borrow().clone();
            info!(status = ?progress.status, percent = progress.percent, "Upload finished");
            break;
        }
    }
}

/// Uniform draw from `range`, tolerating reversed bounds.
fn sample(rng: &mut StdRng, range: &RangeInclusive<u32>) -> u32 {
    let (low, high) = if range.start() <= range.end() {
        (*range.start(), *range.end())
    } else {
        (*range.end(), *range.start())
    };
    rng.gen_range(low..=high)
}
