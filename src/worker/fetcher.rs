use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, warn};

use crate::dataloader::config::{FetcherConfig, SampleErrorPolicy};
use crate::dataloader::error::{FetcherError, Result};
use crate::dataloader::example::{LoadedExample, SampleLoader};
use crate::dataloader::manifest::{load_working_set, SampleRef};
use crate::dataloader::sampler::CyclicSampler;

type QueueItem = Result<LoadedExample>;

/// Background prefetcher: one worker thread loading samples into a bounded queue.
///
/// Built with `new`, started with `start`, drained with `fetch` and stopped with
/// `shutdown`. `shutdown` does not wait for the worker, call `join` for that.
/// Dropping the fetcher does both.
///
/// A push already in flight when `shutdown` runs can land in the queue after the
/// drain. `fetch` checks the stop flag first so that item is never handed out.
///
/// In stereo mode the worker decodes both views through `rayon::join`, so rayon's
/// global pool runs next to the worker thread.
pub struct DataFetcher {
    manifest_path: PathBuf,
    config: FetcherConfig,
    len: usize,
    sampler: Option<CyclicSampler<SampleRef>>,
    loader: SampleLoader,
    stopped: Arc<AtomicBool>,
    receiver: Option<Receiver<QueueItem>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl DataFetcher {
    pub fn new(manifest_path: impl AsRef<Path>, config: Option<FetcherConfig>) -> Result<Self> {
        let manifest_path = manifest_path.as_ref().to_owned();
        let mut config = config.unwrap_or_default().build()?;

        // Record the seed so a run can be replayed
        let seed = *config
            .shuffle_seed
            .get_or_insert_with(|| rand::thread_rng().gen());
        let mut rng = StdRng::seed_from_u64(seed);

        let samples = load_working_set(&manifest_path, &config, &mut rng)?;
        let len = samples.len();

        info!(
            "Fetcher ready: {} samples from {} (stereo: {}, seed: {})",
            len,
            manifest_path.display(),
            config.stereo,
            seed
        );

        Ok(DataFetcher {
            loader: SampleLoader::new(&config),
            manifest_path,
            config,
            len,
            sampler: Some(CyclicSampler::new(samples, rng)),
            stopped: Arc::new(AtomicBool::new(false)),
            receiver: None,
            thread: None,
        })
    }

    pub fn start(&mut self) -> Result<()> {
        let sampler = self.sampler.take().ok_or(FetcherError::AlreadyStarted)?;

        let (sender, receiver) = bounded(self.config.queue_capacity);
        let loader = self.loader.clone();
        let stopped = Arc::clone(&self.stopped);
        let policy = self.config.on_sample_error;

        let thread = thread::Builder::new()
            .name("mesh-fetcher".to_string())
            .spawn(move || run_worker(sampler, loader, sender, stopped, policy))
            .map_err(FetcherError::ThreadSpawn)?;

        self.receiver = Some(receiver);
        self.thread = Some(thread);
        Ok(())
    }

    /// Next example, blocking until the worker produces one.
    ///
    /// `Ok(None)` once shut down. Errors recorded by the worker are re-raised here.
    pub fn fetch(&self) -> Result<Option<LoadedExample>> {
        if self.is_stopped() {
            return Ok(None);
        }
        let receiver = self.receiver.as_ref().ok_or(FetcherError::NotStarted)?;

        match receiver.recv() {
            Ok(item) => item.map(Some),
            Err(_) => self.disconnected(),
        }
    }

    /// Like `fetch`, but gives up with `Ok(None)` after `timeout`.
    pub fn fetch_timeout(&self, timeout: Duration) -> Result<Option<LoadedExample>> {
        if self.is_stopped() {
            return Ok(None);
        }
        let receiver = self.receiver.as_ref().ok_or(FetcherError::NotStarted)?;

        match receiver.recv_timeout(timeout) {
            Ok(item) => item.map(Some),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => self.disconnected(),
        }
    }

    /// Sets the stop flag and empties the queue so a blocked worker can finish its push.
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::Release);

        let drained = self
            .receiver
            .as_ref()
            .map(|receiver| receiver.try_iter().count())
            .unwrap_or(0);
        debug!("Fetcher shutdown, drained {} queued examples", drained);
    }

    /// Waits for the worker thread to exit. Call `shutdown` first or this blocks forever.
    pub fn join(&mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| FetcherError::WorkerPanicked)?;
        }
        Ok(())
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn is_started(&self) -> bool {
        self.receiver.is_some()
    }

    /// Size of the working set, never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    fn disconnected(&self) -> Result<Option<LoadedExample>> {
        // The worker also exits when shutdown races a blocking recv
        if self.is_stopped() {
            Ok(None)
        } else {
            Err(FetcherError::WorkerDisconnected)
        }
    }
}

impl Drop for DataFetcher {
    fn drop(&mut self) {
        self.shutdown();
        // Without a receiver any further send fails and the worker returns
        self.receiver.take();
        if let Err(e) = self.join() {
            error!("Fetcher worker did not exit cleanly: {}", e);
        }
    }
}

fn run_worker(
    mut sampler: CyclicSampler<SampleRef>,
    loader: SampleLoader,
    sender: Sender<QueueItem>,
    stopped: Arc<AtomicBool>,
    policy: SampleErrorPolicy,
) {
    debug!("Fetcher worker starting with {} samples", sampler.len());

    // A pass without a single loaded sample means nothing in the working set loads
    let mut loaded_this_pass = false;

    while !stopped.load(Ordering::Acquire) {
        let sample = sampler.next_sample();

        let example = match loader.load(&sample) {
            Ok(example) => Some(example),
            Err(e) if policy == SampleErrorPolicy::Skip => {
                warn!("Skipping sample: {}", e);
                None
            }
            Err(e) => {
                error!("Fetcher worker stopping: {}", e);
                // Best effort, the consumer may already be gone
                let _ = sender.send(Err(e));
                break;
            }
        };

        if let Some(example) = example {
            loaded_this_pass = true;
            if sender.send(Ok(example)).is_err() {
                debug!("Fetcher: consumer dropped, stopping");
                break;
            }
        }

        if sampler.visits() % sampler.len() as u64 == 0 {
            if !loaded_this_pass {
                error!("Fetcher worker stopping: no sample loaded in a full pass");
                let _ = sender.send(Err(FetcherError::NoLoadableSamples {
                    attempts: sampler.len(),
                }));
                break;
            }
            debug!("Fetcher finished pass {}, reshuffled", sampler.passes());
            loaded_this_pass = false;
        }
    }

    debug!(
        "Fetcher worker stopped after {} visits ({} passes)",
        sampler.visits(),
        sampler.passes()
    );
}
