use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetcherError {
    // Manifest and IO errors
    #[error("Manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("No valid samples found in manifest {}", .0.display())]
    EmptyDataset(PathBuf),

    #[error("Invalid fetcher config: {0}")]
    InvalidConfig(String),

    // Per sample failures raised by the worker and re-raised by fetch()
    #[error("Failed to load sample {}: {source}", .path.display())]
    Sample {
        path: PathBuf,
        #[source]
        source: Box<FetcherError>,
    },

    // Worker lifecycle
    #[error("Fetcher has not been started")]
    NotStarted,

    #[error("Fetcher has already been started")]
    AlreadyStarted,

    #[error("No sample loaded in a full pass over {attempts} samples")]
    NoLoadableSamples { attempts: usize },

    #[error("Worker thread exited and the queue is empty")]
    WorkerDisconnected,

    #[error("Worker thread panicked")]
    WorkerPanicked,

    #[error("Failed to spawn worker thread: {0}")]
    ThreadSpawn(std::io::Error),
}

pub type Result<T> = std::result::Result<T, FetcherError>;

impl FetcherError {
    pub fn for_sample(path: impl Into<PathBuf>, source: FetcherError) -> Self {
        FetcherError::Sample {
            path: path.into(),
            source: Box::new(source),
        }
    }
}
