use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::config::FetcherConfig;
use super::error::FetcherError;

/// One line of the manifest after validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SampleRef {
    /// Label file; the image sits next to it with the image extension.
    Single { label_path: PathBuf },
    /// `label,image_1,image_2` as written in the manifest.
    Stereo {
        label_path: PathBuf,
        image_1: PathBuf,
        image_2: PathBuf,
    },
}

impl SampleRef {
    pub fn label_path(&self) -> &Path {
        match self {
            SampleRef::Single { label_path } => label_path,
            SampleRef::Stereo { label_path, .. } => label_path,
        }
    }

    /// File name handed to the consumer alongside the example.
    ///
    /// For stereo lines this is the last component of the whole line, which is the
    /// second image's file name.
    pub fn file_name(&self) -> String {
        let path = match self {
            SampleRef::Single { label_path } => label_path,
            SampleRef::Stereo { image_2, .. } => image_2,
        };
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn parse(line: &str, stereo: bool) -> Option<SampleRef> {
        if !stereo {
            let label_path = PathBuf::from(line);
            return label_path
                .is_file()
                .then_some(SampleRef::Single { label_path });
        }

        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        let [label, image_1, image_2] = parts.as_slice() else {
            return None;
        };
        let (label_path, image_1, image_2) = (
            PathBuf::from(*label),
            PathBuf::from(*image_1),
            PathBuf::from(*image_2),
        );
        if label_path.is_file() && image_1.is_file() && image_2.is_file() {
            Some(SampleRef::Stereo {
                label_path,
                image_1,
                image_2,
            })
        } else {
            None
        }
    }
}

/// Reads the manifest and keeps every line whose files exist.
///
/// Invalid lines are dropped without an error. The kept samples are shuffled once
/// with `rng` and then cut down to the configured cap.
pub fn load_working_set(
    manifest_path: &Path,
    config: &FetcherConfig,
    rng: &mut StdRng,
) -> Result<Vec<SampleRef>, FetcherError> {
    if !manifest_path.is_file() {
        return Err(FetcherError::ManifestNotFound(manifest_path.to_owned()));
    }

    let contents = std::fs::read_to_string(manifest_path)?;

    let mut skipped = 0usize;
    let mut samples: Vec<SampleRef> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let sample = SampleRef::parse(line, config.stereo);
            if sample.is_none() {
                debug!("Skipping manifest line with missing files: {}", line);
                skipped += 1;
            }
            sample
        })
        .collect();

    if samples.is_empty() {
        return Err(FetcherError::EmptyDataset(manifest_path.to_owned()));
    }

    samples.shuffle(rng);

    if let Some(cap) = config.effective_cap() {
        samples.truncate(cap);
    }

    debug!(
        "Loaded {} samples from {} ({} lines skipped)",
        samples.len(),
        manifest_path.display(),
        skipped
    );

    Ok(samples)
}
