use super::error::FetcherError;

/// What the worker does when a sample fails to load or transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SampleErrorPolicy {
    /// Push the error through the queue so `fetch()` re-raises it, then stop the worker.
    #[default]
    Propagate,
    /// Log the failure and move on to the next sample.
    Skip,
}

// TODO: Accept NonZeroUsize for queue_capacity and image dims once the CLI parses into them directly
#[derive(Clone, Debug)]
pub struct FetcherConfig {
    pub stereo: bool,
    pub sample_cap: Option<usize>,
    pub queue_capacity: usize,
    pub image_height: u32,
    pub image_width: u32,
    pub image_extension: String,
    pub shuffle_seed: Option<u64>,
    pub on_sample_error: SampleErrorPolicy,
}

impl FetcherConfig {
    pub fn build(self) -> Result<Self, FetcherError> {
        check_queue_capacity(self.queue_capacity)?;
        check_image_dims(self.image_height, self.image_width)?;
        check_extension("image_extension", &self.image_extension)?;

        Ok(self)
    }

    /// A cap of zero means no cap.
    pub fn effective_cap(&self) -> Option<usize> {
        self.sample_cap.filter(|&cap| cap > 0)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            stereo: false,
            sample_cap: None,
            queue_capacity: 64,
            image_height: 224,
            image_width: 224,
            image_extension: "png".to_string(),
            shuffle_seed: None,
            on_sample_error: SampleErrorPolicy::Propagate,
        }
    }
}

fn check_queue_capacity(capacity: usize) -> Result<(), FetcherError> {
    if capacity == 0 {
        return Err(FetcherError::InvalidConfig(
            "queue_capacity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn check_image_dims(height: u32, width: u32) -> Result<(), FetcherError> {
    if height == 0 || width == 0 {
        return Err(FetcherError::InvalidConfig(format!(
            "image dimensions must be non-zero, got {}x{}",
            height, width
        )));
    }
    Ok(())
}

fn check_extension(field: &str, ext: &str) -> Result<(), FetcherError> {
    if ext.is_empty() || ext.starts_with('.') {
        return Err(FetcherError::InvalidConfig(format!(
            "{} must be a bare extension like \"png\", got {:?}",
            field, ext
        )));
    }
    Ok(())
}
