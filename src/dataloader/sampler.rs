use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Endless, reshuffling walk over the working set.
///
/// Index `visits % len` is handed out on every call and the whole set is reshuffled
/// in place each time a full pass completes, so every pass is an independent
/// permutation rather than a repeat of the first.
pub struct CyclicSampler<T> {
    samples: Vec<T>,
    rng: StdRng,
    visits: u64,
}

impl<T: Clone> CyclicSampler<T> {
    /// `samples` must not be empty; the manifest loader guarantees this.
    pub fn new(samples: Vec<T>, rng: StdRng) -> Self {
        debug_assert!(!samples.is_empty());
        CyclicSampler {
            samples,
            rng,
            visits: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn visits(&self) -> u64 {
        self.visits
    }

    /// Completed passes over the working set.
    pub fn passes(&self) -> u64 {
        self.visits / self.samples.len() as u64
    }

    pub fn next_sample(&mut self) -> T {
        let len = self.samples.len() as u64;
        let sample = self.samples[(self.visits % len) as usize].clone();
        self.visits += 1;
        if self.visits % len == 0 {
            self.samples.shuffle(&mut self.rng);
        }
        sample
    }
}

impl<T: Clone> Iterator for CyclicSampler<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        Some(self.next_sample())
    }
}
