//! Runtime configuration for the evaluation engines.

/// Default sample count at which inner loops move to the rayon pool.
pub const DEFAULT_MIN_SAMPLES_FOR_PARALLEL: usize = 10_000;

/// Configuration shared by the evaluator and both differentiation engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalConfig {
    /// Scan every node's values for NaN/infinity and stop as soon as one is found.
    ///
    /// The top-level scan of the final buffers happens regardless.
    pub early_exit: bool,
    /// Minimum number of samples before the per-sample loops run in parallel
    pub min_samples_for_parallel: usize,
    /// Minimum number of samples handed to a single rayon task
    pub chunk_size: Option<usize>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            early_exit: true,
            min_samples_for_parallel: DEFAULT_MIN_SAMPLES_FOR_PARALLEL,
            chunk_size: None,
        }
    }
}

impl EvalConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration that never leaves the calling thread.
    pub fn sequential() -> Self {
        Self {
            min_samples_for_parallel: usize::MAX,
            ..Self::default()
        }
    }

    /// Enable or disable per-node non-finite checks.
    pub fn with_early_exit(mut self, early_exit: bool) -> Self {
        self.early_exit = early_exit;
        self
    }

    /// Set the sample count at which loops go parallel.
    pub fn with_min_samples_for_parallel(mut self, min_samples: usize) -> Self {
        self.min_samples_for_parallel = min_samples;
        self
    }

    /// Set the minimum chunk per rayon task.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size.max(1));
        self
    }

    /// Check if a loop over `nsamples` samples should run in parallel.
    pub fn should_parallelize(&self, nsamples: usize) -> bool {
        nsamples >= self.min_samples_for_parallel
    }

    /// Minimum number of samples per rayon task.
    pub fn min_len(&self) -> usize {
        self.chunk_size.unwrap_or(1)
    }
}
