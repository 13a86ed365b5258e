// Dataset trait — unified interface for any image source

use continua_core::{Image, Result};

/// A single sample: an image and its label.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub image: Image,
    /// Class index or regression target, stored as `f64`.
    pub label: f64,
}

impl Sample {
    pub fn new(image: Image, label: f64) -> Self {
        Self { image, label }
    }
}

/// A dataset is an indexed collection of samples.
///
/// Implementations must be `Send + Sync` so a transform holding one (e.g. a
/// background swap) can be shared across loader threads.
pub trait Dataset: Send + Sync {
    /// Total number of samples in the dataset.
    fn len(&self) -> usize;

    /// Whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve the sample at position `index`.
    ///
    /// Returns [`continua_core::Error::IndexOutOfRange`] if `index >= self.len()`.
    fn get(&self, index: usize) -> Result<Sample>;

    /// Optional human-readable name.
    fn name(&self) -> &str {
        "dataset"
    }
}
