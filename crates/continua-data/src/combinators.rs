// Dataset Combinators — in-memory storage, subsets, lazy transforms

use std::sync::Arc;

use continua_core::{Error, Image, Result};

use crate::dataset::{Dataset, Sample};
use crate::transform::Transform;

// InMemoryDataset — samples held in a Vec

/// A simple in-memory dataset backed by a `Vec<Sample>`.
///
/// Useful for synthetic backgrounds (constant colours, noise) and tests.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    samples: Vec<Sample>,
    dataset_name: String,
}

impl InMemoryDataset {
    /// Create an InMemoryDataset from a vector of samples.
    pub fn new(samples: Vec<Sample>, name: &str) -> Self {
        Self {
            samples,
            dataset_name: name.to_string(),
        }
    }

    /// Build from a flat `[N, H, W, C]` (or `[N, H, W]`) buffer.
    ///
    /// `image_dims` is the per-image shape (`[H, W, C]` or `[H, W]`); every
    /// image becomes a channel-last host array. `labels` must hold `N` values.
    pub fn from_flat(
        data: &[f64],
        image_dims: &[usize],
        labels: &[f64],
        name: &str,
    ) -> Result<Self> {
        let per_image: usize = image_dims.iter().product();
        if per_image == 0 || data.len() % per_image != 0 {
            return Err(Error::msg(format!(
                "InMemoryDataset: {} values cannot be split into images of shape {:?}",
                data.len(),
                image_dims
            )));
        }
        let n = data.len() / per_image;
        if labels.len() != n {
            return Err(Error::msg(format!(
                "InMemoryDataset: {} images but {} labels",
                n,
                labels.len()
            )));
        }

        let samples = data
            .chunks_exact(per_image)
            .zip(labels)
            .map(|(chunk, &label)| {
                Ok(Sample::new(Image::array(chunk.to_vec(), image_dims)?, label))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(samples, name))
    }
}

impl Dataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        self.samples
            .get(index)
            .cloned()
            .ok_or(Error::IndexOutOfRange {
                index,
                len: self.samples.len(),
            })
    }

    fn name(&self) -> &str {
        &self.dataset_name
    }
}

// SubsetDataset — view of selected indices

/// A dataset that exposes only the samples at the given indices.
pub struct SubsetDataset<D: Dataset> {
    inner: D,
    indices: Vec<usize>,
}

impl<D: Dataset> SubsetDataset<D> {
    /// Create a subset of `inner` containing only the samples at `indices`.
    ///
    /// Indices are checked lazily, at `get` time.
    pub fn new(inner: D, indices: Vec<usize>) -> Self {
        Self { inner, indices }
    }
}

impl<D: Dataset> Dataset for SubsetDataset<D> {
    fn len(&self) -> usize {
        self.indices.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        let inner_index = *self.indices.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.indices.len(),
        })?;
        self.inner.get(inner_index)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

// MapDataset — apply a transform lazily

/// Wraps a dataset and applies a `Transform` to each image on `get()`.
///
/// The transform is shared, so the same (stateful-RNG) background swap can
/// feed several datasets.
pub struct MapDataset<D: Dataset> {
    inner: D,
    transform: Arc<dyn Transform>,
}

impl<D: Dataset> MapDataset<D> {
    pub fn new(inner: D, transform: Arc<dyn Transform>) -> Self {
        Self { inner, transform }
    }
}

impl<D: Dataset> Dataset for MapDataset<D> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        let sample = self.inner.get(index)?;
        Ok(Sample {
            image: self.transform.apply(sample.image)?,
            label: sample.label,
        })
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

// Tests
