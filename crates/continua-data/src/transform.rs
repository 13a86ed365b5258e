// Transform — per-sample preprocessing / augmentation pipeline

use continua_core::{ChannelLayout, Error, Image, ImageKind, Result};

/// A transform applied to each image as it flows through a pipeline.
pub trait Transform: Send + Sync {
    /// Apply the transform to an image, returning the new image.
    fn apply(&self, image: Image) -> Result<Image>;
}

/// Any closure over images is a transform.
impl<F> Transform for F
where
    F: Fn(Image) -> Result<Image> + Send + Sync,
{
    fn apply(&self, image: Image) -> Result<Image> {
        self(image)
    }
}

// Built-in transforms

/// Divide every value by a scale factor.
///
/// Commonly used for raw pixels: `Normalize::new(255.0)`.
#[derive(Debug, Clone)]
pub struct Normalize {
    scale: f64,
}

impl Normalize {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }
}

impl Transform for Normalize {
    fn apply(&self, mut image: Image) -> Result<Image> {
        for v in image.data_mut() {
            *v /= self.scale;
        }
        Ok(image)
    }
}

/// Per-channel standardization: `x' = (x - mean[c]) / std[c]`.
///
/// A single mean/std pair is broadcast over every channel.
#[derive(Debug, Clone)]
pub struct Standardize {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Standardize {
    pub fn new(mean: f64, std: f64) -> Self {
        Self {
            mean: vec![mean],
            std: vec![std],
        }
    }

    pub fn per_channel(mean: Vec<f64>, std: Vec<f64>) -> Self {
        Self { mean, std }
    }

    fn stats_for(&self, channel: usize) -> Result<(f64, f64)> {
        let pick = |v: &[f64]| {
            if v.len() == 1 {
                Some(v[0])
            } else {
                v.get(channel).copied()
            }
        };
        match (pick(&self.mean), pick(&self.std)) {
            (Some(m), Some(s)) => Ok((m, s)),
            _ => Err(Error::msg(format!(
                "Standardize: no statistics for channel {} (have {} means, {} stds)",
                channel,
                self.mean.len(),
                self.std.len()
            ))),
        }
    }
}

impl Transform for Standardize {
    fn apply(&self, mut image: Image) -> Result<Image> {
        let (h, w) = image.spatial();
        for c in 0..image.channels() {
            let (mean, std) = self.stats_for(c)?;
            for y in 0..h {
                for x in 0..w {
                    let i = image.offset(c, y, x);
                    let v = &mut image.data_mut()[i];
                    *v = (*v - mean) / std;
                }
            }
        }
        Ok(image)
    }
}

/// Convert a host array into a channel-first tensor.
///
/// `[H, W]` becomes `[1, H, W]`, `[H, W, C]` becomes `[C, H, W]`. With a
/// scale set, values are divided by it on the way (raw 0..255 pixels → [0, 1]).
#[derive(Debug, Clone, Default)]
pub struct ToTensor {
    scale: Option<f64>,
}

impl ToTensor {
    pub fn new() -> Self {
        Self { scale: None }
    }

    pub fn scaled(scale: f64) -> Self {
        Self { scale: Some(scale) }
    }
}

impl Transform for ToTensor {
    fn apply(&self, image: Image) -> Result<Image> {
        let mut out = image
            .to_layout(ChannelLayout::First)?
            .with_kind(ImageKind::Tensor);
        if let Some(scale) = self.scale {
            for v in out.data_mut() {
                *v /= scale;
            }
        }
        Ok(out)
    }
}

/// Convert a tensor back into a channel-last host array `[H, W, C]`.
#[derive(Debug, Clone, Default)]
pub struct ToArray;

impl Transform for ToArray {
    fn apply(&self, image: Image) -> Result<Image> {
        Ok(image
            .to_layout(ChannelLayout::Last)?
            .with_kind(ImageKind::Array))
    }
}

/// Chain multiple transforms.
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }
}

impl Transform for Compose {
    fn apply(&self, mut image: Image) -> Result<Image> {
        for t in &self.transforms {
            image = t.apply(image)?;
        }
        Ok(image)
    }
}
