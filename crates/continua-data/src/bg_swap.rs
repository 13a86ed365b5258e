// BackgroundSwap — composite a foreground onto a random background image
//
// Dark foreground locations (every channel <= threshold) are replaced with
// the pixels of a background drawn uniformly from a secondary dataset. The
// background is fitted to `input_dim` (bilinear resize, or a random crop when
// `crop_bg` is set and the image is large enough), normalized, and brought to
// the foreground's channel count before compositing.
//
// The output always has the foreground's shape, layout and kind, and owns a
// fresh buffer.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use continua_core::{Error, Image, Result, Shape};

use crate::dataset::Dataset;
use crate::resize::{crop, resize_bilinear};
use crate::transform::{Standardize, Transform};

/// Mean used by [`BgNormalize::Default`].
pub const DEFAULT_BG_MEAN: f64 = 0.1307;
/// Standard deviation used by [`BgNormalize::Default`].
pub const DEFAULT_BG_STD: f64 = 0.3081;

/// How a sampled background is normalized before compositing.
pub enum BgNormalize {
    /// Standardize every channel with [`DEFAULT_BG_MEAN`] / [`DEFAULT_BG_STD`].
    Default,
    /// Use background pixels as they come out of the dataset.
    Identity,
    /// Caller-supplied transform. Its errors are returned unchanged.
    Custom(Box<dyn Transform>),
}

impl BgNormalize {
    fn apply(&self, image: Image) -> Result<Image> {
        match self {
            BgNormalize::Default => {
                Standardize::new(DEFAULT_BG_MEAN, DEFAULT_BG_STD).apply(image)
            }
            BgNormalize::Identity => Ok(image),
            BgNormalize::Custom(t) => t.apply(image),
        }
    }
}

impl std::fmt::Debug for BgNormalize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BgNormalize::Default => write!(f, "Default"),
            BgNormalize::Identity => write!(f, "Identity"),
            BgNormalize::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Configuration for [`BackgroundSwap`].
#[derive(Debug, Clone)]
pub struct BackgroundSwapConfig {
    /// Spatial size `(height, width)` backgrounds are fitted to. Foregrounds
    /// must already have this size.
    pub input_dim: (usize, usize),
    /// A foreground location is replaced when all its channels are `<=` this.
    pub threshold: f64,
    /// Take a random `input_dim` window from large backgrounds instead of
    /// resizing them.
    pub crop_bg: bool,
}

impl Default for BackgroundSwapConfig {
    fn default() -> Self {
        Self {
            input_dim: (28, 28),
            threshold: 0.5,
            crop_bg: false,
        }
    }
}

impl BackgroundSwapConfig {
    pub fn input_dim(mut self, height: usize, width: usize) -> Self {
        self.input_dim = (height, width);
        self
    }

    pub fn threshold(mut self, t: f64) -> Self {
        self.threshold = t;
        self
    }

    pub fn crop_bg(mut self, c: bool) -> Self {
        self.crop_bg = c;
        self
    }
}

/// Random choices for one composite: which background, and where to crop.
#[derive(Debug, Clone, Copy)]
struct Draw {
    index: usize,
    /// Crop position as fractions of the free range, each in `[0, 1)`.
    crop_at: (f64, f64),
}

/// Replace the dark parts of a foreground with a randomly drawn background.
///
/// # Examples
/// ```ignore
/// let swap = BackgroundSwap::seeded(
///     Arc::new(cifar),
///     BackgroundSwapConfig::default().input_dim(28, 28),
///     BgNormalize::Default,
///     42,
/// )?;
/// let composite = swap.apply(mnist_digit)?;
/// ```
pub struct BackgroundSwap<R = StdRng> {
    backgrounds: Arc<dyn Dataset>,
    config: BackgroundSwapConfig,
    normalize: BgNormalize,
    rng: Mutex<R>,
}

impl BackgroundSwap<StdRng> {
    /// Convenience constructor with a `StdRng` seeded from `seed`.
    pub fn seeded(
        backgrounds: Arc<dyn Dataset>,
        config: BackgroundSwapConfig,
        normalize: BgNormalize,
        seed: u64,
    ) -> Result<Self> {
        Self::new(backgrounds, config, normalize, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> BackgroundSwap<R> {
    /// Create a background swap drawing from `backgrounds` with `rng`.
    ///
    /// Fails with [`Error::EmptyDataset`] if there is nothing to draw from.
    pub fn new(
        backgrounds: Arc<dyn Dataset>,
        config: BackgroundSwapConfig,
        normalize: BgNormalize,
        rng: R,
    ) -> Result<Self> {
        if backgrounds.is_empty() {
            return Err(Error::EmptyDataset(backgrounds.name().to_string()));
        }
        let (h, w) = config.input_dim;
        if h == 0 || w == 0 {
            return Err(Error::msg(format!(
                "BackgroundSwap: input_dim must be non-zero, got {}x{}",
                h, w
            )));
        }
        log::debug!(
            "BackgroundSwap over '{}' ({} images), input_dim {}x{}, threshold {}, normalize {:?}",
            backgrounds.name(),
            backgrounds.len(),
            h,
            w,
            config.threshold,
            normalize
        );
        Ok(Self {
            backgrounds,
            config,
            normalize,
            rng: Mutex::new(rng),
        })
    }

    pub fn config(&self) -> &BackgroundSwapConfig {
        &self.config
    }

    /// Composite using `rng` for the draw instead of the stored generator.
    pub fn apply_with_rng<G: Rng>(&self, foreground: Image, rng: &mut G) -> Result<Image> {
        self.check_foreground(&foreground)?;
        let draw = self.draw(rng);
        self.threshold_composite(foreground, draw)
    }

    /// Composite with a caller-provided mask instead of the threshold.
    ///
    /// `keep` holds one entry per spatial location, row-major: `true` keeps the
    /// foreground pixel, `false` takes the background.
    pub fn apply_with_mask(&self, foreground: Image, keep: &[bool]) -> Result<Image> {
        self.check_foreground(&foreground)?;
        let (h, w) = foreground.spatial();
        if keep.len() != h * w {
            return Err(Error::ShapeMismatch {
                expected: Shape::from((h, w)),
                got: Shape::new(vec![keep.len()]),
            });
        }
        let draw = self.draw(&mut *self.rng.lock());
        let background = self.background(draw, foreground.channels())?;
        Ok(composite(&foreground, &background, |fg, y, x| {
            !keep[y * fg.width() + x]
        }))
    }

    fn threshold_composite(&self, foreground: Image, draw: Draw) -> Result<Image> {
        let background = self.background(draw, foreground.channels())?;
        let threshold = self.config.threshold;
        Ok(composite(&foreground, &background, |fg, y, x| {
            (0..fg.channels()).all(|c| fg.at(c, y, x) <= threshold)
        }))
    }

    fn check_foreground(&self, fg: &Image) -> Result<()> {
        let channels = fg.channels();
        if channels != 1 && channels != 3 {
            return Err(Error::UnsupportedChannels { channels });
        }
        if fg.spatial() != self.config.input_dim {
            return Err(Error::ShapeMismatch {
                expected: Shape::from(self.config.input_dim),
                got: Shape::from(fg.spatial()),
            });
        }
        Ok(())
    }

    fn draw<G: Rng>(&self, rng: &mut G) -> Draw {
        let index = rng.gen_range(0..self.backgrounds.len());
        let crop_at = if self.config.crop_bg {
            (rng.gen::<f64>(), rng.gen::<f64>())
        } else {
            (0.0, 0.0)
        };
        log::trace!("BackgroundSwap: drew background {}", index);
        Draw { index, crop_at }
    }

    /// Fetch, fit, normalize and channel-match the drawn background.
    /// Returns one `h * w` plane per foreground channel.
    fn background(&self, draw: Draw, channels: usize) -> Result<Vec<Vec<f64>>> {
        let image = self.backgrounds.get(draw.index)?.image;
        let bg_channels = image.channels();
        if bg_channels != 1 && bg_channels != 3 {
            return Err(Error::UnsupportedChannels {
                channels: bg_channels,
            });
        }

        let (h, w) = self.config.input_dim;
        let (bg_h, bg_w) = image.spatial();
        let fitted = if self.config.crop_bg && bg_h >= h && bg_w >= w {
            let y0 = ((draw.crop_at.0 * (bg_h - h + 1) as f64) as usize).min(bg_h - h);
            let x0 = ((draw.crop_at.1 * (bg_w - w + 1) as f64) as usize).min(bg_w - w);
            crop(&image, (y0, x0), (h, w))?
        } else {
            resize_bilinear(&image, (h, w))?
        };

        let normalized = self.normalize.apply(fitted)?;
        if normalized.spatial() != (h, w) {
            return Err(Error::ShapeMismatch {
                expected: Shape::from((h, w)),
                got: Shape::from(normalized.spatial()),
            });
        }

        let planes = normalized.planes();
        Ok(match (planes.len(), channels) {
            (a, b) if a == b => planes,
            (1, 3) => vec![planes[0].clone(), planes[0].clone(), planes[0].clone()],
            // A grayscale foreground takes the first background channel, so
            // every replaced pixel is a real background value.
            (3, 1) => planes.into_iter().take(1).collect(),
            (got, _) => return Err(Error::UnsupportedChannels { channels: got }),
        })
    }
}

/// Copy `fg`, overwriting every location where `replace` holds with the
/// background planes.
fn composite<F>(fg: &Image, bg: &[Vec<f64>], replace: F) -> Image
where
    F: Fn(&Image, usize, usize) -> bool,
{
    let (h, w) = fg.spatial();
    let mut out = fg.clone();
    for y in 0..h {
        for x in 0..w {
            if replace(fg, y, x) {
                for (c, plane) in bg.iter().enumerate() {
                    let i = fg.offset(c, y, x);
                    out.data_mut()[i] = plane[y * w + x];
                }
            }
        }
    }
    out
}

impl<R: Rng + Send> Transform for BackgroundSwap<R> {
    fn apply(&self, image: Image) -> Result<Image> {
        self.check_foreground(&image)?;
        // Only the draw happens under the lock.
        let draw = self.draw(&mut *self.rng.lock());
        self.threshold_composite(image, draw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::InMemoryDataset;
    use crate::dataset::Sample;
    use continua_core::{ChannelLayout, ImageKind};

    fn constant_backgrounds(values: &[f64], dims: &[usize]) -> Arc<dyn Dataset> {
        let samples = values
            .iter()
            .map(|&v| {
                let n: usize = dims.iter().product();
                Sample::new(Image::array(vec![v; n], dims).unwrap(), 0.0)
            })
            .collect();
        Arc::new(InMemoryDataset::new(samples, "constant"))
    }

    fn swap(bg: Arc<dyn Dataset>, dim: usize, normalize: BgNormalize) -> BackgroundSwap {
        BackgroundSwap::seeded(
            bg,
            BackgroundSwapConfig::default().input_dim(dim, dim),
            normalize,
            7,
        )
        .unwrap()
    }

    #[test]
    fn bright_foreground_is_untouched() {
        let s = swap(constant_backgrounds(&[-1.0], &[5, 5, 3]), 5, BgNormalize::Identity);
        let fg = Image::array(vec![0.6; 25], &[5, 5]).unwrap();
        let out = s.apply(fg.clone()).unwrap();
        assert_eq!(out, fg);
    }

    #[test]
    fn dark_foreground_is_fully_replaced() {
        let s = swap(constant_backgrounds(&[-1.0], &[5, 5, 3]), 5, BgNormalize::Identity);
        let fg = Image::array(vec![0.3; 25], &[5, 5]).unwrap();
        let out = s.apply(fg).unwrap();
        assert_eq!(out.shape().dims(), &[5, 5]);
        assert!(out.data().iter().all(|&v| v == -1.0));
    }

    #[test]
    fn grayscale_foreground_takes_first_background_channel() {
        // channels (-1, -2, -3) at every location
        let bg = Image::array(
            (0..25).flat_map(|_| [-1.0, -2.0, -3.0]).collect(),
            &[5, 5, 3],
        )
        .unwrap();
        let ds: Arc<dyn Dataset> =
            Arc::new(InMemoryDataset::new(vec![Sample::new(bg, 0.0)], "rgb"));
        let s = swap(ds, 5, BgNormalize::Identity);
        let fg = Image::array(vec![0.3; 25], &[5, 5]).unwrap();
        let out = s.apply(fg).unwrap();
        assert_eq!(out.shape().dims(), &[5, 5]);
        assert!(out.data().iter().all(|&v| v == -1.0));
    }

    #[test]
    fn default_normalization_standardizes_background() {
        let s = swap(constant_backgrounds(&[1.0], &[5, 5, 1]), 5, BgNormalize::Default);
        let fg = Image::array(vec![0.0; 25], &[5, 5]).unwrap();
        let out = s.apply(fg).unwrap();
        let expected = (1.0 - DEFAULT_BG_MEAN) / DEFAULT_BG_STD;
        assert!(out.data().iter().all(|&v| (v - expected).abs() < 1e-12));
    }

    #[test]
    fn mixed_foreground_matches_mask() {
        let s = swap(constant_backgrounds(&[-1.0], &[8, 8, 3]), 4, BgNormalize::Identity);
        let fg_data: Vec<f64> = (0..16).map(|i| if i % 2 == 0 { 0.9 } else { 0.1 }).collect();
        let fg = Image::array(fg_data.clone(), &[4, 4]).unwrap();
        let out = s.apply(fg).unwrap();
        for (o, f) in out.data().iter().zip(&fg_data) {
            if *f <= 0.5 {
                assert!((o + 1.0).abs() < 1e-12);
            } else {
                assert_eq!(o, f);
            }
        }
    }

    #[test]
    fn location_replaced_only_when_all_channels_dark() {
        let s = BackgroundSwap::seeded(
            constant_backgrounds(&[-1.0], &[2, 1, 3]),
            BackgroundSwapConfig::default().input_dim(2, 1),
            BgNormalize::Identity,
            1,
        )
        .unwrap();
        // pixel 0: all dark -> replaced; pixel 1: red channel bright -> kept
        let fg = Image::array(vec![0.1, 0.1, 0.1, 0.9, 0.1, 0.1], &[2, 1, 3]).unwrap();
        let out = s.apply(fg).unwrap();
        assert_eq!(out.data(), &[-1.0, -1.0, -1.0, 0.9, 0.1, 0.1]);
    }

    #[test]
    fn tensor_in_tensor_out() {
        let s = swap(constant_backgrounds(&[0.25], &[32, 32, 3]), 28, BgNormalize::Identity);
        let fg = Image::filled(0.0, (3, 28, 28), ChannelLayout::First, ImageKind::Tensor).unwrap();
        let out = s.apply(fg).unwrap();
        assert_eq!(out.kind(), ImageKind::Tensor);
        assert_eq!(out.layout(), ChannelLayout::First);
        assert_eq!(out.shape().dims(), &[3, 28, 28]);
        assert!(out.data().iter().all(|&v| v == 0.25));
    }

    #[test]
    fn unsupported_channels_rejected() {
        let s = swap(constant_backgrounds(&[0.0], &[5, 5, 3]), 5, BgNormalize::Identity);
        let fg = Image::array(vec![0.0; 50], &[5, 5, 2]).unwrap();
        let err = s.apply(fg).unwrap_err();
        assert!(matches!(err, Error::UnsupportedChannels { channels: 2 }));
        assert!(err.is_shape_error());
    }

    #[test]
    fn foreground_size_must_match_input_dim() {
        let s = swap(constant_backgrounds(&[0.0], &[5, 5, 3]), 5, BgNormalize::Identity);
        let fg = Image::array(vec![0.0; 16], &[4, 4]).unwrap();
        assert!(matches!(s.apply(fg), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn empty_background_dataset_rejected() {
        let empty: Arc<dyn Dataset> = Arc::new(InMemoryDataset::new(Vec::new(), "none"));
        let res = BackgroundSwap::seeded(
            empty,
            BackgroundSwapConfig::default(),
            BgNormalize::Identity,
            0,
        );
        assert!(matches!(res, Err(Error::EmptyDataset(name)) if name == "none"));
    }

    #[test]
    fn custom_normalization_error_propagates() {
        let failing = |_: Image| -> Result<Image> { Err(Error::msg("normalize failed")) };
        let s = swap(
            constant_backgrounds(&[0.0], &[5, 5, 3]),
            5,
            BgNormalize::Custom(Box::new(failing)),
        );
        let fg = Image::array(vec![0.0; 25], &[5, 5]).unwrap();
        assert!(matches!(s.apply(fg), Err(Error::Msg(m)) if m == "normalize failed"));
    }

    #[test]
    fn explicit_mask_overrides_threshold() {
        let s = swap(constant_backgrounds(&[-1.0], &[2, 2]), 2, BgNormalize::Identity);
        let fg = Image::array(vec![0.9; 4], &[2, 2]).unwrap();
        let out = s
            .apply_with_mask(fg.clone(), &[true, false, false, true])
            .unwrap();
        assert_eq!(out.data(), &[0.9, -1.0, -1.0, 0.9]);
        assert!(matches!(
            s.apply_with_mask(fg, &[true; 3]),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn crop_takes_window_from_large_background() {
        // 4x4 background with distinct values; a 2x2 crop must be a contiguous window
        let bg_img = Image::array((0..16).map(|v| v as f64).collect(), &[4, 4]).unwrap();
        let ds: Arc<dyn Dataset> =
            Arc::new(InMemoryDataset::new(vec![Sample::new(bg_img, 0.0)], "ramp"));
        let s = BackgroundSwap::seeded(
            ds,
            BackgroundSwapConfig::default().input_dim(2, 2).crop_bg(true),
            BgNormalize::Identity,
            3,
        )
        .unwrap();
        let fg = Image::array(vec![0.0; 4], &[2, 2]).unwrap();
        let out = s.apply(fg).unwrap();
        let d = out.data();
        assert_eq!(d[1], d[0] + 1.0);
        assert_eq!(d[2], d[0] + 4.0);
        assert_eq!(d[3], d[0] + 5.0);
        assert!(d[0] <= 10.0);
    }
}
