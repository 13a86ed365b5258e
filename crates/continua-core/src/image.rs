// Image — a single pixel buffer flowing through a transform pipeline
//
// An Image is a row-major `Vec<f64>` plus:
//   - a Shape (rank 2 or 3),
//   - a ChannelLayout telling which axis (if any) holds channels,
//   - an ImageKind telling which representation family it belongs to.
//
// Host arrays are channel-last ([H, W] or [H, W, C]); tensors are
// channel-first ([C, H, W]). Transforms must hand back the same kind they
// received unless their whole purpose is conversion (ToTensor / ToArray).

use crate::error::{Error, Result};
use crate::shape::Shape;

/// Position of the channel axis in an image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    /// `[H, W]`, single channel, no channel axis.
    Plane,
    /// `[H, W, C]`
    Last,
    /// `[C, H, W]`
    First,
}

impl ChannelLayout {
    fn rank(self) -> usize {
        match self {
            ChannelLayout::Plane => 2,
            ChannelLayout::Last | ChannelLayout::First => 3,
        }
    }
}

/// Representation family of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    /// Host-side array, channel-last.
    Array,
    /// Model-side tensor, channel-first.
    Tensor,
}

/// A fixed-shape image buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    data: Vec<f64>,
    shape: Shape,
    layout: ChannelLayout,
    kind: ImageKind,
}

impl Image {
    /// Create an image, validating that `shape` matches `layout` and `data`.
    pub fn new(
        data: Vec<f64>,
        shape: impl Into<Shape>,
        layout: ChannelLayout,
        kind: ImageKind,
    ) -> Result<Self> {
        let shape = shape.into();
        if shape.rank() != layout.rank() {
            return Err(Error::RankMismatch {
                expected: layout.rank(),
                got: shape.rank(),
            });
        }
        if shape.dims().contains(&0) {
            return Err(Error::msg(format!("image shape {} has a zero dimension", shape)));
        }
        let expected = shape.elem_count();
        if data.len() != expected {
            return Err(Error::ElementCountMismatch {
                shape,
                expected,
                got: data.len(),
            });
        }
        Ok(Image {
            data,
            shape,
            layout,
            kind,
        })
    }

    /// A host array: `[H, W]` or `[H, W, C]`.
    pub fn array(data: Vec<f64>, dims: &[usize]) -> Result<Self> {
        let layout = match dims.len() {
            2 => ChannelLayout::Plane,
            3 => ChannelLayout::Last,
            n => return Err(Error::RankMismatch { expected: 3, got: n }),
        };
        Image::new(data, dims, layout, ImageKind::Array)
    }

    /// A tensor: `[C, H, W]` (or `[H, W]` for a bare plane).
    pub fn tensor(data: Vec<f64>, dims: &[usize]) -> Result<Self> {
        let layout = match dims.len() {
            2 => ChannelLayout::Plane,
            3 => ChannelLayout::First,
            n => return Err(Error::RankMismatch { expected: 3, got: n }),
        };
        Image::new(data, dims, layout, ImageKind::Tensor)
    }

    /// An image of the given shape/layout/kind with every element set to `value`.
    pub fn filled(
        value: f64,
        shape: impl Into<Shape>,
        layout: ChannelLayout,
        kind: ImageKind,
    ) -> Result<Self> {
        let shape = shape.into();
        let n = shape.elem_count();
        Image::new(vec![value; n], shape, layout, kind)
    }

    /// Build an image from channel planes (each `h * w`, row-major) in the
    /// requested layout. A single plane with `ChannelLayout::Plane` yields `[H, W]`.
    pub fn from_planes(
        planes: &[Vec<f64>],
        height: usize,
        width: usize,
        layout: ChannelLayout,
        kind: ImageKind,
    ) -> Result<Self> {
        let c = planes.len();
        let npix = height * width;
        if let Some(bad) = planes.iter().find(|p| p.len() != npix) {
            return Err(Error::ElementCountMismatch {
                shape: Shape::from((height, width)),
                expected: npix,
                got: bad.len(),
            });
        }
        match layout {
            ChannelLayout::Plane => {
                if c != 1 {
                    return Err(Error::UnsupportedChannels { channels: c });
                }
                Image::new(planes[0].clone(), (height, width), layout, kind)
            }
            ChannelLayout::First => {
                let data = planes.concat();
                Image::new(data, (c, height, width), layout, kind)
            }
            ChannelLayout::Last => {
                let mut data = vec![0.0; c * npix];
                for (ch, plane) in planes.iter().enumerate() {
                    for (i, &v) in plane.iter().enumerate() {
                        data[i * c + ch] = v;
                    }
                }
                Image::new(data, (height, width, c), layout, kind)
            }
        }
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    pub fn height(&self) -> usize {
        let d = self.shape.dims();
        match self.layout {
            ChannelLayout::Plane | ChannelLayout::Last => d[0],
            ChannelLayout::First => d[1],
        }
    }

    pub fn width(&self) -> usize {
        let d = self.shape.dims();
        match self.layout {
            ChannelLayout::Plane | ChannelLayout::Last => d[1],
            ChannelLayout::First => d[2],
        }
    }

    pub fn channels(&self) -> usize {
        let d = self.shape.dims();
        match self.layout {
            ChannelLayout::Plane => 1,
            ChannelLayout::Last => d[2],
            ChannelLayout::First => d[0],
        }
    }

    /// `(height, width)`
    pub fn spatial(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    /// Flat offset of channel `c` at row `y`, column `x`.
    #[inline]
    pub fn offset(&self, c: usize, y: usize, x: usize) -> usize {
        match self.layout {
            ChannelLayout::Plane => y * self.width() + x,
            ChannelLayout::Last => (y * self.width() + x) * self.channels() + c,
            ChannelLayout::First => (c * self.height() + y) * self.width() + x,
        }
    }

    #[inline]
    pub fn at(&self, c: usize, y: usize, x: usize) -> f64 {
        self.data[self.offset(c, y, x)]
    }

    /// Split into channel planes, each `h * w` row-major.
    pub fn planes(&self) -> Vec<Vec<f64>> {
        let (h, w) = self.spatial();
        (0..self.channels())
            .map(|c| {
                let mut plane = Vec::with_capacity(h * w);
                for y in 0..h {
                    for x in 0..w {
                        plane.push(self.at(c, y, x));
                    }
                }
                plane
            })
            .collect()
    }

    /// Same pixels, different layout. `Plane` requires a single channel.
    pub fn to_layout(&self, layout: ChannelLayout) -> Result<Image> {
        if layout == self.layout {
            return Ok(self.clone());
        }
        let (h, w) = self.spatial();
        Image::from_planes(&self.planes(), h, w, layout, self.kind)
    }

    /// Retag the representation family without touching pixels.
    pub fn with_kind(mut self, kind: ImageKind) -> Image {
        self.kind = kind;
        self
    }
}
