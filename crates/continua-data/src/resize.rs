// Resize — bilinear spatial resampling and cropping that keep layout/kind

use continua_core::{Error, Image, Result};

/// Resize `image` to `(height, width)` with bilinear interpolation.
///
/// Sample positions are edge-clamped, so the output never reads outside the
/// source. Channel layout and kind are preserved. When the size already
/// matches, the pixels are copied unchanged.
pub fn resize_bilinear(image: &Image, (new_h, new_w): (usize, usize)) -> Result<Image> {
    let (old_h, old_w) = image.spatial();
    if new_h == 0 || new_w == 0 || old_h == 0 || old_w == 0 {
        return Err(Error::msg(format!(
            "resize: cannot resample {}x{} to {}x{}",
            old_h, old_w, new_h, new_w
        )));
    }
    if (old_h, old_w) == (new_h, new_w) {
        return Ok(image.clone());
    }

    let scale_h = old_h as f64 / new_h as f64;
    let scale_w = old_w as f64 / new_w as f64;

    let planes: Vec<Vec<f64>> = image
        .planes()
        .iter()
        .map(|src| {
            let mut out = vec![0.0; new_h * new_w];
            for y in 0..new_h {
                // Pixel-centre alignment, clamped to the source grid.
                let src_y = ((y as f64 + 0.5) * scale_h - 0.5).max(0.0);
                let y0 = (src_y.floor() as usize).min(old_h - 1);
                let y1 = (y0 + 1).min(old_h - 1);
                let dy = src_y - y0 as f64;
                for x in 0..new_w {
                    let src_x = ((x as f64 + 0.5) * scale_w - 0.5).max(0.0);
                    let x0 = (src_x.floor() as usize).min(old_w - 1);
                    let x1 = (x0 + 1).min(old_w - 1);
                    let dx = src_x - x0 as f64;

                    let v00 = src[y0 * old_w + x0];
                    let v01 = src[y0 * old_w + x1];
                    let v10 = src[y1 * old_w + x0];
                    let v11 = src[y1 * old_w + x1];

                    let top = v00 + (v01 - v00) * dx;
                    let bottom = v10 + (v11 - v10) * dx;
                    out[y * new_w + x] = top + (bottom - top) * dy;
                }
            }
            out
        })
        .collect();

    Image::from_planes(&planes, new_h, new_w, image.layout(), image.kind())
}

/// Copy the `(height, width)` window whose top-left corner is `(y0, x0)`.
pub fn crop(image: &Image, (y0, x0): (usize, usize), (h, w): (usize, usize)) -> Result<Image> {
    let (old_h, old_w) = image.spatial();
    if y0 + h > old_h || x0 + w > old_w {
        return Err(Error::msg(format!(
            "crop: window {}x{} at ({}, {}) exceeds {}x{} image",
            h, w, y0, x0, old_h, old_w
        )));
    }
    let planes: Vec<Vec<f64>> = (0..image.channels())
        .map(|c| {
            let mut out = Vec::with_capacity(h * w);
            for y in y0..y0 + h {
                for x in x0..x0 + w {
                    out.push(image.at(c, y, x));
                }
            }
            out
        })
        .collect();
    Image::from_planes(&planes, h, w, image.layout(), image.kind())
}

#[cfg(test)]
mod tests {
    use super::*;
    use continua_core::{ChannelLayout, ImageKind};

    #[test]
    fn same_size_is_exact_copy() {
        let img = Image::array((0..12).map(|v| v as f64 * 0.1).collect(), &[2, 2, 3]).unwrap();
        let out = resize_bilinear(&img, (2, 2)).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn constant_image_stays_constant() {
        let img = Image::filled(-1.0, (32, 32, 3), ChannelLayout::Last, ImageKind::Array).unwrap();
        let out = resize_bilinear(&img, (5, 7)).unwrap();
        assert_eq!(out.shape().dims(), &[5, 7, 3]);
        assert!(out.data().iter().all(|&v| v == -1.0));
    }

    #[test]
    fn upsample_interpolates_between_neighbours() {
        // 1x2 plane [0, 1] -> 1x4: values must be monotone and within [0, 1]
        let img = Image::array(vec![0.0, 1.0], &[1, 2]).unwrap();
        let out = resize_bilinear(&img, (1, 4)).unwrap();
        let d = out.data();
        assert_eq!(d.len(), 4);
        assert!(d.windows(2).all(|p| p[0] <= p[1]));
        assert!(d[0] >= 0.0 && d[3] <= 1.0);
        assert!((d[0] - 0.0).abs() < 1e-12);
        assert!((d[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn resize_keeps_channel_first() {
        let img = Image::tensor(vec![0.5; 3 * 10 * 10], &[3, 10, 10]).unwrap();
        let out = resize_bilinear(&img, (4, 4)).unwrap();
        assert_eq!(out.shape().dims(), &[3, 4, 4]);
        assert_eq!(out.kind(), ImageKind::Tensor);
    }

    #[test]
    fn crop_window() {
        let img = Image::array((0..16).map(|v| v as f64).collect(), &[4, 4]).unwrap();
        let out = crop(&img, (1, 2), (2, 2)).unwrap();
        assert_eq!(out.data(), &[6.0, 7.0, 10.0, 11.0]);
        assert!(crop(&img, (3, 3), (2, 2)).is_err());
    }
}
