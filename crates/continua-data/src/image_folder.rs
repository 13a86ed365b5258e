// ImageFolder — directory-based image dataset, usable as a background corpus
//
// Loads images from a directory structure where each subdirectory is a class:
//
//   root/
//     forest/
//       img_001.png
//       img_002.jpg
//     street/
//       img_003.png
//       ...
//
// Class labels are assigned as sorted indices of subdirectory names.
//
// Each sample is a channel-last host array `[H, W, C]` (`[H, W]` in
// grayscale mode) with values in [0, 1]. Images are decoded on `get`, so a
// large corpus costs only its path list in memory.
//
// USAGE:
//
//   let bg = ImageFolder::new("data/backgrounds")
//       .resize(64, 64)
//       .build()?;
//
// Requires the `image-folder` feature (which brings in the `image` crate).

#[cfg(feature = "image-folder")]
pub use inner::*;

#[cfg(feature = "image-folder")]
mod inner {
    use std::path::{Path, PathBuf};

    use image::imageops::FilterType;
    use image::GenericImageView;

    use continua_core::{Error, Image, Result};

    use crate::dataset::{Dataset, Sample};

    /// Supported image extensions (case-insensitive).
    const EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tiff", "tif", "webp"];

    fn is_image(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Builder for [`ImageFolder`].
    pub struct ImageFolderBuilder {
        root: PathBuf,
        resize: Option<(u32, u32)>,
        grayscale: bool,
    }

    impl ImageFolderBuilder {
        pub fn new<P: AsRef<Path>>(root: P) -> Self {
            ImageFolderBuilder {
                root: root.as_ref().to_path_buf(),
                resize: None,
                grayscale: false,
            }
        }

        /// Resize all images to (width, height) at decode time using Lanczos3.
        pub fn resize(mut self, width: u32, height: u32) -> Self {
            self.resize = Some((width, height));
            self
        }

        /// Decode as single-channel luma.
        pub fn grayscale(mut self, yes: bool) -> Self {
            self.grayscale = yes;
            self
        }

        /// Scan the directory tree and build the dataset.
        pub fn build(self) -> Result<ImageFolder> {
            ImageFolder::scan(self.root, self.resize, self.grayscale)
        }
    }

    /// A directory-based image dataset (one subdirectory per class).
    #[derive(Debug)]
    pub struct ImageFolder {
        class_names: Vec<String>,
        /// Per-sample metadata: (path, class_index).
        entries: Vec<(PathBuf, usize)>,
        resize: Option<(u32, u32)>,
        grayscale: bool,
    }

    impl ImageFolder {
        /// Convenience entry-point: `ImageFolder::new(root)` returns a builder.
        pub fn new<P: AsRef<Path>>(root: P) -> ImageFolderBuilder {
            ImageFolderBuilder::new(root)
        }

        fn scan(root: PathBuf, resize: Option<(u32, u32)>, grayscale: bool) -> Result<Self> {
            if !root.is_dir() {
                return Err(Error::msg(format!(
                    "ImageFolder: not a directory: {}",
                    root.display()
                )));
            }

            let mut class_dirs: Vec<(String, PathBuf)> = Vec::new();
            for entry in std::fs::read_dir(&root)? {
                let path = entry?.path();
                if path.is_dir() {
                    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                        class_dirs.push((name.to_string(), path));
                    }
                }
            }
            class_dirs.sort_by(|a, b| a.0.cmp(&b.0));

            if class_dirs.is_empty() {
                return Err(Error::msg(format!(
                    "ImageFolder: no class subdirectories in {}",
                    root.display()
                )));
            }

            let class_names: Vec<String> = class_dirs.iter().map(|(n, _)| n.clone()).collect();

            let mut entries: Vec<(PathBuf, usize)> = Vec::new();
            for (class_idx, (_name, dir)) in class_dirs.iter().enumerate() {
                let mut paths: Vec<PathBuf> = Vec::new();
                Self::collect_images(dir, &mut paths);
                paths.sort();
                entries.extend(paths.into_iter().map(|p| (p, class_idx)));
            }

            if entries.is_empty() {
                return Err(Error::EmptyDataset(root.display().to_string()));
            }

            log::debug!(
                "ImageFolder {}: {} images in {} classes",
                root.display(),
                entries.len(),
                class_names.len()
            );

            Ok(ImageFolder {
                class_names,
                entries,
                resize,
                grayscale,
            })
        }

        fn collect_images(dir: &Path, out: &mut Vec<PathBuf>) {
            if let Ok(rd) = std::fs::read_dir(dir) {
                for entry in rd.flatten() {
                    let path = entry.path();
                    if path.is_dir() {
                        Self::collect_images(&path, out);
                    } else if is_image(&path) {
                        out.push(path);
                    }
                }
            }
        }

        pub fn class_names(&self) -> &[String] {
            &self.class_names
        }

        fn load_image(&self, path: &Path) -> Result<Image> {
            let img = image::open(path).map_err(|e| Error::ImageDecode {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

            let img = match self.resize {
                Some((w, h)) => img.resize_exact(w, h, FilterType::Lanczos3),
                None => img,
            };

            let (w, h) = img.dimensions();
            let (h, w) = (h as usize, w as usize);
            if self.grayscale {
                let data = img
                    .to_luma8()
                    .as_raw()
                    .iter()
                    .map(|&v| v as f64 / 255.0)
                    .collect();
                Image::array(data, &[h, w])
            } else {
                // to_rgb8 is already interleaved [H, W, C]
                let data = img
                    .to_rgb8()
                    .as_raw()
                    .iter()
                    .map(|&v| v as f64 / 255.0)
                    .collect();
                Image::array(data, &[h, w, 3])
            }
        }
    }

    impl Dataset for ImageFolder {
        fn len(&self) -> usize {
            self.entries.len()
        }

        fn get(&self, index: usize) -> Result<Sample> {
            let (path, class_idx) = self.entries.get(index).ok_or(Error::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })?;
            let image = self.load_image(path)?;
            Ok(Sample::new(image, *class_idx as f64))
        }

        fn name(&self) -> &str {
            "ImageFolder"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn scratch_dir(tag: &str) -> PathBuf {
            let dir = std::env::temp_dir().join(format!(
                "continua-image-folder-{}-{}",
                tag,
                std::process::id()
            ));
            let _ = std::fs::remove_dir_all(&dir);
            std::fs::create_dir_all(&dir).unwrap();
            dir
        }

        #[test]
        fn loads_rgb_backgrounds() {
            let root = scratch_dir("rgb");
            std::fs::create_dir_all(root.join("plain")).unwrap();
            let img = image::RgbImage::from_pixel(4, 3, image::Rgb([255, 0, 51]));
            img.save(root.join("plain").join("a.png")).unwrap();

            let ds = ImageFolder::new(&root).build().unwrap();
            assert_eq!(ds.len(), 1);
            assert_eq!(ds.class_names(), &["plain".to_string()]);
            let s = ds.get(0).unwrap();
            assert_eq!(s.image.shape().dims(), &[3, 4, 3]);
            assert!((s.image.at(0, 0, 0) - 1.0).abs() < 1e-12);
            assert!((s.image.at(2, 2, 3) - 0.2).abs() < 1e-12);
            assert!(ds.get(1).is_err());

            let _ = std::fs::remove_dir_all(&root);
        }

        #[test]
        fn corrupt_file_is_a_decode_error() {
            let root = scratch_dir("corrupt");
            std::fs::create_dir_all(root.join("bad")).unwrap();
            std::fs::write(root.join("bad").join("x.png"), b"not a png").unwrap();

            let ds = ImageFolder::new(&root).build().unwrap();
            assert!(matches!(ds.get(0), Err(Error::ImageDecode { .. })));

            let _ = std::fs::remove_dir_all(&root);
        }

        #[test]
        fn missing_root_rejected() {
            assert!(ImageFolder::new("/definitely/not/here").build().is_err());
        }
    }
}
