//! # continua-data
//!
//! Datasets and per-sample transforms for continual-learning pipelines.
//!
//! This crate provides:
//! - [`Dataset`] trait — unified interface for any image source
//! - [`Transform`] trait — one stage of a per-sample pipeline
//! - [`BackgroundSwap`] — composite dark foreground pixels onto a random
//!   background drawn from another dataset
//   - Dataset combinators — InMemoryDataset, SubsetDataset, MapDataset
//   - Layout/scale transforms — ToTensor, ToArray, Normalize, Standardize
//   - Bilinear resize and crop
//   - ImageFolder (directory-based image dataset, `image-folder` feature)

pub mod bg_swap;
pub mod combinators;
pub mod dataset;
pub mod image_folder;
pub mod resize;
pub mod transform;

pub use bg_swap::{BackgroundSwap, BackgroundSwapConfig, BgNormalize};
pub use combinators::{InMemoryDataset, MapDataset, SubsetDataset};
pub use dataset::{Dataset, Sample};
pub use resize::{crop, resize_bilinear};
pub use transform::{Compose, Normalize, Standardize, ToArray, ToTensor, Transform};

#[cfg(feature = "image-folder")]
pub use image_folder::{ImageFolder, ImageFolderBuilder};
