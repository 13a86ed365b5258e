//! # continua-core
//!
//! Core types shared by the continua data crates.
//!
//! This crate provides:
//! - [`Image`] — a pixel buffer with its [`ChannelLayout`] and [`ImageKind`]
//! - [`Shape`] — dimension sizes of an image buffer
//! - [`Error`] / [`Result`] — the single error type used across continua

pub mod error;
pub mod image;
pub mod shape;

pub use error::{Error, Result};
pub use image::{ChannelLayout, Image, ImageKind};
pub use shape::Shape;
