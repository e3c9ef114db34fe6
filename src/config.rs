//! Settings injected into the converters.

use crate::error::ConvertError;
use crate::sizes::TargetSizes;
use image::imageops::FilterType;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::thread;

//===========================================================================//

/// The resampling filter used when scaling a source image to an icon size.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ResizeFilter {
    /// Nearest-neighbor sampling; best for pixel art.
    Nearest,
    /// Linear filter.
    Triangle,
    /// Cubic filter.
    #[default]
    CatmullRom,
    /// Gaussian filter.
    Gaussian,
    /// Lanczos with a window of 3.
    Lanczos3,
}

impl ResizeFilter {
    pub(crate) fn filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

//===========================================================================//

/// How the requested sizes are split into output files.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum OutputMode {
    /// One ICO file holding every requested size.
    #[default]
    SingleFile,
    /// One single-image ICO file per requested size.
    PerSize,
}

//===========================================================================//

/// Conversion settings.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConvertSettings {
    /// Sizes used when the caller doesn't pick any.
    pub default_sizes: Vec<u32>,
    /// Whether batches produce one file per input or one per size.
    pub output_mode: OutputMode,
    /// File name used when writing a single icon without an explicit name.
    pub default_file_name: String,
    /// Resampling filter for every resize.
    pub resize_filter: ResizeFilter,
    /// Upper bound on concurrent batch workers.  `None` uses the available
    /// parallelism minus one, leaving a core for the caller.
    pub max_workers: Option<NonZeroUsize>,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        ConvertSettings {
            default_sizes: vec![32, 64, 128, 256],
            output_mode: OutputMode::SingleFile,
            default_file_name: "favicon.ico".to_string(),
            resize_filter: ResizeFilter::CatmullRom,
            max_workers: None,
        }
    }
}

impl ConvertSettings {
    /// Validates `default_sizes`.
    pub fn default_target_sizes(&self) -> Result<TargetSizes, ConvertError> {
        TargetSizes::new(self.default_sizes.iter().copied())
    }

    /// Returns how many workers a batch of `num_files` files may use.
    pub fn worker_limit(&self, num_files: usize) -> usize {
        let limit = match self.max_workers {
            Some(max) => max.get(),
            None => thread::available_parallelism()
                .map(|n| n.get().saturating_sub(1))
                .unwrap_or(1)
                .max(1),
        };
        limit.min(num_files).max(1)
    }
}

//===========================================================================//


//===========================================================================//
