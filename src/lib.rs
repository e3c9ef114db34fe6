//! A library for converting raster images (PNG, JPEG, BMP) into ICO files.
//!
//! An ICO file bundles several square renditions of one picture.  This crate
//! writes every rendition as an embedded 32-bit PNG, with the directory
//! entries in the order the sizes were requested.
//!
//! # Single files
//!
//! ```no_run
//! use icocraft::{Converter, ConvertSettings, TargetSizes};
//! use std::path::Path;
//!
//! let converter = Converter::new(ConvertSettings::default());
//! let sizes: TargetSizes = "16,32,48,256".parse()?;
//! converter.write_ico_file(
//!     Path::new("logo.png"),
//!     Path::new("out/logo.ico"),
//!     &sizes,
//! )?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Batches
//!
//! ```no_run
//! use icocraft::{BatchConverter, BatchJob, BatchProgress, ConvertSettings,
//!                OutputMode, TargetSizes};
//!
//! let batch = BatchConverter::new(ConvertSettings::default());
//! let job = BatchJob::new(["a.png", "b.jpg"], "icons",
//!                         TargetSizes::new([16, 32])?)?
//!     .with_mode(OutputMode::PerSize);
//! let results = batch.convert(&job, &|progress: BatchProgress| {
//!     println!("{}/{}", progress.completed_files, progress.total_files);
//! })?;
//! for result in results {
//!     println!("{:?}: {:?}", result.input(), result.error());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

#[macro_use]
mod macros;

mod batch;
mod cancel;
mod config;
mod converter;
mod encoder;
mod error;
mod icondir;
mod iconimage;
mod progress;
mod sizes;
mod source;

pub use crate::batch::{BatchConverter, BatchError, BatchJob, BatchResult};
pub use crate::cancel::CancelToken;
pub use crate::config::{ConvertSettings, OutputMode, ResizeFilter};
pub use crate::converter::Converter;
pub use crate::encoder::IcoEncoder;
pub use crate::error::{ConversionError, ConvertError};
pub use crate::icondir::{IconDir, IconDirEntry, ENTRY_LEN, HEADER_LEN};
pub use crate::iconimage::IconImage;
pub use crate::progress::{BatchProgress, NoProgress, ProgressSink};
pub use crate::sizes::{TargetSizes, MAX_ICON_SIZE, MIN_ICON_SIZE};
pub use crate::source::SourceImage;
