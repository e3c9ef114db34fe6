use std::io;
use std::path::{Path, PathBuf};

//===========================================================================//

/// The ways a conversion can fail.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The request itself is malformed: an empty path, an input that isn't
    /// a file, an empty size list, a size outside of `1..=256`, or a batch
    /// output already claimed by another input.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The input file does not exist.
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Reading, writing or creating a directory failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file or directory being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The image library failed to decode, resize or encode an image.
    #[error("codec error: {0}")]
    Codec(String),

    /// A cooperative cancellation request was observed.
    #[error("conversion cancelled")]
    Cancelled,
}

impl ConvertError {
    pub(crate) fn io(path: &Path, source: io::Error) -> ConvertError {
        ConvertError::Io { path: path.to_path_buf(), source }
    }

    /// Returns true if this is a `ConvertError::Cancelled`.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConvertError::Cancelled)
    }
}

//===========================================================================//

/// An error from a single-file operation, annotated with the input path and
/// the sizes that were requested.
#[derive(Debug, thiserror::Error)]
#[error("failed to convert {} at sizes {sizes:?}: {source}", input.display())]
pub struct ConversionError {
    input: PathBuf,
    sizes: Vec<u32>,
    #[source]
    source: ConvertError,
}

impl ConversionError {
    pub(crate) fn new(
        input: &Path,
        sizes: &[u32],
        source: ConvertError,
    ) -> ConversionError {
        ConversionError {
            input: input.to_path_buf(),
            sizes: sizes.to_vec(),
            source,
        }
    }

    /// Returns the input path of the failed conversion.
    pub fn input_path(&self) -> &Path {
        &self.input
    }

    /// Returns the sizes that were requested.
    pub fn requested_sizes(&self) -> &[u32] {
        &self.sizes
    }

    /// Returns the underlying error.
    pub fn kind(&self) -> &ConvertError {
        &self.source
    }

    /// Consumes this error and returns the underlying error.
    pub fn into_kind(self) -> ConvertError {
        self.source
    }
}

//===========================================================================//


//===========================================================================//
