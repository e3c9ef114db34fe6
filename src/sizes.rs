use crate::error::ConvertError;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//===========================================================================//

/// The smallest edge length an icon image may have.
pub const MIN_ICON_SIZE: u32 = 1;

/// The largest edge length an icon image may have.  An ICONDIRENTRY stores
/// width and height in one byte each, with zero standing for 256, so nothing
/// larger can be represented.
pub const MAX_ICON_SIZE: u32 = 256;

//===========================================================================//

/// An ordered, non-empty list of square icon sizes, in pixels.
///
/// The order is significant: it determines the order of the directory
/// entries in the encoded ICO file.  Duplicates are kept as given.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<i64>", into = "Vec<u32>"))]
pub struct TargetSizes {
    sizes: Vec<u32>,
}

impl TargetSizes {
    /// Validates a list of requested sizes.  Returns a
    /// `ConvertError::Validation` if the list is empty or if any size is not
    /// in `1..=256`.
    pub fn new<I, T>(sizes: I) -> Result<TargetSizes, ConvertError>
    where
        I: IntoIterator<Item = T>,
        T: Into<i64>,
    {
        let mut validated = Vec::new();
        for size in sizes {
            let size = size.into();
            if size < MIN_ICON_SIZE as i64 || size > MAX_ICON_SIZE as i64 {
                invalid_request!(
                    "Invalid icon size (was {}, but must be between {} and {})",
                    size,
                    MIN_ICON_SIZE,
                    MAX_ICON_SIZE
                );
            }
            validated.push(size as u32);
        }
        if validated.is_empty() {
            invalid_request!("Size list must not be empty");
        }
        Ok(TargetSizes { sizes: validated })
    }

    /// Returns a list holding just the one size.
    pub fn single(size: u32) -> Result<TargetSizes, ConvertError> {
        TargetSizes::new([size])
    }

    /// Returns the sizes in request order.
    pub fn as_slice(&self) -> &[u32] {
        &self.sizes
    }

    /// Returns the number of sizes (and thus of directory entries).
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Always false; an empty list is rejected on construction.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Iterates over the sizes in request order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.sizes.iter().copied()
    }

    /// Splits into one single-size list per entry, in request order.
    pub fn split(&self) -> Vec<TargetSizes> {
        self.sizes
            .iter()
            .map(|&size| TargetSizes { sizes: vec![size] })
            .collect()
    }

    /// Returns the one size in a single-size list.
    pub(crate) fn first(&self) -> u32 {
        self.sizes[0]
    }
}

impl TryFrom<Vec<i64>> for TargetSizes {
    type Error = ConvertError;

    fn try_from(sizes: Vec<i64>) -> Result<TargetSizes, ConvertError> {
        TargetSizes::new(sizes)
    }
}

impl From<TargetSizes> for Vec<u32> {
    fn from(sizes: TargetSizes) -> Vec<u32> {
        sizes.sizes
    }
}

impl FromStr for TargetSizes {
    type Err = ConvertError;

    /// Parses a comma-separated list such as `"16,32,48"`.
    fn from_str(text: &str) -> Result<TargetSizes, ConvertError> {
        let mut sizes = Vec::<i64>::new();
        for piece in text.split(',') {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            match piece.parse::<i64>() {
                Ok(size) => sizes.push(size),
                Err(_) => invalid_request!("Invalid icon size: {:?}", piece),
            }
        }
        TargetSizes::new(sizes)
    }
}

impl fmt::Display for TargetSizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, size) in self.sizes.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}x{}", size, size)?;
        }
        Ok(())
    }
}

//===========================================================================//


//===========================================================================//
