use crate::cancel::CancelToken;
use crate::config::ResizeFilter;
use crate::error::ConvertError;
use crate::icondir::{IconDir, IconDirEntry};
use crate::sizes::TargetSizes;
use crate::source::SourceImage;

//===========================================================================//

/// Packs resized copies of a source image into ICO files.
///
/// Every entry is a 32-bit RGBA PNG; the directory lists them in the order
/// the sizes were requested.  Encoding does no I/O, and the same image and
/// sizes always produce the same bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct IcoEncoder {
    filter: ResizeFilter,
}

impl IcoEncoder {
    /// Creates an encoder that resizes with the given filter.
    pub fn new(filter: ResizeFilter) -> IcoEncoder {
        IcoEncoder { filter }
    }

    /// Returns the resize filter in use.
    pub fn filter(&self) -> ResizeFilter {
        self.filter
    }

    /// Encodes `image` at each of `sizes` into one ICO file.  Fails as a
    /// whole if any size fails.
    pub fn encode(
        &self,
        image: &SourceImage,
        sizes: &TargetSizes,
    ) -> Result<Vec<u8>, ConvertError> {
        self.encode_with_cancel(image, sizes, None)
    }

    /// Like `encode`, but checks `cancel` before each resize and returns
    /// `ConvertError::Cancelled` once it is set.
    pub fn encode_with_cancel(
        &self,
        image: &SourceImage,
        sizes: &TargetSizes,
        cancel: Option<&CancelToken>,
    ) -> Result<Vec<u8>, ConvertError> {
        let mut icondir = IconDir::new();
        for size in sizes.iter() {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Err(ConvertError::Cancelled);
            }
            let icon = image.resized(size, self.filter)?;
            let entry = IconDirEntry::encode_png(&icon).map_err(|error| {
                ConvertError::Codec(format!(
                    "Failed to encode {}x{} PNG: {}",
                    size, size, error
                ))
            })?;
            icondir.add_entry(entry);
        }
        icondir.to_bytes().map_err(|error| {
            ConvertError::Codec(format!("Failed to write ICO data: {}", error))
        })
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::IcoEncoder;
    use crate::cancel::CancelToken;
    use crate::error::ConvertError;
    use crate::sizes::TargetSizes;
    use crate::source::SourceImage;

    fn gradient(width: u32, height: u32) -> SourceImage {
        let mut rgba = Vec::new();
        for y in 0..height {
            for x in 0..width {
                rgba.extend_from_slice(&[x as u8, y as u8, 0x80, 0xff]);
            }
        }
        SourceImage::from_rgba_data(width, height, rgba).unwrap()
    }

    #[test]
    fn header_counts_entries() {
        let sizes = TargetSizes::new([16, 32, 48]).unwrap();
        let data = IcoEncoder::default().encode(&gradient(64, 64), &sizes);
        let data = data.unwrap();
        assert_eq!(&data[..6], b"\x00\x00\x01\x00\x03\x00");
    }

    #[test]
    fn size_256_is_stored_as_zero() {
        let sizes = TargetSizes::new([256]).unwrap();
        let data =
            IcoEncoder::default().encode(&gradient(8, 8), &sizes).unwrap();
        assert_eq!(data[6], 0);
        assert_eq!(data[7], 0);
    }

    #[test]
    fn cancelled_before_first_size() {
        let token = CancelToken::new();
        token.cancel();
        let sizes = TargetSizes::new([16]).unwrap();
        let result = IcoEncoder::default().encode_with_cancel(
            &gradient(8, 8),
            &sizes,
            Some(&token),
        );
        assert!(matches!(result, Err(ConvertError::Cancelled)));
    }
}

//===========================================================================//
