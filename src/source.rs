use crate::config::ResizeFilter;
use crate::error::ConvertError;
use crate::iconimage::IconImage;
use image::{imageops, ImageReader, RgbaImage};
use std::fs;
use std::io;
use std::path::Path;

//===========================================================================//

/// A decoded source picture.  It is decoded once and never modified; every
/// icon size is resized into its own private copy.
#[derive(Clone, Debug)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    /// Decodes a PNG, JPEG or BMP file.  Returns `ConvertError::NotFound` if
    /// the file doesn't exist, `ConvertError::Validation` if the path names
    /// something other than a file, `ConvertError::Io` if it can't be
    /// inspected or read, and `ConvertError::Codec` if it can't be decoded.
    pub fn open(path: &Path) -> Result<SourceImage, ConvertError> {
        if path.as_os_str().is_empty() {
            invalid_request!("Input path must not be empty");
        }
        match fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => {
                invalid_request!("Input {} is not a file", path.display())
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(ConvertError::NotFound(path.to_path_buf()));
            }
            Err(error) => return Err(ConvertError::io(path, error)),
        }
        let reader = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|error| match error.kind() {
                io::ErrorKind::NotFound => {
                    ConvertError::NotFound(path.to_path_buf())
                }
                _ => ConvertError::io(path, error),
            })?;
        let decoded = reader.decode().map_err(|error| match error {
            image::ImageError::IoError(error) => ConvertError::io(path, error),
            error => ConvertError::Codec(format!(
                "Failed to decode {}: {}",
                path.display(),
                error
            )),
        })?;
        log::debug!(
            "Decoded {} ({}x{})",
            path.display(),
            decoded.width(),
            decoded.height()
        );
        Ok(SourceImage { pixels: decoded.into_rgba8() })
    }

    /// Wraps already-decoded RGBA pixels.  Returns a
    /// `ConvertError::Validation` if the buffer length doesn't match the
    /// dimensions or if either dimension is zero.
    pub fn from_rgba_data(
        width: u32,
        height: u32,
        rgba_data: Vec<u8>,
    ) -> Result<SourceImage, ConvertError> {
        if width == 0 || height == 0 {
            invalid_request!(
                "Source image must not be empty (was {}x{})",
                width,
                height
            );
        }
        match RgbaImage::from_raw(width, height, rgba_data) {
            Some(pixels) => Ok(SourceImage { pixels }),
            None => invalid_request!(
                "RGBA buffer doesn't match a {}x{} image",
                width,
                height
            ),
        }
    }

    /// Wraps an image from the `image` crate.
    pub fn from_rgba_image(
        pixels: RgbaImage,
    ) -> Result<SourceImage, ConvertError> {
        let (width, height) = pixels.dimensions();
        SourceImage::from_rgba_data(width, height, pixels.into_raw())
    }

    /// Returns the width of the source, in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Returns the height of the source, in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Scales a copy of the source to exactly `size`x`size` pixels.
    pub(crate) fn resized(
        &self,
        size: u32,
        filter: ResizeFilter,
    ) -> Result<IconImage, ConvertError> {
        let scaled = if self.pixels.dimensions() == (size, size) {
            self.pixels.clone()
        } else {
            imageops::resize(&self.pixels, size, size, filter.filter_type())
        };
        if scaled.dimensions() != (size, size) {
            return Err(ConvertError::Codec(format!(
                "Resize produced {}x{} instead of {}x{}",
                scaled.width(),
                scaled.height(),
                size,
                size
            )));
        }
        IconImage::from_rgba_data(size, scaled.into_raw())
            .map_err(|error| ConvertError::Codec(error.to_string()))
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::SourceImage;
    use crate::config::ResizeFilter;
    use crate::error::ConvertError;
    use std::env;
    use std::fs;
    use std::path::Path;

    #[test]
    fn resize_produces_exact_square() {
        let source =
            SourceImage::from_rgba_data(40, 20, vec![0x7f; 40 * 20 * 4])
                .unwrap();
        for &size in &[1, 16, 48, 256] {
            let icon = source.resized(size, ResizeFilter::Lanczos3).unwrap();
            assert_eq!(icon.size(), size);
            assert_eq!(icon.rgba_data().len(), (size * size * 4) as usize);
        }
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let result = SourceImage::from_rgba_data(4, 4, vec![0; 10]);
        assert!(matches!(result, Err(ConvertError::Validation(_))));
        let result = SourceImage::from_rgba_data(0, 4, Vec::new());
        assert!(matches!(result, Err(ConvertError::Validation(_))));
    }

    #[test]
    fn missing_file_is_not_found() {
        let result = SourceImage::open(Path::new("no/such/picture.png"));
        assert!(matches!(result, Err(ConvertError::NotFound(_))));
        let result = SourceImage::open(Path::new(""));
        assert!(matches!(result, Err(ConvertError::Validation(_))));
    }

    #[test]
    fn directory_is_not_reported_missing() {
        let result = SourceImage::open(&env::temp_dir());
        match result {
            Err(ConvertError::Validation(message)) => {
                assert!(message.contains("not a file"), "{}", message)
            }
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }

    #[test]
    fn unreadable_metadata_is_io_error() {
        // A path running through a regular file can't be inspected, and the
        // failure is not that the file is missing.
        let file = env::temp_dir()
            .join(format!("icocraft-source-{}.txt", std::process::id()));
        fs::write(&file, b"plain file").unwrap();
        let result = SourceImage::open(&file.join("picture.png"));
        assert!(
            matches!(result, Err(ConvertError::Io { .. })),
            "{:?}",
            result.err()
        );
        let _ = fs::remove_file(&file);
    }
}

//===========================================================================//
