use std::io::{self, Read, Write};

//===========================================================================//

// Size limits for images in an ICO file:
const MIN_SIZE: u32 = 1;
const MAX_SIZE: u32 = 256;

// Icon payloads are always written as 8-bit RGBA.
pub(crate) const BITS_PER_PIXEL: u16 = 32;

//===========================================================================//

/// A square RGBA image, ready to be embedded in an ICO file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IconImage {
    size: u32,
    rgba_data: Vec<u8>,
}

impl IconImage {
    /// Creates a new image with the given edge length and RGBA data.  The
    /// `size` must be in `1..=256`, and `rgba_data` must have `4 * size *
    /// size` bytes and be in row-major order from top to bottom.  Returns an
    /// error if the size is out of range or if `rgba_data` is the wrong
    /// length.
    pub fn from_rgba_data(
        size: u32,
        rgba_data: Vec<u8>,
    ) -> io::Result<IconImage> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&size) {
            invalid_input!(
                "Invalid icon size (was {}, but must be between {} and {})",
                size,
                MIN_SIZE,
                MAX_SIZE
            );
        }
        let expected_data_len = (size as u64) * (size as u64) * 4;
        if (rgba_data.len() as u64) != expected_data_len {
            invalid_input!(
                "Invalid data length (was {}, but must be {} for {}x{} image)",
                rgba_data.len(),
                expected_data_len,
                size,
                size
            );
        }
        Ok(IconImage { size, rgba_data })
    }

    /// Returns the width (and height) of the image, in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns the RGBA data for this image, in row-major order from top to
    /// bottom.
    pub fn rgba_data(&self) -> &[u8] {
        &self.rgba_data
    }

    /// Decodes an image from PNG data.  Returns an error if the PNG data is
    /// malformed, not square, or uses a format other than 8-bit RGB/RGBA.
    pub fn read_png<R: Read>(reader: R) -> io::Result<IconImage> {
        let decoder = png::Decoder::new(reader);
        let mut png_reader = match decoder.read_info() {
            Ok(png_reader) => png_reader,
            Err(error) => invalid_data!("Malformed PNG data: {}", error),
        };
        let (width, height) = {
            let info = png_reader.info();
            (info.width, info.height)
        };
        if width != height {
            invalid_data!(
                "Icon PNG must be square (was {}x{})",
                width,
                height
            );
        }
        if png_reader.info().bit_depth != png::BitDepth::Eight {
            invalid_data!(
                "Unsupported PNG bit depth: {:?}",
                png_reader.info().bit_depth
            );
        }
        let mut buffer = vec![0u8; png_reader.output_buffer_size()];
        if let Err(error) = png_reader.next_frame(&mut buffer) {
            invalid_data!("Malformed PNG data: {}", error);
        }
        let rgba_data = match png_reader.info().color_type {
            png::ColorType::Rgba => buffer,
            png::ColorType::Rgb => {
                let num_pixels = buffer.len() / 3;
                let mut rgba = Vec::with_capacity(num_pixels * 4);
                for pixel in buffer.chunks_exact(3) {
                    rgba.extend_from_slice(pixel);
                    rgba.push(u8::MAX);
                }
                rgba
            }
            other => invalid_data!("Unsupported PNG color type: {:?}", other),
        };
        IconImage::from_rgba_data(width, rgba_data).map_err(|error| {
            io::Error::new(io::ErrorKind::InvalidData, error.to_string())
        })
    }

    /// Encodes the image as a 32 bits-per-pixel PNG file.
    pub fn write_png<W: Write>(&self, writer: W) -> io::Result<()> {
        match self.write_png_enc(writer) {
            Ok(()) => Ok(()),
            Err(png::EncodingError::IoError(error)) => Err(error),
            Err(png::EncodingError::Format(error)) => {
                invalid_input!("PNG format error: {}", error);
            }
            Err(png::EncodingError::LimitsExceeded) => {
                invalid_input!("PNG limits exceeded");
            }
            Err(png::EncodingError::Parameter(error)) => {
                invalid_input!("PNG parameter error: {}", error);
            }
        }
    }

    /// Encodes the image as PNG data in memory.
    pub(crate) fn to_png_bytes(&self) -> io::Result<Vec<u8>> {
        let mut data = Vec::new();
        self.write_png(&mut data)?;
        Ok(data)
    }

    fn write_png_enc<W: Write>(
        &self,
        writer: W,
    ) -> Result<(), png::EncodingError> {
        let mut encoder = png::Encoder::new(writer, self.size, self.size);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.rgba_data)?;
        writer.finish()
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::IconImage;

    fn checkerboard(size: u32) -> IconImage {
        let mut rgba = Vec::new();
        for index in 0..(size * size) {
            let on = (index % size + index / size) % 2 == 0;
            let value = if on { 0xff } else { 0x00 };
            rgba.extend_from_slice(&[value, 0x40, 0x80, 0xc0]);
        }
        IconImage::from_rgba_data(size, rgba).unwrap()
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert!(IconImage::from_rgba_data(0, Vec::new()).is_err());
        assert!(IconImage::from_rgba_data(257, vec![0; 257 * 257 * 4]).is_err());
        assert!(IconImage::from_rgba_data(2, vec![0; 15]).is_err());
    }

    #[test]
    fn png_round_trip() {
        let image = checkerboard(7);
        let data = image.to_png_bytes().unwrap();
        assert!(data.starts_with(&[0x89, b'P', b'N', b'G']));
        let decoded = IconImage::read_png(data.as_slice()).unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn png_encoding_is_deterministic() {
        let image = checkerboard(16);
        assert_eq!(image.to_png_bytes().unwrap(), image.to_png_bytes().unwrap());
    }
}

//===========================================================================//
