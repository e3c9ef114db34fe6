use crate::iconimage::{IconImage, BITS_PER_PIXEL};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Seek, SeekFrom, Write};

//===========================================================================//

// The signature that all PNG files start with.
const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G'];

// The resource type number of an icon (as opposed to a cursor) file.
const ICON_RESOURCE_TYPE: u16 = 1;

/// The length of the ICONDIR header, in bytes.
pub const HEADER_LEN: u32 = 6;

/// The length of each ICONDIRENTRY record, in bytes.
pub const ENTRY_LEN: u32 = 16;

//===========================================================================//

/// A collection of images; the contents of a single ICO file.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct IconDir {
    entries: Vec<IconDirEntry>,
}

impl IconDir {
    /// Creates a new, empty collection of icons.
    pub fn new() -> IconDir {
        IconDir { entries: Vec::new() }
    }

    /// Returns the entries in this collection, in directory order.
    pub fn entries(&self) -> &[IconDirEntry] {
        &self.entries
    }

    /// Adds an entry to the end of the collection.
    pub fn add_entry(&mut self, entry: IconDirEntry) {
        self.entries.push(entry);
    }

    /// Reads an ICO file into memory.
    pub fn read<R: Read + Seek>(mut reader: R) -> io::Result<IconDir> {
        let reserved = reader.read_u16::<LittleEndian>()?;
        if reserved != 0 {
            invalid_data!(
                "Invalid reserved field value in ICONDIR \
                 (was {}, but must be 0)",
                reserved
            );
        }
        let restype = reader.read_u16::<LittleEndian>()?;
        if restype != ICON_RESOURCE_TYPE {
            invalid_data!("Unsupported resource type ({})", restype);
        }
        let num_entries = reader.read_u16::<LittleEndian>()? as usize;
        let mut entries = Vec::<IconDirEntry>::with_capacity(num_entries);
        let mut spans = Vec::<(u32, u32)>::with_capacity(num_entries);
        for _ in 0..num_entries {
            let width_byte = reader.read_u8()?;
            let height_byte = reader.read_u8()?;
            let num_colors = reader.read_u8()?;
            let reserved = reader.read_u8()?;
            if reserved != 0 {
                invalid_data!(
                    "Invalid reserved field value in ICONDIRENTRY \
                     (was {}, but must be 0)",
                    reserved
                );
            }
            let color_planes = reader.read_u16::<LittleEndian>()?;
            let bits_per_pixel = reader.read_u16::<LittleEndian>()?;
            let data_size = reader.read_u32::<LittleEndian>()?;
            let data_offset = reader.read_u32::<LittleEndian>()?;
            spans.push((data_offset, data_size));
            entries.push(IconDirEntry {
                width: size_from_byte(width_byte),
                height: size_from_byte(height_byte),
                num_colors,
                color_planes,
                bits_per_pixel,
                data: Vec::new(),
            });
        }
        for (index, &(data_offset, data_size)) in spans.iter().enumerate() {
            reader.seek(SeekFrom::Start(data_offset as u64))?;
            let mut data = vec![0u8; data_size as usize];
            reader.read_exact(&mut data)?;
            entries[index].data = data;
        }
        Ok(IconDir { entries })
    }

    /// Writes an ICO file.  Returns an error without writing anything if an
    /// entry's dimensions can't be represented in an ICONDIRENTRY.
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        if self.entries.len() > (u16::MAX as usize) {
            invalid_input!(
                "Too many entries in IconDir (was {}, but max is {})",
                self.entries.len(),
                u16::MAX
            );
        }
        let mut total_len = HEADER_LEN as u64
            + ENTRY_LEN as u64 * self.entries.len() as u64;
        for entry in self.entries.iter() {
            size_to_byte(entry.width)?;
            size_to_byte(entry.height)?;
            total_len += entry.data.len() as u64;
        }
        if total_len > u32::MAX as u64 {
            invalid_input!(
                "ICO file too large (was {} bytes, but max is {})",
                total_len,
                u32::MAX
            );
        }
        writer.write_u16::<LittleEndian>(0)?; // reserved
        writer.write_u16::<LittleEndian>(ICON_RESOURCE_TYPE)?;
        writer.write_u16::<LittleEndian>(self.entries.len() as u16)?;
        let mut data_offset =
            HEADER_LEN + ENTRY_LEN * (self.entries.len() as u32);
        for entry in self.entries.iter() {
            writer.write_u8(size_to_byte(entry.width)?)?;
            writer.write_u8(size_to_byte(entry.height)?)?;
            writer.write_u8(entry.num_colors)?;
            writer.write_u8(0)?; // reserved
            writer.write_u16::<LittleEndian>(entry.color_planes)?;
            writer.write_u16::<LittleEndian>(entry.bits_per_pixel)?;
            let data_size = entry.data.len() as u32;
            writer.write_u32::<LittleEndian>(data_size)?;
            writer.write_u32::<LittleEndian>(data_offset)?;
            data_offset += data_size;
        }
        for entry in self.entries.iter() {
            writer.write_all(&entry.data)?;
        }
        Ok(())
    }

    /// Writes the ICO file into a new byte vector.
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut output = Vec::new();
        self.write(&mut output)?;
        Ok(output)
    }
}

// A width/height byte of zero indicates a size of 256.
fn size_from_byte(byte: u8) -> u32 {
    if byte == 0 {
        256
    } else {
        byte as u32
    }
}

fn size_to_byte(size: u32) -> io::Result<u8> {
    match size {
        256 => Ok(0),
        1..=255 => Ok(size as u8),
        _ => invalid_input!(
            "Icon dimension {} can't be stored in an ICONDIRENTRY \
             (must be between 1 and 256)",
            size
        ),
    }
}

//===========================================================================//

/// One entry in an ICO file; a single PNG-encoded icon image.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct IconDirEntry {
    width: u32,
    height: u32,
    num_colors: u8,
    color_planes: u16,
    bits_per_pixel: u16,
    data: Vec<u8>,
}

impl IconDirEntry {
    /// Returns the width of the image, in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the image, in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the color-table size recorded in the entry (zero for
    /// true-color images).
    pub fn num_colors(&self) -> u8 {
        self.num_colors
    }

    /// Returns the number of color planes recorded in the entry.
    pub fn color_planes(&self) -> u16 {
        self.color_planes
    }

    /// Returns the bits-per-pixel (color depth) of the image.
    pub fn bits_per_pixel(&self) -> u16 {
        self.bits_per_pixel
    }

    /// Returns true if the image is encoded as a PNG.
    pub fn is_png(&self) -> bool {
        self.data.starts_with(PNG_SIGNATURE)
    }

    /// Returns the raw, encoded image data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Decodes this entry into an image.  Returns an error if the data is not
    /// a PNG, is malformed, or doesn't match the recorded dimensions.
    pub fn decode(&self) -> io::Result<IconImage> {
        if !self.is_png() {
            invalid_data!("Only PNG-encoded icon entries are supported");
        }
        let image = IconImage::read_png(self.data.as_slice())?;
        if image.size() != self.width || image.size() != self.height {
            invalid_data!(
                "Encoded image has wrong dimensions \
                 (was {}x{}, but should be {}x{})",
                image.size(),
                image.size(),
                self.width,
                self.height
            );
        }
        Ok(image)
    }

    /// Encodes an image as a 32-bit PNG in a new entry.  Returns an error if
    /// the encoding fails.
    pub fn encode_png(image: &IconImage) -> io::Result<IconDirEntry> {
        let data = image.to_png_bytes()?;
        Ok(IconDirEntry {
            width: image.size(),
            height: image.size(),
            num_colors: 0,
            color_planes: 1,
            bits_per_pixel: BITS_PER_PIXEL,
            data,
        })
    }
}

//===========================================================================//


//===========================================================================//
