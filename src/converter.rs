use crate::config::ConvertSettings;
use crate::encoder::IcoEncoder;
use crate::error::{ConversionError, ConvertError};
use crate::sizes::TargetSizes;
use crate::source::SourceImage;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

//===========================================================================//

// Stem for per-size files written by `Converter::write_ico_files`.
const PER_SIZE_STEM: &str = "favicon";

//===========================================================================//

/// Converts one image file at a time.
///
/// Errors are returned as `ConversionError`s, which carry the input path and
/// requested sizes alongside the cause.
#[derive(Clone, Debug, Default)]
pub struct Converter {
    settings: ConvertSettings,
    encoder: IcoEncoder,
}

impl Converter {
    /// Creates a converter using the given settings.
    pub fn new(settings: ConvertSettings) -> Converter {
        let encoder = IcoEncoder::new(settings.resize_filter);
        Converter { settings, encoder }
    }

    /// Returns the settings this converter was created with.
    pub fn settings(&self) -> &ConvertSettings {
        &self.settings
    }

    /// Returns the encoder this converter uses.
    pub fn encoder(&self) -> &IcoEncoder {
        &self.encoder
    }

    /// Decodes `input` and returns the bytes of an ICO file holding every
    /// requested size.
    pub fn convert_to_ico(
        &self,
        input: &Path,
        sizes: &TargetSizes,
    ) -> Result<Vec<u8>, ConversionError> {
        let wrap =
            |error| ConversionError::new(input, sizes.as_slice(), error);
        let source = SourceImage::open(input).map_err(wrap)?;
        self.encoder.encode(&source, sizes).map_err(wrap)
    }

    /// Converts `input` and writes a single ICO file to `output`, creating the
    /// parent directory if needed.  Nothing is written unless encoding
    /// succeeds for every size.
    pub fn write_ico_file(
        &self,
        input: &Path,
        output: &Path,
        sizes: &TargetSizes,
    ) -> Result<(), ConversionError> {
        let data = self.convert_to_ico(input, sizes)?;
        write_output(output, &data).map_err(|error| {
            ConversionError::new(input, sizes.as_slice(), error)
        })?;
        log::info!(
            "Wrote {} ({}) from {}",
            output.display(),
            sizes,
            input.display()
        );
        Ok(())
    }

    /// Converts `input` into one ICO file per requested size inside
    /// `output_dir`, named `favicon_{size}x{size}.ico`.  The source is
    /// decoded only once.  Returns the written paths in request order.
    pub fn write_ico_files(
        &self,
        input: &Path,
        output_dir: &Path,
        sizes: &TargetSizes,
    ) -> Result<Vec<PathBuf>, ConversionError> {
        let wrap =
            |error| ConversionError::new(input, sizes.as_slice(), error);
        let source = SourceImage::open(input).map_err(wrap)?;
        let mut paths = Vec::with_capacity(sizes.len());
        for single in sizes.split() {
            let data = self.encoder.encode(&source, &single).map_err(wrap)?;
            let stem = OsStr::new(PER_SIZE_STEM);
            let path =
                output_dir.join(per_size_file_name(stem, single.first()));
            write_output(&path, &data).map_err(wrap)?;
            paths.push(path);
        }
        log::info!(
            "Wrote {} icon files ({}) from {}",
            paths.len(),
            sizes,
            input.display()
        );
        Ok(paths)
    }
}

//===========================================================================//

/// Returns the name of a per-size ICO file, e.g. `logo_32x32.ico`.
pub(crate) fn per_size_file_name(stem: &OsStr, size: u32) -> OsString {
    let mut name = stem.to_os_string();
    name.push(format!("_{}x{}.ico", size, size));
    name
}

/// Returns the name of an ICO file holding every size, e.g. `logo.ico`.
pub(crate) fn single_file_name(stem: &OsStr) -> OsString {
    let mut name = stem.to_os_string();
    name.push(".ico");
    name
}

/// Writes `data` to `path`, creating its parent directory first.  The data
/// goes to a hidden sibling file that is then renamed over `path`, so `path`
/// never holds a partially written icon.
pub(crate) fn write_output(
    path: &Path,
    data: &[u8],
) -> Result<(), ConvertError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|error| ConvertError::io(parent, error))?;
        }
    }
    let temp_path = temp_file_path(path)?;
    let result = fs::write(&temp_path, data)
        .and_then(|()| fs::rename(&temp_path, path));
    if let Err(error) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(ConvertError::io(path, error));
    }
    Ok(())
}

// Returns e.g. `out/.logo.ico.1234.tmp` for `out/logo.ico`.
fn temp_file_path(path: &Path) -> Result<PathBuf, ConvertError> {
    let name = match path.file_name() {
        Some(name) => name,
        None => invalid_request!("Output path {:?} has no file name", path),
    };
    let mut temp_name = OsString::from(".");
    temp_name.push(name);
    temp_name.push(format!(".{}.tmp", process::id()));
    Ok(path.with_file_name(temp_name))
}

//===========================================================================//


//===========================================================================//
