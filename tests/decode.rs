extern crate icocraft;

use icocraft::{ConvertError, ConvertSettings, Converter, IconDir, TargetSizes};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use std::env;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

//===========================================================================//

#[test]
fn convert_png_file() {
    let dir = unique_temp_dir("png");
    let input = dir.join("logo.png");
    rgba_picture(64, 48).save(&input).unwrap();
    check_converted(&input, &[16, 32, 48]);
}

#[test]
fn convert_jpeg_file() {
    let dir = unique_temp_dir("jpeg");
    let input = dir.join("photo.jpg");
    let rgb = RgbImage::from_fn(80, 60, |x, y| Rgb([x as u8, y as u8, 99]));
    DynamicImage::ImageRgb8(rgb).save(&input).unwrap();
    check_converted(&input, &[32, 64]);
}

#[test]
fn convert_bmp_file() {
    let dir = unique_temp_dir("bmp");
    let input = dir.join("sprite.bmp");
    rgba_picture(20, 20).save(&input).unwrap();
    check_converted(&input, &[256, 16]);
}

#[test]
fn write_single_file_creates_parent_directory() {
    let dir = unique_temp_dir("single");
    let input = dir.join("logo.png");
    rgba_picture(64, 64).save(&input).unwrap();
    let output = dir.join("nested").join("deeper").join("logo.ico");
    let sizes = TargetSizes::new([16, 32]).unwrap();
    Converter::default().write_ico_file(&input, &output, &sizes).unwrap();
    let icondir = read_ico(&output);
    let widths: Vec<u32> =
        icondir.entries().iter().map(|entry| entry.width()).collect();
    assert_eq!(widths, vec![16, 32]);
}

#[test]
fn write_one_file_per_size() {
    let dir = unique_temp_dir("multiple");
    let input = dir.join("logo.png");
    rgba_picture(64, 64).save(&input).unwrap();
    let out_dir = dir.join("icons");
    let sizes = TargetSizes::new([32, 16]).unwrap();
    let converter = Converter::new(ConvertSettings::default());
    let paths = converter.write_ico_files(&input, &out_dir, &sizes).unwrap();
    assert_eq!(
        paths,
        vec![
            out_dir.join("favicon_32x32.ico"),
            out_dir.join("favicon_16x16.ico"),
        ]
    );
    for (path, &size) in paths.iter().zip(sizes.as_slice()) {
        let icondir = read_ico(path);
        assert_eq!(icondir.entries().len(), 1);
        assert_eq!(icondir.entries()[0].width(), size);
    }
}

#[test]
fn missing_input_is_not_found() {
    let dir = unique_temp_dir("missing");
    let input = dir.join("nothing-here.png");
    let output = dir.join("nothing-here.ico");
    let sizes = TargetSizes::new([16]).unwrap();
    let error = Converter::default()
        .write_ico_file(&input, &output, &sizes)
        .unwrap_err();
    assert!(matches!(error.kind(), ConvertError::NotFound(_)));
    assert_eq!(error.input_path(), input.as_path());
    assert_eq!(error.requested_sizes(), &[16]);
    assert!(!output.exists());
}

#[test]
fn undecodable_input_is_codec_error() {
    let dir = unique_temp_dir("garbage");
    let input = dir.join("broken.png");
    fs::write(&input, b"this is not a picture").unwrap();
    let output = dir.join("broken.ico");
    let sizes = TargetSizes::new([16, 32]).unwrap();
    let error = Converter::default()
        .write_ico_file(&input, &output, &sizes)
        .unwrap_err();
    assert!(matches!(error.kind(), ConvertError::Codec(_)), "{}", error);
    assert!(!output.exists());
}

//===========================================================================//

fn check_converted(input: &Path, sizes: &[u32]) {
    let sizes = TargetSizes::new(sizes.iter().copied()).unwrap();
    let data = Converter::default().convert_to_ico(input, &sizes).unwrap();
    let icondir = IconDir::read(Cursor::new(&data)).unwrap();
    assert_eq!(icondir.entries().len(), sizes.len());
    for (entry, size) in icondir.entries().iter().zip(sizes.iter()) {
        assert_eq!(entry.width(), size, "{:?}", input);
        let image = entry.decode().unwrap();
        assert_eq!(image.size(), size, "{:?}", input);
    }
}

fn read_ico(path: &Path) -> IconDir {
    let data = fs::read(path).unwrap();
    IconDir::read(Cursor::new(data)).unwrap()
}

fn rgba_picture(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 3 % 256) as u8, (y * 5 % 256) as u8, 0x80, 0xff])
    })
}

fn unique_temp_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = env::temp_dir().join(format!(
        "icocraft-decode-{}-{}-{}",
        label,
        std::process::id(),
        nanos
    ));
    fs::create_dir_all(&dir).unwrap();
    dir
}

//===========================================================================//
