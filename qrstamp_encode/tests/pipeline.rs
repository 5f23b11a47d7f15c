use std::fs;

use image::{GrayImage, Rgb, RgbImage, Rgba, RgbaImage};
use qrstamp_core::{Color, CompositionOptions, Ecl, LogoOptions, SymbolSpec};
use qrstamp_encode::payload::{wifi, Contact, WifiSecurity};
use qrstamp_encode::{Error, Generated, Generator, OutputFormat, OutputTarget};

/// Options drawing the title with the embedded font, so results do not depend on installed fonts.
fn titled(title: &str) -> CompositionOptions {
    CompositionOptions {
        fonts: Some(Vec::new()),
        ..Default::default()
    }
    .with_title(title)
}

fn small_spec() -> SymbolSpec {
    SymbolSpec {
        box_size: 4,
        ..Default::default()
    }
}

fn png(generated: Generated) -> RgbImage {
    let Generated::Bytes(bytes) = generated else {
        panic!("expected in-memory output");
    };
    image::load_from_memory(&bytes).unwrap().to_rgb8()
}

/// Read every symbol in `image` with an independent decoder.
fn read_symbols(image: &RgbImage) -> Vec<String> {
    let gray: GrayImage = image::DynamicImage::ImageRgb8(image.clone()).to_luma8();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        gray.width() as usize,
        gray.height() as usize,
        |x, y| gray.get_pixel(x as u32, y as u32).0[0],
    );
    prepared
        .detect_grids()
        .into_iter()
        .filter_map(|grid| grid.decode().ok())
        .map(|(_, content)| content)
        .collect()
}

#[test]
fn round_trip_through_external_reader() {
    let mut contact = Contact::new("Jane Doe");
    contact.phone = Some("+1 555 0100".into());
    contact.email = Some("jane@example.com".into());
    let payloads = [
        "https://example.com".to_string(),
        wifi("Net", Some("pass"), WifiSecurity::Wpa),
        contact.to_vcard(),
    ];
    let generator = Generator::new();
    for payload in payloads {
        let image = png(generator
            .generate(&payload, OutputFormat::Png, Some(&small_spec()), None)
            .unwrap());
        assert_eq!(read_symbols(&image), vec![payload]);
    }
}

#[test]
fn round_trip_with_title_and_logo() {
    let dir = tempfile::tempdir().unwrap();
    let logo = dir.path().join("logo.png");
    RgbaImage::from_pixel(32, 32, Rgba([200, 30, 30, 255])).save(&logo).unwrap();
    let spec = SymbolSpec {
        ecl: Ecl::H,
        ..small_spec()
    };
    let image = png(Generator::new()
        .generate_with_logo(
            "https://example.com",
            OutputFormat::Png,
            &LogoOptions::new(&logo),
            Some(&spec),
            Some(&titled("Example")),
        )
        .unwrap());
    assert_eq!(read_symbols(&image), vec!["https://example.com".to_string()]);
}

#[test]
fn title_adds_exactly_one_banner() {
    let generator = Generator::new();
    let plain = png(generator
        .generate("hello", OutputFormat::Png, Some(&small_spec()), None)
        .unwrap());
    let with_title = png(generator
        .generate("hello", OutputFormat::Png, Some(&small_spec()), Some(&titled("Greeting")))
        .unwrap());
    assert_eq!(with_title.width(), plain.width());
    assert_eq!(with_title.height(), plain.height() + 80);

    let untitled = png(generator
        .generate("hello", OutputFormat::Png, Some(&small_spec()), Some(&titled("")))
        .unwrap());
    assert_eq!(untitled, plain);
}

#[test]
fn custom_colors_are_used() {
    let spec = SymbolSpec {
        foreground: Color::Hex([0x10, 0x20, 0x30]),
        background: "yellow".parse().unwrap(),
        border: 1,
        box_size: 1,
        ..Default::default()
    };
    let image = png(Generator::new()
        .generate("hello", OutputFormat::Png, Some(&spec), None)
        .unwrap());
    assert_eq!(image.dimensions(), (23, 23));
    assert_eq!(image.get_pixel(0, 0), &Rgb([255, 255, 0]));
    // Top-left finder pattern corner.
    assert_eq!(image.get_pixel(1, 1), &Rgb([0x10, 0x20, 0x30]));
}

#[test]
fn logo_size_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let logo = dir.path().join("logo.png");
    RgbImage::from_pixel(50, 20, Rgb([0, 0, 255])).save(&logo).unwrap();
    let generator = Generator::new();
    for fraction in [0.0, 1.0] {
        let options = LogoOptions::new(&logo).with_size_fraction(fraction);
        assert!(matches!(
            generator.generate_with_logo("hello", OutputFormat::Png, &options, None, None),
            Err(Error::InvalidParameter(_))
        ));
    }

    let spec = SymbolSpec {
        ecl: Ecl::H,
        ..small_spec()
    };
    let options = LogoOptions::new(&logo).with_size_fraction(0.2);
    let image = png(generator
        .generate_with_logo("hello", OutputFormat::Png, &options, Some(&spec), None)
        .unwrap());
    // 29 modules * 4 px = 116 px; floor(0.2 * 116) = 23 px wide, 9 px high.
    let side = image.width();
    assert_eq!(side, 116);
    let blue: Vec<(u32, u32)> = image
        .enumerate_pixels()
        .filter(|(_, _, pixel)| pixel.0 == [0, 0, 255])
        .map(|(x, y, _)| (x, y))
        .collect();
    let min_x = blue.iter().map(|(x, _)| *x).min().unwrap();
    let max_x = blue.iter().map(|(x, _)| *x).max().unwrap();
    let min_y = blue.iter().map(|(_, y)| *y).min().unwrap();
    let max_y = blue.iter().map(|(_, y)| *y).max().unwrap();
    assert_eq!((min_x, max_x), (46, 68));
    assert_eq!((min_y, max_y), (53, 61));
}

#[test]
fn every_file_format_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Generator::new();
    let signatures: [(&str, &[u8]); 5] = [
        ("png", b"\x89PNG"),
        ("jpg", b"\xFF\xD8"),
        ("JPEG", b"\xFF\xD8"),
        ("gif", b"GIF8"),
        ("svg", b"<?xml"),
    ];
    for (extension, signature) in signatures {
        let path = dir.path().join("out").join(format!("code.{}", extension));
        let generated = generator
            .generate("hello", path.clone(), Some(&small_spec()), Some(&titled("Hi")))
            .unwrap();
        assert_eq!(generated, Generated::Path(path.clone()));
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(signature), "{}", extension);
    }
}

#[test]
fn failures_leave_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Generator::new();

    let bmp = dir.path().join("code.bmp");
    assert!(matches!(
        generator.generate("hello", bmp.clone(), None, None),
        Err(Error::UnsupportedOutputFormat(ext)) if ext == "bmp"
    ));
    assert!(!bmp.exists());

    let png_path = dir.path().join("code.png");
    let logo = LogoOptions::new(dir.path().join("missing.png"));
    assert!(matches!(
        generator.generate_with_logo("hello", png_path.clone(), &logo, None, None),
        Err(Error::LogoNotFound(_))
    ));
    let too_long = "x".repeat(4001);
    assert!(generator.generate(&too_long, png_path.clone(), None, None).is_err());
    assert!(!png_path.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn memory_target_matches_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("code.png");
    let generator = Generator::new();
    generator
        .generate("same", OutputTarget::Path(path.clone()), None, None)
        .unwrap();
    let generated = generator
        .generate("same", OutputTarget::Memory(OutputFormat::Png), None, None)
        .unwrap();
    assert_eq!(generated.bytes().unwrap(), fs::read(&path).unwrap().as_slice());
}
