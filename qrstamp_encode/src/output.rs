use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbImage};
use log::debug;

use crate::Error;

/// Format of a generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Gif,
    Svg,
}

impl OutputFormat {
    /// Determine the format from a file extension, ignoring case.
    /// # Example
    /// ```
    /// use qrstamp_encode::OutputFormat;
    /// assert_eq!(OutputFormat::from_extension("JPG"), Some(OutputFormat::Jpeg));
    /// assert_eq!(OutputFormat::from_extension("bmp"), None);
    /// ```
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    /// Determine the format from the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let extension = extension_of(path);
        Self::from_extension(&extension).ok_or(Error::UnsupportedOutputFormat(extension))
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Svg => "svg",
        }
    }

    /// Whether the format is a raster image format.
    pub fn is_raster(self) -> bool {
        self != Self::Svg
    }
}

/// Lowercase extension of `path`, empty if there is none.
pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Where a generated image goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write a file, the format follows the extension.
    Path(PathBuf),
    /// Keep the encoded bytes in memory.
    Memory(OutputFormat),
}

impl OutputTarget {
    pub fn format(&self) -> Result<OutputFormat, Error> {
        match self {
            OutputTarget::Path(path) => OutputFormat::from_path(path),
            OutputTarget::Memory(format) => Ok(*format),
        }
    }
}

impl From<PathBuf> for OutputTarget {
    fn from(value: PathBuf) -> Self {
        OutputTarget::Path(value)
    }
}

impl From<&Path> for OutputTarget {
    fn from(value: &Path) -> Self {
        OutputTarget::Path(value.to_path_buf())
    }
}

impl From<OutputFormat> for OutputTarget {
    fn from(value: OutputFormat) -> Self {
        OutputTarget::Memory(value)
    }
}

/// Result of a generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    /// The file that was written.
    Path(PathBuf),
    /// The encoded image.
    Bytes(Vec<u8>),
}

impl Generated {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Generated::Path(path) => Some(path),
            Generated::Bytes(_) => None,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Generated::Path(_) => None,
            Generated::Bytes(bytes) => Some(bytes),
        }
    }
}

/// Encode `image` in the raster `format`.
pub(crate) fn encode_raster(image: RgbImage, format: OutputFormat) -> Result<Vec<u8>, Error> {
    let (image, image_format) = match format {
        OutputFormat::Png => (DynamicImage::ImageRgb8(image), ImageFormat::Png),
        OutputFormat::Jpeg => (DynamicImage::ImageRgb8(image), ImageFormat::Jpeg),
        OutputFormat::Gif => (
            DynamicImage::ImageRgba8(DynamicImage::ImageRgb8(image).to_rgba8()),
            ImageFormat::Gif,
        ),
        OutputFormat::Svg => {
            return Err(Error::UnsupportedOutputFormat("svg".into()));
        }
    };
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), image_format)?;
    Ok(bytes)
}

/// Hand the encoded `bytes` over to `target`.
pub(crate) fn deliver(target: &OutputTarget, bytes: Vec<u8>) -> Result<Generated, Error> {
    match target {
        OutputTarget::Memory(_) => Ok(Generated::Bytes(bytes)),
        OutputTarget::Path(path) => {
            write_atomic(path, &bytes)?;
            Ok(Generated::Path(path.clone()))
        }
    }
}

/// Write `bytes` to `path` through a temporary file in the same directory, so `path` is either
/// left untouched or fully written.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let io_error = |source| Error::IoWrite {
        path: path.to_path_buf(),
        source,
    };
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&directory).map_err(io_error)?;
    let mut file = tempfile::NamedTempFile::new_in(&directory).map_err(io_error)?;
    file.write_all(bytes).map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path).map_err(|err| io_error(err.error))?;
    debug!("wrote {} B to {}", bytes.len(), path.display());
    Ok(())
}

/// Turn a title into a file name: spaces become underscores, anything but letters, digits, `_`
/// and `-` is dropped, and the result is cut to `max_len` characters. Falls back to `qr_code`.
/// # Example
/// ```
/// use qrstamp_encode::output::sanitize_filename;
/// assert_eq!(sanitize_filename("My WiFi: Home!", 50), "My_WiFi_Home");
/// assert_eq!(sanitize_filename("???", 50), "qr_code");
/// ```
pub fn sanitize_filename(title: &str, max_len: usize) -> String {
    let sanitized: String = title
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .take(max_len)
        .collect();
    if sanitized.is_empty() {
        "qr_code".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("a/b.PNG")).unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::from_path(Path::new("b.jpeg")).unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_path(Path::new("b.svg")).unwrap(), OutputFormat::Svg);
        assert!(matches!(
            OutputFormat::from_path(Path::new("b.bmp")),
            Err(Error::UnsupportedOutputFormat(ext)) if ext == "bmp"
        ));
        assert!(matches!(
            OutputFormat::from_path(Path::new("noext")),
            Err(Error::UnsupportedOutputFormat(ext)) if ext.is_empty()
        ));
    }

    #[test]
    fn test_encode_raster_signatures() {
        let image = RgbImage::from_pixel(8, 8, image::Rgb([10, 200, 30]));
        let png = encode_raster(image.clone(), OutputFormat::Png).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        let jpeg = encode_raster(image.clone(), OutputFormat::Jpeg).unwrap();
        assert!(jpeg.starts_with(&[0xFF, 0xD8]));
        let gif = encode_raster(image.clone(), OutputFormat::Gif).unwrap();
        assert!(gif.starts_with(b"GIF8"));
        assert!(encode_raster(image, OutputFormat::Svg).is_err());
    }

    #[test]
    fn test_write_atomic_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.png");
        write_atomic(&path, b"data").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"data");
        // Only the target file is left behind.
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_atomic_failure_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let path = blocker.join("out.png");
        assert!(matches!(
            write_atomic(&path, b"data"),
            Err(Error::IoWrite { path: p, .. }) if p == path
        ));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Contact: Jane Doe", 50), "Contact_Jane_Doe");
        assert_eq!(sanitize_filename("abcdef", 3), "abc");
        assert_eq!(sanitize_filename("", 50), "qr_code");
    }
}
