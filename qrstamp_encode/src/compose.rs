use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, Rgb, RgbImage, RgbaImage};
use log::{debug, warn};
use qrstamp_core::qrstandard;
use qrstamp_core::CompositionOptions;

use crate::font::TitleFont;
use crate::Error;

/// Adds a title banner above an image.
#[derive(Debug, Clone, Copy)]
pub struct TitleCompositor<'f> {
    font: &'f TitleFont,
    background: [u8; 3],
    text_color: [u8; 3],
    font_size: f32,
}

impl<'f> TitleCompositor<'f> {
    /// Construct a new [TitleCompositor] drawing with `font` and the banner settings of
    /// `options`. The font size must fit in the banner.
    pub fn new(font: &'f TitleFont, options: &CompositionOptions) -> Result<Self, Error> {
        let font_size = options.font_size;
        let max = qrstandard::TITLE_BANNER_HEIGHT as f32;
        if !(1.0..=max).contains(&font_size) {
            return Err(Error::InvalidParameter(format!(
                "font size must be between 1 and {}, got {}",
                max, font_size
            )));
        }
        Ok(Self {
            font,
            background: options.title_background.rgb(),
            text_color: options.title_color.rgb(),
            font_size,
        })
    }

    pub fn banner_height(&self) -> u32 {
        qrstandard::TITLE_BANNER_HEIGHT
    }

    /// Top-left corner of `title` inside the banner of an image `width` pixels wide. The
    /// horizontal offset is negative when the title is wider than the image.
    pub fn text_origin(&self, width: u32, title: &str) -> (i64, i64) {
        let text_width = self.font.text_width(title, self.font_size) as i64;
        let x = (width as i64 - text_width).div_euclid(2);
        let y = (self.banner_height() as i64 - self.font_size as i64).div_euclid(2);
        (x, y)
    }

    /// Return `image` with the banner and `title` on top. Without a title, or with an empty one,
    /// `image` is returned untouched.
    pub fn add_title(&self, image: RgbImage, title: Option<&str>) -> RgbImage {
        let Some(title) = title.filter(|title| !title.is_empty()) else {
            return image;
        };
        let (width, height) = image.dimensions();
        let row_len = width as usize * 3;
        let banner_len = row_len * self.banner_height() as usize;

        let mut canvas = RgbImage::from_pixel(width, height + self.banner_height(), Rgb(self.background));
        let buffer: &mut [u8] = &mut canvas;
        if row_len > 0 {
            for (dst, src) in buffer[banner_len..]
                .chunks_exact_mut(row_len)
                .zip(image.as_raw().chunks_exact(row_len))
            {
                dst.copy_from_slice(src);
            }
        }

        let (x, y) = self.text_origin(width, title);
        debug!("title '{}' drawn at ({}, {})", title, x, y);
        self.font
            .draw(&mut canvas, x, y, title, self.font_size, self.text_color);
        canvas
    }
}

/// Where a logo lands on the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoPlacement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Overlays a logo at the center of an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogoCompositor {
    size_fraction: f32,
}

impl LogoCompositor {
    /// Construct a new [LogoCompositor]. `size_fraction` must be strictly between 0 and 1; values
    /// above 0.3 are accepted but may hide too much of the symbol for it to be read.
    pub fn new(size_fraction: f32) -> Result<Self, Error> {
        let in_range = size_fraction > 0.0 && size_fraction < 1.0;
        if !in_range {
            return Err(Error::InvalidParameter(format!(
                "logo size must be between 0 and 1 (exclusive), got {}",
                size_fraction
            )));
        }
        if size_fraction > qrstandard::LOGO_SIZE_WARNING {
            warn!(
                "logo size {} exceeds {}, the code may not scan reliably",
                size_fraction,
                qrstandard::LOGO_SIZE_WARNING
            );
        }
        Ok(Self { size_fraction })
    }

    pub fn size_fraction(&self) -> f32 {
        self.size_fraction
    }

    /// Compute the size and position of a `logo_width` x `logo_height` logo on a `width` x
    /// `height` image. A logo whose longer side exceeds `floor(f * min(width, height))` is
    /// shrunk to that side, keeping its aspect ratio. Smaller logos keep their native size.
    /// # Example
    /// ```
    /// use qrstamp_encode::LogoCompositor;
    /// let compositor = LogoCompositor::new(0.2).unwrap();
    /// let placement = compositor.placement(500, 500, 300, 150);
    /// assert_eq!((placement.width, placement.height), (100, 50));
    /// assert_eq!((placement.x, placement.y), (200, 225));
    /// let placement = compositor.placement(500, 500, 40, 20);
    /// assert_eq!((placement.width, placement.height), (40, 20));
    /// ```
    pub fn placement(&self, width: u32, height: u32, logo_width: u32, logo_height: u32) -> LogoPlacement {
        let limit = ((self.size_fraction * width.min(height) as f32).floor() as u32).max(1);
        let longer = logo_width.max(logo_height).max(1);
        let (w, h) = if longer <= limit {
            (logo_width.max(1), logo_height.max(1))
        } else {
            let scaled = |side: u32| ((side as u64 * limit as u64 / longer as u64) as u32).max(1);
            if logo_width >= logo_height {
                (limit, scaled(logo_height))
            } else {
                (scaled(logo_width), limit)
            }
        };
        LogoPlacement {
            x: width.saturating_sub(w) / 2,
            y: height.saturating_sub(h) / 2,
            width: w,
            height: h,
        }
    }

    /// Return `image` with `logo` pasted at its center. A logo with an alpha channel is blended,
    /// any other logo replaces the pixels below it. GIF logos always decode with alpha, so their
    /// transparent color lets the image show through and their opaque pixels replace it.
    pub fn add_logo(&self, mut image: RgbImage, logo: &DynamicImage) -> RgbImage {
        let (width, height) = image.dimensions();
        let placement = self.placement(width, height, logo.width(), logo.height());
        debug!("logo placed at {:?}", placement);
        let source = logo.to_rgba8();
        let resized: RgbaImage = if source.dimensions() == (placement.width, placement.height) {
            source
        } else {
            imageops::resize(&source, placement.width, placement.height, FilterType::CatmullRom)
        };
        let blend = logo.color().has_alpha();
        for (lx, ly, src) in resized.enumerate_pixels() {
            let (x, y) = (placement.x + lx, placement.y + ly);
            if x >= width || y >= height {
                continue;
            }
            let dst = image.get_pixel_mut(x, y);
            let [r, g, b, a] = src.0;
            if !blend {
                dst.0 = [r, g, b];
                continue;
            }
            let a = a as u32;
            for (d, s) in dst.0.iter_mut().zip([r, g, b]) {
                *d = ((s as u32 * a + *d as u32 * (255 - a) + 127) / 255) as u8;
            }
        }
        image
    }
}

/// File extensions accepted for logos.
pub const LOGO_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Load the logo at `path`.
pub fn load_logo(path: &Path) -> Result<DynamicImage, Error> {
    if !path.is_file() {
        return Err(Error::LogoNotFound(path.to_path_buf()));
    }
    let extension = crate::output::extension_of(path);
    if !LOGO_EXTENSIONS.contains(&extension.as_str()) {
        return Err(Error::UnsupportedLogoFormat {
            path: path.to_path_buf(),
            reason: format!("extension '{}', expected one of png, jpg, jpeg, gif", extension),
        });
    }
    let reader = ImageReader::open(path).map_err(|_| Error::LogoNotFound(path.to_path_buf()))?;
    reader.decode().map_err(|err| match err {
        image::ImageError::IoError(_) => Error::LogoNotFound(path.to_path_buf()),
        other => Error::UnsupportedLogoFormat {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })
}
