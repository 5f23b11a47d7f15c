use std::fmt::Write as _;
use std::io::Write;

use image::{Rgb, RgbImage};
use qrstamp_core::{qrstandard, Color, Module, ModuleGrid, SymbolSpec, Version};

use crate::Error;

/// Renders a [ModuleGrid] into an RGB pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rasterizer {
    box_size: u32,
    border: u32,
    foreground: [u8; 3],
    background: [u8; 3],
}

impl Rasterizer {
    /// Construct a new [Rasterizer]. Fails if `box_size` is zero, or if even the smallest symbol
    /// would exceed [qrstandard::MAX_IMAGE_SIDE].
    pub fn new(box_size: u32, border: u32, foreground: Color, background: Color) -> Result<Self, Error> {
        if box_size < 1 {
            return Err(Error::InvalidParameter(
                "box size must be a positive integer".into(),
            ));
        }
        let rasterizer = Self {
            box_size,
            border,
            foreground: foreground.rgb(),
            background: background.rgb(),
        };
        rasterizer.image_side(qrstandard::canvas_size(Version::V01))?;
        Ok(rasterizer)
    }

    /// Construct a [Rasterizer] from the rendering fields of `spec`.
    pub fn from_spec(spec: &SymbolSpec) -> Result<Self, Error> {
        Self::new(spec.box_size, spec.border, spec.foreground, spec.background)
    }

    /// Side of the rendered image in pixels for a grid of `modules` modules.
    /// # Example
    /// ```
    /// use qrstamp_core::Color;
    /// use qrstamp_encode::Rasterizer;
    /// let rasterizer = Rasterizer::new(10, 4, Color::BLACK, Color::WHITE).unwrap();
    /// assert_eq!(rasterizer.image_side(21).unwrap(), 290);
    /// assert!(rasterizer.image_side(2000).is_err());
    /// ```
    pub fn image_side(&self, modules: usize) -> Result<u32, Error> {
        u32::try_from(modules)
            .ok()
            .and_then(|modules| self.border.checked_mul(2)?.checked_add(modules))
            .and_then(|modules| modules.checked_mul(self.box_size))
            .filter(|side| *side <= qrstandard::MAX_IMAGE_SIDE)
            .ok_or_else(|| {
                Error::InvalidParameter(format!(
                    "box size {} and border {} make a {} module symbol wider than {} pixels",
                    self.box_size,
                    self.border,
                    modules,
                    qrstandard::MAX_IMAGE_SIDE
                ))
            })
    }

    /// Render the `grid`.
    pub fn render<G: AsRef<ModuleGrid>>(&self, grid: G) -> Result<RgbImage, Error> {
        let grid = grid.as_ref();
        let side = self.image_side(grid.size())?;
        let box_size = self.box_size as usize;
        let border_px = self.border as usize * box_size;
        let row_len = side as usize * 3;

        let mut image = RgbImage::from_pixel(side, side, Rgb(self.background));
        let buffer: &mut [u8] = &mut image;
        // Each module row becomes a single scanline, copied into `box_size` pixel rows.
        let mut scanline = self.background.repeat(side as usize);
        for (i, row) in grid.rows().enumerate() {
            for (j, bit) in row.iter().enumerate() {
                let color = if *bit { &self.foreground } else { &self.background };
                let start = (border_px + j * box_size) * 3;
                for pixel in scanline[start..start + box_size * 3].chunks_exact_mut(3) {
                    pixel.copy_from_slice(color);
                }
            }
            let top = (border_px + i * box_size) * row_len;
            for dst in buffer[top..top + box_size * row_len].chunks_exact_mut(row_len) {
                dst.copy_from_slice(&scanline);
            }
        }
        Ok(image)
    }
}

/// Renders a [ModuleGrid] as an SVG document with one path for all dark modules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgRenderer {
    rasterizer: Rasterizer,
}

impl SvgRenderer {
    pub fn new(rasterizer: Rasterizer) -> Self {
        Self { rasterizer }
    }

    /// Side of the document in pixels for a grid of `modules` modules.
    pub fn image_side(&self, modules: usize) -> Result<u32, Error> {
        self.rasterizer.image_side(modules)
    }

    /// Write the `<rect>` and `<path>` elements of the symbol, offset vertically by `top` pixels.
    pub fn write_symbol(&self, out: &mut String, grid: &ModuleGrid, top: u32) -> Result<(), Error> {
        let Rasterizer {
            box_size,
            border,
            foreground,
            background,
        } = self.rasterizer;
        let side = self.image_side(grid.size())?;
        let _ = writeln!(
            out,
            "\t<rect x=\"0\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
            top,
            side,
            side,
            hex(background)
        );
        out.push_str("\t<path d=\"");
        let mut first = true;
        for (i, row) in grid.rows().enumerate() {
            for (j, bit) in row.iter().enumerate() {
                if !*bit {
                    continue;
                }
                if !first {
                    out.push(' ');
                }
                first = false;
                let x = (j as u32 + border) * box_size;
                let y = (i as u32 + border) * box_size + top;
                let _ = write!(out, "M{},{}h{}v{}h-{}z", x, y, box_size, box_size, box_size);
            }
        }
        let _ = writeln!(out, "\" fill=\"{}\"/>", hex(foreground));
        Ok(())
    }

    /// Render a complete document for `grid`.
    pub fn render<G: AsRef<ModuleGrid>>(&self, grid: G) -> Result<String, Error> {
        let grid = grid.as_ref();
        let side = self.image_side(grid.size())?;
        let mut out = svg_header(side, side);
        self.write_symbol(&mut out, grid, 0)?;
        out.push_str("</svg>\n");
        Ok(out)
    }
}

/// Opening of an SVG document of the given size in pixels.
pub(crate) fn svg_header(width: u32, height: u32) -> String {
    let mut out = String::new();
    out += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    out += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" version=\"1.1\" width=\"{0}\" height=\"{1}\" viewBox=\"0 0 {0} {1}\" stroke=\"none\">",
        width, height
    );
    out
}

pub(crate) fn hex([r, g, b]: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

pub struct AsciiRenderer {
    light_pattern: Box<str>,
    dark_pattern: Box<str>,
    border: usize,
}

impl AsciiRenderer {
    /// Construct a new [AsciiRenderer] that uses "██" to render dark modules and "  " to print light ones, with a
    /// border of 2 modules.
    pub fn new() -> Self {
        Self {
            light_pattern: "  ".into(),
            dark_pattern: "██".into(),
            border: 2,
        }
    }

    /// Set the light module `pattern` to be used when rendering.
    pub fn with_light_pattern(mut self, pattern: &str) -> Self {
        self.light_pattern = pattern.into();
        self
    }

    /// Set the dark module `pattern` to be used when rendering.
    pub fn with_dark_pattern(mut self, pattern: &str) -> Self {
        self.dark_pattern = pattern.into();
        self
    }

    /// Set the number of light modules printed around the symbol.
    pub fn with_border(mut self, border: usize) -> Self {
        self.border = border;
        self
    }

    /// Invert the light and dark patterns. Useful on terminals with a dark background.
    pub fn inverted(mut self) -> Self {
        std::mem::swap(&mut self.light_pattern, &mut self.dark_pattern);
        self
    }

    /// Peek at the pattern used to render light modules.
    pub fn light_pattern(&self) -> &str {
        self.light_pattern.as_ref()
    }

    /// Peek at the pattern used to render dark modules.
    pub fn dark_pattern(&self) -> &str {
        self.dark_pattern.as_ref()
    }

    /// Render the `grid` into `output`.
    pub fn render<G, W>(&self, output: &mut W, grid: G) -> std::io::Result<()>
    where
        G: AsRef<ModuleGrid>,
        W: Write,
    {
        let grid = grid.as_ref();
        let size = grid.size() + 2 * self.border;
        for i in 0..size {
            for j in 0..size {
                let dark = match (i.checked_sub(self.border), j.checked_sub(self.border)) {
                    (Some(i), Some(j)) => grid.is_dark(i, j),
                    _ => false,
                };
                let pattern = match Module::from(dark) {
                    Module::Dark => self.dark_pattern(),
                    Module::Light => self.light_pattern(),
                };
                write!(output, "{}", pattern)?;
            }
            writeln!(output)?;
        }
        Ok(())
    }
}

impl Default for AsciiRenderer {
    fn default() -> Self {
        Self::new()
    }
}
