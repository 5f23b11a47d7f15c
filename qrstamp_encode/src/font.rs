//! Fonts used to draw the title banner.
//!
//! A font is chosen from an ordered list of font files. The first file that loads and parses as a
//! TrueType/OpenType font wins; when none does, the embedded 5x7 bitmap font is used, so a title
//! is never left blank. The default list is resolved once per process.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use image::RgbImage;
use log::{debug, warn};
use ttf_parser::{Face, GlyphId, OutlineBuilder};
use zeno::{Command, Mask, Vector};

#[cfg(target_os = "macos")]
pub fn default_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/System/Library/Fonts/Supplemental/Arial.ttf"),
        PathBuf::from("/Library/Fonts/Arial.ttf"),
        PathBuf::from("/System/Library/Fonts/Helvetica.ttc"),
        PathBuf::from("/System/Library/Fonts/Geneva.ttf"),
    ]
}

#[cfg(target_os = "windows")]
pub fn default_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from(r"C:\Windows\Fonts\arial.ttf"),
        PathBuf::from(r"C:\Windows\Fonts\segoeui.ttf"),
        PathBuf::from(r"C:\Windows\Fonts\tahoma.ttf"),
    ]
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub fn default_candidates() -> Vec<PathBuf> {
    vec![
        /* DejaVu, as packaged by Debian, Arch and Fedora */
        PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
        PathBuf::from("/usr/share/fonts/TTF/DejaVuSans.ttf"),
        PathBuf::from("/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf"),
        /* Other sans-serif fallbacks */
        PathBuf::from("/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf"),
        PathBuf::from("/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf"),
        PathBuf::from("/usr/share/fonts/noto/NotoSans-Regular.ttf"),
        PathBuf::from("/usr/share/fonts/truetype/freefont/FreeSans.ttf"),
    ]
}

/// A font able to measure and draw a single line of text.
#[derive(Debug, Clone)]
pub enum TitleFont {
    TrueType(TrueTypeFont),
    Bitmap(BitmapFont),
}

impl TitleFont {
    /// Pick the first candidate that loads, or the embedded font.
    pub fn resolve<P: AsRef<Path>>(candidates: &[P]) -> Self {
        for path in candidates {
            let path = path.as_ref();
            match TrueTypeFont::load(path) {
                Some(font) => {
                    debug!("title font: {}", path.display());
                    return TitleFont::TrueType(font);
                }
                None => debug!("title font candidate unavailable: {}", path.display()),
            }
        }
        warn!("no title font candidate available, using the embedded bitmap font");
        TitleFont::embedded()
    }

    /// The embedded bitmap font.
    pub fn embedded() -> Self {
        TitleFont::Bitmap(BitmapFont)
    }

    /// The font resolved from [default_candidates], computed on first use.
    pub fn system_default() -> &'static TitleFont {
        static DEFAULT: OnceLock<TitleFont> = OnceLock::new();
        DEFAULT.get_or_init(|| TitleFont::resolve(&default_candidates()))
    }

    /// Width in pixels of `text` drawn at `size` pixels.
    pub fn text_width(&self, text: &str, size: f32) -> u32 {
        match self {
            TitleFont::TrueType(font) => font.text_width(text, size),
            TitleFont::Bitmap(font) => font.text_width(text, size),
        }
    }

    /// Draw `text` with the top of the line at `(x, y)`. Pixels outside `image` are clipped.
    pub fn draw(&self, image: &mut RgbImage, x: i64, y: i64, text: &str, size: f32, color: [u8; 3]) {
        match self {
            TitleFont::TrueType(font) => font.draw(image, x, y, text, size, color),
            TitleFont::Bitmap(font) => font.draw(image, x, y, text, size, color),
        }
    }
}

/// A font file, parsed with [ttf_parser] and rasterized with [zeno].
#[derive(Clone)]
pub struct TrueTypeFont {
    path: PathBuf,
    data: Vec<u8>,
}

impl std::fmt::Debug for TrueTypeFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrueTypeFont")
            .field("path", &self.path)
            .field("len", &self.data.len())
            .finish()
    }
}

impl TrueTypeFont {
    /// Load the font at `path`. Returns `None` if it cannot be read or is not a usable font.
    pub fn load(path: &Path) -> Option<Self> {
        let data = std::fs::read(path).ok()?;
        let font = Self {
            path: path.to_path_buf(),
            data,
        };
        let usable = font
            .face()
            .is_some_and(|face| face.units_per_em() > 0 && face.glyph_index('A').is_some());
        usable.then_some(font)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, 0).ok()
    }

    fn glyph(face: &Face<'_>, c: char) -> GlyphId {
        face.glyph_index(c).unwrap_or(GlyphId(0))
    }

    fn text_width(&self, text: &str, size: f32) -> u32 {
        let Some(face) = self.face() else {
            return 0;
        };
        let scale = size / face.units_per_em() as f32;
        let advance: f32 = text
            .chars()
            .map(|c| face.glyph_hor_advance(Self::glyph(&face, c)).unwrap_or(0) as f32)
            .sum();
        (advance * scale).ceil() as u32
    }

    fn draw(&self, image: &mut RgbImage, x: i64, y: i64, text: &str, size: f32, color: [u8; 3]) {
        let Some(face) = self.face() else {
            return;
        };
        let scale = size / face.units_per_em() as f32;
        let mut commands = Vec::new();
        let mut pen = GlyphPen {
            commands: &mut commands,
            scale,
            x: x as f32,
            baseline: y as f32 + face.ascender() as f32 * scale,
        };
        for c in text.chars() {
            let glyph = Self::glyph(&face, c);
            face.outline_glyph(glyph, &mut pen);
            pen.x += face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * scale;
        }
        if commands.is_empty() {
            return;
        }
        let (coverage, placement) = Mask::new(commands.as_slice()).render();
        let width = placement.width as usize;
        for (row, line) in coverage.chunks(width.max(1)).enumerate() {
            for (col, &alpha) in line.iter().enumerate() {
                let px = placement.left as i64 + col as i64;
                let py = placement.top as i64 + row as i64;
                blend_pixel(image, px, py, color, alpha);
            }
        }
    }
}

/// Collects glyph outlines as [zeno] path commands, in image coordinates.
struct GlyphPen<'a> {
    commands: &'a mut Vec<Command>,
    scale: f32,
    x: f32,
    baseline: f32,
}

impl GlyphPen<'_> {
    fn point(&self, x: f32, y: f32) -> Vector {
        // Font units are y-up, the image is y-down.
        Vector::new(self.x + x * self.scale, self.baseline - y * self.scale)
    }
}

impl OutlineBuilder for GlyphPen<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.commands.push(Command::MoveTo(p));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.commands.push(Command::LineTo(p));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (c, p) = (self.point(x1, y1), self.point(x, y));
        self.commands.push(Command::QuadTo(c, p));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (c1, c2, p) = (self.point(x1, y1), self.point(x2, y2), self.point(x, y));
        self.commands.push(Command::CurveTo(c1, c2, p));
    }

    fn close(&mut self) {
        self.commands.push(Command::Close);
    }
}

/// Mix `color` into the pixel at `(x, y)` with coverage `alpha`, ignoring positions outside the
/// image.
fn blend_pixel(image: &mut RgbImage, x: i64, y: i64, color: [u8; 3], alpha: u8) {
    if alpha == 0 || x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return;
    }
    let pixel = image.get_pixel_mut(x as u32, y as u32);
    let a = alpha as u32;
    for (dst, src) in pixel.0.iter_mut().zip(color) {
        *dst = ((src as u32 * a + *dst as u32 * (255 - a) + 127) / 255) as u8;
    }
}

/// Embedded 5x7 font covering printable ASCII. Other characters are drawn as `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapFont;

impl BitmapFont {
    const GLYPH_WIDTH: u32 = 5;
    const GLYPH_HEIGHT: u32 = 7;
    /// Glyph width plus one column of spacing.
    const ADVANCE: u32 = Self::GLYPH_WIDTH + 1;

    /// Integer magnification making the 7 rows (plus one of descent) approach `size` pixels.
    /// # Example
    /// ```
    /// use qrstamp_encode::font::BitmapFont;
    /// assert_eq!(BitmapFont::pixel_scale(30.0), 4);
    /// assert_eq!(BitmapFont::pixel_scale(2.0), 1);
    /// ```
    pub fn pixel_scale(size: f32) -> u32 {
        ((size / (Self::GLYPH_HEIGHT + 1) as f32).round() as u32).max(1)
    }

    fn columns(c: char) -> &'static [u8; 5] {
        let index = match c {
            ' '..='~' => c as usize - ' ' as usize,
            _ => '?' as usize - ' ' as usize,
        };
        &FONT_5X7[index]
    }

    pub fn text_width(&self, text: &str, size: f32) -> u32 {
        let count = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        if count == 0 {
            return 0;
        }
        let scale = Self::pixel_scale(size);
        count
            .saturating_mul(Self::ADVANCE)
            .saturating_sub(1)
            .saturating_mul(scale)
    }

    pub fn draw(&self, image: &mut RgbImage, x: i64, y: i64, text: &str, size: f32, color: [u8; 3]) {
        let scale = Self::pixel_scale(size) as i64;
        for (k, c) in text.chars().enumerate() {
            let origin = x + k as i64 * Self::ADVANCE as i64 * scale;
            if origin >= image.width() as i64 {
                break;
            }
            for (col, bits) in Self::columns(c).iter().enumerate() {
                for row in 0..Self::GLYPH_HEIGHT as i64 {
                    if bits & (1 << row) == 0 {
                        continue;
                    }
                    let (bx, by) = (origin + col as i64 * scale, y + row * scale);
                    for dy in 0..scale {
                        for dx in 0..scale {
                            blend_pixel(image, bx + dx, by + dy, color, 255);
                        }
                    }
                }
            }
        }
    }
}

/// Column-major glyphs for `' '..='~'`, least significant bit at the top.
#[rustfmt::skip]
const FONT_5X7: [[u8; 5]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // !
    [0x00, 0x07, 0x00, 0x07, 0x00], // "
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // #
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // $
    [0x23, 0x13, 0x08, 0x64, 0x62], // %
    [0x36, 0x49, 0x55, 0x22, 0x50], // &
    [0x00, 0x05, 0x03, 0x00, 0x00], // '
    [0x00, 0x1C, 0x22, 0x41, 0x00], // (
    [0x00, 0x41, 0x22, 0x1C, 0x00], // )
    [0x08, 0x2A, 0x1C, 0x2A, 0x08], // *
    [0x08, 0x08, 0x3E, 0x08, 0x08], // +
    [0x00, 0x50, 0x30, 0x00, 0x00], // ,
    [0x08, 0x08, 0x08, 0x08, 0x08], // -
    [0x00, 0x60, 0x60, 0x00, 0x00], // .
    [0x20, 0x10, 0x08, 0x04, 0x02], // /
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // 0
    [0x00, 0x42, 0x7F, 0x40, 0x00], // 1
    [0x42, 0x61, 0x51, 0x49, 0x46], // 2
    [0x21, 0x41, 0x45, 0x4B, 0x31], // 3
    [0x18, 0x14, 0x12, 0x7F, 0x10], // 4
    [0x27, 0x45, 0x45, 0x45, 0x39], // 5
    [0x3C, 0x4A, 0x49, 0x49, 0x30], // 6
    [0x01, 0x71, 0x09, 0x05, 0x03], // 7
    [0x36, 0x49, 0x49, 0x49, 0x36], // 8
    [0x06, 0x49, 0x49, 0x29, 0x1E], // 9
    [0x00, 0x36, 0x36, 0x00, 0x00], // :
    [0x00, 0x56, 0x36, 0x00, 0x00], // ;
    [0x00, 0x08, 0x14, 0x22, 0x41], // <
    [0x14, 0x14, 0x14, 0x14, 0x14], // =
    [0x41, 0x22, 0x14, 0x08, 0x00], // >
    [0x02, 0x01, 0x51, 0x09, 0x06], // ?
    [0x32, 0x49, 0x79, 0x41, 0x3E], // @
    [0x7E, 0x11, 0x11, 0x11, 0x7E], // A
    [0x7F, 0x49, 0x49, 0x49, 0x36], // B
    [0x3E, 0x41, 0x41, 0x41, 0x22], // C
    [0x7F, 0x41, 0x41, 0x22, 0x1C], // D
    [0x7F, 0x49, 0x49, 0x49, 0x41], // E
    [0x7F, 0x09, 0x09, 0x01, 0x01], // F
    [0x3E, 0x41, 0x41, 0x51, 0x32], // G
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // H
    [0x00, 0x41, 0x7F, 0x41, 0x00], // I
    [0x20, 0x40, 0x41, 0x3F, 0x01], // J
    [0x7F, 0x08, 0x14, 0x22, 0x41], // K
    [0x7F, 0x40, 0x40, 0x40, 0x40], // L
    [0x7F, 0x02, 0x04, 0x02, 0x7F], // M
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // N
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // O
    [0x7F, 0x09, 0x09, 0x09, 0x06], // P
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // Q
    [0x7F, 0x09, 0x19, 0x29, 0x46], // R
    [0x46, 0x49, 0x49, 0x49, 0x31], // S
    [0x01, 0x01, 0x7F, 0x01, 0x01], // T
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // U
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // V
    [0x7F, 0x20, 0x18, 0x20, 0x7F], // W
    [0x63, 0x14, 0x08, 0x14, 0x63], // X
    [0x03, 0x04, 0x78, 0x04, 0x03], // Y
    [0x61, 0x51, 0x49, 0x45, 0x43], // Z
    [0x00, 0x00, 0x7F, 0x41, 0x41], // [
    [0x02, 0x04, 0x08, 0x10, 0x20], // backslash
    [0x41, 0x41, 0x7F, 0x00, 0x00], // ]
    [0x04, 0x02, 0x01, 0x02, 0x04], // ^
    [0x40, 0x40, 0x40, 0x40, 0x40], // _
    [0x00, 0x01, 0x02, 0x04, 0x00], // `
    [0x20, 0x54, 0x54, 0x54, 0x78], // a
    [0x7F, 0x48, 0x44, 0x44, 0x38], // b
    [0x38, 0x44, 0x44, 0x44, 0x20], // c
    [0x38, 0x44, 0x44, 0x48, 0x7F], // d
    [0x38, 0x54, 0x54, 0x54, 0x18], // e
    [0x08, 0x7E, 0x09, 0x01, 0x02], // f
    [0x08, 0x14, 0x54, 0x54, 0x3C], // g
    [0x7F, 0x08, 0x04, 0x04, 0x78], // h
    [0x00, 0x44, 0x7D, 0x40, 0x00], // i
    [0x20, 0x40, 0x44, 0x3D, 0x00], // j
    [0x00, 0x7F, 0x10, 0x28, 0x44], // k
    [0x00, 0x41, 0x7F, 0x40, 0x00], // l
    [0x7C, 0x04, 0x18, 0x04, 0x78], // m
    [0x7C, 0x08, 0x04, 0x04, 0x78], // n
    [0x38, 0x44, 0x44, 0x44, 0x38], // o
    [0x7C, 0x14, 0x14, 0x14, 0x08], // p
    [0x08, 0x14, 0x14, 0x18, 0x7C], // q
    [0x7C, 0x08, 0x04, 0x04, 0x08], // r
    [0x48, 0x54, 0x54, 0x54, 0x20], // s
    [0x04, 0x3F, 0x44, 0x40, 0x20], // t
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // u
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // v
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // w
    [0x44, 0x28, 0x10, 0x28, 0x44], // x
    [0x0C, 0x50, 0x50, 0x50, 0x3C], // y
    [0x44, 0x64, 0x54, 0x4C, 0x44], // z
    [0x00, 0x08, 0x36, 0x41, 0x00], // {
    [0x00, 0x00, 0x7F, 0x00, 0x00], // |
    [0x00, 0x41, 0x36, 0x08, 0x00], // }
    [0x02, 0x01, 0x02, 0x04, 0x02], // ~
];
