use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Color given by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedColor {
    Black,
    White,
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Cyan,
    Magenta,
    Gray,
    Grey,
    Orange,
    Pink,
    Brown,
}

impl NamedColor {
    const ALL: [NamedColor; 14] = [
        Self::Black,
        Self::White,
        Self::Red,
        Self::Green,
        Self::Blue,
        Self::Yellow,
        Self::Purple,
        Self::Cyan,
        Self::Magenta,
        Self::Gray,
        Self::Grey,
        Self::Orange,
        Self::Pink,
        Self::Brown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::White => "white",
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Purple => "purple",
            Self::Cyan => "cyan",
            Self::Magenta => "magenta",
            Self::Gray => "gray",
            Self::Grey => "grey",
            Self::Orange => "orange",
            Self::Pink => "pink",
            Self::Brown => "brown",
        }
    }

    /// Get the RGB value, following the CSS color keywords.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            Self::Black => [0, 0, 0],
            Self::White => [255, 255, 255],
            Self::Red => [255, 0, 0],
            Self::Green => [0, 128, 0],
            Self::Blue => [0, 0, 255],
            Self::Yellow => [255, 255, 0],
            Self::Purple => [128, 0, 128],
            Self::Cyan => [0, 255, 255],
            Self::Magenta => [255, 0, 255],
            Self::Gray | Self::Grey => [128, 128, 128],
            Self::Orange => [255, 165, 0],
            Self::Pink => [255, 192, 203],
            Self::Brown => [165, 42, 42],
        }
    }

    /// Look up a color by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|color| color.name().eq_ignore_ascii_case(name))
    }
}

/// A color as accepted at the API boundary.
///
/// Parsing happens once; downstream code only ever asks for [Color::rgb].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Color {
    Named(NamedColor),
    Hex([u8; 3]),
    Rgb([u8; 3]),
}

impl Color {
    pub const BLACK: Color = Color::Named(NamedColor::Black);
    pub const WHITE: Color = Color::Named(NamedColor::White);

    /// Get the RGB triple.
    /// # Example
    /// ```
    /// use qrstamp_core::Color;
    /// assert_eq!(Color::BLACK.rgb(), [0, 0, 0]);
    /// assert_eq!("#42f593".parse::<Color>().unwrap().rgb(), [0x42, 0xf5, 0x93]);
    /// ```
    pub fn rgb(&self) -> [u8; 3] {
        match self {
            Color::Named(named) => named.rgb(),
            Color::Hex(rgb) | Color::Rgb(rgb) => *rgb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    #[error("invalid color '{0}', use a hex code, an RGB triple or a named color")]
    Unrecognized(String),
    #[error("invalid RGB color '{0}', expected exactly 3 integers between 0 and 255")]
    InvalidRgb(String),
}

impl FromStr for Color {
    type Err = ColorError;

    /// Parse a color. Accepted forms are a name (`"orange"`), six hex digits with or without a
    /// leading `#` (`"#42f593"`), and three decimal components either bare (`"1,2,3"`) or wrapped
    /// in `rgb(...)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(named) = NamedColor::from_name(s) {
            return Ok(Color::Named(named));
        }
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            let channel = |k: usize| u8::from_str_radix(&hex[2 * k..2 * k + 2], 16);
            // Six validated hex digits always parse.
            if let (Ok(r), Ok(g), Ok(b)) = (channel(0), channel(1), channel(2)) {
                return Ok(Color::Hex([r, g, b]));
            }
        }
        let inner = s
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(s);
        if inner.contains(',') {
            let components: Vec<&str> = inner.split(',').map(str::trim).collect();
            let parsed: Option<Vec<u8>> = components.iter().map(|c| c.parse().ok()).collect();
            return match parsed.as_deref() {
                Some(&[r, g, b]) => Ok(Color::Rgb([r, g, b])),
                _ => Err(ColorError::InvalidRgb(s.to_string())),
            };
        }
        Err(ColorError::Unrecognized(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Named(named) => f.write_str(named.name()),
            Color::Hex([r, g, b]) => write!(f, "#{:02x}{:02x}{:02x}", r, g, b),
            Color::Rgb([r, g, b]) => write!(f, "rgb({}, {}, {})", r, g, b),
        }
    }
}
