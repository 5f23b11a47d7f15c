use crate::Version;

/// Absolute ceiling on content length, in characters, checked before any encoding attempt. The
/// real capacity depends on version and error correction level and is enforced by the encoder.
pub const MAX_CONTENT_CHARS: usize = 4000;

/// Height in pixels of the title banner drawn above the symbol.
pub const TITLE_BANNER_HEIGHT: u32 = 80;

/// Largest side in pixels of a rendered symbol, banner excluded.
pub const MAX_IMAGE_SIDE: u32 = 16_384;

/// Logo size fractions above this value are accepted but risk an unreadable symbol.
pub const LOGO_SIZE_WARNING: f32 = 0.3;

/// Determine the QR code's canvas size in modules for the given `version`.
/// # Example
/// ```
/// use qrstamp_core::{qrstandard, Version};
/// assert_eq!(qrstandard::canvas_size(Version::V01), 21);
/// assert_eq!(qrstandard::canvas_size(Version::V40), 177);
/// ```
pub fn canvas_size(version: Version) -> usize {
    17 + version.number() as usize * 4
}
