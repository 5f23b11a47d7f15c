use std::ops::{Bound, RangeBounds, RangeInclusive};

use log::debug;
use qrcode::types::QrError;

use qrstamp_core::qrstandard;
use qrstamp_core::{Ecl, Meta, ModuleGrid, Symbol, Version};

/// Encoder for a QR code.
///
/// Error correction itself is delegated to the [qrcode] crate. The encoder only decides which
/// [Version] to ask for and turns the result into a [ModuleGrid].
#[derive(Debug, Clone)]
pub struct SymbolEncoder {
    constraints: Constraints,
}

impl SymbolEncoder {
    /// Construct a new encoder allowing every version at [Ecl::M].
    pub fn new() -> Self {
        Self {
            constraints: Default::default(),
        }
    }

    /// Encode `data`, picking the smallest allowed version that fits.
    pub fn encode<T: AsRef<[u8]>>(&self, data: T) -> Result<Symbol, EncodingError> {
        let data = data.as_ref();
        check_content(data)?;
        let ecl = self.constraints.ecl;
        let (vmin, vmax) = self.allowed_version_extremes();
        for version in vmin.up_to(vmax) {
            match qrcode::QrCode::with_version(data, primitive_version(version), primitive_ecl(ecl)) {
                Ok(code) => {
                    debug!("encoded {} B as version {} with ECL {}", data.len(), version, ecl);
                    return into_symbol(&code, Meta { version, ecl });
                }
                Err(QrError::DataTooLong) => continue,
                Err(other) => return Err(EncodingError::Primitive(other)),
            }
        }
        Err(EncodingError::CapacityExceeded(data.len(), vmax, ecl))
    }

    /// Transform a range of any type to an inclusive range, given the absolute minimum and maximum values as well as
    /// functions to increment and decrement values.
    fn any_range_to_inclusive<T, R, I, D>(
        range: R,
        abs_min: T,
        abs_max: T,
        incr: I,
        decr: D,
    ) -> RangeInclusive<T>
    where
        T: Clone + Copy,
        R: RangeBounds<T>,
        I: FnOnce(T) -> Option<T>,
        D: FnOnce(T) -> Option<T>,
    {
        let min = match range.start_bound() {
            Bound::Included(&min) => min,
            Bound::Excluded(&min) => incr(min).unwrap_or(abs_max),
            Bound::Unbounded => abs_min,
        };
        let max = match range.end_bound() {
            Bound::Included(&max) => max,
            Bound::Excluded(&max) => decr(max).unwrap_or(abs_min),
            Bound::Unbounded => abs_max,
        };
        min..=max
    }

    /// Get the range of allowed [Version]s.
    pub fn allowed_versions(&self) -> &RangeInclusive<Version> {
        &self.constraints.version
    }

    /// Constrain to the specified `version`.
    pub fn with_version(mut self, version: Version) -> Self {
        self.constraints.version = version..=version;
        self
    }

    /// Constrain [Version] to be inside `range`.
    pub fn with_version_in<T: RangeBounds<Version>>(mut self, range: T) -> Self {
        self.constraints.version = Self::any_range_to_inclusive(
            range,
            Version::MIN,
            Version::MAX,
            Version::incr,
            Version::decr,
        );
        self
    }

    /// Get the [Ecl] used for encoding.
    pub fn ecl(&self) -> Ecl {
        self.constraints.ecl
    }

    /// Encode with the specified `ecl`.
    pub fn with_ecl(mut self, ecl: Ecl) -> Self {
        self.constraints.ecl = ecl;
        self
    }

    /// Get the minimum and maximum allowed [Version]s according to the constraints.
    fn allowed_version_extremes(&self) -> (Version, Version) {
        (
            *self.constraints.version.start(),
            *self.constraints.version.end(),
        )
    }
}

impl Default for SymbolEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct Constraints {
    ecl: Ecl,
    version: RangeInclusive<Version>,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            ecl: Ecl::default(),
            version: Version::MIN..=Version::MAX,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("content cannot be empty")]
    EmptyContent,
    #[error("content is too long for a QR code: {0} characters, at most 4000 allowed")]
    ContentTooLong(usize),
    #[error("cannot encode {0} B of data with best case version {1} and ECL {2} according to the constraints")]
    CapacityExceeded(usize, Version, Ecl),
    #[error("QR encoding failed: {0}")]
    Primitive(QrError),
}

/// Reject content before attempting any encoding. Length is counted in characters for text and
/// in bytes otherwise.
fn check_content(data: &[u8]) -> Result<(), EncodingError> {
    if data.is_empty() {
        return Err(EncodingError::EmptyContent);
    }
    let len = match std::str::from_utf8(data) {
        Ok(text) => text.chars().count(),
        Err(_) => data.len(),
    };
    if len > qrstandard::MAX_CONTENT_CHARS {
        return Err(EncodingError::ContentTooLong(len));
    }
    Ok(())
}

fn primitive_version(version: Version) -> qrcode::Version {
    qrcode::Version::Normal(version.number() as i16)
}

fn primitive_ecl(ecl: Ecl) -> qrcode::EcLevel {
    match ecl {
        Ecl::L => qrcode::EcLevel::L,
        Ecl::M => qrcode::EcLevel::M,
        Ecl::Q => qrcode::EcLevel::Q,
        Ecl::H => qrcode::EcLevel::H,
    }
}

fn into_symbol(code: &qrcode::QrCode, meta: Meta) -> Result<Symbol, EncodingError> {
    let size = code.width();
    let modules = code
        .to_colors()
        .into_iter()
        .map(|color| color == qrcode::Color::Dark);
    ModuleGrid::from_row_major(size, modules)
        .and_then(|grid| Symbol::new(grid, meta))
        .ok_or(EncodingError::Primitive(QrError::InvalidVersion))
}

#[cfg(test)]
mod test {
    use super::*;

    /// Byte mode capacity of version 40, from the QR code standard tables.
    fn max_bytes(ecl: Ecl) -> usize {
        match ecl {
            Ecl::L => 2953,
            Ecl::M => 2331,
            Ecl::Q => 1663,
            Ecl::H => 1273,
        }
    }

    #[test]
    fn test_auto_version_picks_smallest() {
        let symbol = SymbolEncoder::new().encode("hello").unwrap();
        assert_eq!(symbol.meta().version, Version::V01);
        assert_eq!(symbol.meta().ecl, Ecl::M);
        assert_eq!(symbol.grid().size(), 21);
    }

    #[test]
    fn test_side_matches_version() {
        // Version 1 at ECL L holds 17 bytes, version 2 holds 32.
        let data = "x".repeat(20);
        let symbol = SymbolEncoder::new().with_ecl(Ecl::L).encode(&data).unwrap();
        assert_eq!(symbol.meta().version, Version::V02);
        assert_eq!(symbol.grid().size(), 17 + 4 * 2);
    }

    #[test]
    fn test_minimum_version_is_respected() {
        let symbol = SymbolEncoder::new()
            .with_version_in(Version::V05..)
            .encode("hi")
            .unwrap();
        assert_eq!(symbol.meta().version, Version::V05);
        assert_eq!(symbol.grid().size(), 37);
    }

    #[test]
    fn test_pinned_version_too_small() {
        let data = "x".repeat(100);
        let err = SymbolEncoder::new()
            .with_version(Version::V01)
            .encode(&data)
            .unwrap_err();
        assert!(matches!(
            err,
            EncodingError::CapacityExceeded(100, Version::V01, Ecl::M)
        ));
    }

    #[test]
    fn test_full_capacity_fits() {
        for ecl in [Ecl::L, Ecl::M, Ecl::Q, Ecl::H] {
            let data = vec![b'a'; max_bytes(ecl).min(qrstandard::MAX_CONTENT_CHARS)];
            let symbol = SymbolEncoder::new()
                .with_ecl(ecl)
                .with_version(Version::V40)
                .encode(&data)
                .unwrap();
            assert_eq!(symbol.grid().size(), 177);
        }
    }

    #[test]
    fn test_one_beyond_capacity_fails() {
        for ecl in [Ecl::L, Ecl::M, Ecl::Q, Ecl::H] {
            let data = vec![b'a'; max_bytes(ecl) + 1];
            let err = SymbolEncoder::new().with_ecl(ecl).encode(&data).unwrap_err();
            assert!(
                matches!(err, EncodingError::CapacityExceeded(_, Version::V40, e) if e == ecl),
                "unexpected error {:?}",
                err
            );
        }
    }

    #[test]
    fn test_empty_content() {
        assert!(matches!(
            SymbolEncoder::new().encode(""),
            Err(EncodingError::EmptyContent)
        ));
    }

    #[test]
    fn test_length_ceiling_before_encoding() {
        // Numeric content of this length would fit version 40, the ceiling still rejects it.
        let data = "1".repeat(4001);
        assert!(matches!(
            SymbolEncoder::new().with_ecl(Ecl::L).encode(&data),
            Err(EncodingError::ContentTooLong(4001))
        ));
        // Characters are counted, not bytes.
        let data = "é".repeat(1000);
        assert!(!matches!(
            SymbolEncoder::new().with_ecl(Ecl::L).encode(&data),
            Err(EncodingError::ContentTooLong(_))
        ));
    }

    #[test]
    fn test_excluded_range_bounds() {
        let encoder = SymbolEncoder::new().with_version_in((
            Bound::Excluded(Version::V02),
            Bound::Excluded(Version::V10),
        ));
        assert_eq!(encoder.allowed_versions(), &(Version::V03..=Version::V09));
    }

    #[test]
    fn test_deterministic() {
        let a = SymbolEncoder::new().encode("https://example.com").unwrap();
        let b = SymbolEncoder::new().encode("https://example.com").unwrap();
        assert_eq!(a.grid(), b.grid());
    }
}
