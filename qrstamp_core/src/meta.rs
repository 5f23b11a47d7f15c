use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::qrstandard;

/// Resolved parameters of an encoded symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meta {
    pub version: Version,
    pub ecl: Ecl,
}

impl Meta {
    pub fn canvas_size(&self) -> usize {
        qrstandard::canvas_size(self.version)
    }
}

/// Version of a QR code, which determines its size.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
#[rustfmt::skip]
pub enum Version {
    V01 =  1, V02 =  2, V03 =  3, V04 =  4, V05 =  5, V06 =  6, V07 =  7, V08 =  8, V09 =  9, V10 = 10,
    V11 = 11, V12 = 12, V13 = 13, V14 = 14, V15 = 15, V16 = 16, V17 = 17, V18 = 18, V19 = 19, V20 = 20,
    V21 = 21, V22 = 22, V23 = 23, V24 = 24, V25 = 25, V26 = 26, V27 = 27, V28 = 28, V29 = 29, V30 = 30,
    V31 = 31, V32 = 32, V33 = 33, V34 = 34, V35 = 35, V36 = 36, V37 = 37, V38 = 38, V39 = 39, V40 = 40,
}

impl Version {
    pub const MIN: Version = Version::V01;
    pub const MAX: Version = Version::V40;

    /// Construct a new version given its number. Valid version numbers are in the range 1..=40.
    /// # Example
    /// ```
    /// use qrstamp_core::Version;
    /// assert!(Version::new(1).is_some());
    /// assert!(Version::new(50).is_none());
    /// ```
    pub const fn new(number: u8) -> Option<Self> {
        let version = match number {
             1 => Self::V01,  2 => Self::V02,  3 => Self::V03,  4 => Self::V04,  5 => Self::V05,  6 => Self::V06,  7 => Self::V07,  8 => Self::V08,  9 => Self::V09, 10 => Self::V10,
            11 => Self::V11, 12 => Self::V12, 13 => Self::V13, 14 => Self::V14, 15 => Self::V15, 16 => Self::V16, 17 => Self::V17, 18 => Self::V18, 19 => Self::V19, 20 => Self::V20,
            21 => Self::V21, 22 => Self::V22, 23 => Self::V23, 24 => Self::V24, 25 => Self::V25, 26 => Self::V26, 27 => Self::V27, 28 => Self::V28, 29 => Self::V29, 30 => Self::V30,
            31 => Self::V31, 32 => Self::V32, 33 => Self::V33, 34 => Self::V34, 35 => Self::V35, 36 => Self::V36, 37 => Self::V37, 38 => Self::V38, 39 => Self::V39, 40 => Self::V40,
            _ => return None,
        };
        Some(version)
    }

    /// Get the version number.
    /// # Example
    /// ```
    /// use qrstamp_core::Version;
    /// assert_eq!(Version::V12.number(), 12);
    /// ```
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Get the next higher version, if it exists.
    /// # Example
    /// ```
    /// use qrstamp_core::Version;
    /// assert_eq!(Version::V10.incr(), Some(Version::V11));
    /// assert_eq!(Version::V40.incr(), None);
    /// ```
    pub fn incr(self) -> Option<Self> {
        Self::new(self.number() + 1)
    }

    /// Get the next lower version, if it exists.
    /// # Example
    /// ```
    /// use qrstamp_core::Version;
    /// assert_eq!(Version::V10.decr(), Some(Version::V09));
    /// assert_eq!(Version::V01.decr(), None);
    /// ```
    pub fn decr(self) -> Option<Self> {
        Self::new(self.number() - 1)
    }

    /// Iterate over the versions from `self` up to `last`, both included.
    pub fn up_to(self, last: Version) -> impl Iterator<Item = Version> {
        (self.number()..=last.number()).filter_map(Version::new)
    }
}

impl From<Version> for u8 {
    fn from(value: Version) -> Self {
        value.number()
    }
}

impl TryFrom<u8> for Version {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Version::new(value).ok_or_else(|| format!("invalid version '{}', expected 1..=40", value))
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "V{}", self.number())
    }
}

/// Error correction level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ecl {
    /// Low: 7% recovery rate.
    L,
    /// Medium: 15% recovery rate.
    #[default]
    M,
    /// Quartile: 25% recovery rate.
    Q,
    /// High: 30% recovery rate.
    H,
}

impl Ecl {
    /// Get the next higher ECL, if it exists.
    /// # Example
    /// ```
    /// use qrstamp_core::Ecl;
    /// assert_eq!(Ecl::L.incr(), Some(Ecl::M));
    /// assert_eq!(Ecl::H.incr(), None)
    /// ```
    pub fn incr(self) -> Option<Self> {
        match self {
            Self::L => Some(Self::M),
            Self::M => Some(Self::Q),
            Self::Q => Some(Self::H),
            Self::H => None,
        }
    }

    /// Get the next lower ECL, if it exists.
    /// # Example
    /// ```
    /// use qrstamp_core::Ecl;
    /// assert_eq!(Ecl::M.decr(), Some(Ecl::L));
    /// assert_eq!(Ecl::L.decr(), None)
    /// ```
    pub fn decr(self) -> Option<Self> {
        match self {
            Self::L => None,
            Self::M => Some(Self::L),
            Self::Q => Some(Self::M),
            Self::H => Some(Self::Q),
        }
    }
}

impl std::fmt::Display for Ecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Self::L => "L",
            Self::M => "M",
            Self::Q => "Q",
            Self::H => "H",
        };
        f.write_str(letter)
    }
}

impl FromStr for Ecl {
    type Err = String;

    /// Parse a level from its letter or name, ignoring case.
    /// # Example
    /// ```
    /// use qrstamp_core::Ecl;
    /// assert_eq!("q".parse::<Ecl>(), Ok(Ecl::Q));
    /// assert_eq!("high".parse::<Ecl>(), Ok(Ecl::H));
    /// assert!("x".parse::<Ecl>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "low" => Ok(Self::L),
            "m" | "medium" => Ok(Self::M),
            "q" | "quartile" => Ok(Self::Q),
            "h" | "high" => Ok(Self::H),
            other => Err(format!("invalid error correction level '{}'", other)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_version_up_to() {
        let versions: Vec<_> = Version::V38.up_to(Version::MAX).collect();
        assert_eq!(versions, vec![Version::V38, Version::V39, Version::V40]);
        assert_eq!(Version::MIN.up_to(Version::MAX).count(), 40);
        assert_eq!(Version::V05.up_to(Version::V04).count(), 0);
    }

    #[test]
    fn test_version_serde() {
        let version: Version = serde_json::from_str("7").unwrap();
        assert_eq!(version, Version::V07);
        assert_eq!(serde_json::to_string(&Version::V40).unwrap(), "40");
        assert!(serde_json::from_str::<Version>("41").is_err());
    }

    #[test]
    fn test_default_ecl_is_medium() {
        assert_eq!(Ecl::default(), Ecl::M);
    }
}
