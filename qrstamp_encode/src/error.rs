use std::path::PathBuf;

use qrstamp_core::{ColorError, ConfigError};

use crate::encode::EncodingError;

/// Failure of a generation call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Empty or overlong content, or content the symbol cannot hold.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error(transparent)]
    InvalidColor(#[from] ColorError),
    #[error("logo file not found: {}", .0.display())]
    LogoNotFound(PathBuf),
    #[error("unsupported logo format for '{}': {reason}", .path.display())]
    UnsupportedLogoFormat { path: PathBuf, reason: String },
    #[error("unsupported output format '{0}', supported formats: png, jpg, jpeg, gif, svg")]
    UnsupportedOutputFormat(String),
    #[error("cannot write '{}'", .path.display())]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot encode image")]
    ImageEncoding(#[from] image::ImageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
