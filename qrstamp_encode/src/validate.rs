//! Checks run on user input before anything is generated.
//!
//! Every check returns a [Report] instead of failing, so a front end can gather all issues of a
//! request and present them at once. Errors make the request unusable, warnings do not.

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use itertools::Itertools;
use qrstamp_core::{qrstandard, Color, Version};

use crate::compose::LOGO_EXTENSIONS;
use crate::output::extension_of;
use crate::OutputFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

/// A problem with one input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub field: &'static str,
    pub severity: Severity,
    pub message: String,
}

impl Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{} ({}): {}", label, self.field, self.message)
    }
}

/// Issues found by one or more checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    issues: Vec<Issue>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: &'static str, message: impl Into<String>) {
        self.issues.push(Issue {
            field,
            severity: Severity::Error,
            message: message.into(),
        });
    }

    pub fn warning(&mut self, field: &'static str, message: impl Into<String>) {
        self.issues.push(Issue {
            field,
            severity: Severity::Warning,
            message: message.into(),
        });
    }

    /// Append the issues of `other`.
    pub fn merge(&mut self, other: Report) {
        self.issues.extend(other.issues);
    }

    /// Builder flavor of [Report::merge].
    pub fn and(mut self, other: Report) -> Self {
        self.merge(other);
        self
    }

    /// `true` if no issue is an error.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> + '_ {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> + '_ {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Warning)
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.issues.iter().join("; "))
    }
}

/// Content must be non-empty and at most 4000 characters.
pub fn validate_content(content: &str) -> Report {
    let mut report = Report::new();
    if content.is_empty() {
        report.error("content", "content cannot be empty");
    } else if content.chars().count() > qrstandard::MAX_CONTENT_CHARS {
        report.error(
            "content",
            format!(
                "content is too long for a QR code, at most {} characters allowed",
                qrstandard::MAX_CONTENT_CHARS
            ),
        );
    }
    report
}

/// The output path needs a supported extension and a parent directory that exists or can be
/// created.
pub fn validate_output_path(path: &Path) -> Report {
    let mut report = Report::new();
    if path.as_os_str().is_empty() {
        report.error("output", "output path cannot be empty");
        return report;
    }
    let extension = extension_of(path);
    if OutputFormat::from_extension(&extension).is_none() {
        report.error(
            "output",
            format!(
                "unsupported file format '{}', supported formats: png, jpg, jpeg, gif, svg",
                extension
            ),
        );
    }
    // The closest existing ancestor must be a directory, otherwise nothing can be created below.
    let blocked = path
        .ancestors()
        .skip(1)
        .filter(|ancestor| !ancestor.as_os_str().is_empty())
        .find(|ancestor| ancestor.exists())
        .is_some_and(|ancestor| !ancestor.is_dir());
    if blocked {
        report.error(
            "output",
            format!("cannot create a directory for '{}'", path.display()),
        );
    }
    report
}

/// The logo must be an existing file with a supported extension.
pub fn validate_logo_path(path: &Path) -> Report {
    let mut report = Report::new();
    if path.as_os_str().is_empty() {
        report.error("logo", "logo path cannot be empty");
        return report;
    }
    if !path.exists() {
        report.error(
            "logo",
            format!("logo file does not exist: {}", path.display()),
        );
        return report;
    }
    let extension = extension_of(path);
    if !LOGO_EXTENSIONS.contains(&extension.as_str()) {
        report.error(
            "logo",
            format!(
                "unsupported logo format '{}', supported formats: {}",
                extension,
                LOGO_EXTENSIONS.iter().join(", ")
            ),
        );
    }
    report
}

/// The color must parse as a [Color].
pub fn validate_color(field: &'static str, color: &str) -> Report {
    let mut report = Report::new();
    if let Err(err) = Color::from_str(color) {
        report.error(field, err.to_string());
    }
    report
}

/// Range checks on raw numeric parameters, as they come from a front end.
pub fn validate_qr_parameters(
    version: Option<i64>,
    box_size: Option<i64>,
    border: Option<i64>,
) -> Report {
    let mut report = Report::new();
    if let Some(version) = version {
        let valid = u8::try_from(version)
            .ok()
            .and_then(|v| Version::try_from(v).ok())
            .is_some();
        if !valid {
            report.error(
                "version",
                format!(
                    "version must be an integer between {} and {}",
                    Version::MIN.number(),
                    Version::MAX.number()
                ),
            );
        }
    }
    if box_size.is_some_and(|box_size| box_size < 1) {
        report.error("box_size", "box size must be a positive integer");
    }
    if border.is_some_and(|border| border < 0) {
        report.error("border", "border must be a non-negative integer");
    }
    report
}

/// The logo size must be in `(0, 1)`. Sizes above 0.3 are allowed with a warning.
pub fn validate_logo_size(size_fraction: f32) -> Report {
    let mut report = Report::new();
    let in_range = size_fraction > 0.0 && size_fraction < 1.0;
    if !in_range {
        report.error("logo_size", "logo size must be between 0 and 1 (exclusive)");
    } else if size_fraction > qrstandard::LOGO_SIZE_WARNING {
        report.warning(
            "logo_size",
            format!(
                "logo size should not exceed {} for reliable scanning",
                qrstandard::LOGO_SIZE_WARNING
            ),
        );
    }
    report
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_content() {
        assert!(validate_content("hello").is_empty());
        assert!(!validate_content("").is_valid());
        assert!(validate_content(&"x".repeat(4000)).is_valid());
        assert!(!validate_content(&"x".repeat(4001)).is_valid());
        // Characters, not bytes.
        assert!(validate_content(&"é".repeat(4000)).is_valid());
    }

    #[test]
    fn test_output_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_output_path(&dir.path().join("a/b/out.PNG")).is_empty());
        assert!(validate_output_path(&dir.path().join("out.svg")).is_empty());
        assert!(!validate_output_path(&dir.path().join("out.bmp")).is_valid());
        assert!(!validate_output_path(Path::new("")).is_valid());

        let file = dir.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        assert!(!validate_output_path(&file.join("out.png")).is_valid());
    }

    #[test]
    fn test_logo_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("logo.png");
        assert!(!validate_logo_path(&missing).is_valid());

        std::fs::write(&missing, b"x").unwrap();
        assert!(validate_logo_path(&missing).is_valid());

        let bmp = dir.path().join("logo.bmp");
        std::fs::write(&bmp, b"x").unwrap();
        let report = validate_logo_path(&bmp);
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.issues()[0].field, "logo");
    }

    #[test]
    fn test_color() {
        for valid in ["red", "GREY", "#42f593", "42f593", "rgb(1, 2, 3)"] {
            assert!(validate_color("fg_color", valid).is_empty(), "{}", valid);
        }
        for invalid in ["", "#12345", "chartreuse", "rgb(1, 2, 300)"] {
            assert!(!validate_color("fg_color", invalid).is_valid(), "{}", invalid);
        }
    }

    #[test]
    fn test_qr_parameters() {
        assert!(validate_qr_parameters(None, None, None).is_empty());
        assert!(validate_qr_parameters(Some(1), Some(1), Some(0)).is_empty());
        assert!(validate_qr_parameters(Some(40), Some(20), Some(4)).is_empty());
        let report = validate_qr_parameters(Some(41), Some(0), Some(-1));
        let fields: Vec<_> = report.errors().map(|issue| issue.field).collect();
        assert_eq!(fields, vec!["version", "box_size", "border"]);
        assert!(!validate_qr_parameters(Some(0), None, None).is_valid());
        assert!(!validate_qr_parameters(Some(-3), None, None).is_valid());
    }

    #[test]
    fn test_logo_size() {
        assert!(validate_logo_size(0.2).is_empty());
        assert!(validate_logo_size(0.3).is_empty());
        assert!(!validate_logo_size(0.0).is_valid());
        assert!(!validate_logo_size(1.0).is_valid());
        assert!(!validate_logo_size(f32::NAN).is_valid());

        let report = validate_logo_size(0.5);
        assert!(report.is_valid());
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_report_display_and_merge() {
        let report = validate_content("").and(validate_logo_size(0.5));
        assert!(!report.is_valid());
        assert_eq!(
            report.to_string(),
            "error (content): content cannot be empty; \
             warning (logo_size): logo size should not exceed 0.3 for reliable scanning"
        );
    }
}
