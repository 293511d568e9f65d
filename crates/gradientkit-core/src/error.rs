//! Error handling for GradientKit
//!
//! Provides the error types for every stage of a rewrite run:
//! - G-code errors (line parsing)
//! - Gradient errors (stream preconditions and configuration)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// G-Code error type
///
/// Raised while turning a raw line into a structured record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcodeError {
    /// A line looks like a move but carries a parameter that is not a number
    #[error("Malformed command at line {line_number}: {reason}")]
    MalformedCommand {
        /// The 1-based line number of the offending line.
        line_number: usize,
        /// What could not be parsed.
        reason: String,
    },
}

impl GcodeError {
    /// Line number the error refers to
    pub fn line_number(&self) -> usize {
        match self {
            GcodeError::MalformedCommand { line_number, .. } => *line_number,
        }
    }
}

/// Gradient error type
///
/// Represents conditions that make a gradient rewrite unsafe or impossible.
/// All of them abort the run before any output is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradientError {
    /// A move extrudes while absolute extrusion (M82) is active
    #[error("Incompatible extrusion mode at line {line_number}: relative extrusion (M83) is required")]
    IncompatibleMode {
        /// The first move that extrudes in absolute mode.
        line_number: usize,
    },

    /// No slicer signature was found in the file header
    #[error("Could not detect the slicer that produced this file; set the slicer explicitly")]
    DialectNotDetected,

    /// Unknown slicer dialect name
    #[error("Unknown slicer dialect: {name}")]
    UnknownDialect {
        /// The name that was requested.
        name: String,
    },

    /// Gradient parameters are inconsistent
    #[error("Invalid gradient configuration: {reason}")]
    InvalidConfig {
        /// Why the configuration was rejected.
        reason: String,
    },
}

/// Main error type for GradientKit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// G-Code error
    #[error(transparent)]
    Gcode(#[from] GcodeError),

    /// Gradient error
    #[error(transparent)]
    Gradient(#[from] GradientError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this is a G-Code error
    pub fn is_gcode_error(&self) -> bool {
        matches!(self, Error::Gcode(_))
    }

    /// Check if this is an extrusion mode error
    pub fn is_incompatible_mode(&self) -> bool {
        matches!(self, Error::Gradient(GradientError::IncompatibleMode { .. }))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcode_error_display() {
        let err = GcodeError::MalformedCommand {
            line_number: 12,
            reason: "invalid E value 'abc'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed command at line 12: invalid E value 'abc'"
        );
        assert_eq!(err.line_number(), 12);
    }

    #[test]
    fn test_gradient_error_display() {
        let err = GradientError::IncompatibleMode { line_number: 3 };
        assert!(err.to_string().contains("line 3"));

        let err = GradientError::InvalidConfig {
            reason: "thresholds must ascend".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid gradient configuration: thresholds must ascend"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = GradientError::IncompatibleMode { line_number: 1 }.into();
        assert!(err.is_incompatible_mode());
        assert!(!err.is_gcode_error());

        let err: Error = GcodeError::MalformedCommand {
            line_number: 1,
            reason: "x".to_string(),
        }
        .into();
        assert!(err.is_gcode_error());

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
