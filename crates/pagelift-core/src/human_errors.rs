// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people scanning documents.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how a front end presents the problem.

use crate::error::PageliftError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Worth trying again as-is.
    Transient,
    /// User must do something (pick another file, fix a setting, re-take a photo).
    ActionRequired,
    /// Cannot be fixed by retrying with the same input.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether retrying the same operation may succeed.
    pub retriable: bool,
    /// Severity level.
    pub severity: Severity,
}

/// Convert a `PageliftError` into a `HumanError` anyone can understand.
pub fn humanize_error(err: &PageliftError) -> HumanError {
    match err {
        // -- Image engine --
        PageliftError::Decode(_) => HumanError {
            message: "We couldn't read this image.".into(),
            suggestion: "The file may be damaged or not a picture. Try taking the photo again, or save it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PageliftError::UnsupportedFormat(detail) => HumanError {
            message: "This type of image can't be added to a PDF.".into(),
            suggestion: format!("Try saving the picture as a JPEG or PNG, then add it again. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        PageliftError::DegenerateGeometry { .. } => HumanError {
            message: "The selected area is empty.".into(),
            suggestion: "Drag the corners apart so they surround the document, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PageliftError::Encode(_) => HumanError {
            message: "We couldn't save the edited image.".into(),
            suggestion: "Your device may be low on memory. Close other apps and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PageliftError::PdfError(_) => HumanError {
            message: "We couldn't create the PDF.".into(),
            suggestion: "Make sure at least one page is selected, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Configuration --
        PageliftError::Config(detail) => HumanError {
            message: "A setting has an invalid value.".into(),
            suggestion: format!("Fix the setting in your configuration file and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Runtime --
        PageliftError::Task(_) => HumanError {
            message: "Image processing stopped unexpectedly.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PageliftError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "We don't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or try copying the file to a different location first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        PageliftError::Serialization(_) => HumanError {
            message: "A settings file couldn't be understood.".into(),
            suggestion: "Check that the configuration file is valid JSON.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failure_is_permanent() {
        let human = humanize_error(&PageliftError::Decode("bad header".into()));
        assert_eq!(human.severity, Severity::Permanent);
        assert!(!human.retriable);
    }

    #[test]
    fn empty_selection_is_action_required() {
        let err = PageliftError::DegenerateGeometry {
            width: 0,
            height: 12,
        };
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn encode_failure_is_retriable() {
        let human = humanize_error(&PageliftError::Encode("out of memory".into()));
        assert!(human.retriable);
        assert_eq!(human.severity, Severity::Transient);
    }

    #[test]
    fn missing_file_is_action_required() {
        let err = PageliftError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.message.contains("couldn't be found"));
    }

    #[test]
    fn unsupported_format_mentions_detail() {
        let err = PageliftError::UnsupportedFormat("image/heic".into());
        let human = humanize_error(&err);
        assert!(human.suggestion.contains("image/heic"));
    }
}
