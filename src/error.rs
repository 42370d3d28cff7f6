use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while serving a single detection request.
///
/// None of these are fatal to the process; each one ends the request it was raised in.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported file format: {filename:?} (expected .csv, .xls or .xlsx)")]
    UnsupportedFormat { filename: String },

    #[error("Failed to decode the uploaded file: {reason}")]
    Decode { reason: String },

    #[error("The uploaded file contains no rows or no columns")]
    EmptyResult,

    #[error("No numeric features available for outlier detection")]
    NoNumericFeatures,

    #[error("Optional detector {detector} is not available in this build")]
    OptionalDetectorUnavailable { detector: &'static str },

    #[error("Invalid detection mode {0:?} (expected simple, balanced or complex)")]
    InvalidMode(String),

    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Insufficient data for {detector}: required {required} rows, got {got}")]
    InsufficientData {
        detector: &'static str,
        required: usize,
        got: usize,
    },

    #[error("Failed to access file {path:?}: {inner}")]
    AccessError {
        path: PathBuf,
        #[source]
        inner: io::Error,
    },

    #[error("Error writing CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Error writing JSON: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Failed to render chart to {path:?}: {reason}")]
    RenderError { path: PathBuf, reason: String },
}

impl Error {
    pub(crate) fn decode<E: std::fmt::Display>(err: E) -> Error {
        Error::Decode {
            reason: err.to_string(),
        }
    }

    /// The message shown to the person who made the request.
    pub fn user_message(&self) -> String {
        match self {
            Error::UnsupportedFormat { .. } | Error::Decode { .. } | Error::EmptyResult => {
                "Error: Unable to read the uploaded file.".to_owned()
            }
            Error::NoNumericFeatures => {
                "No numeric features available for outlier detection.".to_owned()
            }
            other => format!("Error: {}.", other),
        }
    }
}

pub type Result<T> = ::std::result::Result<T, Error>;

/// Logs `e` and every error in its source chain.
pub fn log_error(e: &Error) {
    error!("error: {}", e);
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        error!("caused by: {}", cause);
        source = cause.source();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn file_errors_share_the_upload_message() {
        let errors = vec![
            Error::UnsupportedFormat {
                filename: "notes.txt".to_owned(),
            },
            Error::decode("invalid base64"),
            Error::EmptyResult,
        ];

        for e in errors {
            assert_eq!(e.user_message(), "Error: Unable to read the uploaded file.");
        }
    }

    #[test]
    fn no_numeric_features_message() {
        assert_eq!(
            Error::NoNumericFeatures.user_message(),
            "No numeric features available for outlier detection."
        );
    }

    #[test]
    fn insufficient_data_display() {
        let e = Error::InsufficientData {
            detector: "local outlier factor",
            required: 2,
            got: 1,
        };
        assert_eq!(
            e.to_string(),
            "Insufficient data for local outlier factor: required 2 rows, got 1"
        );
        assert_eq!(
            e.user_message(),
            "Error: Insufficient data for local outlier factor: required 2 rows, got 1."
        );
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
