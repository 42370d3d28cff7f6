//! Uploaded files and their formats.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::{Error, Result};

/// Parser chosen from the uploaded file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Comma separated values, UTF-8 encoded
    Csv,
    /// Excel workbook (`.xls`, `.xlsx`); only the first worksheet is read
    Spreadsheet,
}

impl Format {
    /// Picks the parser for `filename`. The extension is matched case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Format> {
        let lower = filename.to_lowercase();

        if lower.ends_with(".csv") {
            Ok(Format::Csv)
        } else if lower.ends_with(".xls") || lower.ends_with(".xlsx") {
            Ok(Format::Spreadsheet)
        } else {
            Err(Error::UnsupportedFormat {
                filename: filename.to_owned(),
            })
        }
    }
}

/// One uploaded file: the raw payload plus the name it was uploaded under.
///
/// The filename is only used to choose a parser.
#[derive(Debug, Clone)]
pub struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

impl Upload {
    pub fn from_bytes<S: Into<String>>(filename: S, bytes: Vec<u8>) -> Upload {
        Upload {
            filename: filename.into(),
            bytes,
        }
    }

    /// Decodes a browser-style data URL (`data:text/csv;base64,<payload>`).
    ///
    /// Everything up to the first comma is the content-type header and is ignored.
    pub fn from_data_url<S: Into<String>>(filename: S, contents: &str) -> Result<Upload> {
        let payload = match contents.find(',') {
            Some(comma) => &contents[comma + 1..],
            None => {
                return Err(Error::Decode {
                    reason: "data URL has no ',' separating header and payload".to_owned(),
                })
            }
        };

        // Line breaks are common when the payload was pasted from elsewhere.
        let payload: String = payload.split_whitespace().collect();
        let bytes = BASE64.decode(payload.as_bytes()).map_err(Error::decode)?;

        Ok(Upload::from_bytes(filename, bytes))
    }

    /// Reads the file at `path`; its name selects the parser.
    pub fn open(path: &Path) -> Result<Upload> {
        let bytes = fs::read(path).map_err(|inner| Error::AccessError {
            path: path.to_owned(),
            inner,
        })?;

        Ok(Upload::from_bytes(file_name(path), bytes))
    }

    /// Reads a file holding a data URL, see [`Upload::from_data_url`].
    pub fn open_data_url(path: &Path) -> Result<Upload> {
        let contents = fs::read_to_string(path).map_err(|inner| Error::AccessError {
            path: path.to_owned(),
            inner,
        })?;

        Upload::from_data_url(file_name(path), &contents)
    }

    /// Replaces the name the parser is chosen from
    pub fn with_filename<S: Into<String>>(self, filename: S) -> Upload {
        Upload {
            filename: filename.into(),
            ..self
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> Result<Format> {
        Format::from_filename(&self.filename)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
