//! Table loading from delimited-text files.
//!
//! Input files are not guaranteed to be UTF-8: when strict decoding fails
//! the loader falls back to a single-byte legacy decode (Windows-1252)
//! before parsing. Parsing itself is delegated to polars' CSV reader with
//! a small ladder of fallback strategies for quote-damaged files. Every
//! failure surfaces as [`AnalysisError::Load`]; the caller never retries.

use crate::error::{AnalysisError, Result};
use encoding_rs::WINDOWS_1252;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

/// Loads a delimited-text file into a DataFrame.
pub struct TableLoader;

impl TableLoader {
    /// Load the table at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Load`] when the file is missing, cannot be
    /// read, cannot be parsed, or parses to an empty table.
    pub fn load(path: &Path) -> Result<DataFrame> {
        let display = path.display().to_string();

        if !path.exists() {
            return Err(AnalysisError::Load {
                path: display,
                reason: "file not found".to_string(),
            });
        }

        let bytes = std::fs::read(path).map_err(|e| AnalysisError::Load {
            path: display.clone(),
            reason: format!("could not read file: {}", e),
        })?;

        if bytes.is_empty() {
            return Err(AnalysisError::Load {
                path: display,
                reason: "file is empty".to_string(),
            });
        }

        let text = Self::decode(&bytes);
        let df = Self::parse_csv(&text).map_err(|e| AnalysisError::Load {
            path: display.clone(),
            reason: format!("could not parse as delimited text: {}", e),
        })?;

        if df.height() == 0 || df.width() == 0 {
            return Err(AnalysisError::Load {
                path: display,
                reason: "parsed table has no data rows".to_string(),
            });
        }

        info!(
            "Loaded {}: {} rows x {} columns",
            path.display(),
            df.height(),
            df.width()
        );
        Ok(df)
    }

    /// Decode file bytes, preferring strict UTF-8 with a single-byte
    /// legacy fallback.
    fn decode(bytes: &[u8]) -> Cow<'_, str> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Cow::Borrowed(text),
            Err(_) => {
                warn!("Input is not valid UTF-8, falling back to Windows-1252 decoding");
                let (decoded, _, _) = WINDOWS_1252.decode(bytes);
                decoded
            }
        }
    }

    /// Parse CSV text with fallback strategies.
    fn parse_csv(text: &str) -> PolarsResult<DataFrame> {
        // Strategy 1: standard parsing with quote handling
        match CsvReadOptions::default()
            .with_infer_schema_length(Some(100))
            .with_has_header(true)
            .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
            .into_reader_with_file_handle(Cursor::new(text.to_string()))
            .finish()
        {
            Ok(df) => return Ok(df),
            Err(e) => debug!("Standard CSV parsing failed: {}", e),
        }

        // Strategy 2: without quote handling
        CsvReadOptions::default()
            .with_infer_schema_length(Some(100))
            .with_has_header(true)
            .with_parse_options(CsvParseOptions::default().with_quote_char(None))
            .into_reader_with_file_handle(Cursor::new(text.to_string()))
            .finish()
    }
}
