//! JSON Reader
//!
//! Reads diagram documents as produced by the generator. A markdown code fence
//! around the document is tolerated.

use std::fs;
use std::path::Path;

use crate::diagram::DiagramResponse;
use crate::io::{IoResult, Reader};
use crate::parser::{self, ParseMode};

/// Reader for JSON diagram documents
#[derive(Debug, Default)]
pub struct JsonReader {
    mode: ParseMode,
}

impl JsonReader {
    /// Create a strict JSON reader
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: ParseMode) -> Self {
        Self { mode }
    }
}

impl Reader for JsonReader {
    fn read(&self, input: &Path) -> IoResult<DiagramResponse> {
        let content = fs::read_to_string(input)?;
        Ok(parser::parse_with(&content, self.mode)?)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }
}
