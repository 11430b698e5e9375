//! YAML Reader
//!
//! Reads hand-written diagram documents in YAML. The document has the same
//! shape as the JSON form and goes through the same validation.

use std::fs;
use std::path::Path;

use crate::diagram::DiagramResponse;
use crate::io::{IoResult, Reader};
use crate::parser::{self, MalformedDiagram, ParseMode};

/// Reader for YAML diagram documents
#[derive(Debug, Default)]
pub struct YamlReader {
    mode: ParseMode,
}

impl YamlReader {
    /// Create a strict YAML reader
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: ParseMode) -> Self {
        Self { mode }
    }
}

impl Reader for YamlReader {
    fn read(&self, input: &Path) -> IoResult<DiagramResponse> {
        let content = fs::read_to_string(input)?;
        let value: serde_json::Value = serde_yaml::from_str(&content)
            .map_err(|e| MalformedDiagram::Syntax(e.to_string()))?;
        Ok(parser::parse_value(value, self.mode)?)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }
}
