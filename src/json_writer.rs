//! JSON Writer
//!
//! Writes the canonical serialization of a validated response. Reading the
//! output back yields an equal response.

use std::fs;
use std::path::Path;

use crate::diagram::DiagramResponse;
use crate::io::{IoError, IoResult, Writer};

#[derive(Debug, Default)]
pub struct JsonWriter;

impl JsonWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Writer for JsonWriter {
    fn write(&self, response: &DiagramResponse, output: &Path) -> IoResult<()> {
        fs::create_dir_all(output)?;

        let json =
            serde_json::to_string_pretty(response).map_err(|e| IoError::Write(e.to_string()))?;
        let output_path = output.join("diagrams.json");
        fs::write(&output_path, json)?;

        tracing::debug!(path = %output_path.display(), "wrote canonical json");
        Ok(())
    }

    fn format_id(&self) -> &str {
        "json"
    }
}
