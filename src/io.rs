//! Reader/Writer traits and format dispatch
//!
//! Readers load a diagram document from disk and validate it into a
//! [`DiagramResponse`]. Writers render a validated response into an output
//! directory. [`FormatRegistry`] picks a reader by file extension and a writer
//! by format id.

use std::path::Path;

use thiserror::Error;

use crate::diagram::DiagramResponse;
use crate::html_writer::HtmlWriter;
use crate::json_reader::JsonReader;
use crate::json_writer::JsonWriter;
use crate::parser::{MalformedDiagram, ParseMode};
use crate::text_writer::TextWriter;
use crate::yaml_reader::YamlReader;

/// Errors that can occur during reading or writing
#[derive(Error, Debug)]
pub enum IoError {
    /// No reader or writer is registered for the requested format
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The input path has no extension to pick a reader by
    #[error("could not determine file format from path: {0}")]
    UnknownExtension(String),

    /// Reading the document or writing a page failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not a valid diagram document
    #[error(transparent)]
    Malformed(#[from] MalformedDiagram),

    /// A template or serializer failed to produce output
    #[error("write error: {0}")]
    Write(String),
}

/// Result of reading a document or writing rendered diagrams
pub type IoResult<T> = Result<T, IoError>;

/// A reader parses an input file into a validated [`DiagramResponse`]
pub trait Reader {
    fn read(&self, input: &Path) -> IoResult<DiagramResponse>;

    /// Extensions of the documents this reader accepts, without the dot
    fn supported_extensions(&self) -> &[&str];

    /// Case-insensitive extension match
    fn supports_extension(&self, ext: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// A writer renders diagrams into an output directory
pub trait Writer {
    fn write(&self, response: &DiagramResponse, output: &Path) -> IoResult<()>;

    /// Name used to pick this writer with `--format`
    fn format_id(&self) -> &str;
}

/// Readers keyed by extension and writers keyed by format id
pub struct FormatRegistry {
    readers: Vec<Box<dyn Reader>>,
    writers: Vec<Box<dyn Writer>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
            writers: Vec::new(),
        }
    }

    /// Registry with strict readers and a batch HTML writer
    pub fn with_defaults() -> Self {
        Self::with_options(ParseMode::Strict, false)
    }

    /// Create a registry with all readers and writers registered
    ///
    /// - Readers: `JsonReader` (json), `YamlReader` (yaml, yml), both using `mode`
    /// - Writers: `HtmlWriter` (html), `TextWriter` (text), `JsonWriter` (json)
    pub fn with_options(mode: ParseMode, split_html: bool) -> Self {
        let mut registry = Self::new();
        registry.register_reader(Box::new(JsonReader::with_mode(mode)));
        registry.register_reader(Box::new(YamlReader::with_mode(mode)));
        registry.register_writer(Box::new(HtmlWriter::with_options(split_html)));
        registry.register_writer(Box::new(TextWriter::new()));
        registry.register_writer(Box::new(JsonWriter::new()));
        registry
    }

    pub fn register_reader(&mut self, reader: Box<dyn Reader>) {
        self.readers.push(reader);
    }

    pub fn register_writer(&mut self, writer: Box<dyn Writer>) {
        self.writers.push(writer);
    }

    /// Find a reader for the given file extension
    pub fn reader_for_extension(&self, ext: &str) -> Option<&dyn Reader> {
        self.readers
            .iter()
            .find(|r| r.supports_extension(ext))
            .map(|r| r.as_ref())
    }

    /// Find a writer by format ID
    pub fn writer_for_format(&self, format_id: &str) -> Option<&dyn Writer> {
        self.writers
            .iter()
            .find(|w| w.format_id().eq_ignore_ascii_case(format_id))
            .map(|w| w.as_ref())
    }

    pub fn extension_from_path(path: &Path) -> Option<&str> {
        path.extension().and_then(|e| e.to_str())
    }

    /// Find a reader for the given path based on its extension
    pub fn reader_for_path(&self, path: &Path) -> IoResult<&dyn Reader> {
        let ext = Self::extension_from_path(path)
            .ok_or_else(|| IoError::UnknownExtension(path.display().to_string()))?;

        self.reader_for_extension(ext)
            .ok_or_else(|| IoError::UnsupportedFormat(ext.to_string()))
    }

    /// Read `input` and write it with the writer registered for `format_id`
    pub fn convert(&self, input: &Path, format_id: &str, output: &Path) -> IoResult<DiagramResponse> {
        let writer = self
            .writer_for_format(format_id)
            .ok_or_else(|| IoError::UnsupportedFormat(format_id.to_string()))?;
        let response = self.reader_for_path(input)?.read(input)?;
        writer.write(&response, output)?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::diagram::{Diagram, DiagramNode, SequenceNode};

    struct MockReader {
        extensions: Vec<&'static str>,
    }

    impl Reader for MockReader {
        fn read(&self, _input: &Path) -> IoResult<DiagramResponse> {
            Ok(DiagramResponse {
                diagrams: vec![Diagram {
                    title: "mock".to_string(),
                    root: DiagramNode::Sequence(SequenceNode {
                        id: "1".to_string(),
                        children: vec![],
                    }),
                }],
            })
        }

        fn supported_extensions(&self) -> &[&str] {
            &self.extensions
        }
    }

    struct MockWriter {
        format: &'static str,
    }

    impl Writer for MockWriter {
        fn write(&self, _response: &DiagramResponse, _output: &Path) -> IoResult<()> {
            Ok(())
        }

        fn format_id(&self) -> &str {
            self.format
        }
    }

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    #[test]
    fn reader_supports_extension_case_insensitive() {
        let reader = MockReader {
            extensions: vec!["yaml", "yml"],
        };
        assert!(reader.supports_extension("yaml"));
        assert!(reader.supports_extension("YML"));
        assert!(!reader.supports_extension("json"));
    }

    #[test]
    fn registry_finds_reader_by_extension() {
        let mut registry = FormatRegistry::new();
        registry.register_reader(Box::new(MockReader {
            extensions: vec!["json"],
        }));

        assert!(registry.reader_for_extension("json").is_some());
        assert!(registry.reader_for_extension("yaml").is_none());
    }

    #[test]
    fn registry_finds_writer_by_format() {
        let mut registry = FormatRegistry::new();
        registry.register_writer(Box::new(MockWriter { format: "html" }));

        assert!(registry.writer_for_format("html").is_some());
        assert!(registry.writer_for_format("HTML").is_some());
        assert!(registry.writer_for_format("text").is_none());
    }

    #[test]
    fn registry_reader_for_path_extracts_extension() {
        let registry = FormatRegistry::with_defaults();

        assert!(registry.reader_for_path(Path::new("/tmp/diagrams.json")).is_ok());
        assert!(matches!(
            registry.reader_for_path(Path::new("/tmp/diagrams.xyz")),
            Err(IoError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            registry.reader_for_path(Path::new("/tmp/diagrams")),
            Err(IoError::UnknownExtension(_))
        ));
    }

    #[test]
    fn with_defaults_registers_all_formats() {
        let registry = FormatRegistry::with_defaults();

        for ext in ["json", "yaml", "yml", "JSON"] {
            assert!(registry.reader_for_extension(ext).is_some(), "reader for {ext}");
        }
        for format in ["html", "text", "json"] {
            assert!(registry.writer_for_format(format).is_some(), "writer for {format}");
        }
        assert!(registry.writer_for_format("png").is_none());
    }

    #[test]
    fn io_error_display() {
        let err = IoError::UnsupportedFormat("xyz".to_string());
        assert_eq!(err.to_string(), "unsupported format: xyz");

        let err = IoError::from(MalformedDiagram::Syntax("bad".to_string()));
        assert_eq!(err.to_string(), "malformed diagram: bad");
    }

    #[test]
    fn convert_reads_and_writes() {
        let registry = FormatRegistry::with_defaults();
        let output = tempfile::tempdir().unwrap();

        let response = registry
            .convert(&fixture("example.json"), "json", output.path())
            .expect("conversion should succeed");

        assert_eq!(response.diagrams.len(), 1);
        assert!(output.path().join("diagrams.json").exists());
    }

    #[test]
    fn convert_rejects_unknown_format_before_reading() {
        let registry = FormatRegistry::with_defaults();
        let result = registry.convert(Path::new("missing.json"), "png", Path::new("out"));
        assert!(matches!(result, Err(IoError::UnsupportedFormat(f)) if f == "png"));
    }
}
