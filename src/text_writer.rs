//! Text Writer
//!
//! Writes the layout of every diagram as an indented outline, one box per line.
//! Useful for terminals, diffs and snapshot tests.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::diagram::DiagramResponse;
use crate::io::{IoError, IoResult, Writer};
use crate::layout::{self, DiagramLayout, LayoutBox};

const INDENT: &str = "  ";

/// Writer for plain-text layout outlines
#[derive(Debug, Default)]
pub struct TextWriter;

impl TextWriter {
    pub fn new() -> Self {
        Self
    }
}

/// Render layouts as an outline. Diagrams are separated by a blank line.
pub fn render_text(layouts: &[DiagramLayout]) -> String {
    let mut out = String::new();
    for (index, diagram) in layouts.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "== {} ==", diagram.title);
        write_box(&mut out, &diagram.root, 0);
    }
    out
}

fn write_box(out: &mut String, layout: &LayoutBox, depth: usize) {
    out.push_str(&INDENT.repeat(depth));
    out.push_str(layout.role.as_str());
    if layout.framed {
        out.push_str(" [framed]");
    }
    if let Some(label) = &layout.label {
        out.push_str(": ");
        out.push_str(label);
    }
    out.push('\n');

    for child in &layout.children {
        write_box(out, child, depth + 1);
    }
}

impl Writer for TextWriter {
    fn write(&self, response: &DiagramResponse, output: &Path) -> IoResult<()> {
        fs::create_dir_all(output)?;

        let text = render_text(&layout::render_response(response));
        let output_path = output.join("diagrams.txt");
        fs::write(&output_path, text).map_err(IoError::Io)?;

        tracing::debug!(path = %output_path.display(), "wrote text outline");
        Ok(())
    }

    fn format_id(&self) -> &str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, parse_lenient};

    const EXAMPLE: &str = r#"{"diagrams":[{"title":"example","root":{"id":"1","type":"sequence","children":[
        {"id":"2","type":"if","condition":"x > 0","trueBlock":[{"id":"3","type":"statement","text":"print('Hello')"}],"falseBlock":[{"id":"4","type":"statement","text":"print('World')"}]}
    ]}}]}"#;

    #[test]
    fn text_writer_format_id() {
        assert_eq!(TextWriter::new().format_id(), "text");
    }

    #[test]
    fn outline_indents_by_depth() {
        let response = parse(EXAMPLE).unwrap();
        let text = render_text(&layout::render_response(&response));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "== example ==");
        assert_eq!(lines[1], "sequence [framed]");
        assert_eq!(lines[2], "  branch");
        assert_eq!(lines[3], "    branch-header: x > 0");
    }

    #[test]
    fn outline_separates_diagrams() {
        let doc = r#"{"diagrams":[
            {"title":"a","root":{"id":"1","type":"sequence"}},
            {"title":"b","root":{"id":"1","type":"sequence"}}
        ]}"#;
        let text = render_text(&layout::render_response(&parse(doc).unwrap()));
        assert_eq!(text, "== a ==\nsequence [framed]\n\n== b ==\nsequence [framed]\n");
    }

    #[test]
    fn text_writer_writes_outline_file() {
        let response = parse(EXAMPLE).unwrap();
        let temp_dir = tempfile::tempdir().unwrap();

        TextWriter::new()
            .write(&response, temp_dir.path())
            .expect("Write failed");

        let text = fs::read_to_string(temp_dir.path().join("diagrams.txt")).unwrap();
        assert!(text.contains("statement: print('Hello')"));
    }

    mod snapshots {
        use super::*;

        #[test]
        fn snapshot_example_outline() {
            let response = parse(EXAMPLE).unwrap();
            let text = render_text(&layout::render_response(&response));
            insta::assert_snapshot!("example_outline", text);
        }

        #[test]
        fn snapshot_loop_and_fallback_outline() {
            let doc = r#"{"diagrams":[{"title":"mixed","root":{"id":"1","type":"sequence","children":[
                {"id":"2","type":"loop","condition":"running"},
                {"id":"3","type":"bogus"}
            ]}}]}"#;
            let response = parse_lenient(doc).unwrap();
            let text = render_text(&layout::render_response(&response));
            insta::assert_snapshot!("loop_and_fallback_outline", text);
        }
    }
}
