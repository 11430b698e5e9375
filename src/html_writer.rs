//! HTML Writer
//!
//! Writes diagram layouts as standalone HTML pages. Each diagram is one
//! `<section id="diagram-N">` container so a screenshot tool can export it
//! on its own.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use askama::Template;

use crate::diagram::DiagramResponse;
use crate::io::{IoError, IoResult, Writer};
use crate::layout::{self, DiagramLayout, Direction, LayoutBox};

/// Page title used when a page holds more than one diagram
const BATCH_TITLE: &str = "Structograms";

#[derive(Template)]
#[template(path = "index.html")]
struct PageTemplate<'a> {
    title: &'a str,
    sections: &'a [String],
}

#[derive(Template)]
#[template(path = "components/diagram.html")]
struct DiagramTemplate<'a> {
    anchor: &'a str,
    title: &'a str,
    body: &'a str,
}

#[derive(Template)]
#[template(path = "components/box.html")]
struct BoxTemplate<'a> {
    classes: &'a str,
    key: &'a str,
    label: Option<&'a str>,
    children: &'a [String],
}

/// Writer for HTML structogram pages
pub struct HtmlWriter {
    /// Write one file per diagram instead of a single `index.html`
    pub split: bool,
}

impl HtmlWriter {
    /// Create a new HTML writer that puts all diagrams on one page
    pub fn new() -> Self {
        Self { split: false }
    }

    pub fn with_options(split: bool) -> Self {
        Self { split }
    }

    /// Render a whole page holding the given diagrams, in order
    pub fn render_page(layouts: &[DiagramLayout]) -> IoResult<String> {
        let sections = layouts
            .iter()
            .enumerate()
            .map(|(index, diagram)| render_section(index, diagram))
            .collect::<IoResult<Vec<_>>>()?;

        let title = match layouts {
            [only] => only.title.as_str(),
            _ => BATCH_TITLE,
        };

        PageTemplate {
            title,
            sections: &sections,
        }
        .render()
        .map_err(|e| IoError::Write(e.to_string()))
    }

    fn write_split(layouts: &[DiagramLayout], output: &Path) -> IoResult<()> {
        let mut used = HashSet::new();
        for (index, diagram) in layouts.iter().enumerate() {
            let base = export_stem(&diagram.title, index);
            let mut stem = base.clone();
            let mut suffix = 1;
            while !used.insert(stem.clone()) {
                stem = format!("{base}-{suffix}");
                suffix += 1;
            }

            let html = Self::render_page(std::slice::from_ref(diagram))?;
            let output_path = output.join(format!("{stem}.html"));
            fs::write(&output_path, html)?;
            tracing::debug!(path = %output_path.display(), title = %diagram.title, "wrote diagram page");
        }
        Ok(())
    }
}

impl Default for HtmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// File stem for a single exported diagram.
///
/// Whitespace runs become `_`, as does every character other than
/// alphanumerics, `-` and `_`, so the stem never names a path outside the
/// output directory. Titles with nothing usable left fall back to
/// `diagram-{index}`.
pub fn export_stem(title: &str, index: usize) -> String {
    let stem: String = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !stem.chars().any(char::is_alphanumeric) {
        format!("diagram-{index}")
    } else {
        stem
    }
}

fn render_section(index: usize, diagram: &DiagramLayout) -> IoResult<String> {
    let body = render_box(&diagram.root)?;
    let anchor = format!("diagram-{index}");

    DiagramTemplate {
        anchor: &anchor,
        title: &diagram.title,
        body: &body,
    }
    .render()
    .map_err(|e| IoError::Write(e.to_string()))
}

fn render_box(layout: &LayoutBox) -> IoResult<String> {
    let children = layout
        .children
        .iter()
        .map(render_box)
        .collect::<IoResult<Vec<_>>>()?;
    let classes = box_classes(layout);

    BoxTemplate {
        classes: &classes,
        key: &layout.key,
        label: layout.label.as_deref(),
        children: &children,
    }
    .render()
    .map_err(|e| IoError::Write(e.to_string()))
}

fn box_classes(layout: &LayoutBox) -> String {
    let direction = match layout.direction {
        Direction::Column => "ns-column",
        Direction::Row => "ns-row",
    };
    let mut classes = format!("ns-box ns-{} {direction}", layout.role.as_str());
    if layout.framed {
        classes.push_str(" ns-framed");
    }
    classes
}

impl Writer for HtmlWriter {
    fn write(&self, response: &DiagramResponse, output: &Path) -> IoResult<()> {
        fs::create_dir_all(output)?;

        let layouts = layout::render_response(response);
        for diagram in &layouts {
            for node_type in diagram.root.unknown_types() {
                tracing::warn!(
                    diagram = %diagram.title,
                    node_type,
                    "rendered fallback box for unknown node type"
                );
            }
        }

        if self.split {
            return Self::write_split(&layouts, output);
        }

        let html = Self::render_page(&layouts)?;
        let output_path = output.join("index.html");
        fs::write(&output_path, html)?;
        tracing::debug!(path = %output_path.display(), diagrams = layouts.len(), "wrote html page");

        Ok(())
    }

    fn format_id(&self) -> &str {
        "html"
    }
}
