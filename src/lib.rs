//! structogram - validate Nassi-Shneiderman diagram documents and render them.
//!
//! A document describes the control structure of one or more functions as a
//! tree of nodes (sequences, statements, branches, loops, switches). This crate
//! parses such documents into a typed tree, lays each tree out as nested boxes,
//! and writes the result as HTML, a text outline or canonical JSON.
//!
//! ```rust,no_run
//! use structogram::{layout, parser};
//!
//! let text = std::fs::read_to_string("diagrams.json")?;
//! let response = parser::parse(&text)?;
//! for diagram in layout::render_response(&response) {
//!     println!("{}: {} boxes", diagram.title, diagram.root.descendants().len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod diagram;
pub mod html_writer;
pub mod io;
pub mod json_reader;
pub mod json_writer;
pub mod layout;
pub mod parser;
pub mod text_writer;
pub mod yaml_reader;

pub use diagram::{Diagram, DiagramNode, DiagramResponse};
pub use layout::{DiagramLayout, LayoutBox};
pub use parser::{MalformedDiagram, ParseMode};
