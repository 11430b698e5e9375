//! Parse and validate diagram documents
//!
//! This is the only place where untrusted input is checked. Text goes through
//! serde into the flat [`RawResponse`] shape first, which catches JSON syntax
//! errors and lists that are not lists. The validator then turns every
//! [`RawNode`] into a typed [`DiagramNode`], checking the fields each variant
//! requires and that node ids are unique within a tree.
//!
//! Errors name the offending node by path, e.g. `diagrams[0].root.children[1]`.

use std::collections::HashSet;

use thiserror::Error;

use crate::diagram::{
    Diagram, DiagramNode, DiagramResponse, FunctionNode, IfNode, LoopNode, NodeType, RawCase,
    RawDiagram, RawNode, RawResponse, SequenceNode, StatementNode, SwitchCase, SwitchNode,
    UnknownNode,
};

/// Rejection of input that does not satisfy the diagram model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedDiagram {
    /// Not JSON, or the document does not have the expected shape
    #[error("malformed diagram: {0}")]
    Syntax(String),

    #[error("malformed diagram at {path}: `{node_type}` node is missing required field `{field}`")]
    MissingField {
        path: String,
        node_type: &'static str,
        field: &'static str,
    },

    #[error("malformed diagram at {path}: unknown node type `{type_name}`")]
    UnknownNodeType { path: String, type_name: String },

    #[error("malformed diagram at {path}: duplicate node id `{id}`")]
    DuplicateId { path: String, id: String },
}

/// How the validator treats recoverable problems
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Reject unknown node types and duplicate ids
    #[default]
    Strict,
    /// Keep unknown node types as [`DiagramNode::Unknown`] and re-key duplicate ids
    Lenient,
}

/// Remove a markdown code fence wrapped around a document.
///
/// Generators often answer with ```` ```json ... ``` ```` even when asked for
/// bare JSON. The opening fence line (with any language tag) and the closing
/// fence are dropped; anything else is returned trimmed and untouched.
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix("```") {
        body = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }

    body.trim()
}

/// Parse a document strictly
pub fn parse(text: &str) -> Result<DiagramResponse, MalformedDiagram> {
    parse_with(text, ParseMode::Strict)
}

/// Parse a document, keeping unrecognised node types as fallback nodes
pub fn parse_lenient(text: &str) -> Result<DiagramResponse, MalformedDiagram> {
    parse_with(text, ParseMode::Lenient)
}

pub fn parse_with(text: &str, mode: ParseMode) -> Result<DiagramResponse, MalformedDiagram> {
    let raw: RawResponse = serde_json::from_str(strip_code_fences(text))
        .map_err(|e| MalformedDiagram::Syntax(e.to_string()))?;
    validate(raw, mode)
}

/// Parse a document that is already held as a JSON value
pub fn parse_value(
    value: serde_json::Value,
    mode: ParseMode,
) -> Result<DiagramResponse, MalformedDiagram> {
    let raw: RawResponse =
        serde_json::from_value(value).map_err(|e| MalformedDiagram::Syntax(e.to_string()))?;
    validate(raw, mode)
}

/// Validate an already deserialized document
pub fn validate(raw: RawResponse, mode: ParseMode) -> Result<DiagramResponse, MalformedDiagram> {
    let mut validator = Validator::new(mode);
    let diagrams = raw
        .diagrams
        .into_iter()
        .enumerate()
        .map(|(index, diagram)| validator.diagram(diagram, &format!("diagrams[{index}]")))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DiagramResponse { diagrams })
}

struct Validator {
    mode: ParseMode,
    /// Ids claimed in the tree currently being validated
    seen: HashSet<String>,
}

impl Validator {
    fn new(mode: ParseMode) -> Self {
        Self {
            mode,
            seen: HashSet::new(),
        }
    }

    fn diagram(&mut self, raw: RawDiagram, path: &str) -> Result<Diagram, MalformedDiagram> {
        self.seen.clear();
        let root = self.node(raw.root, &format!("{path}.root"))?;
        Ok(Diagram {
            title: raw.title,
            root,
        })
    }

    fn node(&mut self, raw: RawNode, path: &str) -> Result<DiagramNode, MalformedDiagram> {
        let id = self.claim_id(raw.id.map(|id| id.into_string()), path)?;

        let Some(node_type) = NodeType::from_tag(&raw.node_type) else {
            return match self.mode {
                ParseMode::Strict => Err(MalformedDiagram::UnknownNodeType {
                    path: path.to_string(),
                    type_name: raw.node_type,
                }),
                ParseMode::Lenient => Ok(DiagramNode::Unknown(UnknownNode {
                    id,
                    type_name: raw.node_type,
                })),
            };
        };

        let node = match node_type {
            NodeType::Sequence => DiagramNode::Sequence(SequenceNode {
                id,
                children: self.block(raw.children, path, "children")?,
            }),
            NodeType::Statement => DiagramNode::Statement(StatementNode {
                id,
                text: required(raw.text, path, node_type, "text")?,
            }),
            NodeType::If => DiagramNode::If(IfNode {
                id,
                condition: required(raw.condition, path, node_type, "condition")?,
                true_block: self.block(raw.true_block, path, "trueBlock")?,
                false_block: self.block(raw.false_block, path, "falseBlock")?,
            }),
            NodeType::Loop => DiagramNode::Loop(LoopNode {
                id,
                condition: required(raw.condition, path, node_type, "condition")?,
                children: self.block(raw.children, path, "children")?,
            }),
            NodeType::Switch => {
                let condition = required(raw.condition, path, node_type, "condition")?;
                let cases = required(raw.cases, path, node_type, "cases")?;
                DiagramNode::Switch(SwitchNode {
                    id,
                    condition,
                    cases: self.cases(cases, path)?,
                })
            }
            NodeType::Function => DiagramNode::Function(FunctionNode {
                id,
                text: raw.text,
                children: self.block(raw.children, path, "children")?,
            }),
        };

        Ok(node)
    }

    fn block(
        &mut self,
        raw: Option<Vec<RawNode>>,
        path: &str,
        field: &str,
    ) -> Result<Vec<DiagramNode>, MalformedDiagram> {
        raw.unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, child)| self.node(child, &format!("{path}.{field}[{index}]")))
            .collect()
    }

    fn cases(&mut self, raw: Vec<RawCase>, path: &str) -> Result<Vec<SwitchCase>, MalformedDiagram> {
        raw.into_iter()
            .enumerate()
            .map(|(index, case)| -> Result<SwitchCase, MalformedDiagram> {
                let case_path = format!("{path}.cases[{index}]");
                let condition = case.condition.ok_or_else(|| MalformedDiagram::MissingField {
                    path: case_path.clone(),
                    node_type: "case",
                    field: "condition",
                })?;
                let body = case.body.ok_or_else(|| MalformedDiagram::MissingField {
                    path: case_path.clone(),
                    node_type: "case",
                    field: "body",
                })?;
                Ok(SwitchCase {
                    condition,
                    body: self.node(body, &format!("{case_path}.body"))?,
                })
            })
            .collect()
    }

    /// Missing or empty ids take the node's path. A repeated id is an error in
    /// strict mode and falls back to the path in lenient mode.
    fn claim_id(&mut self, id: Option<String>, path: &str) -> Result<String, MalformedDiagram> {
        let id = match id {
            Some(id) if !id.is_empty() => id,
            _ => path.to_string(),
        };

        if self.seen.insert(id.clone()) {
            return Ok(id);
        }

        if self.mode == ParseMode::Lenient && self.seen.insert(path.to_string()) {
            return Ok(path.to_string());
        }
        Err(MalformedDiagram::DuplicateId {
            path: path.to_string(),
            id,
        })
    }
}

fn required<T>(
    value: Option<T>,
    path: &str,
    node_type: NodeType,
    field: &'static str,
) -> Result<T, MalformedDiagram> {
    value.ok_or_else(|| MalformedDiagram::MissingField {
        path: path.to_string(),
        node_type: node_type.as_str(),
        field,
    })
}
