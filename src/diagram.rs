//! Structogram tree model
//!
//! A [`DiagramResponse`] holds one [`Diagram`] per analysed function. Each diagram
//! owns a tree of [`DiagramNode`] values, a closed sum type with one payload struct
//! per node kind. Trees are built once by the [`parser`](crate::parser) and are
//! never mutated afterwards.
//!
//! On the wire a node is a flat JSON object discriminated by its `type` field
//! (see [`RawNode`]). `DiagramNode` serializes through that shape, so
//! `serde_json::to_string` yields the canonical form that the parser accepts back.
//! Deserialization is only offered for a whole [`DiagramResponse`] and runs the
//! strict validator, so ids, paths and errors match [`parser::parse`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::{self, MalformedDiagram, ParseMode};

/// The full result of one analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawResponse")]
pub struct DiagramResponse {
    pub diagrams: Vec<Diagram>,
}

/// One diagram per detected function or procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagram {
    pub title: String,
    /// Conventionally a [`DiagramNode::Sequence`]
    pub root: DiagramNode,
}

/// A node in a structogram tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "RawNode")]
pub enum DiagramNode {
    Sequence(SequenceNode),
    Statement(StatementNode),
    If(IfNode),
    Loop(LoopNode),
    Switch(SwitchNode),
    Function(FunctionNode),
    /// A node whose `type` tag is not recognised. Only produced by lenient parsing.
    Unknown(UnknownNode),
}

/// Ordered block of nodes executed top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceNode {
    pub id: String,
    pub children: Vec<DiagramNode>,
}

/// Atomic leaf action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementNode {
    pub id: String,
    pub text: String,
}

/// Binary branch. Both arms are sequences and may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfNode {
    pub id: String,
    pub condition: String,
    pub true_block: Vec<DiagramNode>,
    pub false_block: Vec<DiagramNode>,
}

/// Single-exit iteration wrapping a body sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopNode {
    pub id: String,
    pub condition: String,
    pub children: Vec<DiagramNode>,
}

/// Multi-way branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchNode {
    pub id: String,
    pub condition: String,
    pub cases: Vec<SwitchCase>,
}

/// One labelled arm of a [`SwitchNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchCase {
    pub condition: String,
    pub body: DiagramNode,
}

/// Named block, rendered as a titled sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionNode {
    pub id: String,
    pub text: Option<String>,
    pub children: Vec<DiagramNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNode {
    pub id: String,
    pub type_name: String,
}

/// The recognised `type` tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Sequence,
    Statement,
    If,
    Loop,
    Switch,
    Function,
}

impl NodeType {
    pub const ALL: [NodeType; 6] = [
        NodeType::Sequence,
        NodeType::Statement,
        NodeType::If,
        NodeType::Loop,
        NodeType::Switch,
        NodeType::Function,
    ];

    /// Look up a wire tag. Tags are case-sensitive.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Sequence => "sequence",
            NodeType::Statement => "statement",
            NodeType::If => "if",
            NodeType::Loop => "loop",
            NodeType::Switch => "switch",
            NodeType::Function => "function",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DiagramNode {
    /// The node's key, unique within its tree
    pub fn id(&self) -> &str {
        match self {
            DiagramNode::Sequence(n) => &n.id,
            DiagramNode::Statement(n) => &n.id,
            DiagramNode::If(n) => &n.id,
            DiagramNode::Loop(n) => &n.id,
            DiagramNode::Switch(n) => &n.id,
            DiagramNode::Function(n) => &n.id,
            DiagramNode::Unknown(n) => &n.id,
        }
    }

    /// The wire `type` tag of this node
    pub fn type_name(&self) -> &str {
        match self {
            DiagramNode::Sequence(_) => NodeType::Sequence.as_str(),
            DiagramNode::Statement(_) => NodeType::Statement.as_str(),
            DiagramNode::If(_) => NodeType::If.as_str(),
            DiagramNode::Loop(_) => NodeType::Loop.as_str(),
            DiagramNode::Switch(_) => NodeType::Switch.as_str(),
            DiagramNode::Function(_) => NodeType::Function.as_str(),
            DiagramNode::Unknown(n) => &n.type_name,
        }
    }

    /// Direct children in render order. Switch case bodies count as children.
    pub fn children(&self) -> Vec<&DiagramNode> {
        match self {
            DiagramNode::Sequence(n) => n.children.iter().collect(),
            DiagramNode::Loop(n) => n.children.iter().collect(),
            DiagramNode::Function(n) => n.children.iter().collect(),
            DiagramNode::If(n) => n.true_block.iter().chain(&n.false_block).collect(),
            DiagramNode::Switch(n) => n.cases.iter().map(|c| &c.body).collect(),
            DiagramNode::Statement(_) | DiagramNode::Unknown(_) => Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(DiagramNode::node_count)
            .sum::<usize>()
    }
}

impl DiagramResponse {
    /// Total node count across every diagram
    pub fn node_count(&self) -> usize {
        self.diagrams.iter().map(|d| d.root.node_count()).sum()
    }
}

/// Node id as it appears on the wire. Generators sometimes emit numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    pub fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

/// Flat wire shape of a node: every variant's fields, all optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RawId>,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<RawNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_block: Option<Vec<RawNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_block: Option<Vec<RawNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cases: Option<Vec<RawCase>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCase {
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub body: Option<RawNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDiagram {
    pub title: String,
    pub root: RawNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawResponse {
    pub diagrams: Vec<RawDiagram>,
}

fn raw_block(nodes: Vec<DiagramNode>) -> Option<Vec<RawNode>> {
    Some(nodes.into_iter().map(RawNode::from).collect())
}

impl From<DiagramNode> for RawNode {
    fn from(node: DiagramNode) -> Self {
        let node_type = node.type_name().to_string();
        let id = Some(RawId::Text(node.id().to_string()));
        let base = RawNode {
            id,
            node_type,
            ..RawNode::default()
        };

        match node {
            DiagramNode::Sequence(n) => RawNode {
                children: raw_block(n.children),
                ..base
            },
            DiagramNode::Statement(n) => RawNode {
                text: Some(n.text),
                ..base
            },
            DiagramNode::If(n) => RawNode {
                condition: Some(n.condition),
                true_block: raw_block(n.true_block),
                false_block: raw_block(n.false_block),
                ..base
            },
            DiagramNode::Loop(n) => RawNode {
                condition: Some(n.condition),
                children: raw_block(n.children),
                ..base
            },
            DiagramNode::Switch(n) => RawNode {
                condition: Some(n.condition),
                cases: Some(
                    n.cases
                        .into_iter()
                        .map(|c| RawCase {
                            condition: Some(c.condition),
                            body: Some(RawNode::from(c.body)),
                        })
                        .collect(),
                ),
                ..base
            },
            DiagramNode::Function(n) => RawNode {
                text: n.text,
                children: raw_block(n.children),
                ..base
            },
            DiagramNode::Unknown(_) => base,
        }
    }
}

/// Strict conversion, used when a response is deserialized directly.
impl TryFrom<RawResponse> for DiagramResponse {
    type Error = MalformedDiagram;

    fn try_from(raw: RawResponse) -> Result<Self, Self::Error> {
        parser::validate(raw, ParseMode::Strict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(id: &str, text: &str) -> DiagramNode {
        DiagramNode::Statement(StatementNode {
            id: id.to_string(),
            text: text.to_string(),
        })
    }

    fn sample_if() -> DiagramNode {
        DiagramNode::If(IfNode {
            id: "2".to_string(),
            condition: "x > 0".to_string(),
            true_block: vec![statement("3", "print('Hello')")],
            false_block: vec![],
        })
    }

    #[test]
    fn node_type_from_tag_recognises_all_tags() {
        for tag in ["sequence", "statement", "if", "loop", "switch", "function"] {
            let node_type = NodeType::from_tag(tag).expect("tag should be recognised");
            assert_eq!(node_type.as_str(), tag);
        }
        assert_eq!(NodeType::from_tag("bogus"), None);
        assert_eq!(NodeType::from_tag("If"), None);
    }

    #[test]
    fn id_and_type_name_follow_variant() {
        let node = sample_if();
        assert_eq!(node.id(), "2");
        assert_eq!(node.type_name(), "if");

        let unknown = DiagramNode::Unknown(UnknownNode {
            id: "9".to_string(),
            type_name: "bogus".to_string(),
        });
        assert_eq!(unknown.type_name(), "bogus");
    }

    #[test]
    fn node_count_includes_nested_nodes() {
        let root = DiagramNode::Sequence(SequenceNode {
            id: "1".to_string(),
            children: vec![sample_if(), statement("4", "done")],
        });
        assert_eq!(root.node_count(), 4);
    }

    #[test]
    fn node_count_includes_switch_case_bodies() {
        let node = DiagramNode::Switch(SwitchNode {
            id: "s".to_string(),
            condition: "key".to_string(),
            cases: vec![
                SwitchCase {
                    condition: "'a'".to_string(),
                    body: statement("a", "left()"),
                },
                SwitchCase {
                    condition: "'b'".to_string(),
                    body: statement("b", "right()"),
                },
            ],
        });
        assert_eq!(node.node_count(), 3);
    }

    #[test]
    fn raw_node_from_if_keeps_empty_arms() {
        let raw = RawNode::from(sample_if());
        assert_eq!(raw.node_type, "if");
        assert_eq!(raw.condition.as_deref(), Some("x > 0"));
        assert_eq!(raw.true_block.as_ref().map(Vec::len), Some(1));
        assert_eq!(raw.false_block, Some(vec![]));
        assert!(raw.children.is_none());
        assert!(raw.text.is_none());
    }

    #[test]
    fn statement_serializes_without_foreign_fields() {
        let json = serde_json::to_value(statement("7", "x = 1")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "7", "type": "statement", "text": "x = 1"})
        );
    }

    #[test]
    fn response_deserializes_through_strict_validation() {
        let doc = r#"{"diagrams":[{"title":"t","root":{"type":"sequence","children":[
            {"type":"loop","condition":"i < n"},
            {"id":7,"type":"statement","text":"x = 1"}
        ]}}]}"#;
        let response: DiagramResponse = serde_json::from_str(doc).unwrap();
        assert_eq!(response, parser::parse(doc).unwrap());

        let root = &response.diagrams[0].root;
        assert_eq!(root.id(), "diagrams[0].root");
        assert_eq!(root.children()[0].id(), "diagrams[0].root.children[0]");
        assert_eq!(root.children()[1].id(), "7");
    }

    #[test]
    fn response_deserialization_reports_parser_errors() {
        let doc = r#"{"diagrams":[{"title":"t","root":{"id":"1","type":"sequence","children":[
            {"id":"2","type":"bogus"}
        ]}}]}"#;
        let err = serde_json::from_str::<DiagramResponse>(doc).unwrap_err();
        let expected = parser::parse(doc).unwrap_err().to_string();
        assert!(err.to_string().starts_with(&expected), "{err}");
        assert!(expected.contains("diagrams[0].root.children[0]"));
    }

    #[test]
    fn raw_id_accepts_numbers() {
        let raw: RawNode = serde_json::from_str(r#"{"id":42,"type":"sequence"}"#).unwrap();
        assert_eq!(raw.id.map(RawId::into_string), Some("42".to_string()));
    }
}
