//! Structogram layout
//!
//! Walks a [`DiagramNode`] tree depth-first and produces a [`LayoutBox`] tree:
//! nested boxes stacked either as a column or as a row, each with an optional
//! label. Writers turn that tree into HTML or text; nothing here does I/O.
//!
//! The same tree always yields the same layout. Box keys are derived from node
//! ids, so they are stable across renders. Derived boxes append `/`-separated
//! segments to their node's key, so `/` and `%` in ids are percent-escaped.

use serde::Serialize;

use crate::diagram::{
    Diagram, DiagramNode, DiagramResponse, FunctionNode, IfNode, LoopNode, SwitchNode,
};

/// Label of the placeholder shown in an empty `if` arm
pub const EMPTY_ARM_LABEL: &str = "Empty";

/// Side marker of a loop box
pub const LOOP_MARKER_LABEL: &str = "LOOP";

/// Prefix of the label carried by fallback boxes
pub const UNKNOWN_LABEL_PREFIX: &str = "Unknown node: ";

/// What a box depicts. Writers use it for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoxRole {
    Sequence,
    Statement,
    Branch,
    BranchHeader,
    ArmLabel,
    Arms,
    Arm,
    Placeholder,
    Loop,
    LoopMarker,
    LoopFrame,
    LoopHeader,
    LoopBody,
    Switch,
    SwitchHeader,
    Cases,
    Case,
    CaseLabel,
    Function,
    FunctionHeader,
    Unknown,
}

impl BoxRole {
    pub fn as_str(self) -> &'static str {
        match self {
            BoxRole::Sequence => "sequence",
            BoxRole::Statement => "statement",
            BoxRole::Branch => "branch",
            BoxRole::BranchHeader => "branch-header",
            BoxRole::ArmLabel => "arm-label",
            BoxRole::Arms => "arms",
            BoxRole::Arm => "arm",
            BoxRole::Placeholder => "placeholder",
            BoxRole::Loop => "loop",
            BoxRole::LoopMarker => "loop-marker",
            BoxRole::LoopFrame => "loop-frame",
            BoxRole::LoopHeader => "loop-header",
            BoxRole::LoopBody => "loop-body",
            BoxRole::Switch => "switch",
            BoxRole::SwitchHeader => "switch-header",
            BoxRole::Cases => "cases",
            BoxRole::Case => "case",
            BoxRole::CaseLabel => "case-label",
            BoxRole::Function => "function",
            BoxRole::FunctionHeader => "function-header",
            BoxRole::Unknown => "unknown",
        }
    }
}

/// Axis along which a box stacks its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Column,
    Row,
}

/// One box of the rendered structogram
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutBox {
    /// Stable key, unique within one diagram
    pub key: String,
    pub role: BoxRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub direction: Direction,
    /// Outer frame, set on the root box of a diagram only
    pub framed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LayoutBox>,
}

impl LayoutBox {
    fn column(key: impl Into<String>, role: BoxRole) -> Self {
        Self {
            key: key.into(),
            role,
            label: None,
            direction: Direction::Column,
            framed: false,
            children: Vec::new(),
        }
    }

    fn row(key: impl Into<String>, role: BoxRole) -> Self {
        Self {
            direction: Direction::Row,
            ..Self::column(key, role)
        }
    }

    fn leaf(key: impl Into<String>, role: BoxRole, label: impl Into<String>) -> Self {
        Self::column(key, role).labelled(label)
    }

    fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn with_children(mut self, children: Vec<LayoutBox>) -> Self {
        self.children = children;
        self
    }

    /// This box and all its descendants, pre-order
    pub fn descendants(&self) -> Vec<&LayoutBox> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a LayoutBox>) {
        out.push(self);
        for child in &self.children {
            child.collect(out);
        }
    }

    /// Type names of every fallback box in this subtree, in render order
    pub fn unknown_types(&self) -> Vec<&str> {
        self.descendants()
            .into_iter()
            .filter(|b| b.role == BoxRole::Unknown)
            .filter_map(|b| b.label.as_deref())
            .filter_map(|label| label.strip_prefix(UNKNOWN_LABEL_PREFIX))
            .collect()
    }
}

/// The rendered form of one [`Diagram`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagramLayout {
    pub title: String,
    pub root: LayoutBox,
}

/// Render every diagram of a response, in order
pub fn render_response(response: &DiagramResponse) -> Vec<DiagramLayout> {
    response.diagrams.iter().map(render_diagram).collect()
}

pub fn render_diagram(diagram: &Diagram) -> DiagramLayout {
    DiagramLayout {
        title: diagram.title.clone(),
        root: render(&diagram.root, true),
    }
}

/// Render a node and its subtree.
///
/// `is_root` only controls the outer frame.
pub fn render(node: &DiagramNode, is_root: bool) -> LayoutBox {
    let mut layout = match node {
        DiagramNode::Sequence(n) => {
            LayoutBox::column(box_key(&n.id), BoxRole::Sequence)
                .with_children(render_block(&n.children))
        }
        DiagramNode::Statement(n) => LayoutBox::leaf(box_key(&n.id), BoxRole::Statement, &n.text),
        DiagramNode::If(n) => render_if(n),
        DiagramNode::Loop(n) => render_loop(n),
        DiagramNode::Switch(n) => render_switch(n),
        DiagramNode::Function(n) => render_function(n),
        DiagramNode::Unknown(n) => LayoutBox::leaf(
            box_key(&n.id),
            BoxRole::Unknown,
            format!("{UNKNOWN_LABEL_PREFIX}{}", n.type_name),
        ),
    };
    layout.framed = is_root;
    layout
}

/// Box key of a node: its id with `%` and `/` percent-escaped
pub fn box_key(id: &str) -> String {
    id.replace('%', "%25").replace('/', "%2F")
}

fn render_block(nodes: &[DiagramNode]) -> Vec<LayoutBox> {
    nodes.iter().map(|node| render(node, false)).collect()
}

fn render_if(node: &IfNode) -> LayoutBox {
    let id = &box_key(&node.id);
    let header = LayoutBox::row(format!("{id}/header"), BoxRole::BranchHeader)
        .labelled(&node.condition)
        .with_children(vec![
            LayoutBox::leaf(format!("{id}/header/true"), BoxRole::ArmLabel, "True"),
            LayoutBox::leaf(format!("{id}/header/false"), BoxRole::ArmLabel, "False"),
        ]);
    let arms = LayoutBox::row(format!("{id}/arms"), BoxRole::Arms).with_children(vec![
        render_arm(id, "true", &node.true_block),
        render_arm(id, "false", &node.false_block),
    ]);

    LayoutBox::column(id, BoxRole::Branch).with_children(vec![header, arms])
}

/// An empty arm still gets a box so both arms share the row.
fn render_arm(id: &str, side: &str, block: &[DiagramNode]) -> LayoutBox {
    let key = format!("{id}/{side}");
    let children = if block.is_empty() {
        vec![LayoutBox::leaf(
            format!("{key}/empty"),
            BoxRole::Placeholder,
            EMPTY_ARM_LABEL,
        )]
    } else {
        render_block(block)
    };
    LayoutBox::column(key, BoxRole::Arm).with_children(children)
}

fn render_loop(node: &LoopNode) -> LayoutBox {
    let id = &box_key(&node.id);
    let frame = LayoutBox::column(format!("{id}/frame"), BoxRole::LoopFrame).with_children(vec![
        LayoutBox::leaf(format!("{id}/header"), BoxRole::LoopHeader, &node.condition),
        LayoutBox::column(format!("{id}/body"), BoxRole::LoopBody)
            .with_children(render_block(&node.children)),
    ]);

    LayoutBox::row(id, BoxRole::Loop).with_children(vec![
        LayoutBox::leaf(format!("{id}/marker"), BoxRole::LoopMarker, LOOP_MARKER_LABEL),
        frame,
    ])
}

fn render_switch(node: &SwitchNode) -> LayoutBox {
    let id = &box_key(&node.id);
    let cases = node
        .cases
        .iter()
        .enumerate()
        .map(|(index, case)| {
            let key = format!("{id}/case/{index}");
            LayoutBox::column(&key, BoxRole::Case).with_children(vec![
                LayoutBox::leaf(format!("{key}/label"), BoxRole::CaseLabel, &case.condition),
                render(&case.body, false),
            ])
        })
        .collect();

    LayoutBox::column(id, BoxRole::Switch).with_children(vec![
        LayoutBox::leaf(format!("{id}/header"), BoxRole::SwitchHeader, &node.condition),
        LayoutBox::row(format!("{id}/cases"), BoxRole::Cases).with_children(cases),
    ])
}

fn render_function(node: &FunctionNode) -> LayoutBox {
    let id = &box_key(&node.id);
    let mut children = Vec::with_capacity(node.children.len() + 1);
    if let Some(text) = &node.text {
        children.push(LayoutBox::leaf(
            format!("{id}/header"),
            BoxRole::FunctionHeader,
            text,
        ));
    }
    children.extend(render_block(&node.children));

    LayoutBox::column(id, BoxRole::Function).with_children(children)
}
