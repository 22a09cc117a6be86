//! Canonical JSON tree format.
//!
//! Every node serializes to an object drawn from five optional fields:
//! `type`, `key`, `nodes`, `text`, `marks`. Text leaves carry `text` (and
//! `marks` when non-empty), containers carry `type` and `nodes`. The
//! document root is an object with only `nodes`.
//!
//! Reading is lenient where it can be: missing keys are minted fresh,
//! unknown `type` names are preserved as pass-through kinds, and a missing
//! `nodes` list on the root yields the default empty document. It is strict
//! where silence would corrupt: a node with both `text` and `nodes`, marks
//! on a non-leaf, or an unparseable key are errors rather than guesses.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::editing::{
    Block, BlockKind, Document, EditError, Inline, InlineKind, Mark, MarkSet, Node, NodeKey, Text,
};

#[derive(Debug, Error)]
pub enum RawError {
    #[error("node has both `text` and `nodes`")]
    TextWithChildren,
    #[error("node has neither `text` nor `type`")]
    Untyped,
    #[error("`marks` given on a node without `text`")]
    MarksWithoutText,
    #[error("unknown mark name `{0}`")]
    UnknownMark(String),
    #[error("invalid node key `{0}`")]
    InvalidKey(String),
    #[error("document structure: {0}")]
    Structure(#[from] EditError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// One node of the wire format. All fields are optional; which are present
/// decides what the node is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<RawNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<String>>,
}

/// Serialize a document to its wire tree.
pub fn to_raw(document: &Document) -> RawNode {
    RawNode {
        nodes: Some(document.nodes().iter().map(node_to_raw).collect()),
        ..RawNode::default()
    }
}

/// Rebuild a document from a wire tree, validating the result.
pub fn from_raw(raw: &RawNode) -> Result<Document, RawError> {
    let Some(children) = raw.nodes.as_deref() else {
        return Ok(Document::new());
    };
    if children.is_empty() {
        return Ok(Document::new());
    }
    let nodes = children_from_raw(children, false)?;
    Ok(Document::from_nodes(nodes)?)
}

/// Serialize a document to pretty-printed JSON.
pub fn to_json_string(document: &Document) -> Result<String, RawError> {
    Ok(serde_json::to_string_pretty(&to_raw(document))?)
}

/// Parse a document from JSON text.
pub fn from_json_str(input: &str) -> Result<Document, RawError> {
    let raw: RawNode = serde_json::from_str(input)?;
    from_raw(&raw)
}

/// Parse a document from JSON bytes as read off disk or a socket.
pub fn from_json_bytes(bytes: &[u8]) -> anyhow::Result<Document> {
    let text = std::str::from_utf8(bytes).context("document is not valid UTF-8")?;
    Ok(from_json_str(text)?)
}

fn node_to_raw(node: &Node) -> RawNode {
    match node {
        Node::Text(t) => RawNode {
            key: Some(t.key.to_string()),
            text: Some(t.text.clone()),
            marks: if t.marks.is_empty() {
                None
            } else {
                Some(t.marks.iter().map(|m| m.as_str().to_string()).collect())
            },
            ..RawNode::default()
        },
        Node::Block(b) => RawNode {
            node_type: Some(b.kind.as_str().to_string()),
            key: Some(b.key.to_string()),
            nodes: Some(b.nodes.iter().map(node_to_raw).collect()),
            ..RawNode::default()
        },
        Node::Inline(i) => RawNode {
            node_type: Some(i.kind.as_str().to_string()),
            key: Some(i.key.to_string()),
            nodes: Some(i.nodes.iter().map(node_to_raw).collect()),
            ..RawNode::default()
        },
    }
}

/// Convert a sibling run. The wire format has no block/inline discriminator,
/// so unknown type names are classified by position: beside a text leaf (or
/// under an inline) they become inlines, otherwise blocks.
fn children_from_raw(children: &[RawNode], parent_is_inline: bool) -> Result<Vec<Node>, RawError> {
    let inline_context = parent_is_inline || children.iter().any(|c| c.text.is_some());
    children
        .iter()
        .map(|c| node_from_raw(c, inline_context))
        .collect()
}

fn node_from_raw(raw: &RawNode, inline_context: bool) -> Result<Node, RawError> {
    if let Some(text) = &raw.text {
        if raw.nodes.is_some() {
            return Err(RawError::TextWithChildren);
        }
        let marks = marks_from_raw(raw.marks.as_deref())?;
        let key = key_from_raw(raw.key.as_deref())?;
        return Ok(Text::with_key(key, text.clone(), marks).into());
    }
    if raw.marks.is_some() {
        return Err(RawError::MarksWithoutText);
    }
    let Some(name) = raw.node_type.as_deref() else {
        return Err(RawError::Untyped);
    };
    let key = key_from_raw(raw.key.as_deref())?;
    let kind = BlockKind::from_name(name);
    let is_inline = name == InlineKind::Link.as_str()
        || (inline_context && matches!(kind, BlockKind::Other(_)));
    if is_inline {
        let children = children_from_raw(raw.nodes.as_deref().unwrap_or_default(), true)?;
        return Ok(Inline::with_key(key, InlineKind::from_name(name), children).into());
    }
    let children = children_from_raw(raw.nodes.as_deref().unwrap_or_default(), false)?;
    Ok(Block::with_key(key, kind, children).into())
}

fn marks_from_raw(marks: Option<&[String]>) -> Result<MarkSet, RawError> {
    marks
        .unwrap_or_default()
        .iter()
        .map(|name| Mark::from_name(name).ok_or_else(|| RawError::UnknownMark(name.clone())))
        .collect()
}

fn key_from_raw(key: Option<&str>) -> Result<NodeKey, RawError> {
    match key {
        None => Ok(NodeKey::new()),
        Some(s) => s.parse().map_err(|_| RawError::InvalidKey(s.to_string())),
    }
}
