use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Stable identity for a node in the document tree.
///
/// Keys are minted once when a node is created and survive every edit that
/// keeps the node alive: retyping a block, wrapping or unwrapping it, merging
/// into it, or keeping the leading half of a split. UI layers can therefore
/// hold a `NodeKey` across edits instead of a positional path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey(Uuid);

impl NodeKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NodeKey {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The closed set of block types the engine understands.
///
/// Every consumer that branches on a block type matches this enum, so adding
/// a variant is a compile-visible change everywhere. Types read from
/// serialized documents that the engine does not know land in
/// [`BlockKind::Other`], which round-trips the original name and renders as
/// an unstyled container instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    /// Heading level 1 through 6. Use [`BlockKind::heading`] to construct.
    Heading { level: u8 },
    BlockQuote,
    BulletedList,
    ListItem,
    /// Unknown type name preserved verbatim from a serialized document.
    Other(String),
}

const HEADING_NAMES: [&str; 6] = [
    "heading-one",
    "heading-two",
    "heading-three",
    "heading-four",
    "heading-five",
    "heading-six",
];

impl BlockKind {
    /// Heading of the given level, or `None` outside 1..=6.
    pub fn heading(level: u8) -> Option<Self> {
        (1..=6).contains(&level).then_some(Self::Heading { level })
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, Self::Heading { .. })
    }

    /// Wire name used by the serialized document format.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading { level } => HEADING_NAMES[(*level as usize).clamp(1, 6) - 1],
            Self::BlockQuote => "block-quote",
            Self::BulletedList => "bulleted-list",
            Self::ListItem => "list-item",
            Self::Other(name) => name,
        }
    }

    /// Parse a wire name, preserving unknown names in [`BlockKind::Other`].
    pub fn from_name(name: &str) -> Self {
        if let Some(idx) = HEADING_NAMES.iter().position(|h| *h == name) {
            return Self::Heading {
                level: idx as u8 + 1,
            };
        }
        match name {
            "paragraph" => Self::Paragraph,
            "block-quote" => Self::BlockQuote,
            "bulleted-list" => Self::BulletedList,
            "list-item" => Self::ListItem,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inline node types. Inline content is carried but no editing operation
/// creates it, so the set is small; unknown names are preserved like blocks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InlineKind {
    Link,
    Other(String),
}

impl InlineKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Link => "link",
            Self::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "link" => Self::Link,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Formatting mark on a text leaf. Marks apply to the whole leaf; marking a
/// sub-range splits the leaf first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mark {
    Bold,
    Italic,
    Code,
    Underline,
    Strikethrough,
}

impl Mark {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Code => "code",
            Self::Underline => "underline",
            Self::Strikethrough => "strikethrough",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bold" => Some(Self::Bold),
            "italic" => Some(Self::Italic),
            "code" => Some(Self::Code),
            "underline" => Some(Self::Underline),
            "strikethrough" => Some(Self::Strikethrough),
            _ => None,
        }
    }
}

/// Set of marks on a leaf. `BTreeSet` makes equality order-independent and
/// deduplicates structurally.
pub type MarkSet = BTreeSet<Mark>;

/// Container block: a typed node holding child blocks, inlines and texts.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub key: NodeKey,
    pub kind: BlockKind,
    pub nodes: Vec<Node>,
}

impl Block {
    pub fn new(kind: BlockKind, nodes: Vec<Node>) -> Self {
        Self {
            key: NodeKey::new(),
            kind,
            nodes,
        }
    }

    pub fn with_key(key: NodeKey, kind: BlockKind, nodes: Vec<Node>) -> Self {
        Self { key, kind, nodes }
    }

    /// Concatenated text of every leaf under this block.
    pub fn text(&self) -> String {
        self.nodes.iter().map(Node::text_content).collect()
    }

    /// Text length in characters.
    pub fn len_chars(&self) -> usize {
        self.nodes.iter().map(Node::text_len).sum()
    }
}

/// Inline container node (a link span, for example).
#[derive(Debug, Clone, PartialEq)]
pub struct Inline {
    pub key: NodeKey,
    pub kind: InlineKind,
    pub nodes: Vec<Node>,
}

impl Inline {
    pub fn new(kind: InlineKind, nodes: Vec<Node>) -> Self {
        Self {
            key: NodeKey::new(),
            kind,
            nodes,
        }
    }

    pub fn with_key(key: NodeKey, kind: InlineKind, nodes: Vec<Node>) -> Self {
        Self { key, kind, nodes }
    }
}

/// Leaf node: a run of text with one mark set applied to all of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub key: NodeKey,
    pub text: String,
    pub marks: MarkSet,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            key: NodeKey::new(),
            text: text.into(),
            marks: MarkSet::new(),
        }
    }

    pub fn with_marks(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            key: NodeKey::new(),
            text: text.into(),
            marks,
        }
    }

    pub fn with_key(key: NodeKey, text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            key,
            text: text.into(),
            marks,
        }
    }

    pub fn empty() -> Self {
        Self::new("")
    }

    /// Length in characters, the unit all selection offsets use.
    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    /// Byte index of the given character offset, clamped to the text end.
    pub fn byte_of_char(&self, offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(offset)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }
}

/// A node in the document tree.
///
/// Children are held behind `Arc`, so cloning a node (or a whole document) is
/// cheap and edits share every untouched subtree with their predecessor.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Block(Arc<Block>),
    Inline(Arc<Inline>),
    Text(Arc<Text>),
}

impl Node {
    pub fn block(kind: BlockKind, nodes: Vec<Node>) -> Self {
        Self::Block(Arc::new(Block::new(kind, nodes)))
    }

    pub fn inline(kind: InlineKind, nodes: Vec<Node>) -> Self {
        Self::Inline(Arc::new(Inline::new(kind, nodes)))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(Arc::new(Text::new(text)))
    }

    pub fn marked_text(text: impl Into<String>, marks: MarkSet) -> Self {
        Self::Text(Arc::new(Text::with_marks(text, marks)))
    }

    pub fn key(&self) -> NodeKey {
        match self {
            Self::Block(b) => b.key,
            Self::Inline(i) => i.key,
            Self::Text(t) => t.key,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block(_))
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Self::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_inline(&self) -> Option<&Inline> {
        match self {
            Self::Inline(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Child nodes, or `None` for leaves.
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Self::Block(b) => Some(&b.nodes),
            Self::Inline(i) => Some(&i.nodes),
            Self::Text(_) => None,
        }
    }

    /// Concatenated text of every leaf under this node, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text(t) => out.push_str(&t.text),
            Self::Block(b) => {
                for child in &b.nodes {
                    child.collect_text(out);
                }
            }
            Self::Inline(i) => {
                for child in &i.nodes {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Total text length in characters under this node.
    pub fn text_len(&self) -> usize {
        match self {
            Self::Text(t) => t.len_chars(),
            Self::Block(b) => b.nodes.iter().map(Node::text_len).sum(),
            Self::Inline(i) => i.nodes.iter().map(Node::text_len).sum(),
        }
    }

    /// Same node identity with replaced children. Leaves are returned
    /// unchanged since they have none.
    pub(crate) fn with_children(&self, nodes: Vec<Node>) -> Node {
        match self {
            Self::Block(b) => Self::Block(Arc::new(Block::with_key(b.key, b.kind.clone(), nodes))),
            Self::Inline(i) => {
                Self::Inline(Arc::new(Inline::with_key(i.key, i.kind.clone(), nodes)))
            }
            Self::Text(_) => self.clone(),
        }
    }

    /// Same block identity with a new kind. Non-blocks are returned unchanged.
    pub(crate) fn with_kind(&self, kind: BlockKind) -> Node {
        match self {
            Self::Block(b) => Self::Block(Arc::new(Block::with_key(b.key, kind, b.nodes.clone()))),
            _ => self.clone(),
        }
    }
}

impl From<Block> for Node {
    fn from(block: Block) -> Self {
        Self::Block(Arc::new(block))
    }
}

impl From<Inline> for Node {
    fn from(inline: Inline) -> Self {
        Self::Inline(Arc::new(inline))
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Self::Text(Arc::new(text))
    }
}
