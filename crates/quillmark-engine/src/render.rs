//! UI-ready flattening of the document tree.
//!
//! Frontends do not walk the tree. They take a [`Snapshot`] and draw a flat
//! list of [`RenderBlock`]s, each carrying everything needed to paint one
//! visual line group: its stable key, its kind, the container kinds it sits
//! inside, and its text split into styled spans.
//!
//! Nothing here branches on [`BlockKind`], so documents carrying unknown
//! kinds flatten like any other; deciding how an unknown kind looks is the
//! renderer's problem and falling back to an unstyled container is always
//! safe.

use crate::editing::{BlockKind, Document, InlineKind, MarkSet, Node, NodeKey};
use crate::session::Session;

/// Immutable picture of a session for one paint pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Session version at capture time, for cheap change detection.
    pub version: u64,
    pub blocks: Vec<RenderBlock>,
}

impl Snapshot {
    pub fn capture(session: &Session) -> Self {
        Self {
            version: session.version(),
            blocks: render_blocks(session.state().document()),
        }
    }
}

/// One leaf block prepared for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBlock {
    /// Stable identity, survives edits that keep the block alive.
    pub key: NodeKey,
    pub kind: BlockKind,
    /// Kinds of the container blocks above this one, outermost first.
    pub ancestors: Vec<BlockKind>,
    /// Styled text runs. Never empty; an empty block yields one empty span
    /// so the caret has somewhere to sit.
    pub spans: Vec<TextSpan>,
}

impl RenderBlock {
    /// Nesting depth for indentation.
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }
}

/// A run of identically styled text within a block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub marks: MarkSet,
    /// Set when the run came from inside an inline node.
    pub inline: Option<InlineKind>,
}

/// Flatten a document into leaf blocks in reading order.
pub fn render_blocks(document: &Document) -> Vec<RenderBlock> {
    let mut blocks = Vec::new();
    let mut ancestors = Vec::new();
    for node in document.nodes() {
        collect_blocks(node, &mut ancestors, &mut blocks);
    }
    blocks
}

fn collect_blocks(node: &Node, ancestors: &mut Vec<BlockKind>, out: &mut Vec<RenderBlock>) {
    let Some(block) = node.as_block() else { return };
    if block.nodes.iter().any(Node::is_block) {
        ancestors.push(block.kind.clone());
        for child in &block.nodes {
            collect_blocks(child, ancestors, out);
        }
        ancestors.pop();
    } else {
        out.push(RenderBlock {
            key: block.key,
            kind: block.kind.clone(),
            ancestors: ancestors.clone(),
            spans: collect_spans(&block.nodes),
        });
    }
}

fn collect_spans(children: &[Node]) -> Vec<TextSpan> {
    let mut spans = Vec::new();
    for child in children {
        flatten_spans(child, None, &mut spans);
    }
    if spans.is_empty() {
        spans.push(TextSpan {
            text: String::new(),
            marks: MarkSet::new(),
            inline: None,
        });
    }
    spans
}

fn flatten_spans(node: &Node, inline: Option<&InlineKind>, spans: &mut Vec<TextSpan>) {
    match node {
        Node::Text(t) => {
            if let Some(last) = spans.last_mut() {
                if last.marks == t.marks && last.inline.as_ref() == inline {
                    last.text.push_str(&t.text);
                    return;
                }
            }
            spans.push(TextSpan {
                text: t.text.clone(),
                marks: t.marks.clone(),
                inline: inline.cloned(),
            });
        }
        Node::Inline(i) => {
            for child in &i.nodes {
                flatten_spans(child, Some(&i.kind), spans);
            }
        }
        Node::Block(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::Mark;
    use crate::tests::{bulleted_list, heading, para, state_with_caret};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flat_document_renders_in_order() {
        let doc = Document::from_nodes(vec![heading(1, "Title"), para("Body")]).unwrap();
        let blocks = render_blocks(&doc);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, BlockKind::Heading { level: 1 });
        assert_eq!(blocks[0].depth(), 0);
        assert_eq!(blocks[1].spans[0].text, "Body");
    }

    #[test]
    fn test_containers_become_ancestor_context() {
        let doc = Document::from_nodes(vec![bulleted_list(&["one", "two"])]).unwrap();
        let blocks = render_blocks(&doc);
        assert_eq!(blocks.len(), 2);
        for block in &blocks {
            assert_eq!(block.kind, BlockKind::ListItem);
            assert_eq!(block.ancestors, vec![BlockKind::BulletedList]);
            assert_eq!(block.depth(), 1);
        }
    }

    #[test]
    fn test_quote_wrapping_a_paragraph() {
        let doc = Document::from_nodes(vec![Node::block(
            BlockKind::BlockQuote,
            vec![Node::block(BlockKind::Paragraph, vec![Node::text("deep")])],
        )])
        .unwrap();
        let blocks = render_blocks(&doc);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Paragraph);
        assert_eq!(blocks[0].ancestors, vec![BlockKind::BlockQuote]);
    }

    #[test]
    fn test_adjacent_spans_with_equal_style_merge() {
        let marks: MarkSet = [Mark::Bold].into_iter().collect();
        let doc = Document::from_nodes(vec![Node::block(
            BlockKind::Paragraph,
            vec![
                Node::text("a"),
                Node::text("b"),
                Node::marked_text("c", marks.clone()),
            ],
        )])
        .unwrap();
        let spans = &render_blocks(&doc)[0].spans;
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "ab");
        assert_eq!(spans[1].marks, marks);
    }

    #[test]
    fn test_link_spans_keep_their_inline_kind() {
        let doc = Document::from_nodes(vec![Node::block(
            BlockKind::Paragraph,
            vec![
                Node::text("see "),
                Node::inline(InlineKind::Link, vec![Node::text("docs")]),
            ],
        )])
        .unwrap();
        let spans = &render_blocks(&doc)[0].spans;
        assert_eq!(spans[0].inline, None);
        assert_eq!(spans[1].inline, Some(InlineKind::Link));
        assert_eq!(spans[1].text, "docs");
    }

    #[test]
    fn test_empty_block_yields_one_empty_span() {
        let doc = Document::from_nodes(vec![para("")]).unwrap();
        let spans = &render_blocks(&doc)[0].spans;
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "");
    }

    #[test]
    fn test_unknown_kinds_flatten_like_any_other() {
        let doc = Document::from_nodes(vec![Node::block(
            BlockKind::Other("callout".to_string()),
            vec![Node::text("watch out")],
        )])
        .unwrap();
        let blocks = render_blocks(&doc);
        assert_eq!(blocks[0].kind, BlockKind::Other("callout".to_string()));
        assert_eq!(blocks[0].spans[0].text, "watch out");
    }

    #[test]
    fn test_snapshot_captures_the_session_version() {
        let mut session = Session::new(state_with_caret(vec![para("")], 0, 0));
        session
            .handle_key(crate::shortcuts::KeyInput::Char('x'))
            .unwrap();
        let snapshot = Snapshot::capture(&session);
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.blocks[0].spans[0].text, "x");
    }
}
