//! One-way HTML export.
//!
//! Produces a fragment, not a full page. Unknown block kinds render as
//! plain `<div>` containers and unknown inlines as `<span>`, so a document
//! carrying types from a newer producer still previews instead of failing.

use crate::editing::{Block, BlockKind, Document, Inline, InlineKind, Mark, Node, Text};

const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Render a document as an HTML fragment.
pub fn to_html(document: &Document) -> String {
    let mut out = String::new();
    for node in document.nodes() {
        write_node(&mut out, node);
    }
    out
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Block(b) => write_block(out, b),
        Node::Inline(i) => write_inline(out, i),
        Node::Text(t) => write_text(out, t),
    }
}

fn write_block(out: &mut String, block: &Block) {
    let tag = block_tag(&block.kind);
    push_open(out, tag);
    for child in &block.nodes {
        write_node(out, child);
    }
    push_close(out, tag);
}

fn write_inline(out: &mut String, inline: &Inline) {
    let tag = match inline.kind {
        // no target is stored, so links render as bare anchors
        InlineKind::Link => "a",
        InlineKind::Other(_) => "span",
    };
    push_open(out, tag);
    for child in &inline.nodes {
        write_node(out, child);
    }
    push_close(out, tag);
}

fn write_text(out: &mut String, text: &Text) {
    let tags: Vec<&str> = text.marks.iter().map(mark_tag).collect();
    for tag in &tags {
        push_open(out, tag);
    }
    out.push_str(&html_escape::encode_text(&text.text));
    for tag in tags.iter().rev() {
        push_close(out, tag);
    }
}

fn block_tag(kind: &BlockKind) -> &'static str {
    match kind {
        BlockKind::Paragraph => "p",
        BlockKind::Heading { level } => HEADING_TAGS[(*level as usize).clamp(1, 6) - 1],
        BlockKind::BlockQuote => "blockquote",
        BlockKind::BulletedList => "ul",
        BlockKind::ListItem => "li",
        BlockKind::Other(_) => "div",
    }
}

fn mark_tag(mark: &Mark) -> &'static str {
    match mark {
        Mark::Bold => "strong",
        Mark::Italic => "em",
        Mark::Code => "code",
        Mark::Underline => "u",
        Mark::Strikethrough => "del",
    }
}

fn push_open(out: &mut String, tag: &str) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
}

fn push_close(out: &mut String, tag: &str) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}
