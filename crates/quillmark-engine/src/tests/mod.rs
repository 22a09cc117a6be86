//! Shared test fixtures: compact builders for documents and carets so
//! individual test modules stay focused on behavior.

use crate::editing::{BlockKind, Document, Node, Point, Selection, State};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary documents directory for testing.
pub fn create_test_docs_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Create a test file with content.
pub fn create_test_file(docs_dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = docs_dir.path().join(filename);
    fs::write(&file_path, content).unwrap();
    file_path
}

pub fn para(text: &str) -> Node {
    Node::block(BlockKind::Paragraph, vec![Node::text(text)])
}

pub fn heading(level: u8, text: &str) -> Node {
    Node::block(BlockKind::Heading { level }, vec![Node::text(text)])
}

pub fn quote(text: &str) -> Node {
    Node::block(BlockKind::BlockQuote, vec![Node::text(text)])
}

pub fn list_item(text: &str) -> Node {
    Node::block(BlockKind::ListItem, vec![Node::text(text)])
}

pub fn bulleted_list(items: &[&str]) -> Node {
    Node::block(
        BlockKind::BulletedList,
        items.iter().map(|t| list_item(t)).collect(),
    )
}

pub fn doc(nodes: Vec<Node>) -> Document {
    Document::from_nodes(nodes).unwrap()
}

/// Caret at `offset` characters into the `block_index`th leaf block.
pub fn caret_in(document: &Document, block_index: usize, offset: usize) -> Selection {
    let block = document.leaf_blocks()[block_index].key;
    let (key, local) = document
        .text_at_block_offset(block, offset)
        .expect("offset fits in block");
    Selection::collapsed(Point::new(key, local))
}

/// State over `nodes` with the caret at `offset` in the `block_index`th leaf
/// block.
pub fn state_with_caret(nodes: Vec<Node>, block_index: usize, offset: usize) -> State {
    let document = doc(nodes);
    let selection = caret_in(&document, block_index, offset);
    State::new(document, selection).unwrap()
}

/// Kinds of every leaf block, in document order.
pub fn leaf_kinds(document: &Document) -> Vec<BlockKind> {
    document
        .leaf_blocks()
        .iter()
        .map(|b| b.kind.clone())
        .collect()
}

/// Kinds of the top level blocks.
pub fn top_level_kinds(document: &Document) -> Vec<BlockKind> {
    document
        .nodes()
        .iter()
        .filter_map(Node::as_block)
        .map(|b| b.kind.clone())
        .collect()
}

/// Text content of every leaf block, in document order.
pub fn leaf_texts(document: &Document) -> Vec<String> {
    document.leaf_blocks().iter().map(|b| b.text()).collect()
}
