// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use quillmark_engine::editing::{
    BlockKind, Document, Node, Point, Selection, State,
};

#[allow(dead_code)]
pub fn generate_document(sections: usize) -> Document {
    let mut nodes = Vec::new();
    for section in 0..sections {
        nodes.push(Node::block(
            BlockKind::Heading { level: 2 },
            vec![Node::text(format!("Section {section}"))],
        ));
        nodes.push(Node::block(
            BlockKind::Paragraph,
            vec![Node::text(
                "Paragraph with enough content to make traversal representative.",
            )],
        ));
        nodes.push(Node::block(
            BlockKind::BulletedList,
            (0..3)
                .map(|i| {
                    Node::block(
                        BlockKind::ListItem,
                        vec![Node::text(format!("Item {i} of section {section}"))],
                    )
                })
                .collect(),
        ));
        nodes.push(Node::block(
            BlockKind::BlockQuote,
            vec![Node::text("A quoted aside.")],
        ));
    }
    Document::from_nodes(nodes).expect("generated document is valid")
}

/// State with the caret at the very end of the document.
#[allow(dead_code)]
pub fn state_at_end(document: Document) -> State {
    let last = document
        .texts()
        .last()
        .map(|t| Point::new(t.key, t.len_chars()))
        .expect("generated document has text");
    State::new(document, Selection::collapsed(last)).expect("caret is valid")
}
