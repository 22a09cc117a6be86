use crate::editing::document::{Document, EditError};
use crate::editing::node::{Block, Text};
use crate::editing::selection::{Point, Selection};
use crate::editing::transform::Transform;

/// Immutable editing state: a document and the selection into it.
///
/// Everything else is derived. The block or leaf under the cursor, the
/// offsets, the selected kind are all recomputed from the pair on access so
/// they can never drift from it. Mutation happens exclusively through
/// [`State::transform`], which hands back a new `State` and leaves this one
/// intact.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    document: Document,
    selection: Selection,
}

impl State {
    /// Build a state, checking that both selection endpoints resolve to text
    /// leaves and that their offsets are within bounds.
    pub fn new(document: Document, selection: Selection) -> Result<Self, EditError> {
        for point in [selection.anchor, selection.focus] {
            let leaf = document
                .get_node(point.key)
                .ok_or(EditError::NotFound { key: point.key })?;
            let text = leaf
                .as_text()
                .ok_or_else(|| EditError::invalid("selection endpoint is not a text leaf"))?;
            if point.offset > text.len_chars() {
                return Err(EditError::invalid("selection offset beyond text end"));
            }
        }
        Ok(Self {
            document,
            selection,
        })
    }

    /// State with the caret at the very start of the document.
    pub fn at_start(document: Document) -> Result<Self, EditError> {
        let first = document
            .texts()
            .first()
            .map(|t| t.key)
            .ok_or_else(|| EditError::invalid("document has no text leaves"))?;
        let selection = Selection::collapsed(Point::new(first, 0));
        Ok(Self {
            document,
            selection,
        })
    }

    /// Internal constructor for transform steps that maintain validity by
    /// construction.
    pub(crate) fn from_parts(document: Document, selection: Selection) -> Self {
        Self {
            document,
            selection,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Begin a chain of operations against this state.
    pub fn transform(&self) -> Transform {
        Transform::new(self.clone())
    }

    /// Document-order first endpoint of the selection.
    pub fn start_point(&self) -> Option<Point> {
        self.selection.start(&self.document)
    }

    /// Document-order last endpoint of the selection.
    pub fn end_point(&self) -> Option<Point> {
        self.selection.end(&self.document)
    }

    /// Text leaf holding the selection start.
    pub fn start_text(&self) -> Option<&Text> {
        self.document
            .get_node(self.start_point()?.key)?
            .as_text()
    }

    /// Text leaf holding the selection end.
    pub fn end_text(&self) -> Option<&Text> {
        self.document.get_node(self.end_point()?.key)?.as_text()
    }

    /// Lowest block containing the selection start.
    pub fn start_block(&self) -> Option<&Block> {
        self.document.closest_block(self.start_point()?.key)
    }

    /// Lowest block containing the selection end.
    pub fn end_block(&self) -> Option<&Block> {
        self.document.closest_block(self.end_point()?.key)
    }

    /// Character offset of the selection start within its leaf.
    pub fn start_offset(&self) -> Option<usize> {
        Some(self.start_point()?.offset)
    }

    /// Character offset of the selection end within its leaf.
    pub fn end_offset(&self) -> Option<usize> {
        Some(self.end_point()?.offset)
    }

    /// Character offset of the selection start measured from the start of
    /// its block, counting every earlier leaf in the block.
    pub fn start_offset_in_block(&self) -> Option<usize> {
        let point = self.start_point()?;
        let base = self.document.offset_of_text_in_block(point.key)?;
        Some(base + point.offset)
    }

    /// Character offset of the selection end measured from the start of its
    /// block.
    pub fn end_offset_in_block(&self) -> Option<usize> {
        let point = self.end_point()?;
        let base = self.document.offset_of_text_in_block(point.key)?;
        Some(base + point.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::node::{BlockKind, Node, NodeKey};
    use pretty_assertions::assert_eq;

    fn sample() -> State {
        let document = Document::from_nodes(vec![
            Node::block(BlockKind::Heading { level: 1 }, vec![Node::text("Title")]),
            Node::block(BlockKind::Paragraph, vec![Node::text("Body text")]),
        ])
        .unwrap();
        State::at_start(document).unwrap()
    }

    #[test]
    fn test_at_start_places_caret_in_first_leaf() {
        let state = sample();
        assert!(state.selection().is_collapsed());
        assert_eq!(state.start_offset(), Some(0));
        assert_eq!(state.start_text().unwrap().text, "Title");
    }

    #[test]
    fn test_new_rejects_dangling_selection() {
        let document = Document::new();
        let selection = Selection::collapsed(Point::new(NodeKey::new(), 0));
        let err = State::new(document, selection).unwrap_err();
        assert!(matches!(err, EditError::NotFound { .. }));
    }

    #[test]
    fn test_new_rejects_out_of_range_offset() {
        let document = Document::new();
        let key = document.texts()[0].key;
        let selection = Selection::collapsed(Point::new(key, 1));
        let err = State::new(document, selection).unwrap_err();
        assert!(matches!(err, EditError::InvalidOperation { .. }));
    }

    #[test]
    fn test_accessors_follow_the_selection() {
        let state = sample();
        let body = state.document().texts()[1].key;
        let moved = State::new(
            state.document().clone(),
            Selection::collapsed(Point::new(body, 4)),
        )
        .unwrap();
        assert_eq!(moved.start_block().unwrap().kind, BlockKind::Paragraph);
        assert_eq!(moved.start_offset(), Some(4));
        assert_eq!(moved.start_text().unwrap().text, "Body text");
    }

    #[test]
    fn test_expanded_selection_orders_endpoints() {
        let state = sample();
        let title = state.document().texts()[0].key;
        let body = state.document().texts()[1].key;
        let backward = State::new(
            state.document().clone(),
            Selection::new(Point::new(body, 2), Point::new(title, 1)),
        )
        .unwrap();
        assert_eq!(backward.start_text().unwrap().text, "Title");
        assert_eq!(backward.end_text().unwrap().text, "Body text");
        assert_eq!(backward.start_offset(), Some(1));
        assert_eq!(backward.end_offset(), Some(2));
    }

    #[test]
    fn test_offset_in_block_counts_earlier_leaves() {
        let document = Document::from_nodes(vec![Node::block(
            BlockKind::Paragraph,
            vec![Node::text("ab"), Node::text("cd")],
        )])
        .unwrap();
        let second = document.texts()[1].key;
        let state =
            State::new(document, Selection::collapsed(Point::new(second, 1))).unwrap();
        assert_eq!(state.start_offset_in_block(), Some(3));
    }
}
