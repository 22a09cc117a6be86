use crate::editing::document::{Document, EditError};
use crate::editing::node::{Block, BlockKind, Mark, Node, NodeKey, Text};
use crate::editing::selection::{Point, Selection};
use crate::editing::state::State;

/// One recorded operation. A [`Transform`] queues these and [`Transform::apply`]
/// folds them in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    SetBlock { kind: BlockKind },
    WrapBlock { kind: BlockKind },
    UnwrapBlock { kind: BlockKind },
    SplitBlock,
    ExtendToStartOf { key: NodeKey },
    CollapseToStart,
    CollapseToEnd,
    MoveTo { selection: Selection },
    Delete,
    InsertText { text: String },
    DeleteBackward { count: usize },
    AddMark { mark: Mark },
    RemoveMark { mark: Mark },
}

/// An in-progress change: the state it started from plus the queued
/// operations.
///
/// Nothing happens until [`Transform::apply`], which folds the operations
/// left to right and returns the resulting [`State`]. Operations whose
/// preconditions are benignly unmet (deleting at a caret, unwrapping a
/// wrapper that is not there, backspacing at the document start) pass the
/// working state through unchanged; structural errors (an unknown key, a
/// split through a non-leaf) abort the whole fold. Because documents are
/// immutable values, an aborted apply leaves the base state exactly as it
/// was: there are no partial commits.
#[derive(Debug, Clone)]
pub struct Transform {
    base: State,
    ops: Vec<Op>,
}

impl Transform {
    pub(crate) fn new(base: State) -> Self {
        Self {
            base,
            ops: Vec::new(),
        }
    }

    /// Operations queued so far.
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    fn push(mut self, op: Op) -> Self {
        self.ops.push(op);
        self
    }

    /// Retype every lowest-level block the selection touches.
    pub fn set_block(self, kind: BlockKind) -> Self {
        self.push(Op::SetBlock { kind })
    }

    /// Wrap the sibling run of blocks the selection touches in a new block
    /// of `kind`.
    pub fn wrap_block(self, kind: BlockKind) -> Self {
        self.push(Op::WrapBlock { kind })
    }

    /// Remove the closest wrapping ancestor of `kind`, promoting its
    /// children. Does nothing when no such ancestor exists.
    pub fn unwrap_block(self, kind: BlockKind) -> Self {
        self.push(Op::UnwrapBlock { kind })
    }

    /// Split the block at the selection start in two; the caret lands at the
    /// start of the trailing block. An expanded selection is deleted first.
    pub fn split_block(self) -> Self {
        self.push(Op::SplitBlock)
    }

    /// Move the focus to the start of the first text under `key`.
    pub fn extend_to_start_of(self, key: NodeKey) -> Self {
        self.push(Op::ExtendToStartOf { key })
    }

    pub fn collapse_to_start(self) -> Self {
        self.push(Op::CollapseToStart)
    }

    pub fn collapse_to_end(self) -> Self {
        self.push(Op::CollapseToEnd)
    }

    pub fn move_to(self, selection: Selection) -> Self {
        self.push(Op::MoveTo { selection })
    }

    /// Remove the selected content. Does nothing at a caret.
    pub fn delete(self) -> Self {
        self.push(Op::Delete)
    }

    /// Insert text at the caret, deleting an expanded selection first.
    pub fn insert_text(self, text: impl Into<String>) -> Self {
        self.push(Op::InsertText { text: text.into() })
    }

    /// Remove `count` characters before the caret, joining blocks at a block
    /// start. An expanded selection is deleted instead.
    pub fn delete_backward(self, count: usize) -> Self {
        self.push(Op::DeleteBackward { count })
    }

    /// Apply `mark` to the selected text. Does nothing at a caret.
    pub fn add_mark(self, mark: Mark) -> Self {
        self.push(Op::AddMark { mark })
    }

    /// Clear `mark` from the selected text. Does nothing at a caret.
    pub fn remove_mark(self, mark: Mark) -> Self {
        self.push(Op::RemoveMark { mark })
    }

    /// Fold the queued operations over the base state.
    pub fn apply(self) -> Result<State, EditError> {
        let Transform { base, ops } = self;
        ops.into_iter().try_fold(base, apply_op)
    }
}

fn apply_op(state: State, op: Op) -> Result<State, EditError> {
    match op {
        Op::SetBlock { kind } => set_block(state, kind),
        Op::WrapBlock { kind } => wrap_block(state, kind),
        Op::UnwrapBlock { kind } => unwrap_block(state, kind),
        Op::SplitBlock => split_block(state),
        Op::ExtendToStartOf { key } => extend_to_start_of(state, key),
        Op::CollapseToStart => collapse_to_start(state),
        Op::CollapseToEnd => collapse_to_end(state),
        Op::MoveTo { selection } => State::new(state.document().clone(), selection),
        Op::Delete => delete(state),
        Op::InsertText { text } => insert_text(state, &text),
        Op::DeleteBackward { count } => delete_backward(state, count),
        Op::AddMark { mark } => update_marks(state, mark, true),
        Op::RemoveMark { mark } => update_marks(state, mark, false),
    }
}

fn selection_error() -> EditError {
    EditError::invalid("selection does not resolve to the document")
}

fn ordered_points(state: &State) -> Result<(Point, Point), EditError> {
    let start = state.start_point().ok_or_else(selection_error)?;
    let end = state.end_point().ok_or_else(selection_error)?;
    Ok((start, end))
}

/// Keys of the lowest-level blocks the selection touches, in document order.
fn selected_leaf_blocks(state: &State) -> Result<Vec<NodeKey>, EditError> {
    let (start, end) = ordered_points(state)?;
    let doc = state.document();
    let b1 = doc.closest_block(start.key).ok_or_else(selection_error)?.key;
    let b2 = doc.closest_block(end.key).ok_or_else(selection_error)?.key;
    let order: Vec<NodeKey> = doc.leaf_blocks().iter().map(|b| b.key).collect();
    let p1 = order.iter().position(|k| *k == b1).ok_or_else(selection_error)?;
    let p2 = order.iter().position(|k| *k == b2).ok_or_else(selection_error)?;
    Ok(order[p1..=p2].to_vec())
}

fn set_block(state: State, kind: BlockKind) -> Result<State, EditError> {
    let blocks = selected_leaf_blocks(&state)?;
    let mut doc = state.document().clone();
    for key in blocks {
        doc = doc.set_node_kind(key, kind.clone())?;
    }
    let selection = state.selection();
    Ok(State::from_parts(doc, selection))
}

fn wrap_block(state: State, kind: BlockKind) -> Result<State, EditError> {
    let (start, end) = ordered_points(&state)?;
    let doc = state.document();
    let b1 = doc.closest_block(start.key).ok_or_else(selection_error)?.key;
    let b2 = doc.closest_block(end.key).ok_or_else(selection_error)?.key;
    let p1 = doc.path_to(b1).ok_or(EditError::NotFound { key: b1 })?;
    let p2 = doc.path_to(b2).ok_or(EditError::NotFound { key: b2 })?;

    // Wrap the run of siblings under the deepest common parent that spans
    // both endpoint blocks.
    let depth = if b1 == b2 {
        p1.len() - 1
    } else {
        p1.iter().zip(&p2).take_while(|(a, b)| a == b).count()
    };
    let parent_path = p1[..depth].to_vec();
    let (i1, i2) = (p1[depth], p2[depth]);
    let siblings: Vec<Node> = if parent_path.is_empty() {
        doc.nodes()[i1..=i2].to_vec()
    } else {
        doc.node_at_path(&parent_path)
            .and_then(Node::children)
            .map(|c| c[i1..=i2].to_vec())
            .ok_or_else(selection_error)?
    };
    let wrapper: Node = Block::new(kind, siblings).into();
    let doc = doc.splice_children(&parent_path, i1..i2 + 1, vec![wrapper])?;
    let selection = state.selection();
    Ok(State::from_parts(doc, selection))
}

fn unwrap_block(state: State, kind: BlockKind) -> Result<State, EditError> {
    let start = state.start_point().ok_or_else(selection_error)?;
    let doc = state.document();
    let block_key = doc.closest_block(start.key).ok_or_else(selection_error)?.key;
    let wrapper = doc
        .get_closest(block_key, |b| b.kind == kind)
        .map(|w| (w.key, w.nodes.clone()));
    let Some((wrapper_key, children)) = wrapper else {
        // nothing to unwrap
        return Ok(state);
    };
    let path = doc
        .path_to(wrapper_key)
        .ok_or(EditError::NotFound { key: wrapper_key })?;
    let (last, parent_path) = path.split_last().expect("path is never empty");
    let doc = doc.splice_children(parent_path, *last..*last + 1, children)?;
    let selection = state.selection();
    Ok(State::from_parts(doc, selection))
}

fn split_block(state: State) -> Result<State, EditError> {
    let state = delete(state)?;
    let point = state.start_point().ok_or_else(selection_error)?;
    let block_key = state
        .document()
        .closest_block(point.key)
        .ok_or_else(selection_error)?
        .key;
    let (doc, second) = state
        .document()
        .split_block_at(block_key, point.key, point.offset)?;
    let cursor = Point::start_of(&doc, second)
        .ok_or_else(|| EditError::invalid("split produced a block without text"))?;
    Ok(State::from_parts(doc, Selection::collapsed(cursor)))
}

fn extend_to_start_of(state: State, key: NodeKey) -> Result<State, EditError> {
    if state.document().get_node(key).is_none() {
        return Err(EditError::NotFound { key });
    }
    let point = Point::start_of(state.document(), key)
        .ok_or_else(|| EditError::invalid("node has no text to extend to"))?;
    let selection = state.selection().extend_to(point);
    Ok(State::from_parts(state.document().clone(), selection))
}

fn collapse_to_start(state: State) -> Result<State, EditError> {
    let selection = state
        .selection()
        .collapse_to_start(state.document())
        .ok_or_else(selection_error)?;
    Ok(State::from_parts(state.document().clone(), selection))
}

fn collapse_to_end(state: State) -> Result<State, EditError> {
    let selection = state
        .selection()
        .collapse_to_end(state.document())
        .ok_or_else(selection_error)?;
    Ok(State::from_parts(state.document().clone(), selection))
}

fn delete(state: State) -> Result<State, EditError> {
    if state.selection().is_collapsed() {
        return Ok(state);
    }
    let (start, end) = ordered_points(&state)?;
    let doc = state
        .document()
        .delete_between((start.key, start.offset), (end.key, end.offset))?;
    Ok(State::from_parts(doc, Selection::collapsed(start)))
}

fn insert_text(state: State, text: &str) -> Result<State, EditError> {
    let state = if state.selection().is_expanded() {
        delete(state)?
    } else {
        state
    };
    let point = state.selection().anchor;
    let doc = state.document().insert_text_at(point.key, point.offset, text)?;
    let cursor = Point::new(point.key, point.offset + text.chars().count());
    Ok(State::from_parts(doc, Selection::collapsed(cursor)))
}

fn delete_backward(state: State, count: usize) -> Result<State, EditError> {
    if state.selection().is_expanded() {
        return delete(state);
    }
    let mut state = state;
    for _ in 0..count {
        match single_backspace(&state)? {
            Some(next) => state = next,
            None => break,
        }
    }
    Ok(state)
}

/// One character of backward deletion. `None` means the caret sits at the
/// very start of the document and there is nothing before it.
fn single_backspace(state: &State) -> Result<Option<State>, EditError> {
    let point = state.selection().anchor;
    let doc = state.document();
    let block_key = doc.closest_block(point.key).ok_or_else(selection_error)?.key;
    let offset_in_block = state.start_offset_in_block().ok_or_else(selection_error)?;

    if offset_in_block > 0 {
        let (leaf, local) = doc
            .text_at_block_offset(block_key, offset_in_block - 1)
            .ok_or_else(|| EditError::invalid("caret position is outside its block"))?;
        let next = doc.remove_text_at(leaf, local, 1)?;
        let cursor = Selection::collapsed(Point::new(leaf, local));
        return Ok(Some(State::from_parts(next, cursor)));
    }

    // Caret at a block start: join this block onto the previous one.
    let order: Vec<NodeKey> = doc.leaf_blocks().iter().map(|b| b.key).collect();
    let pos = order
        .iter()
        .position(|k| *k == block_key)
        .ok_or_else(selection_error)?;
    let Some(prev_key) = pos.checked_sub(1).map(|i| order[i]) else {
        return Ok(None);
    };
    let prev_end = Point::end_of(doc, prev_key)
        .ok_or_else(|| EditError::invalid("previous block has no text"))?;
    let next = doc.delete_between((prev_end.key, prev_end.offset), (point.key, 0))?;
    Ok(Some(State::from_parts(next, Selection::collapsed(prev_end))))
}

fn toggle_leaf(doc: &Document, key: NodeKey, mark: Mark, add: bool) -> Result<Document, EditError> {
    let leaf = doc
        .get_node(key)
        .and_then(Node::as_text)
        .ok_or(EditError::NotFound { key })?;
    let mut marks = leaf.marks.clone();
    if add {
        marks.insert(mark);
    } else {
        marks.remove(&mark);
    }
    doc.replace_node(key, Text::with_key(leaf.key, leaf.text.clone(), marks).into())
}

fn update_marks(state: State, mark: Mark, add: bool) -> Result<State, EditError> {
    if state.selection().is_collapsed() {
        return Ok(state);
    }
    let (start, end) = ordered_points(&state)?;
    let doc = state.document();

    if start.key == end.key {
        let leaf = doc
            .get_node(start.key)
            .and_then(Node::as_text)
            .ok_or(EditError::NotFound { key: start.key })?;
        let len = leaf.len_chars();
        let (so, eo) = (start.offset, end.offset);

        if so == 0 && eo == len {
            let next = toggle_leaf(doc, start.key, mark, add)?;
            let selection = state.selection();
            return Ok(State::from_parts(next, selection));
        }

        // Carve the covered span into its own leaf, then toggle it. The
        // leading remainder keeps the original key, so only endpoints that
        // landed past it need remapping.
        let mut next = doc.clone();
        let covered = if so > 0 {
            let (split, mid) = next.split_text_at(start.key, so)?;
            next = split;
            if eo < len {
                let (split, _) = next.split_text_at(mid, eo - so)?;
                next = split;
            }
            mid
        } else {
            let (split, _) = next.split_text_at(start.key, eo)?;
            next = split;
            start.key
        };
        let next = toggle_leaf(&next, covered, mark, add)?;

        let remap = |p: Point| {
            if so > 0 && p == end {
                Point::new(covered, eo - so)
            } else {
                p
            }
        };
        let selection = Selection::new(
            remap(state.selection().anchor),
            remap(state.selection().focus),
        );
        return Ok(State::from_parts(next, selection));
    }

    // Range spans several leaves: toggle the covered slice of each.
    let texts = doc.texts();
    let i = texts
        .iter()
        .position(|t| t.key == start.key)
        .ok_or(EditError::NotFound { key: start.key })?;
    let j = texts
        .iter()
        .position(|t| t.key == end.key)
        .ok_or(EditError::NotFound { key: end.key })?;
    let start_len = texts[i].len_chars();
    let end_len = texts[j].len_chars();
    let middles: Vec<NodeKey> = texts[i + 1..j].iter().map(|t| t.key).collect();

    let mut next = doc.clone();
    if start.offset == 0 {
        next = toggle_leaf(&next, start.key, mark, add)?;
    } else if start.offset < start_len {
        let (split, mid) = next.split_text_at(start.key, start.offset)?;
        next = toggle_leaf(&split, mid, mark, add)?;
    }
    for key in middles {
        next = toggle_leaf(&next, key, mark, add)?;
    }
    if end.offset == end_len {
        next = toggle_leaf(&next, end.key, mark, add)?;
    } else if end.offset > 0 {
        let (split, _) = next.split_text_at(end.key, end.offset)?;
        next = toggle_leaf(&split, end.key, mark, add)?;
    }
    let selection = state.selection();
    Ok(State::from_parts(next, selection))
}

// ============================================================================
// Tests
// ============================================================================
