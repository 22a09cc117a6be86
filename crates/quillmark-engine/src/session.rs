//! Caller-side editing controller.
//!
//! The engine itself is pure values; something has to own the current
//! [`State`], feed key input through the shortcut policy, fall back to the
//! default edit for the key, and tell interested parties that the state
//! moved. That something is [`Session`]. Frontends hold one per open
//! document and render from `session.state()` after every event.

use crate::editing::{Document, EditError, Point, Selection, State};
use crate::shortcuts::{self, KeyInput};

/// What a committed change was, for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The markdown shortcut policy fired.
    Shortcut,
    /// Default editing behavior: typed text, backspace, block split.
    Edit,
    /// Selection moved without touching the document.
    Cursor,
    /// The document was replaced wholesale, e.g. by a load.
    Replace,
}

/// Notification delivered to observers after a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub kind: ChangeKind,
    pub old_version: u64,
    pub new_version: u64,
}

pub type ChangeCallback = Box<dyn FnMut(&StateChange)>;

/// Owns the current state, a monotonically increasing version, and the
/// registered change observers.
///
/// The version only moves when the state actually changes; input that ends
/// up a no-op (backspace at the document start, a declined shortcut with a
/// no-op default) commits nothing and notifies nobody.
pub struct Session {
    state: State,
    version: u64,
    modified: bool,
    callbacks: Vec<ChangeCallback>,
}

impl Session {
    pub fn new(state: State) -> Self {
        Self {
            state,
            version: 0,
            modified: false,
            callbacks: Vec::new(),
        }
    }

    /// Session over `document` with the caret at its start.
    pub fn from_document(document: Document) -> Result<Self, EditError> {
        Ok(Self::new(State::at_start(document)?))
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether the document changed since the last [`Session::clear_modified`].
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Mark the current document as persisted.
    pub fn clear_modified(&mut self) {
        self.modified = false;
    }

    /// Register an observer called after every committed change.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&StateChange) + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Commit `next` as the current state. Returns `false` (committing
    /// nothing, notifying nobody) when `next` equals the current state.
    pub fn commit(&mut self, next: State, kind: ChangeKind) -> bool {
        if next == self.state {
            return false;
        }
        if next.document() != self.state.document() {
            self.modified = true;
        }
        let change = StateChange {
            kind,
            old_version: self.version,
            new_version: self.version + 1,
        };
        self.state = next;
        self.version = change.new_version;
        for callback in &mut self.callbacks {
            callback(&change);
        }
        true
    }

    /// Replace the open document, moving the caret to its start. The session
    /// counts as unmodified afterwards.
    pub fn replace_document(&mut self, document: Document) -> Result<(), EditError> {
        let next = State::at_start(document)?;
        self.commit(next, ChangeKind::Replace);
        self.modified = false;
        Ok(())
    }

    /// Route one key through the shortcut policy, falling back to the
    /// default edit for the key. Returns whether anything was committed.
    pub fn handle_key(&mut self, input: KeyInput) -> Result<bool, EditError> {
        if let Some(next) = shortcuts::handle(&self.state, input)? {
            return Ok(self.commit(next, ChangeKind::Shortcut));
        }
        let next = match input {
            KeyInput::Char(c) => self
                .state
                .transform()
                .insert_text(c.to_string())
                .apply()?,
            KeyInput::Space => self.state.transform().insert_text(" ").apply()?,
            KeyInput::Backspace => self.state.transform().delete_backward(1).apply()?,
            KeyInput::Enter => self.state.transform().split_block().apply()?,
        };
        Ok(self.commit(next, ChangeKind::Edit))
    }

    /// Move the caret one position left, crossing leaf and block boundaries.
    pub fn move_left(&mut self) -> Result<bool, EditError> {
        let selection = self.state.selection();
        if selection.is_expanded() {
            let next = self.state.transform().collapse_to_start().apply()?;
            return Ok(self.commit(next, ChangeKind::Cursor));
        }
        let point = selection.anchor;
        let doc = self.state.document();
        let target = if point.offset > 0 {
            Some(Point::new(point.key, point.offset - 1))
        } else {
            doc.previous_text(point.key).map(|prev| {
                let same_block = doc.closest_block(prev.key).map(|b| b.key)
                    == doc.closest_block(point.key).map(|b| b.key);
                if same_block {
                    Point::new(prev.key, prev.len_chars().saturating_sub(1))
                } else {
                    // crossing a block boundary costs one keypress
                    Point::new(prev.key, prev.len_chars())
                }
            })
        };
        let Some(target) = target else {
            return Ok(false);
        };
        let next = self
            .state
            .transform()
            .move_to(Selection::collapsed(target))
            .apply()?;
        Ok(self.commit(next, ChangeKind::Cursor))
    }

    /// Move the caret one position right, crossing leaf and block
    /// boundaries.
    pub fn move_right(&mut self) -> Result<bool, EditError> {
        let selection = self.state.selection();
        if selection.is_expanded() {
            let next = self.state.transform().collapse_to_end().apply()?;
            return Ok(self.commit(next, ChangeKind::Cursor));
        }
        let point = selection.anchor;
        let doc = self.state.document();
        let len = doc
            .get_node(point.key)
            .and_then(|n| n.as_text().map(|t| t.len_chars()))
            .ok_or_else(|| EditError::invalid("caret is not on a text leaf"))?;
        let target = if point.offset < len {
            Some(Point::new(point.key, point.offset + 1))
        } else {
            doc.next_text(point.key).map(|next_leaf| {
                let same_block = doc.closest_block(next_leaf.key).map(|b| b.key)
                    == doc.closest_block(point.key).map(|b| b.key);
                if same_block {
                    Point::new(next_leaf.key, next_leaf.len_chars().min(1))
                } else {
                    Point::new(next_leaf.key, 0)
                }
            })
        };
        let Some(target) = target else {
            return Ok(false);
        };
        let next = self
            .state
            .transform()
            .move_to(Selection::collapsed(target))
            .apply()?;
        Ok(self.commit(next, ChangeKind::Cursor))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("version", &self.version)
            .field("modified", &self.modified)
            .field("observers", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::BlockKind;
    use crate::tests::{bulleted_list, doc, heading, leaf_kinds, leaf_texts, para, state_with_caret};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_typing_inserts_and_bumps_version() {
        let mut session = Session::new(state_with_caret(vec![para("")], 0, 0));
        assert_eq!(session.version(), 0);

        assert!(session.handle_key(KeyInput::Char('h')).unwrap());
        assert!(session.handle_key(KeyInput::Char('i')).unwrap());
        assert_eq!(session.version(), 2);
        assert_eq!(leaf_texts(session.state().document()), vec!["hi"]);
        assert!(session.is_modified());
    }

    #[test]
    fn test_space_fires_shortcut_without_inserting_the_space() {
        let mut session = Session::new(state_with_caret(vec![para("*")], 0, 1));
        assert!(session.handle_key(KeyInput::Space).unwrap());
        assert_eq!(leaf_kinds(session.state().document()), vec![BlockKind::ListItem]);
        assert_eq!(leaf_texts(session.state().document()), vec![""]);
    }

    #[test]
    fn test_space_elsewhere_inserts_a_space() {
        let mut session = Session::new(state_with_caret(vec![para("ab")], 0, 1));
        assert!(session.handle_key(KeyInput::Space).unwrap());
        assert_eq!(leaf_texts(session.state().document()), vec!["a b"]);
    }

    #[test]
    fn test_enter_on_paragraph_splits_by_default() {
        let mut session = Session::new(state_with_caret(vec![para("ab")], 0, 1));
        assert!(session.handle_key(KeyInput::Enter).unwrap());
        assert_eq!(leaf_texts(session.state().document()), vec!["a", "b"]);
    }

    #[test]
    fn test_enter_at_list_item_end_continues_the_list() {
        let mut session = Session::new(state_with_caret(vec![bulleted_list(&["milk"])], 0, 4));
        assert!(session.handle_key(KeyInput::Enter).unwrap());
        assert_eq!(
            leaf_kinds(session.state().document()),
            vec![BlockKind::ListItem, BlockKind::ListItem]
        );
    }

    #[test]
    fn test_no_op_input_commits_nothing() {
        let mut session = Session::new(state_with_caret(vec![para("x")], 0, 0));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        session.subscribe(move |change| sink.borrow_mut().push(*change));

        // backspace at the document start declines everywhere
        assert!(!session.handle_key(KeyInput::Backspace).unwrap());
        assert_eq!(session.version(), 0);
        assert!(seen.borrow().is_empty());
        assert!(!session.is_modified());
    }

    #[test]
    fn test_observers_see_every_commit_in_order() {
        let mut session = Session::new(state_with_caret(vec![heading(1, "T")], 0, 1));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        session.subscribe(move |change| sink.borrow_mut().push(*change));

        session.handle_key(KeyInput::Char('!')).unwrap();
        session.handle_key(KeyInput::Enter).unwrap();

        let changes = seen.borrow();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].kind, ChangeKind::Edit);
        assert_eq!(changes[0].old_version, 0);
        assert_eq!(changes[0].new_version, 1);
        assert_eq!(changes[1].kind, ChangeKind::Shortcut);
        assert_eq!(changes[1].new_version, 2);
    }

    #[test]
    fn test_cursor_moves_do_not_mark_modified() {
        let mut session = Session::new(state_with_caret(vec![para("ab"), para("cd")], 0, 2));
        assert!(session.move_right().unwrap());
        assert_eq!(
            session.state().start_block().map(|b| b.text()),
            Some("cd".to_string())
        );
        assert!(session.move_left().unwrap());
        assert_eq!(
            session.state().start_block().map(|b| b.text()),
            Some("ab".to_string())
        );
        assert!(!session.is_modified());
        assert_eq!(session.version(), 2);
    }

    #[test]
    fn test_move_left_at_document_start_is_a_no_op() {
        let mut session = Session::new(state_with_caret(vec![para("ab")], 0, 0));
        assert!(!session.move_left().unwrap());
        assert_eq!(session.version(), 0);
    }

    #[test]
    fn test_move_left_collapses_an_expanded_selection_to_its_start() {
        let document = doc(vec![para("abc")]);
        let text = document.texts()[0].key;
        let expanded = Selection::new(Point::new(text, 1), Point::new(text, 3));
        let mut session = Session::new(State::new(document, expanded).unwrap());

        assert!(session.move_left().unwrap());
        assert_eq!(
            session.state().selection(),
            Selection::collapsed(Point::new(text, 1))
        );
        assert!(!session.is_modified());
    }

    #[test]
    fn test_move_right_collapses_an_expanded_selection_to_its_end() {
        let document = doc(vec![para("abc")]);
        let text = document.texts()[0].key;
        // a backward selection still collapses onto its document-order end
        let expanded = Selection::new(Point::new(text, 3), Point::new(text, 1));
        let mut session = Session::new(State::new(document, expanded).unwrap());

        assert!(session.move_right().unwrap());
        assert_eq!(
            session.state().selection(),
            Selection::collapsed(Point::new(text, 3))
        );
    }

    #[test]
    fn test_replace_document_resets_modified() {
        let mut session = Session::new(state_with_caret(vec![para("")], 0, 0));
        session.handle_key(KeyInput::Char('x')).unwrap();
        assert!(session.is_modified());

        session.replace_document(Document::new()).unwrap();
        assert!(!session.is_modified());
        assert_eq!(session.version(), 2);
    }

    #[test]
    fn test_full_shortcut_flow_through_the_session() {
        let mut session = Session::new(state_with_caret(vec![para("")], 0, 0));
        for key in [
            KeyInput::Char('#'),
            KeyInput::Char('#'),
            KeyInput::Space,
            KeyInput::Char('H'),
            KeyInput::Char('i'),
        ] {
            session.handle_key(key).unwrap();
        }
        assert_eq!(
            leaf_kinds(session.state().document()),
            vec![BlockKind::Heading { level: 2 }]
        );
        assert_eq!(leaf_texts(session.state().document()), vec!["Hi"]);
    }
}
