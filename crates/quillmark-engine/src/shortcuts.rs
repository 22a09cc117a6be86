//! Markdown shortcut editing policy.
//!
//! Watches the three keys that can change a block's shape and answers with a
//! fully applied [`State`] when a shortcut fires:
//!
//! - space after a marker run (`*`, `-`, `+`, `>`, `#` through `######`)
//!   converts the block and deletes the run,
//! - backspace at the start of a converted block reverts it to a paragraph,
//! - enter at the end of a heading or quote starts a fresh paragraph instead
//!   of continuing the block.
//!
//! Every handler returns `Ok(None)` to decline, which tells the caller to
//! run its default behavior for the key. The policy never touches expanded
//! selections.

use crate::editing::{BlockKind, EditError, State};
use regex::Regex;
use std::sync::OnceLock;

static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

fn whitespace_re() -> &'static Regex {
    WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid whitespace regex"))
}

/// Keyboard input the editing layer routes through the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Space,
    Backspace,
    Enter,
    Char(char),
}

/// Block kind a marker run converts to, or `None` when the run is not a
/// shortcut. Anything past six hashes is not a heading.
pub fn block_kind_for_shortcut(chars: &str) -> Option<BlockKind> {
    match chars {
        "*" | "-" | "+" => Some(BlockKind::ListItem),
        ">" => Some(BlockKind::BlockQuote),
        "#" => Some(BlockKind::Heading { level: 1 }),
        "##" => Some(BlockKind::Heading { level: 2 }),
        "###" => Some(BlockKind::Heading { level: 3 }),
        "####" => Some(BlockKind::Heading { level: 4 }),
        "#####" => Some(BlockKind::Heading { level: 5 }),
        "######" => Some(BlockKind::Heading { level: 6 }),
        _ => None,
    }
}

/// Run the policy for `input`. `Ok(None)` means it declined and the caller
/// should fall back to its default behavior for the key.
pub fn handle(state: &State, input: KeyInput) -> Result<Option<State>, EditError> {
    match input {
        KeyInput::Space => on_space(state),
        KeyInput::Backspace => on_backspace(state),
        KeyInput::Enter => on_enter(state),
        KeyInput::Char(_) => Ok(None),
    }
}

/// Space pressed: if everything before the caret is a marker run, convert
/// the block, wrap list items in a bulleted list, and delete the run. The
/// caret ends collapsed at the block start, so the space itself must not be
/// inserted by the caller.
pub fn on_space(state: &State) -> Result<Option<State>, EditError> {
    if state.selection().is_expanded() {
        return Ok(None);
    }
    let Some(block) = state.start_block() else {
        return Ok(None);
    };
    let Some(offset) = state.start_offset_in_block() else {
        return Ok(None);
    };

    let prefix: String = block.text().chars().take(offset).collect();
    let chars = whitespace_re().replace_all(&prefix, "");
    let Some(kind) = block_kind_for_shortcut(&chars) else {
        return Ok(None);
    };
    // "* " inside a list item would start a nested list; leave it as text
    if kind == BlockKind::ListItem && block.kind == BlockKind::ListItem {
        return Ok(None);
    }

    let block_key = block.key;
    let mut transform = state.transform().set_block(kind.clone());
    if kind == BlockKind::ListItem {
        transform = transform.wrap_block(BlockKind::BulletedList);
    }
    let next = transform.extend_to_start_of(block_key).delete().apply()?;
    Ok(Some(next))
}

/// Backspace pressed at the very start of a non-paragraph block: revert it
/// to a paragraph, unwrapping the bulleted list around a list item.
pub fn on_backspace(state: &State) -> Result<Option<State>, EditError> {
    if state.selection().is_expanded() {
        return Ok(None);
    }
    if state.start_offset_in_block() != Some(0) {
        return Ok(None);
    }
    let Some(block) = state.start_block() else {
        return Ok(None);
    };
    if block.kind == BlockKind::Paragraph {
        return Ok(None);
    }

    let was_list_item = block.kind == BlockKind::ListItem;
    let mut transform = state.transform().set_block(BlockKind::Paragraph);
    if was_list_item {
        transform = transform.unwrap_block(BlockKind::BulletedList);
    }
    Ok(Some(transform.apply()?))
}

/// Enter pressed at the end of a heading or quote: split and retype the
/// fresh block to a paragraph rather than continuing the kind. Enter in an
/// empty converted block reverts it like backspace does.
pub fn on_enter(state: &State) -> Result<Option<State>, EditError> {
    if state.selection().is_expanded() {
        return Ok(None);
    }
    let Some(block) = state.start_block() else {
        return Ok(None);
    };
    let len = block.len_chars();

    if state.start_offset_in_block() == Some(0) && len == 0 {
        return on_backspace(state);
    }
    if state.end_offset_in_block() != Some(len) {
        return Ok(None);
    }
    if !(block.kind.is_heading() || block.kind == BlockKind::BlockQuote) {
        return Ok(None);
    }

    let next = state
        .transform()
        .split_block()
        .set_block(BlockKind::Paragraph)
        .apply()?;
    Ok(Some(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{Point, Selection};
    use crate::tests::{
        bulleted_list, heading, leaf_kinds, leaf_texts, para, quote, state_with_caret,
        top_level_kinds,
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("*", Some(BlockKind::ListItem))]
    #[case("-", Some(BlockKind::ListItem))]
    #[case("+", Some(BlockKind::ListItem))]
    #[case(">", Some(BlockKind::BlockQuote))]
    #[case("#", Some(BlockKind::Heading { level: 1 }))]
    #[case("##", Some(BlockKind::Heading { level: 2 }))]
    #[case("###", Some(BlockKind::Heading { level: 3 }))]
    #[case("####", Some(BlockKind::Heading { level: 4 }))]
    #[case("#####", Some(BlockKind::Heading { level: 5 }))]
    #[case("######", Some(BlockKind::Heading { level: 6 }))]
    #[case("#######", None)]
    #[case("**", None)]
    #[case("", None)]
    #[case("hello", None)]
    fn test_shortcut_classification(#[case] chars: &str, #[case] expected: Option<BlockKind>) {
        assert_eq!(block_kind_for_shortcut(chars), expected);
    }

    // ========================================================================
    // on_space
    // ========================================================================

    #[test]
    fn test_space_after_star_builds_a_bulleted_list() {
        let state = state_with_caret(vec![para("* ")], 0, 2);
        // the caret sits after "* "; block text before it classifies as a list
        let next = on_space(&state).unwrap().unwrap();

        assert_eq!(top_level_kinds(next.document()), vec![BlockKind::BulletedList]);
        assert_eq!(leaf_kinds(next.document()), vec![BlockKind::ListItem]);
        assert_eq!(leaf_texts(next.document()), vec![""]);
        assert!(next.selection().is_collapsed());
        assert_eq!(next.start_offset_in_block(), Some(0));
    }

    #[test]
    fn test_space_after_hashes_converts_to_heading() {
        let state = state_with_caret(vec![para("##Header")], 0, 2);
        let next = on_space(&state).unwrap().unwrap();

        assert_eq!(leaf_kinds(next.document()), vec![BlockKind::Heading { level: 2 }]);
        assert_eq!(leaf_texts(next.document()), vec!["Header"]);
        assert_eq!(next.start_offset_in_block(), Some(0));
    }

    #[test]
    fn test_space_strips_whitespace_inside_the_marker_run() {
        let state = state_with_caret(vec![para(" > ")], 0, 3);
        let next = on_space(&state).unwrap().unwrap();
        assert_eq!(leaf_kinds(next.document()), vec![BlockKind::BlockQuote]);
    }

    #[test]
    fn test_space_declines_when_prefix_is_not_a_shortcut() {
        let state = state_with_caret(vec![para("hello")], 0, 5);
        assert_eq!(on_space(&state).unwrap(), None);
    }

    #[test]
    fn test_space_declines_seven_hashes() {
        let state = state_with_caret(vec![para("#######")], 0, 7);
        assert_eq!(on_space(&state).unwrap(), None);
    }

    #[test]
    fn test_space_declines_inside_an_existing_list_item() {
        let state = state_with_caret(vec![bulleted_list(&["* rest"])], 0, 1);
        assert_eq!(on_space(&state).unwrap(), None);
    }

    #[test]
    fn test_space_declines_expanded_selection() {
        let document = crate::tests::doc(vec![para("* hi")]);
        let text = document.texts()[0].key;
        let state = State::new(
            document,
            Selection::new(Point::new(text, 0), Point::new(text, 1)),
        )
        .unwrap();
        assert_eq!(on_space(&state).unwrap(), None);
    }

    #[test]
    fn test_space_only_consumes_text_before_the_caret() {
        // caret after "*" but before the rest; trailing text must survive
        let state = state_with_caret(vec![para("*milk")], 0, 1);
        let next = on_space(&state).unwrap().unwrap();
        assert_eq!(leaf_kinds(next.document()), vec![BlockKind::ListItem]);
        assert_eq!(leaf_texts(next.document()), vec!["milk"]);
    }

    // ========================================================================
    // on_backspace
    // ========================================================================

    #[test]
    fn test_backspace_reverts_heading_to_paragraph() {
        let state = state_with_caret(vec![heading(2, "Header")], 0, 0);
        let next = on_backspace(&state).unwrap().unwrap();
        assert_eq!(leaf_kinds(next.document()), vec![BlockKind::Paragraph]);
        assert_eq!(leaf_texts(next.document()), vec!["Header"]);
    }

    #[test]
    fn test_backspace_unwraps_list_item() {
        let state = state_with_caret(vec![bulleted_list(&["only"])], 0, 0);
        let next = on_backspace(&state).unwrap().unwrap();
        assert_eq!(top_level_kinds(next.document()), vec![BlockKind::Paragraph]);
        assert_eq!(leaf_texts(next.document()), vec!["only"]);
    }

    #[test]
    fn test_backspace_reverts_empty_quote() {
        let state = state_with_caret(vec![quote("")], 0, 0);
        let next = on_backspace(&state).unwrap().unwrap();
        assert_eq!(leaf_kinds(next.document()), vec![BlockKind::Paragraph]);
        assert_eq!(leaf_texts(next.document()), vec![""]);
    }

    #[test]
    fn test_backspace_declines_paragraph() {
        let state = state_with_caret(vec![para("text")], 0, 0);
        assert_eq!(on_backspace(&state).unwrap(), None);
    }

    #[test]
    fn test_backspace_declines_mid_block() {
        let state = state_with_caret(vec![quote("text")], 0, 2);
        assert_eq!(on_backspace(&state).unwrap(), None);
    }

    // ========================================================================
    // on_enter
    // ========================================================================

    #[test]
    fn test_enter_at_heading_end_starts_a_paragraph() {
        let state = state_with_caret(vec![heading(1, "Title")], 0, 5);
        let next = on_enter(&state).unwrap().unwrap();

        assert_eq!(
            leaf_kinds(next.document()),
            vec![BlockKind::Heading { level: 1 }, BlockKind::Paragraph]
        );
        assert_eq!(leaf_texts(next.document()), vec!["Title", ""]);
        assert_eq!(next.start_offset_in_block(), Some(0));
        assert_eq!(next.start_block().unwrap().kind, BlockKind::Paragraph);
    }

    #[test]
    fn test_enter_at_quote_end_starts_a_paragraph() {
        let state = state_with_caret(vec![quote("said so")], 0, 7);
        let next = on_enter(&state).unwrap().unwrap();
        assert_eq!(
            leaf_kinds(next.document()),
            vec![BlockKind::BlockQuote, BlockKind::Paragraph]
        );
    }

    #[test]
    fn test_enter_mid_heading_declines() {
        let state = state_with_caret(vec![heading(1, "Title")], 0, 2);
        assert_eq!(on_enter(&state).unwrap(), None);
    }

    #[test]
    fn test_enter_at_paragraph_end_declines() {
        let state = state_with_caret(vec![para("body")], 0, 4);
        assert_eq!(on_enter(&state).unwrap(), None);
    }

    #[test]
    fn test_enter_in_empty_quote_reverts_like_backspace() {
        let state = state_with_caret(vec![quote("")], 0, 0);
        let next = on_enter(&state).unwrap().unwrap();
        assert_eq!(leaf_kinds(next.document()), vec![BlockKind::Paragraph]);
        assert_eq!(leaf_texts(next.document()), vec![""]);
    }

    #[test]
    fn test_enter_in_empty_list_item_leaves_the_list() {
        let state = state_with_caret(vec![bulleted_list(&[""])], 0, 0);
        let next = on_enter(&state).unwrap().unwrap();
        assert_eq!(top_level_kinds(next.document()), vec![BlockKind::Paragraph]);
    }

    // ========================================================================
    // dispatch
    // ========================================================================

    #[test]
    fn test_handle_routes_keys_to_their_handlers() {
        let state = state_with_caret(vec![para("* ")], 0, 2);
        assert!(handle(&state, KeyInput::Space).unwrap().is_some());
        assert_eq!(handle(&state, KeyInput::Char('x')).unwrap(), None);

        let heading_start = state_with_caret(vec![heading(1, "T")], 0, 0);
        assert!(handle(&heading_start, KeyInput::Backspace).unwrap().is_some());

        let heading_end = state_with_caret(vec![heading(1, "T")], 0, 1);
        assert!(handle(&heading_end, KeyInput::Enter).unwrap().is_some());
    }

    #[test]
    fn test_space_conversion_preserves_block_identity() {
        let state = state_with_caret(vec![para("> quoted")], 0, 1);
        let before = state.document().nodes()[0].key();
        let next = on_space(&state).unwrap().unwrap();
        assert_eq!(next.document().nodes()[0].key(), before);
    }
}
