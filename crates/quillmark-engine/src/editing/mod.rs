/*!
 * # Editing Core
 *
 * The document transform engine: an immutable tree model with composable,
 * selection-aware operations on top of it.
 *
 * ## Architecture Overview
 *
 * ### 1. Immutable Values Everywhere
 * - [`Document`], [`Selection`] and [`State`] are values; every edit returns
 *   a new one and never touches its input
 * - Node children sit behind `Arc`, so an edit rebuilds only the spine from
 *   the changed node up and shares every untouched subtree
 * - Old states stay valid, which is what makes transform application atomic
 *
 * ### 2. Stable Node Keys
 * - Every node carries a [`NodeKey`] minted at construction
 * - Keys survive retyping, wrapping, unwrapping, merging and the leading
 *   half of a split, so UI layers can track blocks across edits
 * - All addressing is by key; nothing in the public API hands out positional
 *   indices
 *
 * ### 3. Operation-Based Editing
 * - All edits are recorded as [`Op`]s queued on a [`Transform`]
 * - [`Transform::apply`] folds the queue left to right into a new [`State`]
 * - Benignly inapplicable operations pass the state through unchanged;
 *   structural errors abort the whole fold with an [`EditError`]
 *
 * ### 4. Selection As Part Of The State
 * - A [`Selection`] is an anchor and a focus [`Point`], each a text leaf key
 *   plus a character offset
 * - Operations keep the selection meaningful across edits: a split moves the
 *   caret into the trailing block, a delete collapses onto the start point
 *
 * ## Usage Pattern
 *
 * ```rust
 * use quillmark_engine::editing::{BlockKind, Document, State};
 *
 * let document = Document::new();
 * let state = State::at_start(document).unwrap();
 *
 * let state = state
 *     .transform()
 *     .insert_text("milk")
 *     .set_block(BlockKind::ListItem)
 *     .wrap_block(BlockKind::BulletedList)
 *     .apply()
 *     .unwrap();
 *
 * assert_eq!(state.start_block().unwrap().text(), "milk");
 * ```
 */

pub mod document;
pub mod node;
pub mod selection;
pub mod state;
pub mod transform;

pub use document::{Document, EditError};
pub use node::{Block, BlockKind, Inline, InlineKind, Mark, MarkSet, Node, NodeKey, Text};
pub use selection::{Point, Selection};
pub use state::State;
pub use transform::{Op, Transform};
