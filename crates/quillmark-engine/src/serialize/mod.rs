//! Interchange formats for documents.
//!
//! Three surfaces live here:
//!
//! - [`raw`]: the canonical JSON tree format. Lossless for everything the
//!   engine models, including node keys and unknown block types.
//! - [`markdown`]: import from CommonMark via `pulldown-cmark` and a
//!   hand-rolled exporter for the block types the engine edits.
//! - [`html`]: one-way HTML export for previews.
//!
//! The raw format is the one persistence uses; markdown and HTML are
//! interchange with the outside world and make no round-trip promise.

pub mod html;
pub mod markdown;
pub mod raw;

pub use html::to_html;
pub use markdown::{from_markdown, to_markdown};
pub use raw::{RawError, RawNode, from_json_bytes, from_json_str, to_json_string};
