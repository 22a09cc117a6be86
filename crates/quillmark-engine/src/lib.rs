pub mod editing;
pub mod io;
pub mod render;
pub mod serialize;
pub mod session;
pub mod shortcuts;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{document::*, node::*, selection::*, state::*, transform::*};
pub use io::*;
pub use render::*;
pub use serialize::{html::*, markdown::*, raw::*};
pub use session::*;
pub use shortcuts::{KeyInput, block_kind_for_shortcut, handle};
