//! Reply composition: chunking agent output and chaining the chunks into a
//! thread of new post records.

pub mod chunk;
pub mod compose;
pub mod links;

pub use chunk::split_into_chunks;
pub use compose::{ComposedThread, ReplyChain, ReplyComposer};
pub use links::first_url;
