//! A concurrent, in-memory tree of folders.
//!
//! Folders are addressed by slash-separated paths rooted at `/`, e.g.
//! `/home/user/`. [`Tree`] exposes four operations — [`Tree::list`],
//! [`Tree::create`], [`Tree::remove`] and [`Tree::mv`] — any number of which
//! may run concurrently from multiple threads against the same `Tree`
//! (share it behind an `Arc`). Each folder mediates its own access through
//! a fair reader/writer protocol (see [`sync`]) and `move` additionally
//! locks the lowest common ancestor of its two paths to keep concurrent
//! moves from racing each other; see `DESIGN.md` for the deadlock argument.

mod error;
mod map;
mod node;
pub mod path;
mod sync;
mod tree;

pub use self::error::{TreeError, TreeResult};
pub use self::path::MAX_NAME;
pub use self::tree::Tree;
