//! Working-copy engine: a transactional metadata store (WCDB), a
//! content-addressed pristine store, and a fuzzy patch-application engine,
//! tying together a remote repository, the on-disk tree, and pending local
//! modifications.

pub mod checksum;
pub mod cli;
pub mod config;
pub mod error;
pub mod notify;
pub mod path;
pub mod patch;
pub mod pristine;
pub mod stream;
pub mod translate;
pub mod wc;
pub mod workqueue;

pub use error::{ErrorKind, WcError};
