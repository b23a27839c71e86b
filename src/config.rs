//! Top-level convenience re-export. The configuration store itself is a
//! working-copy concern (it lives in the same `wc.db` file, scoped by
//! `wcid`) and is implemented in [`crate::wc::config`]; this module exists
//! so callers outside `wc` can reach it as `crate::config::Config` without
//! reaching into the `wc` module tree.

pub use crate::wc::config::Config;
