//! Root crate for the logdy workspace.
//!
//! This crate carries no runtime logic of its own; it exists so that
//! cross-crate integration tests under `tests/integration/` can depend on
//! every workspace member from one place, the way `rusty_timer`'s root
//! crate anchors that workspace's end-to-end suites.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
