//! FICS session (workspace facade crate).
//!
//! Re-exports `fics_session::{adapter,core,types}` while the implementation
//! lives in dedicated crates under `crates/`.

pub use fics_session_adapter as adapter;
pub use fics_session_core as core;
pub use fics_session_types as types;
