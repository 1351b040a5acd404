//! Request handling module
//!
//! The per-request dispatch algorithm and the static file resolver it
//! falls back to.

pub mod dispatch;
pub mod static_files;
