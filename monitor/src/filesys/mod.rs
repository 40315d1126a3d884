//! Filesystem helpers

pub mod file;
pub mod lock;
