//! Deployment monitor library
//!
//! Tracks one marketplace deployment's remote test runs to a verdict and mirrors
//! progress into a status file shared with a dashboard.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod launch;
pub mod logs;
pub mod models;
pub mod notify;
pub mod storage;
pub mod utils;
