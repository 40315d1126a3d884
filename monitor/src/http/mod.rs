//! Submission API access

pub mod client;
pub mod deploy_status;
