//! Persistent state shared with the dashboard

pub mod status_store;
