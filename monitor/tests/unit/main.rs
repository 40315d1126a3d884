//! Integration tests for the deployment monitor

mod common;
mod test_fsm;
mod test_launch;
mod test_status_store;
