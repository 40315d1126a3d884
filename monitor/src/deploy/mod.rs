//! Deployment monitoring

pub mod fsm;
pub mod instructions;
pub mod interpret;
pub mod monitor;
