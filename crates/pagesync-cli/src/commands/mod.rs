//! Command handlers

pub mod config;
pub mod publish;
pub mod status;
pub mod sync;
pub mod watch;
