//! roster CLI library
//!
//! Exposes the command implementations for integration testing. The binary
//! entry point is in main.rs.

pub mod commands;
pub mod error;
pub mod logging;
