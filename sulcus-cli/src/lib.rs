//! Library surface of the sulcus CLI: command plumbing and logging setup.

pub mod cli;
pub mod logging;
