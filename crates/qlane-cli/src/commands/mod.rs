//! CLI command implementations.

pub mod common;
pub mod compile;
pub mod resolve;
pub mod version;
