//! CLI command implementations.

pub mod algorithms;
pub mod chord;
pub mod common;
pub mod patches;
pub mod render;
