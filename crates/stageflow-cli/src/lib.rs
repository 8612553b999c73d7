//! StageFlow CLI library.
//!
//! This module exposes internal types for testing purposes.
//! The main entry point is the `stageflow` binary.

pub mod cli;
pub mod config;
pub mod diagram;
pub mod input;
pub mod output;

// Re-export commonly used types
pub use cli::Args;
pub use config::DiagramOptions;
