//! Output formatting modules.

pub mod json;
pub mod mermaid;
pub mod table;

pub use json::format_json;
pub use mermaid::{format_markdown, format_mermaid};
pub use table::format_table;
