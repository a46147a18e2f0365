//! Built-in tools and the tool registry
//!
//! Tools expose a name, a description, and a JSON-Schema parameter block to
//! the LLM, and an async `execute`. File tools are scoped to a root
//! directory fixed at construction; anything outside it is refused before a
//! single filesystem side effect happens.

pub mod fs;
pub mod registry;
pub mod scrape;
pub mod search;

pub use registry::{Tool, ToolRegistry};
