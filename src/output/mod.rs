//! Structured output validation and draft persistence

pub mod drafts;
pub mod validator;

pub use drafts::DraftStore;
pub use validator::{schema_instructions, validate_content};
