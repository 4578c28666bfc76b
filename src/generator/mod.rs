//! Mod project generation from form-authored definitions.

pub mod definitions;
pub mod orchestrator;
pub mod templates;

pub use definitions::{CardDefinition, KeywordDefinition, ModDefinition};
pub use orchestrator::{ModOrchestrator, DEFAULT_OUTPUT_DIR};
