// Core infrastructure shared by the registry, loader, bus and collaborators

pub mod errors;
pub mod logging;

pub use errors::{Result, StsmError};
pub use logging::init_logging;
