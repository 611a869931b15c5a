//! Mentor chat library root. The binary entry point is `src/main.rs`;
//! integration tests drive [`comms::build_router`] directly.

pub mod core;
pub mod bootstrap;
pub mod llm;
pub mod prompt;
pub mod session;
pub mod render;
pub mod comms;

pub use crate::core::{config, error};
pub use crate::bootstrap::logger;
