//! Bootstrap layer, run before the web channel starts.
//!
//! - **logger**: tracing-subscriber initialisation.

pub mod logger;
