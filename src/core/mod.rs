//! Core infrastructure shared by every other module.
//!
//! - **config**: TOML loading, env overrides, resolved config types.
//! - **error**: the top-level [`AppError`](error::AppError).

pub mod config;
pub mod error;
