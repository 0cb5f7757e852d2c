//! Core types, configuration, and error handling shared by the pcremote crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ClientConfig, Settings};
pub use error::AppError;
pub use types::{Decision, PendingAction};
