//! Inquest Core - Core data structures and trait definitions
//!
//! Defines the shared abstractions for the Inquest research orchestrator:
//! error taxonomy, configuration, collaborator traits, and common types.

pub mod async_utils;
pub mod config;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use async_utils::*;
pub use error::*;
pub use logging::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tokio;
pub use tracing;
