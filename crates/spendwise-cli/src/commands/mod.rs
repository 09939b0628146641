//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `advisor` - Budget suggestions and prompt preview
//! - `ai` - AI backend checks
//! - `prompts` - Prompt library management commands
//! - `serve` - Web server command

pub mod advisor;
pub mod ai;
pub mod prompts;
pub mod serve;

// Re-export command functions for main.rs
pub use advisor::*;
pub use ai::*;
pub use prompts::*;
pub use serve::*;
