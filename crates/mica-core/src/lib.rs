//! # mica-core
//!
//! Shared data model and text utilities for the mica agent:
//!
//! - [`messages`]: conversation messages and tool-call descriptors
//! - [`tools`]: tool definitions exposed to the model
//! - [`text`]: UTF-8–safe truncation helpers
//! - [`tokens`]: character-based token estimation
//! - [`truncation`]: format-aware tool-result truncation

#![deny(unsafe_code)]

pub mod messages;
pub mod text;
pub mod tokens;
pub mod tools;
pub mod truncation;

pub use messages::{ContentPart, Message, MessageContent, Role, ToolCallRequest};
pub use tools::ToolDefinition;
