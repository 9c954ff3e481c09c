//! # mica-runtime
//!
//! The agent's processing core: the [`TurnEngine`] model/tool loop, the
//! [`Compactor`] keeping long histories inside the context window, the
//! [`ContextBuilder`] assembling prompts from workspace files and memory,
//! and the [`Agent`] tying them together per inbound message.

#![deny(unsafe_code)]

pub mod agent;
pub mod compaction;
pub mod context;
pub mod engine;
pub mod errors;
pub mod sessions;

pub use agent::{Agent, InboundMessage, OutboundMessage};
pub use compaction::{CompactionPolicy, Compactor};
pub use context::ContextBuilder;
pub use engine::{TurnEngine, TurnEngineConfig};
pub use errors::RuntimeError;
pub use sessions::{CompactionState, Session, SessionManager};
