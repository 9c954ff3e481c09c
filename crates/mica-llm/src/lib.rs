//! # mica-llm
//!
//! The consumed model-provider interface. Concrete HTTP clients live in the
//! embedding application; the runtime only depends on [`ChatProvider`].

#![deny(unsafe_code)]

pub mod errors;
pub mod provider;

pub use errors::ProviderError;
pub use provider::{ChatOptions, ChatProvider, ChatResponse};
