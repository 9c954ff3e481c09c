//! # mica-tools
//!
//! The [`Tool`] trait and [`ToolRegistry`]. Concrete tools (shell, files,
//! web, calendar) are registered by the embedding application; the runtime
//! only needs name → schema + executable resolution and the delivery flag.

#![deny(unsafe_code)]

pub mod registry;
pub mod traits;

pub use registry::ToolRegistry;
pub use traits::Tool;
