//! # thoughtline core
//!
//! Domain types, traits, and error definitions for the thoughtline agent
//! runtime. Everything the orchestration loop talks to is defined here as a
//! trait; implementations live in their own crates.
//!
//! ## Design Philosophy
//!
//! - The model client is a [`Provider`], swappable via configuration.
//! - Every capability is a [`Tool`] registered by action type in a
//!   [`ToolRegistry`] that the caller builds and hands to the agent.
//! - A run produces a transcript of [`Step`]s and always ends in a
//!   [`RunResult`].

pub mod error;
pub mod event;
pub mod provider;
pub mod step;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, RegistryError, Result, ToolError};
pub use event::{DomainEvent, EventBus};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use step::{Action, Observation, RunOutcome, RunResult, Step};
pub use tool::{Tool, ToolDescriptor, ToolRegistry};
