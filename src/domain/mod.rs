//! Starter catalog of resources, prompts and tools
//!
//! Provides the concrete handlers and the profile-driven construction of the registry.

pub mod profile;
pub mod prompts;
pub mod resources;
pub mod tools;
