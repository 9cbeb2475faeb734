//! Server profiles
//!
//! A profile decides which tool set is registered and which suffix is appended
//! to resource names, resource URI schemes and the prompt name. The two stock
//! profiles reproduce the `hello`/`echo`/`calculator` server and its
//! `hello2`/`ping`/`even-or-odd` sibling from one registry definition.

use crate::domain::{prompts, resources, tools};
use crate::registry::{Registry, RegistryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSet {
    /// `echo` and `calculator`
    Calculator,
    /// `ping` and `even-or-odd`
    Parity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name_suffix: String,
    pub tool_set: ToolSet,
}

impl Default for Profile {
    fn default() -> Self {
        Self::primary()
    }
}

impl Profile {
    pub fn new(name_suffix: impl Into<String>, tool_set: ToolSet) -> Self {
        Self {
            name_suffix: name_suffix.into(),
            tool_set,
        }
    }

    pub fn primary() -> Self {
        Self::new("", ToolSet::Calculator)
    }

    pub fn secondary() -> Self {
        Self::new("2", ToolSet::Parity)
    }

    pub fn named(&self, base: &str) -> String {
        format!("{base}{}", self.name_suffix)
    }
}

pub fn build_registry(profile: &Profile) -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();

    for operation in resources::operations(profile)? {
        registry.register(operation)?;
    }
    registry.register(prompts::helpful_assistant(profile))?;
    for operation in tools::operations(profile.tool_set) {
        registry.register(operation)?;
    }

    tracing::info!(
        suffix = %profile.name_suffix,
        tool_set = ?profile.tool_set,
        operations = registry.len(),
        "registry built"
    );
    Ok(registry)
}
