//! Scaffolding capabilities a plugin may implement.
//!
//! The orchestrator asks a plugin which capabilities it has instead of
//! relying on a type hierarchy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One scaffolding subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Init,
    CreateApi,
    CreateWebhook,
    Edit,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Init,
        Capability::CreateApi,
        Capability::CreateWebhook,
        Capability::Edit,
    ];

    const fn bit(self) -> u8 {
        match self {
            Self::Init => 1,
            Self::CreateApi => 1 << 1,
            Self::CreateWebhook => 1 << 2,
            Self::Edit => 1 << 3,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::CreateApi => "create api",
            Self::CreateWebhook => "create webhook",
            Self::Edit => "edit",
        };
        f.write_str(name)
    }
}

/// Set of capabilities, stored as a bitset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0b1111)
    }

    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    pub const fn contains(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|c| c.to_string()).collect();
        f.write_str(&names.join(", "))
    }
}
