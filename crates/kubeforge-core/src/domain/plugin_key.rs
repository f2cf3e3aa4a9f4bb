//! Plugin identity (`{name}/{version}`) and project configuration versions.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::error::DomainError;

/// Maturity of a plugin version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Alpha,
    Beta,
    Stable,
}

/// Plugin version: `v<N>` with an optional `-alpha` / `-beta` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginVersion {
    number: u32,
    stage: Stage,
}

impl PluginVersion {
    pub const fn new(number: u32, stage: Stage) -> Self {
        Self { number, stage }
    }

    pub const fn stable(number: u32) -> Self {
        Self::new(number, Stage::Stable)
    }

    pub const fn alpha(number: u32) -> Self {
        Self::new(number, Stage::Alpha)
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            Stage::Stable => write!(f, "v{}", self.number),
            Stage::Alpha => write!(f, "v{}-alpha", self.number),
            Stage::Beta => write!(f, "v{}-beta", self.number),
        }
    }
}

impl FromStr for PluginVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('v')
            .ok_or_else(|| format!("version '{s}' must start with 'v'"))?;

        let (number, stage) = match rest.split_once('-') {
            None => (rest, Stage::Stable),
            Some((number, "alpha")) => (number, Stage::Alpha),
            Some((number, "beta")) => (number, Stage::Beta),
            Some((_, other)) => return Err(format!("unknown stage '{other}'")),
        };

        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("version '{s}' must be v<N>[-alpha|-beta]"));
        }
        let number: u32 = number
            .parse()
            .map_err(|_| format!("version number '{number}' is out of range"))?;
        if number == 0 {
            return Err("version number must be positive".into());
        }

        Ok(Self { number, stage })
    }
}

/// Identity of a plugin or bundle: `{name}/{version}`.
///
/// Names are dotted, DNS-like strings (`go.kubeforge.io`). A short key such
/// as `go/v4` selects every plugin whose name is `go` or starts with `go.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginKey {
    name: String,
    version: PluginVersion,
}

impl PluginKey {
    pub fn new(name: impl Into<String>, version: PluginVersion) -> Result<Self, DomainError> {
        let name = name.into();
        validate_name(&name).map_err(|reason| DomainError::InvalidPluginKey {
            key: format!("{name}/{version}"),
            reason,
        })?;
        Ok(Self { name, version })
    }

    /// Parse a fully qualified `{name}/{version}` key.
    pub fn parse(key: &str) -> Result<Self, DomainError> {
        let invalid = |reason: String| DomainError::InvalidPluginKey {
            key: key.to_string(),
            reason,
        };

        let (name, version) = key
            .split_once('/')
            .ok_or_else(|| invalid("expected <name>/<version>".into()))?;
        if version.contains('/') {
            return Err(invalid("expected exactly one '/'".into()));
        }
        let version = version.parse().map_err(invalid)?;
        validate_name(name).map_err(invalid)?;

        Ok(Self {
            name: name.to_string(),
            version,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> PluginVersion {
        self.version
    }

    /// Whether a user supplied (possibly short) key selects this plugin.
    ///
    /// `go/v4`, `go.kubeforge.io/v4` and `go` (any version) all select
    /// `go.kubeforge.io/v4`.
    pub fn matches(&self, query: &str) -> bool {
        let (name, version) = match query.split_once('/') {
            Some((name, version)) => (name, Some(version)),
            None => (query, None),
        };

        let name_matches = self.name == name
            || self
                .name
                .strip_prefix(name)
                .is_some_and(|rest| rest.starts_with('.'));

        let version_matches = match version {
            Some(v) => v.parse::<PluginVersion>().is_ok_and(|v| v == self.version),
            None => true,
        };

        name_matches && version_matches
    }
}

impl fmt::Display for PluginKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

impl FromStr for PluginKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name must not be empty".into());
    }
    for label in name.split('.') {
        if label.is_empty() {
            return Err("name must not contain empty labels".into());
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(format!(
                "label '{label}' may only contain lowercase letters, digits and '-'"
            ));
        }
    }
    Ok(())
}

/// Version of the PROJECT file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectVersion(u32);

impl ProjectVersion {
    pub const V3: Self = Self(3);

    pub const fn new(version: u32) -> Self {
        Self(version)
    }
}

impl Default for ProjectVersion {
    fn default() -> Self {
        Self::V3
    }
}

impl fmt::Display for ProjectVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProjectVersion {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .ok()
            .filter(|v| *v > 0)
            .map(Self)
            .ok_or_else(|| DomainError::InvalidProjectVersion(s.to_string()))
    }
}

// PROJECT files store the version as a quoted string ("3").
impl Serialize for ProjectVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// Hand-edited files sometimes drop the quotes; accept both forms.
impl<'de> Deserialize<'de> for ProjectVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u32),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(raw) => raw.parse().map_err(serde::de::Error::custom),
            Raw::Number(n) => n.to_string().parse().map_err(serde::de::Error::custom),
        }
    }
}
