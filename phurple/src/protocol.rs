//! Protocol plugin descriptors and name lookup.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A protocol plugin as reported by the engine: id plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProtocolInfo {
    /// Engine identifier, e.g. `prpl-jabber`.
    pub id: String,
    /// Human-readable name, e.g. `XMPP`.
    pub name: String,
}

impl ProtocolInfo {
    /// Build a descriptor from its id and display name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ProtocolInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.name)
    }
}

impl FromStr for ProtocolInfo {
    type Err = Error;

    /// Parse `id:name`. The name may itself contain colons.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once(':') {
            Some((id, name)) if !id.trim().is_empty() && !name.trim().is_empty() => {
                Ok(Self::new(id.trim(), name.trim()))
            }
            _ => Err(Error::InvalidArgument(format!(
                "protocol entry must look like id:name, got {s:?}"
            ))),
        }
    }
}

/// Resolve a protocol name to its engine id.
///
/// Display names match case-insensitively and the first match wins. An exact
/// id (`prpl-irc`) is accepted as well.
#[must_use]
pub fn find_protocol_id<'a>(protocols: &'a [ProtocolInfo], name: &str) -> Option<&'a str> {
    protocols
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .or_else(|| protocols.iter().find(|p| p.id == name))
        .map(|p| p.id.as_str())
}

/// Parse a comma-separated `id:name` list, as stored in profile files.
///
/// Blank entries are skipped.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for an entry without an id or a name.
pub fn parse_protocol_list(list: &str) -> Result<Vec<ProtocolInfo>> {
    list.split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// Render protocols in the form accepted by [`parse_protocol_list`].
#[must_use]
pub fn format_protocol_list(protocols: &[ProtocolInfo]) -> String {
    protocols
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
