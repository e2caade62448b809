// ── Identifiers ──
//
// MacAddress is what operators type; DeviceId is what the provisioning
// server hands back from a search. The server accepts a MAC wherever a
// device identifier is expected, so every MacAddress converts into one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── MacAddress ──────────────────────────────────────────────────────

/// MAC address as an operator supplied it.
///
/// [`MacAddress::new`] normalizes lookup keys to lowercase with colons.
/// [`MacAddress::verbatim`] keeps a MAC exactly as written, for records
/// the server stores. Either way the `1,6,` hardware-type prefix the
/// server uses in identifiers is kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MacAddress(String);

impl MacAddress {
    /// Trim, lowercase, and turn dashes into colons.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw.as_ref().trim().to_lowercase().replace('-', ":");
        Self(normalized)
    }

    /// Only surrounding whitespace is dropped.
    pub fn verbatim(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

// ── DeviceId ────────────────────────────────────────────────────────

/// Opaque device identifier as returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DeviceId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&MacAddress> for DeviceId {
    fn from(mac: &MacAddress) -> Self {
        Self(mac.as_str().to_owned())
    }
}
