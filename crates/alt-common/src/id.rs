//! Device and batch identity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential device identifier, rendered as `D0001`.
///
/// Assigned in generation order across a whole run; never reset per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u32);

impl DeviceId {
    /// The first identifier handed out by a generation run.
    pub const FIRST: DeviceId = DeviceId(1);

    /// The identifier following this one.
    pub fn next(self) -> DeviceId {
        DeviceId(self.0 + 1)
    }

    /// Parse the `D0001` form (the prefix is optional).
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('D').unwrap_or(s);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u32>().ok().map(DeviceId)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{:04}", self.0)
    }
}

impl From<u32> for DeviceId {
    fn from(id: u32) -> Self {
        DeviceId(id)
    }
}

/// Manufacturing batch label (e.g. `B1`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub String);

impl BatchId {
    pub fn new(label: impl Into<String>) -> Self {
        BatchId(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BatchId {
    fn from(label: &str) -> Self {
        BatchId(label.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_display_is_zero_padded() {
        assert_eq!(DeviceId(1).to_string(), "D0001");
        assert_eq!(DeviceId(400).to_string(), "D0400");
        assert_eq!(DeviceId(12345).to_string(), "D12345");
    }

    #[test]
    fn device_id_parse() {
        assert_eq!(DeviceId::parse("D0042"), Some(DeviceId(42)));
        assert_eq!(DeviceId::parse("7"), Some(DeviceId(7)));
        assert_eq!(DeviceId::parse("D"), None);
        assert_eq!(DeviceId::parse("Dx1"), None);
    }

    #[test]
    fn device_id_sequence() {
        assert_eq!(DeviceId::FIRST.next(), DeviceId(2));
    }

    #[test]
    fn batch_id_serializes_transparently() {
        let json = serde_json::to_string(&BatchId::new("B3")).unwrap();
        assert_eq!(json, "\"B3\"");
    }
}
