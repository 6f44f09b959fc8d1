// ── Device identity ──
//
// A BLE accessory is keyed by its link-layer address for its whole paired
// lifetime. Platforms disagree on case and separators, so the address is
// normalized once on the way in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stable identifier of a physical accessory, normalized to uppercase
/// colon-separated form (`AA:BB:CC:DD:EE:FF`).
///
/// Opaque beyond normalization: platform-specific identifiers (e.g. the
/// UUIDs some stacks hand out instead of MAC addresses) pass through
/// unchanged apart from case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Create a normalized address from any common format.
    /// Accepts colon-separated, dash-separated, or lowercase hex.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw.as_ref().trim().to_uppercase().replace('-', ":");
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<String> for DeviceAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for DeviceAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<DeviceAddress> for String {
    fn from(addr: DeviceAddress) -> Self {
        addr.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_dashes_and_case() {
        let addr = DeviceAddress::new("aa-bb-cc-dd-ee-ff");
        assert_eq!(addr.as_str(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn equal_after_normalization() {
        assert_eq!(
            DeviceAddress::from("aa:bb:cc:dd:ee:ff"),
            DeviceAddress::from(" AA-BB-CC-DD-EE-FF ")
        );
    }

    #[test]
    fn serde_goes_through_normalization() {
        let addr: DeviceAddress = serde_json::from_str("\"c4:be:84:00:11:22\"").unwrap();
        assert_eq!(addr.to_string(), "C4:BE:84:00:11:22");
        assert_eq!(
            serde_json::to_string(&addr).unwrap(),
            "\"C4:BE:84:00:11:22\""
        );
    }
}
