use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform criticality, 1 (lowest) to 10 (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Criticality(u8);

impl Criticality {
    pub const DEFAULT: Criticality = Criticality(5);

    /// Maps a declared tier to criticality: tier 0 is the most critical.
    /// Unknown or absent tiers get the default.
    pub fn from_tier(tier: Option<&str>) -> Self {
        match tier.map(str::trim) {
            Some("0") => Criticality(10),
            Some("1") => Criticality(9),
            Some("2") => Criticality(8),
            Some("3") => Criticality(7),
            Some("4") => Criticality(6),
            _ => Self::DEFAULT,
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Criticality {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for Criticality {
    fn from(value: u8) -> Self {
        Criticality(value.clamp(1, 10))
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tier() {
        let cases = [
            (Some("0"), 10),
            (Some("1"), 9),
            (Some("2"), 8),
            (Some("3"), 7),
            (Some("4"), 6),
            (Some("5"), 5),
            (Some(" 2 "), 8),
            (Some("gold"), 5),
            (None, 5),
        ];
        for (tier, expected) in cases {
            assert_eq!(Criticality::from_tier(tier).value(), expected, "tier {:?}", tier);
        }
    }

    #[test]
    fn test_from_u8_clamps() {
        assert_eq!(Criticality::from(0).value(), 1);
        assert_eq!(Criticality::from(42).value(), 10);
        assert_eq!(Criticality::from(7).value(), 7);
    }
}
