/*
 * Fee tiers and quoter interface versions
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::models::QuoterError;

/// Standard pool fee tiers, in hundredths of a basis point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum FeeTier {
    /// 0.01%, the stablecoin convention.
    #[default]
    Lowest,
    /// 0.05%
    Low,
    /// 0.3%
    Medium,
    /// 1%
    High,
}

impl FeeTier {
    #[must_use]
    pub fn raw(self) -> u32 {
        match self {
            Self::Lowest => 100,
            Self::Low => 500,
            Self::Medium => 3000,
            Self::High => 10_000,
        }
    }

    #[must_use]
    pub fn bps(self) -> u32 {
        self.raw() / 100
    }

    #[must_use]
    pub fn all() -> &'static [FeeTier] {
        &[Self::Lowest, Self::Low, Self::Medium, Self::High]
    }
}

impl TryFrom<u32> for FeeTier {
    type Error = QuoterError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::all()
            .iter()
            .copied()
            .find(|tier| tier.raw() == raw)
            .ok_or_else(|| {
                QuoterError::ConfigError(format!(
                    "Unsupported fee tier {raw}, expected one of 100, 500, 3000, 10000"
                ))
            })
    }
}

impl From<FeeTier> for u32 {
    fn from(tier: FeeTier) -> Self {
        tier.raw()
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lowest => write!(f, "0.01%"),
            Self::Low => write!(f, "0.05%"),
            Self::Medium => write!(f, "0.3%"),
            Self::High => write!(f, "1%"),
        }
    }
}

/// Which quoter ABI the configured contract speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoterVersion {
    V1,
    #[default]
    V2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_and_bps() {
        assert_eq!(FeeTier::Lowest.raw(), 100);
        assert_eq!(FeeTier::Low.raw(), 500);
        assert_eq!(FeeTier::Medium.raw(), 3000);
        assert_eq!(FeeTier::High.raw(), 10_000);
        assert_eq!(FeeTier::Lowest.bps(), 1);
        assert_eq!(FeeTier::High.bps(), 100);
    }

    #[test]
    fn default_is_stablecoin_tier() {
        assert_eq!(FeeTier::default(), FeeTier::Lowest);
        assert_eq!(FeeTier::default().to_string(), "0.01%");
    }

    #[test]
    fn parses_known_tiers_only() {
        assert_eq!(FeeTier::try_from(3000).unwrap(), FeeTier::Medium);
        assert!(matches!(FeeTier::try_from(250), Err(QuoterError::ConfigError(_))));
    }

    #[test]
    fn deserializes_from_raw_number() {
        let tier: FeeTier = serde_json::from_str("500").unwrap();
        assert_eq!(tier, FeeTier::Low);
        assert!(serde_json::from_str::<FeeTier>("42").is_err());
        let version: QuoterVersion = serde_json::from_str("\"v1\"").unwrap();
        assert_eq!(version, QuoterVersion::V1);
    }
}
