//! Risk categories and their score bands

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed score interval `[lo, hi]` bound to a risk category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoreBand {
    /// Inclusive lower bound
    pub lo: u8,
    /// Inclusive upper bound
    pub hi: u8,
}

impl ScoreBand {
    /// Create a band
    pub const fn new(lo: u8, hi: u8) -> Self {
        Self { lo, hi }
    }

    /// Check whether a score falls inside the band
    #[inline]
    pub fn contains(&self, score: u8) -> bool {
        score >= self.lo && score <= self.hi
    }
}

/// Ordered risk category
///
/// `Approved < LowRisk < MediumRisk < HighRisk < Critical`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum RiskCategory {
    /// Request to a sanctioned internal AI platform
    Approved = 0,
    /// External AI with non-sensitive data
    LowRisk = 1,
    /// External AI with potentially sensitive context
    MediumRisk = 2,
    /// External AI with confirmed sensitive data
    HighRisk = 3,
    /// Active data exfiltration attempt
    Critical = 4,
}

impl RiskCategory {
    /// All categories in ascending severity
    pub const ALL: [RiskCategory; 5] = [
        Self::Approved,
        Self::LowRisk,
        Self::MediumRisk,
        Self::HighRisk,
        Self::Critical,
    ];

    /// Score band of the category
    pub const fn band(&self) -> ScoreBand {
        match self {
            Self::Approved => ScoreBand::new(0, 20),
            Self::LowRisk => ScoreBand::new(21, 40),
            Self::MediumRisk => ScoreBand::new(41, 70),
            Self::HighRisk => ScoreBand::new(71, 90),
            Self::Critical => ScoreBand::new(91, 100),
        }
    }

    /// Default recommended action
    pub const fn default_action(&self) -> &'static str {
        match self {
            Self::Approved => "Allow",
            Self::LowRisk => "Monitor",
            Self::MediumRisk => "Alert and educate user",
            Self::HighRisk => "Block and notify security team",
            Self::Critical => "Immediate block and incident response",
        }
    }

    /// Human-readable description
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Approved => "Request to sanctioned internal AI platform",
            Self::LowRisk => "External AI with non-sensitive data",
            Self::MediumRisk => "External AI with potentially sensitive context",
            Self::HighRisk => "External AI with confirmed sensitive data",
            Self::Critical => "Active data exfiltration attempt",
        }
    }

    /// Wire name (`APPROVED`, `LOW_RISK`, ...)
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::LowRisk => "LOW_RISK",
            Self::MediumRisk => "MEDIUM_RISK",
            Self::HighRisk => "HIGH_RISK",
            Self::Critical => "CRITICAL",
        }
    }

    /// Category whose band contains the score (scores above 100 are CRITICAL)
    pub fn from_score(score: u8) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.band().contains(score))
            .unwrap_or(Self::Critical)
    }

    /// Whether mitigation (incident + alert) applies
    #[inline]
    pub fn requires_escalation(&self) -> bool {
        *self >= Self::HighRisk
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskCategory {
    type Err = String;

    /// Accepts the wire names, tolerating case, spaces and dashes
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();

        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("unknown risk category: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_are_contiguous() {
        let mut expected_lo = 0u16;
        for category in RiskCategory::ALL {
            let band = category.band();
            assert_eq!(band.lo as u16, expected_lo);
            expected_lo = band.hi as u16 + 1;
        }
        assert_eq!(expected_lo, 101);
    }

    #[test]
    fn test_from_score() {
        assert_eq!(RiskCategory::from_score(5), RiskCategory::Approved);
        assert_eq!(RiskCategory::from_score(25), RiskCategory::LowRisk);
        assert_eq!(RiskCategory::from_score(50), RiskCategory::MediumRisk);
        assert_eq!(RiskCategory::from_score(71), RiskCategory::HighRisk);
        assert_eq!(RiskCategory::from_score(95), RiskCategory::Critical);
        assert_eq!(RiskCategory::from_score(200), RiskCategory::Critical);
    }

    #[test]
    fn test_ordering() {
        assert!(RiskCategory::Approved < RiskCategory::LowRisk);
        assert!(RiskCategory::HighRisk < RiskCategory::Critical);
        assert!(RiskCategory::HighRisk.requires_escalation());
        assert!(!RiskCategory::MediumRisk.requires_escalation());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("CRITICAL".parse::<RiskCategory>().unwrap(), RiskCategory::Critical);
        assert_eq!("medium_risk".parse::<RiskCategory>().unwrap(), RiskCategory::MediumRisk);
        assert_eq!("High Risk".parse::<RiskCategory>().unwrap(), RiskCategory::HighRisk);
        assert!("SEVERE".parse::<RiskCategory>().is_err());
    }

    proptest::proptest! {
        #[test]
        fn prop_from_score_lands_in_band(score in 0u8..=100) {
            let category = RiskCategory::from_score(score);
            proptest::prop_assert!(category.band().contains(score));
        }
    }

    #[test]
    fn test_serde_wire_names() {
        let json = serde_json::to_string(&RiskCategory::LowRisk).unwrap();
        assert_eq!(json, "\"LOW_RISK\"");
        let back: RiskCategory = serde_json::from_str("\"HIGH_RISK\"").unwrap();
        assert_eq!(back, RiskCategory::HighRisk);
    }
}
