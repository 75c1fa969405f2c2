use serde::{Deserialize, Deserializer, Serialize};

/// Churn risk buckets, ordered from least to most at risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskCategory {
    Stable,
    Fair,
    Caution,
    Risk,
    VeryRisk,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 5] = [
        RiskCategory::Stable,
        RiskCategory::Fair,
        RiskCategory::Caution,
        RiskCategory::Risk,
        RiskCategory::VeryRisk,
    ];

    /// Maps a churn probability in `[0, 1]` onto its bucket.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 0.8 {
            RiskCategory::VeryRisk
        } else if probability >= 0.6 {
            RiskCategory::Risk
        } else if probability >= 0.4 {
            RiskCategory::Caution
        } else if probability > 0.25 {
            RiskCategory::Fair
        } else {
            RiskCategory::Stable
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskCategory::Stable => "stable",
            RiskCategory::Fair => "fair",
            RiskCategory::Caution => "caution",
            RiskCategory::Risk => "risk",
            RiskCategory::VeryRisk => "very-risk",
        }
    }

    /// Label the backend stores and filters on.
    pub fn backend_label(self) -> &'static str {
        match self {
            RiskCategory::Stable => "안정",
            RiskCategory::Fair => "양호",
            RiskCategory::Caution => "주의",
            RiskCategory::Risk => "위험",
            RiskCategory::VeryRisk => "매우 위험",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.to_ascii_lowercase().as_str() {
            "stable" | "안정" => Some(RiskCategory::Stable),
            "fair" | "양호" | "보통" => Some(RiskCategory::Fair),
            "caution" | "주의" => Some(RiskCategory::Caution),
            "risk" | "위험" => Some(RiskCategory::Risk),
            "very-risk" | "veryrisk" | "매우위험" => Some(RiskCategory::VeryRisk),
            _ => None,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            RiskCategory::Stable => "#2563eb",
            RiskCategory::Fair => "#82ca9d",
            RiskCategory::Caution => "#ffbb28",
            RiskCategory::Risk => "#ff8042",
            RiskCategory::VeryRisk => "#ed174d",
        }
    }
}

impl<'de> Deserialize<'de> for RiskCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        RiskCategory::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown risk category '{raw}'")))
    }
}

/// Lenient variant for upstream records: unknown labels become `None`
/// instead of failing the whole payload.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<RiskCategory>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(RiskCategory::parse))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_map_probabilities() {
        assert_eq!(RiskCategory::from_probability(0.81), RiskCategory::VeryRisk);
        assert_eq!(RiskCategory::from_probability(0.65), RiskCategory::Risk);
        assert_eq!(RiskCategory::from_probability(0.45), RiskCategory::Caution);
        assert_eq!(RiskCategory::from_probability(0.30), RiskCategory::Fair);
        assert_eq!(RiskCategory::from_probability(0.10), RiskCategory::Stable);
    }

    #[test]
    fn boundaries_are_inclusive_except_fair() {
        assert_eq!(RiskCategory::from_probability(0.80), RiskCategory::VeryRisk);
        assert_eq!(RiskCategory::from_probability(0.60), RiskCategory::Risk);
        assert_eq!(RiskCategory::from_probability(0.40), RiskCategory::Caution);
        assert_eq!(RiskCategory::from_probability(0.25), RiskCategory::Stable);
    }

    #[test]
    fn categories_are_ordered() {
        assert!(RiskCategory::Stable < RiskCategory::Fair);
        assert!(RiskCategory::Risk < RiskCategory::VeryRisk);
    }

    #[test]
    fn backend_labels_parse_with_or_without_spaces() {
        assert_eq!(RiskCategory::parse("매우 위험"), Some(RiskCategory::VeryRisk));
        assert_eq!(RiskCategory::parse("매우위험"), Some(RiskCategory::VeryRisk));
        assert_eq!(RiskCategory::parse("보통"), Some(RiskCategory::Fair));
        assert_eq!(RiskCategory::parse("very-risk"), Some(RiskCategory::VeryRisk));
        assert_eq!(RiskCategory::parse("unknown"), None);
        for category in RiskCategory::ALL {
            assert_eq!(RiskCategory::parse(category.backend_label()), Some(category));
        }
    }

    #[test]
    fn serializes_as_kebab_case() {
        let json = serde_json::to_string(&RiskCategory::VeryRisk).unwrap();
        assert_eq!(json, "\"very-risk\"");
        let parsed: RiskCategory = serde_json::from_str("\"위험\"").unwrap();
        assert_eq!(parsed, RiskCategory::Risk);
    }
}
