use crate::models::{ChurnFactor, ChurnFactorShare, FeatureImportanceRecord};
use serde::Serialize;
use serde_json::Value;

const FEATURE_PREFIX: &str = "feature_";
const IMPACT_PREFIX: &str = "impact_value_";

/// Model column names and how the dashboard labels them.
const FEATURE_LABELS: &[(&str, &str)] = &[
    ("TV_I_CNT", "TV sets in use"),
    ("AGMT_KIND_NM", "Contract type"),
    ("MEDIA_NM_GRP", "Product media"),
    ("PROD_NM_GRP", "Product"),
    ("CH_HH_AVG_MONTH1", "Avg. monthly viewing hours"),
    ("BUNDLE_YN", "Bundled product"),
    ("VOC_STOP_CANCEL_MONTH1_YN", "Cancellation call last month"),
    ("VOC_TOTAL_MONTH1_YN", "Any support call last month"),
    ("MONTHS_REMAINING", "Contract months remaining"),
    ("STB_RES_1M_YN", "Set-top box dormant"),
    ("CH_LAST_DAYS_BF_GRP", "Last viewing day"),
    ("INHOME_RATE", "Stay-at-home index"),
    ("AGE_GRP10", "Age group"),
    ("AGMT_END_SEG", "Contract end segment"),
    ("TOTAL_USED_DAYS", "Total days of use"),
    ("SCRB_PATH_NM_GRP", "Acquisition channel"),
];

pub fn translate_feature(name: &str) -> String {
    FEATURE_LABELS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Themes the retention playbook groups churn drivers into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyGroup {
    Viewing,
    Contract,
    SupportCalls,
    Product,
}

impl StrategyGroup {
    pub fn title(self) -> &'static str {
        match self {
            StrategyGroup::Viewing => "Viewing activity retention strategy",
            StrategyGroup::Contract => "Contract and tenure retention strategy",
            StrategyGroup::SupportCalls => "Support call retention strategy",
            StrategyGroup::Product => "Product retention strategy",
        }
    }
}

pub fn strategy_for_feature(name: &str) -> Option<StrategyGroup> {
    match name {
        "CH_LAST_DAYS_BF_GRP" | "STB_RES_1M_YN" | "CH_HH_AVG_MONTH1" => {
            Some(StrategyGroup::Viewing)
        }
        "MONTHS_REMAINING" | "TOTAL_USED_DAYS" | "AGMT_END_SEG" | "AGMT_KIND_NM" => {
            Some(StrategyGroup::Contract)
        }
        "VOC_TOTAL_MONTH1_YN" | "VOC_STOP_CANCEL_MONTH1_YN" => Some(StrategyGroup::SupportCalls),
        "MEDIA_NM_GRP" | "PROD_NM_GRP" | "BUNDLE_YN" => Some(StrategyGroup::Product),
        _ => None,
    }
}

/// Collects the populated `feature_N` slots of a record in index order,
/// translating names and scaling impacts to percentages.
pub fn extract_factors(record: &FeatureImportanceRecord) -> Vec<ChurnFactor> {
    let mut indexed: Vec<(u32, &str)> = record
        .slots
        .iter()
        .filter_map(|(key, value)| {
            let index = key.strip_prefix(FEATURE_PREFIX)?.parse::<u32>().ok()?;
            let name = value.as_str()?.trim();
            (!name.is_empty()).then_some((index, name))
        })
        .collect();
    indexed.sort_by_key(|(index, _)| *index);

    indexed
        .into_iter()
        .map(|(index, name)| {
            let raw = record
                .slots
                .get(&format!("{IMPACT_PREFIX}{index}"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            ChurnFactor {
                factor: translate_feature(name),
                impact: scale_impact(raw),
            }
        })
        .collect()
}

/// Distinct playbook themes touched by a record's populated slots.
pub fn strategies_for(record: &FeatureImportanceRecord) -> Vec<StrategyGroup> {
    let mut groups = Vec::new();
    for (key, value) in &record.slots {
        if !key.starts_with(FEATURE_PREFIX) {
            continue;
        }
        if let Some(group) = value.as_str().and_then(|name| strategy_for_feature(name.trim())) {
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
    }
    groups
}

/// Top monthly churn factors from the risk summary, with empty slots dropped.
pub fn translate_factor_shares(shares: &[ChurnFactorShare]) -> Vec<ChurnFactor> {
    shares
        .iter()
        .filter_map(|share| {
            let name = share.factor.as_deref()?.trim();
            (!name.is_empty()).then(|| ChurnFactor {
                factor: translate_feature(name),
                impact: share.impact,
            })
        })
        .collect()
}

fn scale_impact(raw: f64) -> f64 {
    (raw * 100.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> FeatureImportanceRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_slots_are_skipped() {
        let record = record(json!({
            "sha2_hash": "h1",
            "p_mt": 6,
            "feature_1": "X",
            "impact_value_1": 0.4356,
            "feature_2": "",
            "impact_value_2": 0.2
        }));

        let factors = extract_factors(&record);
        assert_eq!(
            factors,
            vec![ChurnFactor {
                factor: translate_feature("X"),
                impact: 43.56,
            }]
        );
    }

    #[test]
    fn slots_keep_index_order_past_nine() {
        let record = record(json!({
            "sha2_hash": "h1",
            "p_mt": 6,
            "feature_10": "TOTAL_USED_DAYS",
            "impact_value_10": 0.01,
            "feature_2": "MONTHS_REMAINING",
            "impact_value_2": 0.3,
            "feature_1": "TV_I_CNT",
            "impact_value_1": 0.5,
            "feature_3": null
        }));

        let names: Vec<String> = extract_factors(&record)
            .into_iter()
            .map(|f| f.factor)
            .collect();
        assert_eq!(
            names,
            vec![
                "TV sets in use".to_string(),
                "Contract months remaining".to_string(),
                "Total days of use".to_string(),
            ]
        );
    }

    #[test]
    fn missing_impact_counts_as_zero() {
        let record = record(json!({
            "sha2_hash": "h1",
            "p_mt": 6,
            "feature_1": "BUNDLE_YN"
        }));
        assert_eq!(extract_factors(&record)[0].impact, 0.0);
    }

    #[test]
    fn unknown_features_keep_raw_name() {
        assert_eq!(translate_feature("NEW_COLUMN"), "NEW_COLUMN");
        assert_eq!(translate_feature("INHOME_RATE"), "Stay-at-home index");
    }

    #[test]
    fn features_map_to_strategy_groups() {
        assert_eq!(strategy_for_feature("STB_RES_1M_YN"), Some(StrategyGroup::Viewing));
        assert_eq!(strategy_for_feature("AGMT_KIND_NM"), Some(StrategyGroup::Contract));
        assert_eq!(
            strategy_for_feature("VOC_STOP_CANCEL_MONTH1_YN"),
            Some(StrategyGroup::SupportCalls)
        );
        assert_eq!(strategy_for_feature("INHOME_RATE"), None);
    }

    #[test]
    fn strategies_are_deduplicated() {
        let record = record(json!({
            "sha2_hash": "h1",
            "p_mt": 6,
            "feature_1": "MONTHS_REMAINING",
            "feature_2": "TOTAL_USED_DAYS",
            "feature_3": "BUNDLE_YN",
            "feature_4": "INHOME_RATE"
        }));
        let groups = strategies_for(&record);
        assert_eq!(groups.len(), 2);
        assert!(groups.contains(&StrategyGroup::Contract));
        assert!(groups.contains(&StrategyGroup::Product));
    }

    #[test]
    fn factor_shares_drop_null_names() {
        let shares = vec![
            ChurnFactorShare {
                factor: Some("BUNDLE_YN".into()),
                impact: 0.31,
            },
            ChurnFactorShare {
                factor: None,
                impact: 0.1,
            },
        ];
        let factors = translate_factor_shares(&shares);
        assert_eq!(factors.len(), 1);
        assert_eq!(factors[0].factor, "Bundled product");
    }
}
