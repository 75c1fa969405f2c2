use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

/// Month-over-month movement of a metric. `direction` is `None` when
/// there is nothing to compare against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trend {
    pub direction: Option<TrendDirection>,
    pub percentage: String,
}

impl Trend {
    fn undefined() -> Self {
        Self {
            direction: None,
            percentage: "0.00".to_string(),
        }
    }
}

pub fn compute_trend(current: Option<f64>, previous: Option<f64>) -> Trend {
    let (Some(current), Some(previous)) = (current, previous) else {
        return Trend::undefined();
    };
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return Trend::undefined();
    }

    let diff = current - previous;
    let direction = if diff > 0.0 {
        TrendDirection::Up
    } else if diff < 0.0 {
        TrendDirection::Down
    } else {
        TrendDirection::Flat
    };

    Trend {
        direction: Some(direction),
        percentage: format!("{:.2}", (diff / previous * 100.0).abs()),
    }
}

/// `part / total` as a percentage with two decimals; a zero total yields `0.00`.
pub fn rate_percent(part: u64, total: u64) -> String {
    if total == 0 {
        return "0.00".to_string();
    }
    format!("{:.2}", part as f64 / total as f64 * 100.0)
}

/// Groups digits in threes: `1234567` -> `1,234,567`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Probability in `[0, 1]` as a percentage rounded to one decimal.
pub fn probability_percent(probability: f64) -> f64 {
    (probability * 100.0 * 10.0).round() / 10.0
}
