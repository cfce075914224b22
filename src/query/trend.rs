use serde::Serialize;

/// Direction of a period-over-period change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Positive,
    Negative,
    Neutral,
}

/// A formatted period-over-period change with its direction.
#[derive(Debug, Clone, Serialize)]
pub struct Trend {
    pub percentage: String,
    pub mood: Mood,
}

/// Compare a metric against its value over the previous window.
///
/// Growth from a zero baseline has no ratio, so it reads as "+100%".
pub fn calculate_change_with_mood(current: u64, previous: u64) -> Trend {
    if previous == 0 {
        return if current > 0 {
            Trend {
                percentage: "+100%".to_string(),
                mood: Mood::Positive,
            }
        } else {
            Trend {
                percentage: "0%".to_string(),
                mood: Mood::Neutral,
            }
        };
    }

    #[allow(clippy::cast_precision_loss)]
    let change = (current as f64 - previous as f64) / previous as f64 * 100.0;

    let percentage = if change > 0.0 {
        format!("+{change:.1}%")
    } else {
        format!("{change:.1}%")
    };
    let mood = if change > 0.0 {
        Mood::Positive
    } else if change < 0.0 {
        Mood::Negative
    } else {
        Mood::Neutral
    };

    Trend { percentage, mood }
}
