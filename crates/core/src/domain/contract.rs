use crate::domain::fortune::{DayFortune, LUCKY_NUMBER_RANGE, SCORE_RANGE};
use anyhow::{ensure, Context};
use chrono::NaiveDate;
use serde::Deserialize;

/// One day as the external service is asked to return it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmDayFortune {
    pub date: String,
    pub score: i64,
    pub description: String,
    pub advice: String,
    pub lucky_number: i64,
    pub activities: String,
}

impl LlmDayFortune {
    pub fn from_json(value: serde_json::Value) -> anyhow::Result<Self> {
        serde_json::from_value(value).context("entry does not match the day fortune schema")
    }

    pub fn validate_and_into_day(self, expected_date: NaiveDate) -> anyhow::Result<DayFortune> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .with_context(|| format!("date is not YYYY-MM-DD: {}", self.date))?;
        ensure!(
            date == expected_date,
            "date mismatch: expected {expected_date}, got {date}"
        );

        ensure!(
            SCORE_RANGE.contains(&self.score),
            "score out of range: {}",
            self.score
        );
        ensure!(
            LUCKY_NUMBER_RANGE.contains(&self.lucky_number),
            "luckyNumber out of range: {}",
            self.lucky_number
        );

        let description = non_empty(self.description, "description")?;
        let advice = non_empty(self.advice, "advice")?;
        let activities = non_empty(self.activities, "activities")?;

        Ok(DayFortune {
            date,
            score: self.score as u8,
            description,
            advice,
            lucky_number: self.lucky_number as u8,
            activities,
        })
    }
}

fn non_empty(s: String, field: &str) -> anyhow::Result<String> {
    let s = s.trim().to_string();
    ensure!(!s.is_empty(), "{field} must be non-empty");
    Ok(s)
}
