use anyhow::{ensure, Context};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of consecutive days in every forecast.
pub const FORECAST_DAYS: usize = 7;

pub const SCORE_RANGE: std::ops::RangeInclusive<i64> = 1..=10;
pub const LUCKY_NUMBER_RANGE: std::ops::RangeInclusive<i64> = 1..=9;

/// A validated prediction request. Construct it with [`PredictionRequest::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRequest {
    pub name: String,
    pub birthdate: NaiveDate,
}

impl PredictionRequest {
    pub fn parse(name: &str, birthdate: &str) -> anyhow::Result<Self> {
        let name = name.trim();
        ensure!(!name.is_empty(), "name must be non-empty");
        let birthdate = parse_birthdate(birthdate)?;
        Ok(Self {
            name: name.to_string(),
            birthdate,
        })
    }

    pub fn fingerprint(&self) -> RequestFingerprint {
        RequestFingerprint::of(&self.name, self.birthdate)
    }
}

fn parse_birthdate(s: &str) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    ensure!(!s.is_empty(), "birthdate must be non-empty");
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .with_context(|| format!("birthdate is not an ISO-8601 date: {s}"))
}

/// Cache key for a `(name, birthdate)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestFingerprint(String);

impl RequestFingerprint {
    pub fn of(name: &str, birthdate: NaiveDate) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(birthdate.format("%Y-%m-%d").to_string().as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayFortune {
    pub date: NaiveDate,
    pub score: u8,
    pub description: String,
    pub advice: String,
    pub lucky_number: u8,
    pub activities: String,
}

/// Exactly [`FORECAST_DAYS`] entries on consecutive calendar days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FortuneSequence(Vec<DayFortune>);

impl FortuneSequence {
    pub fn try_from_days(days: Vec<DayFortune>) -> anyhow::Result<Self> {
        ensure!(
            days.len() == FORECAST_DAYS,
            "fortune sequence must contain exactly {FORECAST_DAYS} days (got {})",
            days.len()
        );
        for pair in days.windows(2) {
            ensure!(
                pair[0].date.succ_opt() == Some(pair[1].date),
                "fortune dates must be consecutive: {} then {}",
                pair[0].date,
                pair[1].date
            );
        }
        for day in &days {
            ensure!(
                SCORE_RANGE.contains(&i64::from(day.score)),
                "score out of range on {}: {}",
                day.date,
                day.score
            );
            ensure!(
                LUCKY_NUMBER_RANGE.contains(&i64::from(day.lucky_number)),
                "luckyNumber out of range on {}: {}",
                day.date,
                day.lucky_number
            );
        }
        Ok(Self(days))
    }

    /// For days already checked against a [`crate::time::forecast::ForecastWindow`].
    pub(crate) fn from_window_days(days: [DayFortune; FORECAST_DAYS]) -> Self {
        debug_assert!(days.windows(2).all(|p| p[0].date.succ_opt() == Some(p[1].date)));
        Self(days.into())
    }

    pub fn days(&self) -> &[DayFortune] {
        &self.0
    }

    pub fn first_date(&self) -> NaiveDate {
        self.0[0].date
    }

    pub fn into_days(self) -> Vec<DayFortune> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: NaiveDate) -> DayFortune {
        DayFortune {
            date,
            score: 5,
            description: "d".to_string(),
            advice: "a".to_string(),
            lucky_number: 3,
            activities: "x".to_string(),
        }
    }

    #[test]
    fn parse_trims_name_and_accepts_rfc3339() {
        let req = PredictionRequest::parse("  Alice ", "1990-05-15T08:30:00Z").unwrap();
        assert_eq!(req.name, "Alice");
        assert_eq!(req.birthdate, NaiveDate::from_ymd_opt(1990, 5, 15).unwrap());
    }

    #[test]
    fn parse_rejects_empty_name_and_bad_dates() {
        assert!(PredictionRequest::parse("", "1990-05-15").is_err());
        assert!(PredictionRequest::parse("   ", "1990-05-15").is_err());
        assert!(PredictionRequest::parse("Alice", "").is_err());
        assert!(PredictionRequest::parse("Alice", "1990-02-30").is_err());
        assert!(PredictionRequest::parse("Alice", "yesterday").is_err());
    }

    #[test]
    fn fingerprint_is_stable_and_input_sensitive() {
        let d = NaiveDate::from_ymd_opt(1990, 5, 15).unwrap();
        let a = RequestFingerprint::of("Alice", d);
        assert_eq!(a, RequestFingerprint::of("Alice", d));
        assert_eq!(a.as_str().len(), 64);
        assert_ne!(a, RequestFingerprint::of("Alicia", d));
        assert_ne!(a, RequestFingerprint::of("Alice", d.succ_opt().unwrap()));
    }

    #[test]
    fn sequence_serializes_as_camel_case_array() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let days: Vec<_> = start.iter_days().take(FORECAST_DAYS).map(day).collect();
        let seq = FortuneSequence::try_from_days(days).unwrap();
        let v = serde_json::to_value(&seq).unwrap();
        assert_eq!(v.as_array().unwrap().len(), FORECAST_DAYS);
        assert_eq!(v[0]["date"], "2026-10-19");
        assert_eq!(v[0]["luckyNumber"], 3);
    }

    #[test]
    fn sequence_rejects_gaps_and_wrong_length() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let short: Vec<_> = start.iter_days().take(6).map(day).collect();
        assert!(FortuneSequence::try_from_days(short).is_err());

        let gapped: Vec<_> = start.iter_days().step_by(2).take(FORECAST_DAYS).map(day).collect();
        assert!(FortuneSequence::try_from_days(gapped).is_err());
    }
}
