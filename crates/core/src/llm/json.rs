use crate::domain::contract::LlmDayFortune;
use crate::domain::fortune::{DayFortune, FortuneSequence};
use crate::generator;
use crate::time::forecast::ForecastWindow;
use chrono::NaiveDate;
use serde_json::Value;

/// Ways of pulling a JSON value out of model output, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeStrategy {
    Strict,
    Fenced,
    Bracketed,
}

const DECODE_PIPELINE: [DecodeStrategy; 3] = [
    DecodeStrategy::Strict,
    DecodeStrategy::Fenced,
    DecodeStrategy::Bracketed,
];

impl DecodeStrategy {
    fn decode(self, text: &str) -> Option<Value> {
        let candidate = match self {
            DecodeStrategy::Strict => Some(text.trim()),
            DecodeStrategy::Fenced => strip_fences(text),
            DecodeStrategy::Bracketed => bracketed(text),
        }?;
        serde_json::from_str(candidate).ok()
    }
}

/// Body of a Markdown code fence (```json ... ``` or ``` ... ```).
fn strip_fences(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let rest = trimmed.strip_prefix("```")?;
    let (_, inner) = rest.split_once('\n')?;
    let end = inner.rfind("```")?;
    Some(inner[..end].trim())
}

/// First '[' to last ']'.
fn bracketed(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// The first successfully decoded value, if it is an array.
pub fn extract_array(text: &str) -> Option<Vec<Value>> {
    let (strategy, value) = DECODE_PIPELINE
        .iter()
        .find_map(|s| s.decode(text).map(|v| (*s, v)))?;
    match value {
        Value::Array(items) => Some(items),
        other => {
            tracing::debug!(?strategy, kind = json_kind(&other), "decoded value is not an array");
            None
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn accept(entry: Option<Value>, date: NaiveDate) -> Option<DayFortune> {
    let entry = entry?;
    match LlmDayFortune::from_json(entry).and_then(|e| e.validate_and_into_day(date)) {
        Ok(day) => Some(day),
        Err(err) => {
            tracing::debug!(%date, error = %err, "replacing invalid external entry");
            None
        }
    }
}

/// Turns raw model output into a complete forecast.
///
/// Never fails: every position that is missing or invalid in `raw` is filled
/// from the deterministic generator for that date, and extra entries are dropped.
pub fn parse_and_validate(
    raw: &str,
    window: &ForecastWindow,
    name: &str,
    seed: u8,
) -> FortuneSequence {
    let mut external = extract_array(raw).unwrap_or_default().into_iter();

    let mut repaired = 0usize;
    let days = (*window.dates()).map(|date| {
        accept(external.next(), date).unwrap_or_else(|| {
            repaired += 1;
            generator::generate(date, name, seed)
        })
    });

    if repaired > 0 {
        tracing::info!(
            repaired,
            start = %window.start(),
            "filled forecast positions with generated entries"
        );
    }
    FortuneSequence::from_window_days(days)
}
