use crate::domain::fortune::FORECAST_DAYS;
use anyhow::Context;
use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Utc};

/// Calendar date the forecast starts on.
///
/// With an explicit UTC offset the date is taken in that zone; otherwise the
/// server's local zone is used.
pub fn resolve_today(
    utc_offset_hours: Option<i32>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    match utc_offset_hours {
        Some(hours) => {
            let tz = FixedOffset::east_opt(hours * 3600)
                .with_context(|| format!("invalid UTC offset: {hours}h"))?;
            Ok(now_utc.with_timezone(&tz).date_naive())
        }
        None => Ok(now_utc.with_timezone(&Local).date_naive()),
    }
}

/// The consecutive dates a forecast covers, starting on "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastWindow {
    dates: [NaiveDate; FORECAST_DAYS],
}

impl ForecastWindow {
    pub fn starting(today: NaiveDate) -> Self {
        Self {
            dates: std::array::from_fn(|i| today + Duration::days(i as i64)),
        }
    }

    pub fn dates(&self) -> &[NaiveDate; FORECAST_DAYS] {
        &self.dates
    }

    pub fn start(&self) -> NaiveDate {
        self.dates[0]
    }
}
