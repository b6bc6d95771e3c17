//! Typed views over the tracker's per-day JSON payloads.
//!
//! Every field is optional so a missing or renamed key surfaces as `None`
//! instead of a lookup failure.

use crate::error::VitalsError;
use crate::signal::{Series, SignalKind, SleepStageSegment};
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// `activities/date/{date}.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivityDay {
    pub summary: Option<ActivitySummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivitySummary {
    pub steps: Option<u64>,
    pub activity_calories: Option<u64>,
}

impl ActivityDay {
    pub fn steps(&self) -> Option<u64> {
        self.summary.as_ref().and_then(|s| s.steps)
    }

    pub fn active_calories(&self) -> Option<u64> {
        self.summary.as_ref().and_then(|s| s.activity_calories)
    }
}

/// `sleep/date/{date}.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SleepDay {
    pub sleep: Vec<SleepRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SleepRecord {
    pub date_of_sleep: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub minutes_asleep: Option<u32>,
    pub efficiency: Option<f64>,
    pub minute_data: Vec<SleepMinute>,
    pub levels: Option<SleepLevels>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SleepMinute {
    pub date_time: String,
    pub value: Option<CodeValue>,
}

/// Sleep codes arrive as strings in some payloads and numbers in others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeValue {
    Number(f64),
    Text(String),
}

impl CodeValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CodeValue::Number(value) => Some(*value),
            CodeValue::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SleepLevels {
    pub data: Vec<SleepLevelEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SleepLevelEntry {
    pub date_time: String,
    pub level: Option<String>,
    pub seconds: Option<u32>,
}

impl SleepDay {
    /// The record the per-minute stage codes are taken from.
    pub fn main_record(&self) -> Option<&SleepRecord> {
        self.sleep.first()
    }

    /// Total minutes asleep over every record, `None` if no record reports it.
    pub fn minutes_asleep(&self) -> Option<u32> {
        let values: Vec<u32> = self.sleep.iter().filter_map(|r| r.minutes_asleep).collect();
        (!values.is_empty()).then(|| values.iter().sum())
    }

    /// Mean efficiency over the records that report one.
    pub fn efficiency(&self) -> Option<f64> {
        mean(self.sleep.iter().filter_map(|r| r.efficiency))
    }

    /// Per-minute stage codes of the main record.
    ///
    /// Times are anchored on the record's start date when present, else on
    /// `date`, and advance a day each time the clock wraps past midnight.
    pub fn stage_series(&self, date: NaiveDate) -> Result<Series, VitalsError> {
        let mut series = Series::new(SignalKind::SleepStage);
        let Some(record) = self.main_record() else {
            return Ok(series);
        };
        let mut day = match record.start_time.as_deref() {
            Some(start) => parse_datetime(start)?.date(),
            None => date,
        };
        let mut previous: Option<NaiveTime> = None;
        for minute in &record.minute_data {
            let time = parse_time(&minute.date_time)?;
            if previous.is_some_and(|p| time < p) {
                day = day + Duration::days(1);
            }
            previous = Some(time);
            if let Some(value) = minute.value.as_ref().and_then(CodeValue::as_f64) {
                series.push(day.and_time(time), value);
            }
        }
        Ok(series)
    }

    /// Level runs from every record, in payload order.
    pub fn stage_segments(&self) -> Result<Vec<SleepStageSegment>, VitalsError> {
        let mut segments = Vec::new();
        for record in &self.sleep {
            let Some(levels) = &record.levels else {
                continue;
            };
            for entry in &levels.data {
                let (Some(level), Some(seconds)) = (&entry.level, entry.seconds) else {
                    continue;
                };
                segments.push(SleepStageSegment {
                    start: parse_datetime(&entry.date_time)?,
                    stage: level.clone(),
                    seconds,
                });
            }
        }
        Ok(segments)
    }
}

/// `activities/heart/date/{date}/1d.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartRateDay {
    #[serde(rename = "activities-heart")]
    pub activities_heart: Vec<HeartSummaryEntry>,
    #[serde(rename = "activities-heart-intraday")]
    pub intraday: Option<HeartIntraday>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeartSummaryEntry {
    pub date_time: Option<NaiveDate>,
    pub value: Option<HeartSummaryValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeartSummaryValue {
    pub resting_heart_rate: Option<f64>,
    pub heart_rate_zones: Vec<HeartRateZone>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeartRateZone {
    pub name: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub minutes: Option<f64>,
    pub calories_out: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartIntraday {
    pub dataset: Vec<IntradayPoint>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntradayPoint {
    pub time: String,
    pub value: Option<f64>,
}

impl HeartRateDay {
    fn summary(&self) -> Option<&HeartSummaryValue> {
        self.activities_heart.first().and_then(|e| e.value.as_ref())
    }

    pub fn resting_heart_rate(&self) -> Option<f64> {
        self.summary().and_then(|v| v.resting_heart_rate)
    }

    /// Intraday readings on `date`; points without a value are dropped.
    pub fn intraday_series(&self, date: NaiveDate) -> Result<Series, VitalsError> {
        let mut series = Series::new(SignalKind::HeartRate);
        let Some(intraday) = &self.intraday else {
            return Ok(series);
        };
        for point in &intraday.dataset {
            let time = parse_time(&point.time)?;
            if let Some(value) = point.value {
                series.push(date.and_time(time), value);
            }
        }
        Ok(series)
    }
}

/// `spo2/date/{date}/all.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Spo2Day {
    pub date_time: Option<NaiveDate>,
    pub minutes: Vec<Spo2Minute>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Spo2Minute {
    pub minute: String,
    pub value: Option<f64>,
}

impl Spo2Day {
    pub fn series(&self) -> Result<Series, VitalsError> {
        let mut series = Series::new(SignalKind::OxygenSaturation);
        for reading in &self.minutes {
            let timestamp = parse_datetime(&reading.minute)?;
            if let Some(value) = reading.value {
                series.push(timestamp, value);
            }
        }
        Ok(series)
    }
}

/// Load any of the payload records from disk.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let value = serde_json::from_str(&text)
        .with_context(|| format!("parsing tracker payload {}", path.display()))?;
    Ok(value)
}

pub fn parse_datetime(text: &str) -> Result<NaiveDateTime, VitalsError> {
    let trimmed = text.trim();
    trimmed
        .parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| VitalsError::InvalidTimestamp {
            value: text.to_string(),
            reason: e.to_string(),
        })
}

pub fn parse_time(text: &str) -> Result<NaiveTime, VitalsError> {
    let trimmed = text.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|e| VitalsError::InvalidTimestamp {
            value: text.to_string(),
            reason: e.to_string(),
        })
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()
    }

    #[test]
    fn missing_fields_are_none() {
        let activity: ActivityDay = serde_json::from_str("{}").unwrap();
        assert_eq!(activity.steps(), None);
        let heart: HeartRateDay =
            serde_json::from_str(r#"{"activities-heart": [{"value": {}}]}"#).unwrap();
        assert_eq!(heart.resting_heart_rate(), None);
        assert!(heart.intraday_series(day()).unwrap().is_empty());
    }

    #[test]
    fn sleep_codes_accept_strings_and_numbers() {
        let sleep: SleepDay = serde_json::from_str(
            r#"{"sleep": [{"minuteData": [
                {"dateTime": "01:00:00", "value": "2"},
                {"dateTime": "01:01:00", "value": 3},
                {"dateTime": "01:02:00"}
            ]}]}"#,
        )
        .unwrap();
        let series = sleep.stage_series(day()).unwrap();
        assert_eq!(series.values().collect::<Vec<_>>(), vec![2.0, 3.0]);
    }

    #[test]
    fn sleep_minutes_roll_over_midnight() {
        let sleep: SleepDay = serde_json::from_str(
            r#"{"sleep": [{"startTime": "2024-03-19T23:58:00.000", "minuteData": [
                {"dateTime": "23:58:00", "value": "1"},
                {"dateTime": "23:59:00", "value": "1"},
                {"dateTime": "00:00:00", "value": "2"}
            ]}]}"#,
        )
        .unwrap();
        let series = sleep.stage_series(day()).unwrap();
        let (first, last) = series.span().unwrap();
        assert_eq!(first.date(), NaiveDate::from_ymd_opt(2024, 3, 19).unwrap());
        assert_eq!(last.date(), day());
        assert_eq!(last.hour(), 0);
    }

    #[test]
    fn spo2_minutes_parse_full_datetimes() {
        let spo2: Spo2Day = serde_json::from_str(
            r#"{"dateTime": "2024-03-20", "minutes": [
                {"value": 97.5, "minute": "2024-03-20T00:00:10"},
                {"value": 96.0, "minute": "2024-03-20T00:01:40.000"}
            ]}"#,
        )
        .unwrap();
        let series = spo2.series().unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.samples[1].timestamp.second(), 40);
    }

    #[test]
    fn malformed_time_is_reported() {
        let heart: HeartRateDay = serde_json::from_str(
            r#"{"activities-heart-intraday": {"dataset": [{"time": "noon", "value": 60}]}}"#,
        )
        .unwrap();
        let err = heart.intraday_series(day()).unwrap_err();
        assert!(err.to_string().contains("noon"));
    }

    #[test]
    fn sleep_totals_span_records() {
        let sleep: SleepDay = serde_json::from_str(
            r#"{"sleep": [
                {"minutesAsleep": 300, "efficiency": 90},
                {"minutesAsleep": 60, "efficiency": 80},
                {}
            ]}"#,
        )
        .unwrap();
        assert_eq!(sleep.minutes_asleep(), Some(360));
        assert_eq!(sleep.efficiency(), Some(85.0));
        assert_eq!(SleepDay::default().minutes_asleep(), None);
    }
}
