use crate::error::VitalsError;
use crate::io::fitbit::parse_time;
use crate::signal::{Series, SleepStageSegment};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Time-of-day range, inclusive at both ends. `start > end` wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parse `HH:MM` or `HH:MM:SS` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self, VitalsError> {
        let start = parse_time(start).map_err(|e| VitalsError::InvalidWindow(e.to_string()))?;
        let end = parse_time(end).map_err(|e| VitalsError::InvalidWindow(e.to_string()))?;
        Ok(Self::new(start, end))
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            time >= self.start && time <= self.end
        } else {
            time >= self.start || time <= self.end
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartRateStats {
    pub samples: usize,
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std_dev: f64,
    pub range: f64,
}

impl HeartRateStats {
    pub fn from_series(series: &Series, window: &TimeWindow) -> Option<Self> {
        let values: Vec<f64> = series
            .samples
            .iter()
            .filter(|s| window.contains(s.timestamp.time()))
            .map(|s| s.value)
            .collect();
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = if values.len() > 1 {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        let max = values.iter().copied().fold(f64::MIN, f64::max);
        let min = values.iter().copied().fold(f64::MAX, f64::min);
        Some(Self {
            samples: values.len(),
            max,
            min,
            mean,
            std_dev,
            range: max - min,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepStageStats {
    pub minutes_by_stage: BTreeMap<String, f64>,
    pub main_stage: Option<String>,
    pub transitions: usize,
}

impl SleepStageStats {
    /// Statistics over segments whose start falls inside the window.
    pub fn from_segments(segments: &[SleepStageSegment], window: &TimeWindow) -> Option<Self> {
        let inside: Vec<&SleepStageSegment> = segments
            .iter()
            .filter(|s| window.contains(s.start.time()))
            .collect();
        if inside.is_empty() {
            return None;
        }
        let mut minutes_by_stage: BTreeMap<String, f64> = BTreeMap::new();
        for segment in &inside {
            *minutes_by_stage.entry(segment.stage.clone()).or_default() += segment.minutes();
        }
        let main_stage = minutes_by_stage
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(stage, _)| stage.clone());
        let transitions = inside.windows(2).filter(|w| w[0].stage != w[1].stage).count();
        Some(Self {
            minutes_by_stage,
            main_stage,
            transitions,
        })
    }
}

/// Everything reported for one time-of-day window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub window: TimeWindow,
    pub heart_rate: Option<HeartRateStats>,
    pub sleep: Option<SleepStageStats>,
}

impl WindowStats {
    pub fn compute(window: TimeWindow, heart: &Series, segments: &[SleepStageSegment]) -> Self {
        Self {
            window,
            heart_rate: HeartRateStats::from_series(heart, &window),
            sleep: SleepStageStats::from_segments(segments, &window),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalKind;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 20)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn segment(h: u32, m: u32, stage: &str, seconds: u32) -> SleepStageSegment {
        SleepStageSegment {
            start: at(h, m),
            stage: stage.into(),
            seconds,
        }
    }

    #[test]
    fn window_wraps_midnight() {
        let window = TimeWindow::parse("22:00", "06:00").unwrap();
        assert!(window.contains(NaiveTime::from_hms_opt(23, 30, 0).unwrap()));
        assert!(window.contains(NaiveTime::from_hms_opt(5, 0, 0).unwrap()));
        assert!(!window.contains(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
        assert!(TimeWindow::parse("25:00", "06:00").is_err());
    }

    #[test]
    fn heart_rate_stats_within_window() {
        let mut heart = Series::new(SignalKind::HeartRate);
        heart.push(at(8, 0), 60.0);
        heart.push(at(8, 30), 62.0);
        heart.push(at(9, 0), 64.0);
        heart.push(at(12, 0), 120.0);
        let window = TimeWindow::parse("08:00", "09:00").unwrap();
        let stats = HeartRateStats::from_series(&heart, &window).unwrap();
        assert_eq!(stats.samples, 3);
        assert_eq!(stats.mean, 62.0);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
        assert_eq!(stats.range, 4.0);

        let empty = TimeWindow::parse("13:00", "14:00").unwrap();
        assert!(HeartRateStats::from_series(&heart, &empty).is_none());
    }

    #[test]
    fn sleep_stage_distribution() {
        let segments = vec![
            segment(1, 0, "light", 600),
            segment(1, 10, "deep", 1800),
            segment(1, 40, "light", 300),
            segment(1, 45, "rem", 900),
            segment(7, 0, "wake", 60),
        ];
        let window = TimeWindow::parse("01:00", "02:00").unwrap();
        let stats = SleepStageStats::from_segments(&segments, &window).unwrap();
        assert_eq!(stats.minutes_by_stage["light"], 15.0);
        assert_eq!(stats.minutes_by_stage["deep"], 30.0);
        assert!(!stats.minutes_by_stage.contains_key("wake"));
        assert_eq!(stats.main_stage.as_deref(), Some("deep"));
        assert_eq!(stats.transitions, 3);
    }
}
