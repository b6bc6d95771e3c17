use crate::error::ConfigError;
use crate::io::fitbit::{ActivityDay, HeartRateDay, SleepDay};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Headline numbers for one day; each metric is absent when the tracker
/// reported nothing for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub steps: Option<u64>,
    pub active_calories: Option<u64>,
    pub sleep_hours: Option<f64>,
    pub sleep_efficiency: Option<f64>,
    pub resting_heart_rate: Option<f64>,
}

impl DailySummary {
    pub fn from_records(
        date: NaiveDate,
        activity: Option<&ActivityDay>,
        sleep: Option<&SleepDay>,
        heart: Option<&HeartRateDay>,
    ) -> Self {
        Self {
            date,
            steps: activity.and_then(ActivityDay::steps),
            active_calories: activity.and_then(ActivityDay::active_calories),
            sleep_hours: sleep
                .and_then(SleepDay::minutes_asleep)
                .map(|minutes| minutes as f64 / 60.0),
            sleep_efficiency: sleep.and_then(SleepDay::efficiency),
            resting_heart_rate: heart.and_then(HeartRateDay::resting_heart_rate),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Most recent days included in the statistics.
    pub days_to_show: usize,
    pub step_goal: u64,
    pub sleep_min_hours: f64,
    pub sleep_max_hours: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            days_to_show: 30,
            step_goal: 10_000,
            sleep_min_hours: 7.0,
            sleep_max_hours: 9.0,
        }
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.days_to_show == 0 {
            return Err(ConfigError::ValidationError(
                "dashboard.days_to_show must be positive".into(),
            ));
        }
        if self.sleep_min_hours > self.sleep_max_hours {
            return Err(ConfigError::ValidationError(format!(
                "dashboard.sleep_min_hours ({}) exceeds sleep_max_hours ({})",
                self.sleep_min_hours, self.sleep_max_hours
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepStats {
    pub average: f64,
    pub max: u64,
    pub min: u64,
    pub days_meeting_goal: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepStats {
    pub average_hours: f64,
    pub max_hours: f64,
    pub min_hours: f64,
    pub days_in_recommended_range: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestingHeartStats {
    pub average: f64,
    pub max: f64,
    pub min: f64,
    /// Last minus first reading in the window.
    pub change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub first_day: Option<NaiveDate>,
    pub last_day: Option<NaiveDate>,
    pub days: usize,
    pub steps: Option<StepStats>,
    pub sleep: Option<SleepStats>,
    pub resting_heart_rate: Option<RestingHeartStats>,
}

impl DashboardStats {
    pub fn compute(summaries: &[DailySummary], cfg: &DashboardConfig) -> Self {
        let window = recent_days(summaries, cfg.days_to_show);

        let steps: Vec<u64> = window.iter().filter_map(|d| d.steps).collect();
        let step_stats = (!steps.is_empty()).then(|| StepStats {
            average: steps.iter().sum::<u64>() as f64 / steps.len() as f64,
            max: steps.iter().copied().max().unwrap_or(0),
            min: steps.iter().copied().min().unwrap_or(0),
            days_meeting_goal: steps.iter().filter(|&&s| s >= cfg.step_goal).count(),
        });

        let sleep: Vec<f64> = window.iter().filter_map(|d| d.sleep_hours).collect();
        let sleep_stats = (!sleep.is_empty()).then(|| SleepStats {
            average_hours: sleep.iter().sum::<f64>() / sleep.len() as f64,
            max_hours: sleep.iter().copied().fold(f64::MIN, f64::max),
            min_hours: sleep.iter().copied().fold(f64::MAX, f64::min),
            days_in_recommended_range: sleep
                .iter()
                .filter(|&&h| h >= cfg.sleep_min_hours && h <= cfg.sleep_max_hours)
                .count(),
        });

        let resting: Vec<f64> = window.iter().filter_map(|d| d.resting_heart_rate).collect();
        let resting_stats = match (resting.first(), resting.last()) {
            (Some(first), Some(last)) => Some(RestingHeartStats {
                average: resting.iter().sum::<f64>() / resting.len() as f64,
                max: resting.iter().copied().fold(f64::MIN, f64::max),
                min: resting.iter().copied().fold(f64::MAX, f64::min),
                change: last - first,
            }),
            _ => None,
        };

        Self {
            first_day: window.first().map(|d| d.date),
            last_day: window.last().map(|d| d.date),
            days: window.len(),
            steps: step_stats,
            sleep: sleep_stats,
            resting_heart_rate: resting_stats,
        }
    }
}

/// The `days` most recent summaries, oldest first.
pub fn recent_days(summaries: &[DailySummary], days: usize) -> Vec<DailySummary> {
    let mut sorted = summaries.to_vec();
    sorted.sort_by_key(|d| d.date);
    let skip = sorted.len().saturating_sub(days);
    sorted.split_off(skip)
}
