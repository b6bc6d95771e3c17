use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Physiological signals carried by an aligned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    OxygenSaturation,
    SleepStage,
    HeartRate,
}

impl SignalKind {
    pub fn column_name(&self) -> &'static str {
        match self {
            SignalKind::OxygenSaturation => "oxygen_saturation",
            SignalKind::SleepStage => "sleep_stage",
            SignalKind::HeartRate => "heart_rate",
        }
    }
}

/// One reading of a signal at a tracker-local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Irregularly sampled readings of one signal over one day, sorted by timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    pub kind: SignalKind,
    pub samples: Vec<Sample>,
}

impl Series {
    pub fn new(kind: SignalKind) -> Self {
        Self {
            kind,
            samples: Vec::new(),
        }
    }

    pub fn push(&mut self, timestamp: NaiveDateTime, value: f64) {
        self.samples.push(Sample::new(timestamp, value));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Earliest and latest timestamps, or `None` for an empty series.
    pub fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self.samples.iter().map(|s| s.timestamp).min()?;
        let last = self.samples.iter().map(|s| s.timestamp).max()?;
        Some((first, last))
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.value)
    }
}

/// Truncate a timestamp to the start of its minute.
pub fn floor_minute(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// One minute of the merged view. `None` means no data for that column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedRow {
    pub timestamp: NaiveDateTime,
    pub oxygen_saturation: Option<f64>,
    pub sleep_stage: Option<f64>,
    pub heart_rate: Option<f64>,
}

impl AlignedRow {
    pub fn value(&self, kind: SignalKind) -> Option<f64> {
        match kind {
            SignalKind::OxygenSaturation => self.oxygen_saturation,
            SignalKind::SleepStage => self.sleep_stage,
            SignalKind::HeartRate => self.heart_rate,
        }
    }
}

/// Contiguous per-minute table, strictly increasing by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignedTable {
    pub rows: Vec<AlignedRow>,
}

impl AlignedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, kind: SignalKind) -> Vec<Option<f64>> {
        self.rows.iter().map(|row| row.value(kind)).collect()
    }

    /// True when every consecutive pair of rows is exactly one minute apart.
    pub fn is_contiguous(&self) -> bool {
        self.rows
            .windows(2)
            .all(|w| (w[1].timestamp - w[0].timestamp).num_seconds() == 60)
    }
}

/// A run of one sleep level reported by the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepStageSegment {
    pub start: NaiveDateTime,
    pub stage: String,
    pub seconds: u32,
}

impl SleepStageSegment {
    pub fn minutes(&self) -> f64 {
        self.seconds as f64 / 60.0
    }
}
