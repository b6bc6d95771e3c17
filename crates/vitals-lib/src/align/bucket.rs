use crate::signal::{floor_minute, Series};
use chrono::NaiveDateTime;
use log::warn;

/// Reduce a series onto `len` one-minute bins starting at `origin`, taking the
/// mean of every bin that holds samples. Empty bins are `None`.
pub fn bucket_by_minute(series: &Series, origin: NaiveDateTime, len: usize) -> Vec<Option<f64>> {
    let mut sums = vec![0.0; len];
    let mut counts = vec![0usize; len];
    let mut skipped = 0usize;
    for sample in &series.samples {
        if !sample.value.is_finite() {
            skipped += 1;
            continue;
        }
        let offset = (floor_minute(sample.timestamp) - origin).num_minutes();
        if offset < 0 || offset as usize >= len {
            continue;
        }
        sums[offset as usize] += sample.value;
        counts[offset as usize] += 1;
    }
    if skipped > 0 {
        warn!(
            "{}: skipped {} non-finite sample(s)",
            series.kind.column_name(),
            skipped
        );
    }
    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| (count > 0).then(|| sum / count as f64))
        .collect()
}
