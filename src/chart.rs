use crate::models::{HistoricalTimeline, MetricKind};
use chrono::NaiveDate;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: i64,
}

/// Daily new counts for `metric`: each day minus the day before. The first
/// day has no predecessor and is dropped. Downward corrections in the
/// cumulative series are reported as zero.
pub fn build_series(timeline: &HistoricalTimeline, metric: MetricKind) -> Vec<ChartPoint> {
    let series = timeline.series(metric);
    series
        .iter()
        .zip(series.iter().skip(1))
        .map(|((_, prev), (date, current))| ChartPoint {
            date: *date,
            value: current.saturating_sub(*prev).max(0),
        })
        .collect()
}

/// SVG path `d` attribute scaled into a `width` x `height` box.
pub fn path_data(points: &[ChartPoint], width: f64, height: f64) -> String {
    if points.is_empty() {
        return String::new();
    }
    let max = points.iter().map(|p| p.value).max().unwrap_or(0).max(1) as f64;
    let step = if points.len() > 1 {
        width / (points.len() - 1) as f64
    } else {
        0.0
    };
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let x = i as f64 * step;
            let y = height - (p.value as f64 / max) * height;
            let cmd = if i == 0 { 'M' } else { 'L' };
            format!("{}{:.1},{:.1}", cmd, x, y)
        })
        .collect::<Vec<_>>()
        .join(" ")
}
