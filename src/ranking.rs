use crate::models::{MetricKind, RegionRecord};
use std::cmp::Reverse;

/// Table order: cumulative total of `metric`, highest first. Missing totals
/// count as zero and ties keep their input order.
pub fn rank(records: &[RegionRecord], metric: MetricKind) -> Vec<RegionRecord> {
    let mut ranked = records.to_vec();
    // sort_by_key is stable
    ranked.sort_by_key(|r| Reverse(r.total(metric).unwrap_or(0)));
    ranked
}
