use crate::grouping::QueryGroup;
use crate::hits::HitRecord;
use crate::region::Region;
use log::{debug, warn};

/// Hits with more gap openings than this are not considered copies
pub const DEFAULT_MAX_GAPS: usize = 3;
/// A single accepted hit is no evidence of duplication; it takes at least two
/// loci (usually the query's own locus plus one copy)
pub const DEFAULT_MIN_COPIES: usize = 2;

/// Thresholds deciding whether a hit is a copy of its query region
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Hits must have identity strictly above this percentage
    pub identity_threshold: f64,
    /// Allowed deviation, in percent, of alignment length from query length
    pub length_diff_percent: f64,
    pub max_gaps: usize,
    pub min_copies: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            identity_threshold: 90.0,
            length_diff_percent: 15.0,
            max_gaps: DEFAULT_MAX_GAPS,
            min_copies: DEFAULT_MIN_COPIES,
        }
    }
}

impl FilterConfig {
    pub fn accepts(&self, hit: &HitRecord) -> bool {
        let ratio = hit.length_ratio_percent();
        hit.identity > self.identity_threshold
            && ratio >= 100.0 - self.length_diff_percent
            && ratio <= 100.0 + self.length_diff_percent
            && hit.gap_count <= self.max_gaps
    }
}

/// Outcome of filtering one query group
#[derive(Debug, Clone, PartialEq)]
pub struct FilterResult {
    pub query: Region,
    pub is_valid: bool,
    /// Normalized targets of the accepted hits, in input order. Empty when the
    /// group is not valid.
    pub copies: Vec<Region>,
}

pub fn filter_group(group: &QueryGroup, config: &FilterConfig) -> FilterResult {
    let copies: Vec<Region> = group
        .hits
        .iter()
        .filter(|hit| config.accepts(hit))
        .map(HitRecord::normalized_target)
        .collect();

    let is_valid = copies.len() >= config.min_copies;
    debug!(
        "{}: {} of {} hits accepted{}",
        group.query,
        copies.len(),
        group.len(),
        if is_valid { "" } else { ", discarded" }
    );
    // A valid group hits its own locus unless query ids and targets disagree
    // on coordinates, in which case mutual copies are never matched.
    if is_valid && !copies.contains(&group.query) {
        warn!(
            "{}: no accepted hit covers the query's own locus; check that query ids are 1-based `chrom:start-end`",
            group.query_id
        );
    }

    FilterResult {
        query: group.query.clone(),
        is_valid,
        copies: if is_valid { copies } else { Vec::new() },
    }
}
