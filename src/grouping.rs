use crate::error::PrepError;
use crate::hits::HitRecord;
use crate::region::Region;
use log::{debug, warn};
use rustc_hash::FxHashSet;
use std::io::{BufRead, Lines};

/// All hits of one contiguous block of identical query identifiers
#[derive(Debug, Clone, PartialEq)]
pub struct QueryGroup {
    pub query_id: String,
    pub query: Region,
    pub hits: Vec<HitRecord>,
}

impl QueryGroup {
    fn start(hit: HitRecord) -> Self {
        QueryGroup {
            query_id: hit.query_id.clone(),
            query: hit.query.clone(),
            hits: vec![hit],
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GroupingStats {
    pub records: usize,
    pub malformed: usize,
    pub too_short: usize,
    pub singletons: usize,
    pub groups: usize,
}

/// Groups hit records by query identifier.
///
/// Input must be grouped by query: only contiguous runs are merged. A query
/// id that shows up again after its block ended starts a new, separate group
/// and is reported with a warning. Groups with a single hit carry no
/// duplicate evidence and are not yielded.
pub struct QueryGroups<R: BufRead> {
    lines: Lines<R>,
    line_number: usize,
    min_region_length: usize,
    current: Option<QueryGroup>,
    seen: FxHashSet<String>,
    stats: GroupingStats,
}

impl<R: BufRead> QueryGroups<R> {
    pub fn new(reader: R, min_region_length: usize) -> Self {
        QueryGroups {
            lines: reader.lines(),
            line_number: 0,
            min_region_length,
            current: None,
            seen: FxHashSet::default(),
            stats: GroupingStats::default(),
        }
    }

    pub fn stats(&self) -> GroupingStats {
        self.stats
    }

    fn finish(&mut self, group: QueryGroup) -> Option<QueryGroup> {
        if group.len() > 1 {
            self.stats.groups += 1;
            Some(group)
        } else {
            debug!("Skipping {}: single hit", group.query_id);
            self.stats.singletons += 1;
            None
        }
    }
}

impl<R: BufRead> Iterator for QueryGroups<R> {
    type Item = Result<QueryGroup, PrepError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => return Some(Err(e.into())),
                None => {
                    let last = self.current.take()?;
                    return self.finish(last).map(Ok);
                }
            };
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let hit = match HitRecord::parse_line(trimmed) {
                Ok(hit) => hit,
                Err(e) => {
                    warn!(
                        "{}",
                        PrepError::MalformedInputLine {
                            line_number: self.line_number,
                            reason: e.to_string(),
                        }
                    );
                    self.stats.malformed += 1;
                    continue;
                }
            };
            self.stats.records += 1;

            if hit.query.len() < self.min_region_length {
                self.stats.too_short += 1;
                continue;
            }

            if let Some(group) = self.current.as_mut() {
                if group.query_id == hit.query_id {
                    group.hits.push(hit);
                    continue;
                }
            }

            if !self.seen.insert(hit.query_id.clone()) {
                warn!(
                    "Query {} reappears at line {}; input is not grouped by query, blocks are processed separately",
                    hit.query_id, self.line_number
                );
            }

            if let Some(previous) = self.current.replace(QueryGroup::start(hit)) {
                if let Some(group) = self.finish(previous) {
                    return Some(Ok(group));
                }
            }
        }
    }
}
