use crate::hit_filter::FilterResult;
use crate::region::Region;
use log::info;
use std::collections::{BTreeMap, BTreeSet};

/// Copies recorded for every query region that passed the hit filter.
///
/// Ordered maps keep iteration, and therefore the choice of canonical
/// representative, reproducible.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CandidateSets {
    copies: BTreeMap<Region, BTreeSet<Region>>,
}

impl CandidateSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the copies of a valid query. A query seen twice accumulates both
    /// sets of copies.
    pub fn insert(&mut self, query: Region, copies: impl IntoIterator<Item = Region>) {
        self.copies.entry(query).or_default().extend(copies);
    }

    pub fn add_result(&mut self, result: FilterResult) {
        if result.is_valid {
            self.insert(result.query, result.copies);
        }
    }

    pub fn len(&self) -> usize {
        self.copies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copies.is_empty()
    }

    pub fn contains(&self, query: &Region) -> bool {
        self.copies.contains_key(query)
    }

    pub fn copies_of(&self, query: &Region) -> Option<&BTreeSet<Region>> {
        self.copies.get(query)
    }

    pub fn queries(&self) -> impl Iterator<Item = &Region> {
        self.copies.keys()
    }

    /// Collapse queries that list each other as copies.
    ///
    /// Walks queries in sorted order; a still-surviving query removes every
    /// other surviving query found among its copies. The first region of a
    /// mutually-duplicating cluster in sort order is the one kept.
    pub fn dedup(&self) -> BTreeSet<Region> {
        self.dedup_with_removals().0
    }

    /// Like [`dedup`](Self::dedup), also returning which surviving region
    /// removed each duplicate.
    pub fn dedup_with_removals(&self) -> (BTreeSet<Region>, BTreeMap<Region, Region>) {
        let mut surviving: BTreeSet<Region> = self.copies.keys().cloned().collect();
        let mut removed_by = BTreeMap::new();

        for (query, copies) in &self.copies {
            for copy in copies {
                if copy == query || !self.copies.contains_key(copy) {
                    continue;
                }
                if surviving.contains(query) && surviving.remove(copy) {
                    info!("Removed {copy}. Duplicate of: {query}");
                    removed_by.insert(copy.clone(), query.clone());
                }
            }
        }

        (surviving, removed_by)
    }

    /// The candidate sets of the given queries only
    pub fn restricted_to(&self, keep: &BTreeSet<Region>) -> CandidateSets {
        CandidateSets {
            copies: self
                .copies
                .iter()
                .filter(|(query, _)| keep.contains(*query))
                .map(|(query, copies)| (query.clone(), copies.clone()))
                .collect(),
        }
    }
}

impl FromIterator<FilterResult> for CandidateSets {
    fn from_iter<I: IntoIterator<Item = FilterResult>>(iter: I) -> Self {
        let mut sets = CandidateSets::new();
        for result in iter {
            sets.add_result(result);
        }
        sets
    }
}
