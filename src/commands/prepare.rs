use crate::cluster::CandidateSets;
use crate::error::PrepError;
use crate::external::Indexer;
use crate::grouping::{QueryGroup, QueryGroups};
use crate::hit_filter::{filter_group, FilterConfig, FilterResult};
use crate::package::{archive, OutputDir};
use crate::sequence_index::SequenceStore;
use crate::window::{extract_window, DEFAULT_PADDING};
use log::{info, warn};
use rayon::prelude::*;
use std::io::BufRead;
use std::path::PathBuf;

/// Configuration for the prepare command
#[derive(Debug, Clone)]
pub struct PrepConfig {
    pub filter: FilterConfig,
    /// Query regions shorter than this (bp) are ignored
    pub min_region_length: usize,
    pub padding: usize,
    /// Where the tarball goes; `None` skips archiving
    pub archive_path: Option<PathBuf>,
}

impl Default for PrepConfig {
    fn default() -> Self {
        PrepConfig {
            filter: FilterConfig::default(),
            min_region_length: 100,
            padding: DEFAULT_PADDING,
            archive_path: None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PrepSummary {
    pub query_groups: usize,
    pub valid_queries: usize,
    pub surviving: usize,
    pub windows_written: usize,
    pub lookup_failures: usize,
    /// Duplicates removed in favour of a representative whose lookup failed
    pub orphaned_duplicates: usize,
    pub index_failures: usize,
}

/// Read hits grouped by query and collect the copies of every valid query.
///
/// Groups are filtered in parallel; results keep input order and end up in
/// an ordered map, so the outcome does not depend on the thread count.
pub fn collect_candidates<R: BufRead>(
    hits: R,
    config: &PrepConfig,
) -> Result<(CandidateSets, usize), PrepError> {
    let mut grouping = QueryGroups::new(hits, config.min_region_length);
    let groups: Vec<QueryGroup> = grouping.by_ref().collect::<Result<_, _>>()?;
    let stats = grouping.stats();
    info!(
        "Read {} hit records: {} query groups, {} too short, {} single-hit, {} malformed",
        stats.records, stats.groups, stats.too_short, stats.singletons, stats.malformed
    );

    let results: Vec<FilterResult> = groups
        .par_iter()
        .map(|group| filter_group(group, &config.filter))
        .collect();

    Ok((results.into_iter().collect(), groups.len()))
}

/// Filter, deduplicate, extract windows, index and package.
pub fn run_prepare<R, S, X>(
    hits: R,
    store: &S,
    indexer: &X,
    output: &OutputDir,
    config: &PrepConfig,
) -> Result<PrepSummary, PrepError>
where
    R: BufRead,
    S: SequenceStore + ?Sized,
    X: Indexer + ?Sized,
{
    let (candidates, query_groups) = collect_candidates(hits, config)?;
    info!("{} queries have duplicate copies", candidates.len());

    let (surviving, removed_by) = candidates.dedup_with_removals();
    info!("{} canonical regions after deduplication", surviving.len());

    let mut summary = PrepSummary {
        query_groups,
        valid_queries: candidates.len(),
        surviving: surviving.len(),
        ..Default::default()
    };

    let mut windows = Vec::with_capacity(surviving.len());
    let mut window_paths = Vec::with_capacity(surviving.len());
    for region in &surviving {
        let window = match extract_window(store, region, config.padding) {
            Ok(window) => window,
            Err(e) => {
                warn!("Skipping {region}: {e}");
                summary.lookup_failures += 1;
                let orphans: Vec<String> = removed_by
                    .iter()
                    .filter(|(_, kept)| *kept == region)
                    .map(|(removed, _)| removed.to_string())
                    .collect();
                if !orphans.is_empty() {
                    warn!(
                        "Cluster of {region} has no window; its duplicates {} were removed in its favour",
                        orphans.join(", ")
                    );
                    summary.orphaned_duplicates += orphans.len();
                }
                continue;
            }
        };
        if let Some(copies) = candidates.copies_of(region) {
            output.write_copies(region, copies)?;
        }
        window_paths.push(output.write_window(&window)?);
        windows.push(window);
    }
    summary.windows_written = windows.len();

    if windows.is_empty() {
        warn!("{}", PrepError::EmptyResultWarning);
    }

    let merged = output.write_merged_reference(&windows)?;
    output.write_manifest(windows.iter().map(|w| &w.region))?;
    summary.index_failures = output.index_all(indexer, &merged, &window_paths);

    if let Some(archive_path) = &config.archive_path {
        archive(output.root(), archive_path)?;
    }

    Ok(summary)
}
