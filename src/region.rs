//! Genomic regions and their textual forms.
//!
//! Internally regions are 0-based half-open intervals `[start, end)`. Every
//! text form (`chrom:start-end` keys, query identifiers, window headers) is
//! 1-based closed, the samtools/UCSC convention, which is also how BLAST8
//! reports target coordinates. Query identifiers produced for the search tool
//! carry an extra `_suffix` (the query length) that is ignored on input.
//! BED lines stay 0-based half-open.

use crate::error::PrepError;
use log::warn;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

fn key_regex() -> &'static Regex {
    static KEY_RE: OnceLock<Regex> = OnceLock::new();
    KEY_RE.get_or_init(|| {
        Regex::new(r"^(?P<chrom>\S+):(?P<start>\d+)-(?P<end>\d+)(?:_(?P<suffix>\S*))?$")
            .expect("region key regex is valid")
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    pub chrom: String,
    pub start: usize,
    pub end: usize,
}

impl Region {
    /// Build from 0-based half-open coordinates
    pub fn new(chrom: &str, start: usize, end: usize) -> Result<Self, String> {
        if start >= end {
            return Err(format!(
                "start ({start}) must be less than end ({end}) for '{chrom}'"
            ));
        }
        Ok(Region {
            chrom: chrom.to_string(),
            start,
            end,
        })
    }

    /// Build from 1-based closed coordinates, as written in keys and BLAST8
    pub fn from_one_based(chrom: &str, first: usize, last: usize) -> Result<Self, String> {
        if first == 0 {
            return Err(format!("1-based coordinate 0 in '{chrom}:{first}-{last}'"));
        }
        if first > last {
            return Err(format!(
                "start ({first}) must not exceed end ({last}) for '{chrom}'"
            ));
        }
        Region::new(chrom, first - 1, last)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Parse a query identifier such as `chr1:1001-1200_200`.
    pub fn from_query_id(query_id: &str) -> Result<Self, String> {
        let caps = key_regex()
            .captures(query_id)
            .ok_or_else(|| format!("'{query_id}' is not of the form chrom:start-end[_suffix]"))?;
        let first = caps["start"]
            .parse::<usize>()
            .map_err(|e| format!("invalid start in '{query_id}': {e}"))?;
        let last = caps["end"]
            .parse::<usize>()
            .map_err(|e| format!("invalid end in '{query_id}': {e}"))?;
        Region::from_one_based(&caps["chrom"], first, last)
    }

    /// Query identifier handed to the search tool: `chrom:start-end_length`.
    pub fn query_id(&self) -> String {
        format!("{self}_{}", self.len())
    }

    /// Parse one ROI line: BED-like `chrom\tstart\tend[...]` or `chrom:start-end`.
    ///
    /// Contig names may contain ':', so three or more fields with numeric
    /// second and third columns are always read as BED.
    pub fn from_roi_line(line: &str) -> Result<Self, String> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            return Err("empty line".to_string());
        }
        if fields.len() >= 3 {
            if let (Ok(start), Ok(end)) = (fields[1].parse::<usize>(), fields[2].parse::<usize>()) {
                return Region::new(fields[0], start, end);
            }
        }
        fields[0].parse().map_err(|e: String| {
            if fields.len() >= 3 {
                format!("invalid BED coordinates '{}' '{}' ({e})", fields[1], fields[2])
            } else {
                e
            }
        })
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let caps = key_regex()
            .captures(key)
            .ok_or_else(|| format!("'{key}' is not of the form chrom:start-end"))?;
        if caps.name("suffix").is_some() {
            return Err(format!("unexpected suffix in region key '{key}'"));
        }
        Region::from_query_id(key)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start + 1, self.end)
    }
}

// Natural chromosome order (chr2 < chr10), then coordinates
impl Ord for Region {
    fn cmp(&self, other: &Self) -> Ordering {
        natord::compare(&self.chrom, &other.chrom)
            .then_with(|| self.chrom.cmp(&other.chrom))
            .then_with(|| self.start.cmp(&other.start))
            .then_with(|| self.end.cmp(&other.end))
    }
}

impl PartialOrd for Region {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Read a ROI file. Malformed lines are logged and skipped.
pub fn read_rois(path: &Path) -> Result<Vec<Region>, PrepError> {
    let reader = BufReader::new(File::open(path)?);
    let mut regions = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match Region::from_roi_line(trimmed) {
            Ok(region) => regions.push(region),
            Err(reason) => warn!(
                "{}",
                PrepError::MalformedInputLine {
                    line_number: idx + 1,
                    reason
                }
            ),
        }
    }

    Ok(regions)
}
