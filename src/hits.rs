//! BLAST8 (tabular) hit parsing
//!
//! Column layout, as written by BLAT `-out=blast8`:
//! query, target, identity%, alnLen, mismatches, gapOpenings,
//! qStart, qEnd, tStart, tEnd, evalue, bitscore.
//! Coordinates are 1-based inclusive; reverse-strand hits have tStart > tEnd.

use crate::region::Region;
use std::num::ParseFloatError;
use std::num::ParseIntError;

const MIN_FIELDS: usize = 10;

#[derive(Debug, PartialEq)]
pub enum HitParseErr {
    NotEnoughFields(usize),
    InvalidInt(&'static str, ParseIntError),
    InvalidFloat(&'static str, ParseFloatError),
    InvalidQuery(String),
    ZeroCoordinate(&'static str),
}

impl std::fmt::Display for HitParseErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HitParseErr::NotEnoughFields(n) => write!(
                f,
                "Not enough fields in hit record (found {n}, need at least {MIN_FIELDS})"
            ),
            HitParseErr::InvalidInt(column, e) => write!(f, "Invalid {column}: {e}"),
            HitParseErr::InvalidFloat(column, e) => write!(f, "Invalid {column}: {e}"),
            HitParseErr::InvalidQuery(msg) => write!(f, "Invalid query identifier: {msg}"),
            HitParseErr::ZeroCoordinate(column) => {
                write!(f, "Invalid {column}: coordinates are 1-based, found 0")
            }
        }
    }
}

impl std::error::Error for HitParseErr {}

#[derive(Debug, Clone, PartialEq)]
pub struct HitRecord {
    pub query_id: String,
    /// Region embedded in the query identifier
    pub query: Region,
    pub target_name: String,
    pub identity: f64,
    pub alignment_length: usize,
    pub mismatches: usize,
    pub gap_count: usize,
    pub query_start: usize,
    pub query_end: usize,
    pub target_start: usize,
    pub target_end: usize,
    pub evalue: Option<f64>,
    pub bit_score: Option<f64>,
}

impl HitRecord {
    pub fn parse_line(line: &str) -> Result<Self, HitParseErr> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_FIELDS {
            return Err(HitParseErr::NotEnoughFields(fields.len()));
        }

        let int = |idx: usize, column: &'static str| {
            fields[idx]
                .parse::<usize>()
                .map_err(|e| HitParseErr::InvalidInt(column, e))
        };
        let coord = |idx: usize, column: &'static str| -> Result<usize, HitParseErr> {
            match int(idx, column)? {
                0 => Err(HitParseErr::ZeroCoordinate(column)),
                value => Ok(value),
            }
        };
        let float = |idx: usize, column: &'static str| {
            fields[idx]
                .parse::<f64>()
                .map_err(|e| HitParseErr::InvalidFloat(column, e))
        };

        let query = Region::from_query_id(fields[0]).map_err(HitParseErr::InvalidQuery)?;

        Ok(HitRecord {
            query_id: fields[0].to_string(),
            query,
            target_name: fields[1].to_string(),
            identity: float(2, "identity")?,
            alignment_length: int(3, "alignment length")?,
            mismatches: int(4, "mismatches")?,
            gap_count: int(5, "gap count")?,
            query_start: coord(6, "query start")?,
            query_end: coord(7, "query end")?,
            target_start: coord(8, "target start")?,
            target_end: coord(9, "target end")?,
            evalue: fields.get(10).and_then(|v| v.parse().ok()),
            bit_score: fields.get(11).and_then(|v| v.parse().ok()),
        })
    }

    /// Target locus with the lower coordinate as start, converted to a
    /// 0-based half-open region. Strand-independent. Its key is the 1-based
    /// `tname:min-max` BLAST8 reports, so a self-hit matches its query key.
    pub fn normalized_target(&self) -> Region {
        let (low, high) = if self.target_start <= self.target_end {
            (self.target_start, self.target_end)
        } else {
            (self.target_end, self.target_start)
        };
        Region {
            chrom: self.target_name.clone(),
            start: low - 1,
            end: high,
        }
    }

    /// Alignment length as a percentage of the query region length
    pub fn length_ratio_percent(&self) -> f64 {
        (self.alignment_length as f64 * 100.0) / self.query.len() as f64
    }
}
