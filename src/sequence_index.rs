use crate::error::PrepError;
use rustc_hash::FxHashMap;

// Trait for sequence fetching from different sources
pub trait SequenceStore {
    fn sequence_length(&self, seq_name: &str) -> Result<usize, PrepError>;

    /// Fetch `[start, end)` of `seq_name`, uppercased
    fn fetch_sequence(&self, seq_name: &str, start: usize, end: usize)
        -> Result<Vec<u8>, PrepError>;
}

/// Check that `[start, end)` lies within a sequence of length `len`
pub fn check_interval(seq_name: &str, start: usize, end: usize, len: usize) -> Result<(), PrepError> {
    if start >= end || end > len {
        return Err(PrepError::ReferenceLookupError {
            chrom: seq_name.to_string(),
            reason: format!(
                "interval [{start}, {end}) is outside the sequence (length {len})"
            ),
        });
    }
    Ok(())
}

pub(crate) fn not_found(seq_name: &str) -> PrepError {
    PrepError::ReferenceLookupError {
        chrom: seq_name.to_string(),
        reason: "sequence not found in reference".to_string(),
    }
}

/// Sequences held in memory, keyed by name
#[derive(Debug, Default, Clone)]
pub struct InMemorySequences {
    sequences: FxHashMap<String, Vec<u8>>,
}

impl InMemorySequences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, seq_name: &str, sequence: &[u8]) {
        self.sequences
            .insert(seq_name.to_string(), sequence.to_ascii_uppercase());
    }
}

impl SequenceStore for InMemorySequences {
    fn sequence_length(&self, seq_name: &str) -> Result<usize, PrepError> {
        self.sequences
            .get(seq_name)
            .map(Vec::len)
            .ok_or_else(|| not_found(seq_name))
    }

    fn fetch_sequence(
        &self,
        seq_name: &str,
        start: usize,
        end: usize,
    ) -> Result<Vec<u8>, PrepError> {
        let sequence = self.sequences.get(seq_name).ok_or_else(|| not_found(seq_name))?;
        check_interval(seq_name, start, end, sequence.len())?;
        Ok(sequence[start..end].to_vec())
    }
}
