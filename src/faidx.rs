use crate::error::PrepError;
use crate::sequence_index::{check_interval, not_found, SequenceStore};
use rust_htslib::faidx;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// Random access to an indexed reference FASTA.
///
/// Opening the reader creates `<reference>.fai` when it does not exist yet.
pub struct FastaIndex {
    pub fasta_path: PathBuf,
    pub sequence_lengths: FxHashMap<String, usize>,
    reader: faidx::Reader,
}

impl FastaIndex {
    pub fn open(fasta_path: &Path) -> Result<Self, PrepError> {
        let reader = faidx::Reader::from_path(fasta_path).map_err(|e| {
            PrepError::Io(std::io::Error::other(format!(
                "Failed to open FASTA file '{}': {e}",
                fasta_path.display()
            )))
        })?;

        let fai_path = PathBuf::from(format!("{}.fai", fasta_path.display()));
        let fai_content = std::fs::read_to_string(&fai_path).map_err(|e| {
            PrepError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read FASTA index '{}': {e}", fai_path.display()),
            ))
        })?;

        // name, length, offset, linebases, linewidth
        let mut sequence_lengths = FxHashMap::default();
        for line in fai_content.lines() {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() >= 2 && !fields[0].is_empty() {
                if let Ok(length) = fields[1].parse::<usize>() {
                    sequence_lengths.insert(fields[0].to_string(), length);
                }
            }
        }

        Ok(FastaIndex {
            fasta_path: fasta_path.to_path_buf(),
            sequence_lengths,
            reader,
        })
    }

    pub fn len(&self) -> usize {
        self.sequence_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence_lengths.is_empty()
    }
}

impl SequenceStore for FastaIndex {
    fn sequence_length(&self, seq_name: &str) -> Result<usize, PrepError> {
        self.sequence_lengths
            .get(seq_name)
            .copied()
            .ok_or_else(|| not_found(seq_name))
    }

    fn fetch_sequence(
        &self,
        seq_name: &str,
        start: usize,
        end: usize,
    ) -> Result<Vec<u8>, PrepError> {
        let len = self.sequence_length(seq_name)?;
        check_interval(seq_name, start, end, len)?;

        // fetch_seq expects a 0-based inclusive end coordinate
        match self.reader.fetch_seq(seq_name, start, end - 1) {
            Ok(seq) => {
                let mut seq_vec = seq.to_vec();
                unsafe { libc::free(seq.as_ptr() as *mut std::ffi::c_void) }; // Free up memory to avoid memory leak (bug https://github.com/rust-bio/rust-htslib/issues/401#issuecomment-1704290171)
                seq_vec.make_ascii_uppercase();
                Ok(seq_vec)
            }
            Err(e) => Err(PrepError::ReferenceLookupError {
                chrom: seq_name.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
