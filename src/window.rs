use crate::error::PrepError;
use crate::region::Region;
use crate::sequence_index::{check_interval, SequenceStore};
use log::warn;
use std::io::{self, Write};

/// Flank added on both sides of a region so reads overlapping only the
/// edges still align to the window
pub const DEFAULT_PADDING: usize = 100;

/// Padded sequence around one surviving region
#[derive(Debug, Clone, PartialEq)]
pub struct FastaWindow {
    /// The region the window was built for
    pub region: Region,
    /// The padded interval actually extracted
    pub window: Region,
    pub sequence: Vec<u8>,
}

impl FastaWindow {
    pub fn header(&self) -> String {
        self.window.to_string()
    }

    pub fn write_fasta<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, ">{}", self.header())?;
        writer.write_all(&self.sequence)?;
        writeln!(writer)
    }
}

/// Extract `[start - padding, end + padding)` around `region`, clamped to the
/// chromosome. Clamping is logged as a warning.
pub fn extract_window<S: SequenceStore + ?Sized>(
    store: &S,
    region: &Region,
    padding: usize,
) -> Result<FastaWindow, PrepError> {
    let chrom_len = store.sequence_length(&region.chrom)?;
    check_interval(&region.chrom, region.start, region.end, chrom_len)?;

    let window = Region {
        chrom: region.chrom.clone(),
        start: region.start.saturating_sub(padding),
        end: region.end.saturating_add(padding).min(chrom_len),
    };
    if window.start + padding != region.start || window.end - region.end != padding {
        warn!("Window around {region} clamped to {window} (sequence length {chrom_len})");
    }

    let sequence = store.fetch_sequence(&region.chrom, window.start, window.end)?;
    Ok(FastaWindow {
        region: region.clone(),
        window,
        sequence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence_index::InMemorySequences;

    fn store() -> InMemorySequences {
        let mut store = InMemorySequences::new();
        let sequence: Vec<u8> = b"ACGT".iter().cycle().take(1000).copied().collect();
        store.insert("chr1", &sequence);
        store
    }

    #[test]
    fn test_window_is_padded_on_both_sides() {
        let region = Region::new("chr1", 300, 500).unwrap();
        let window = extract_window(&store(), &region, DEFAULT_PADDING).unwrap();
        assert_eq!(window.header(), "chr1:201-600");
        assert_eq!(window.sequence.len(), region.len() + 2 * DEFAULT_PADDING);
    }

    #[test]
    fn test_window_is_clamped_at_sequence_edges() {
        let store = store();
        let left = extract_window(&store, &Region::new("chr1", 40, 240).unwrap(), 100).unwrap();
        assert_eq!(left.header(), "chr1:1-340");
        assert_eq!(left.sequence.len(), 340);

        let right = extract_window(&store, &Region::new("chr1", 800, 950).unwrap(), 100).unwrap();
        assert_eq!(right.header(), "chr1:701-1000");
        assert_eq!(right.sequence.len(), 300);
    }

    #[test]
    fn test_unknown_chromosome_is_a_lookup_error() {
        let region = Region::new("chr9", 300, 500).unwrap();
        assert!(matches!(
            extract_window(&store(), &region, 100),
            Err(PrepError::ReferenceLookupError { .. })
        ));
    }

    #[test]
    fn test_region_past_the_end_is_a_lookup_error() {
        let region = Region::new("chr1", 900, 1200).unwrap();
        assert!(extract_window(&store(), &region, 100).is_err());
    }

    #[test]
    fn test_fasta_record_format() {
        let window = FastaWindow {
            region: Region::new("chr1", 100, 104).unwrap(),
            window: Region::new("chr1", 98, 106).unwrap(),
            sequence: b"ACGTACGT".to_vec(),
        };
        let mut out = Vec::new();
        window.write_fasta(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), ">chr1:99-106\nACGTACGT\n");
    }
}
