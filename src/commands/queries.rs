use crate::error::PrepError;
use crate::external::run_search;
use crate::region::Region;
use crate::sequence_index::SequenceStore;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write one FASTA record per ROI, named by its query identifier
/// (`chrom:start-end_length`). Short or unresolvable regions are skipped.
///
/// Returns the number of records written.
pub fn write_query_fasta<S: SequenceStore + ?Sized>(
    rois: &[Region],
    store: &S,
    min_region_length: usize,
    out_path: &Path,
) -> Result<usize, PrepError> {
    let mut writer = BufWriter::new(File::create(out_path)?);
    let mut written = 0;

    for roi in rois {
        if roi.len() < min_region_length {
            debug!("Skipping {roi}: shorter than {min_region_length} bp");
            continue;
        }
        let sequence = match store.fetch_sequence(&roi.chrom, roi.start, roi.end) {
            Ok(sequence) => sequence,
            Err(e) => {
                warn!("Skipping {roi}: {e}");
                continue;
            }
        };
        writeln!(writer, ">{}", roi.query_id())?;
        writer.write_all(&sequence)?;
        writeln!(writer)?;
        written += 1;
    }

    writer.flush()?;
    Ok(written)
}

/// Produce a BLAST8 hit file for the ROIs by aligning them back to the
/// reference. Any failure of the search tool is returned as an error.
///
/// When no ROI yields a query the search is skipped and the hit file is
/// left empty.
pub fn search_rois<S: SequenceStore + ?Sized>(
    rois: &[Region],
    store: &S,
    min_region_length: usize,
    blat: &Path,
    reference: &Path,
    work_dir: &Path,
) -> Result<std::path::PathBuf, PrepError> {
    let queries = work_dir.join("queries.fa");
    let hits = work_dir.join("hits.blast8");

    let written = write_query_fasta(rois, store, min_region_length, &queries)?;
    if written == 0 {
        warn!(
            "None of the {} regions of interest could be searched; skipping {}",
            rois.len(),
            blat.display()
        );
        File::create(&hits)?;
        return Ok(hits);
    }
    info!(
        "Searching {written} of {} regions against {}",
        rois.len(),
        reference.display()
    );

    run_search(blat, reference, &queries, &hits)?;
    Ok(hits)
}
