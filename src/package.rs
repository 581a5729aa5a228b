//! Output directory layout and archiving
//!
//! ```text
//! <output>/
//!   rois                           surviving region keys, one per line
//!   rois_copies_coords/<key>       copies recorded for each surviving region
//!   miniFASTA/<key>.fa             padded window (+ .fai and BWA index files)
//!   armadillo_reference_genome.fa  all windows concatenated (+ .fai)
//! ```

use crate::error::PrepError;
use crate::external::Indexer;
use crate::region::Region;
use crate::window::FastaWindow;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const COPIES_DIR: &str = "rois_copies_coords";
pub const WINDOWS_DIR: &str = "miniFASTA";
pub const MERGED_REFERENCE: &str = "armadillo_reference_genome.fa";
pub const MANIFEST: &str = "rois";

pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    /// Create a fresh output directory. An existing one is never reused.
    pub fn create(root: &Path) -> Result<Self, PrepError> {
        if root.exists() {
            return Err(PrepError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Output directory '{}' already exists", root.display()),
            )));
        }
        fs::create_dir_all(root.join(COPIES_DIR))?;
        fs::create_dir_all(root.join(WINDOWS_DIR))?;
        Ok(OutputDir {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn window_path(&self, region: &Region) -> PathBuf {
        self.root.join(WINDOWS_DIR).join(format!("{region}.fa"))
    }

    pub fn write_copies(&self, region: &Region, copies: &BTreeSet<Region>) -> Result<(), PrepError> {
        let mut writer = BufWriter::new(File::create(self.root.join(COPIES_DIR).join(region.to_string()))?);
        for copy in copies {
            writeln!(writer, "{copy}")?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_window(&self, window: &FastaWindow) -> Result<PathBuf, PrepError> {
        let path = self.window_path(&window.region);
        let mut writer = BufWriter::new(File::create(&path)?);
        window.write_fasta(&mut writer)?;
        writer.flush()?;
        Ok(path)
    }

    pub fn write_merged_reference(&self, windows: &[FastaWindow]) -> Result<PathBuf, PrepError> {
        let path = self.root.join(MERGED_REFERENCE);
        let mut writer = BufWriter::new(File::create(&path)?);
        for window in windows {
            window.write_fasta(&mut writer)?;
        }
        writer.flush()?;
        Ok(path)
    }

    pub fn write_manifest<'a, I>(&self, regions: I) -> Result<PathBuf, PrepError>
    where
        I: IntoIterator<Item = &'a Region>,
    {
        let path = self.root.join(MANIFEST);
        let mut writer = BufWriter::new(File::create(&path)?);
        for region in regions {
            writeln!(writer, "{region}")?;
        }
        writer.flush()?;
        Ok(path)
    }

    /// Index the merged reference and every window FASTA.
    ///
    /// Failures are logged and skipped; returns how many files failed.
    pub fn index_all<X: Indexer + ?Sized>(
        &self,
        indexer: &X,
        merged_reference: &Path,
        windows: &[PathBuf],
    ) -> usize {
        let mut failures = 0;

        if let Err(e) = indexer.index_reference(merged_reference) {
            warn!("Skipping index of {}: {e}", merged_reference.display());
            failures += 1;
        }

        for window in windows {
            let fai = PathBuf::from(format!("{}.fai", window.display()));
            if fai.exists() {
                debug!("{} already indexed", window.display());
                continue;
            }
            if let Err(e) = indexer.index_window(window) {
                warn!("Skipping index of {}: {e}", window.display());
                failures += 1;
            }
        }

        failures
    }
}

/// Write `dir` as a gzipped tarball rooted at the directory's own name
pub fn archive(dir: &Path, archive_path: &Path) -> Result<(), PrepError> {
    let name = dir.file_name().ok_or_else(|| {
        PrepError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Cannot archive '{}': no directory name", dir.display()),
        ))
    })?;

    let encoder = GzEncoder::new(File::create(archive_path)?, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(name, dir)?;
    builder.into_inner()?.finish()?;

    info!("Wrote {}", archive_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingIndexer {
        calls: RefCell<Vec<String>>,
        fail_on: Option<String>,
    }

    impl Indexer for RecordingIndexer {
        fn index_reference(&self, fasta: &Path) -> Result<(), PrepError> {
            self.calls.borrow_mut().push(format!("faidx {}", fasta.display()));
            Ok(())
        }

        fn index_window(&self, fasta: &Path) -> Result<(), PrepError> {
            let name = fasta.file_name().unwrap().to_string_lossy().into_owned();
            if self.fail_on.as_deref() == Some(name.as_str()) {
                return Err(PrepError::ExternalToolFailure {
                    tool: "bwa".to_string(),
                    status: Some(1),
                    stderr: String::new(),
                });
            }
            self.calls.borrow_mut().push(format!("window {name}"));
            Ok(())
        }
    }

    fn window(key: &str) -> FastaWindow {
        let region: Region = key.parse().unwrap();
        FastaWindow {
            window: region.clone(),
            region,
            sequence: b"ACGT".to_vec(),
        }
    }

    #[test]
    fn test_existing_output_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let err = OutputDir::create(temp_dir.path()).err().unwrap();
        assert!(matches!(err, PrepError::Io(e) if e.kind() == io::ErrorKind::AlreadyExists));
    }

    #[test]
    fn test_layout_and_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let out = OutputDir::create(&temp_dir.path().join("out")).unwrap();
        let windows = vec![window("chr1:1-4"), window("chr2:11-14")];

        let path = out.write_window(&windows[0]).unwrap();
        assert_eq!(path, out.root().join("miniFASTA").join("chr1:1-4.fa"));
        assert_eq!(fs::read_to_string(&path).unwrap(), ">chr1:1-4\nACGT\n");

        let merged = out.write_merged_reference(&windows).unwrap();
        assert_eq!(
            fs::read_to_string(merged).unwrap(),
            ">chr1:1-4\nACGT\n>chr2:11-14\nACGT\n"
        );

        let copies: BTreeSet<Region> = BTreeSet::from(["chr5:1-4".parse().unwrap(), "chr1:1-4".parse().unwrap()]);
        out.write_copies(&windows[0].region, &copies).unwrap();
        assert_eq!(
            fs::read_to_string(out.root().join(COPIES_DIR).join("chr1:1-4")).unwrap(),
            "chr1:1-4\nchr5:1-4\n"
        );

        let manifest = out.write_manifest(windows.iter().map(|w| &w.region)).unwrap();
        assert_eq!(fs::read_to_string(manifest).unwrap(), "chr1:1-4\nchr2:11-14\n");
    }

    #[test]
    fn test_indexing_failures_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let out = OutputDir::create(&temp_dir.path().join("out")).unwrap();
        let windows = vec![window("chr1:1-4"), window("chr2:11-14"), window("chr3:1-4")];
        let paths: Vec<PathBuf> = windows.iter().map(|w| out.write_window(w).unwrap()).collect();
        let merged = out.write_merged_reference(&windows).unwrap();
        // Already indexed, must not be redone
        fs::write(format!("{}.fai", paths[2].display()), "").unwrap();

        let indexer = RecordingIndexer {
            fail_on: Some("chr1:1-4.fa".to_string()),
            ..Default::default()
        };
        let failures = out.index_all(&indexer, &merged, &paths);
        assert_eq!(failures, 1);
        assert_eq!(
            indexer.calls.into_inner(),
            vec![
                format!("faidx {}", merged.display()),
                "window chr2:11-14.fa".to_string()
            ]
        );
    }

    #[test]
    fn test_archive_contains_directory() {
        let temp_dir = TempDir::new().unwrap();
        let out = OutputDir::create(&temp_dir.path().join("armadillo_data")).unwrap();
        out.write_manifest(std::iter::empty()).unwrap();

        let tarball = temp_dir.path().join("armadillo_data.tar.gz");
        archive(out.root(), &tarball).unwrap();

        let mut entries: Vec<String> = tar::Archive::new(GzDecoder::new(File::open(&tarball).unwrap()))
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().trim_end_matches('/').to_string())
            .collect();
        entries.sort();
        assert_eq!(
            entries,
            vec![
                "armadillo_data",
                "armadillo_data/miniFASTA",
                "armadillo_data/rois",
                "armadillo_data/rois_copies_coords",
            ]
        );
    }
}
