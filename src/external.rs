//! Calls into external tools (samtools, bwa, blat).
//!
//! Every invocation goes through [`run_tool`], which captures stderr and turns
//! a failed spawn or a non-zero exit status into
//! [`PrepError::ExternalToolFailure`].

use crate::error::PrepError;
use log::debug;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub fn run_tool<I, S>(program: &Path, args: I) -> Result<(), PrepError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let tool = program.display().to_string();
    let mut command = Command::new(program);
    command.args(args).stdout(Stdio::null()).stderr(Stdio::piped());
    debug!("Running {command:?}");

    let output = command
        .output()
        .map_err(|e| PrepError::ExternalToolFailure {
            tool: tool.clone(),
            status: None,
            stderr: e.to_string(),
        })?;

    if output.status.success() {
        Ok(())
    } else {
        Err(PrepError::ExternalToolFailure {
            tool,
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Builds the sibling index files armadillo expects next to each FASTA
pub trait Indexer {
    /// `.fai` for the merged reference
    fn index_reference(&self, fasta: &Path) -> Result<(), PrepError>;
    /// BWA index plus `.fai` for one window FASTA
    fn index_window(&self, fasta: &Path) -> Result<(), PrepError>;
}

/// Indexes with `samtools faidx` and `bwa index`
#[derive(Debug, Clone)]
pub struct ExternalIndexer {
    pub samtools: PathBuf,
    pub bwa: PathBuf,
}

impl Default for ExternalIndexer {
    fn default() -> Self {
        ExternalIndexer {
            samtools: PathBuf::from("samtools"),
            bwa: PathBuf::from("bwa"),
        }
    }
}

impl Indexer for ExternalIndexer {
    fn index_reference(&self, fasta: &Path) -> Result<(), PrepError> {
        run_tool(&self.samtools, [OsStr::new("faidx"), fasta.as_os_str()])
    }

    fn index_window(&self, fasta: &Path) -> Result<(), PrepError> {
        run_tool(&self.bwa, [OsStr::new("index"), fasta.as_os_str()])?;
        run_tool(&self.samtools, [OsStr::new("faidx"), fasta.as_os_str()])
    }
}

/// Align query sequences against the reference, writing BLAST8 hits.
/// Failure here aborts the run.
pub fn run_search(
    blat: &Path,
    reference: &Path,
    queries: &Path,
    hits_out: &Path,
) -> Result<(), PrepError> {
    run_tool(
        blat,
        [
            reference.as_os_str(),
            queries.as_os_str(),
            OsStr::new("-out=blast8"),
            hits_out.as_os_str(),
        ],
    )
}
