use std::io::Error as IoError;

/// Everything that can go wrong while preparing armadillo data.
///
/// Only `Io` and `ExternalToolFailure` from the top-level search are fatal;
/// the pipeline recovers from the other variants per region or per file.
#[derive(Debug)]
pub enum PrepError {
    /// A hit or ROI line that could not be parsed.
    MalformedInputLine { line_number: usize, reason: String },
    /// Chromosome missing from the reference, or an interval outside it.
    ReferenceLookupError { chrom: String, reason: String },
    /// An external tool could not be started or exited unsuccessfully.
    ExternalToolFailure {
        tool: String,
        status: Option<i32>,
        stderr: String,
    },
    /// No region survived filtering. Logged, never fatal.
    EmptyResultWarning,
    Io(IoError),
}

impl std::fmt::Display for PrepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrepError::MalformedInputLine {
                line_number,
                reason,
            } => write!(f, "Malformed input at line {line_number}: {reason}"),
            PrepError::ReferenceLookupError { chrom, reason } => {
                write!(f, "Reference lookup failed for '{chrom}': {reason}")
            }
            PrepError::ExternalToolFailure {
                tool,
                status,
                stderr,
            } => {
                match status {
                    Some(code) => write!(f, "'{tool}' exited with status {code}")?,
                    None => write!(f, "'{tool}' was terminated or could not be started")?,
                }
                let stderr = stderr.trim();
                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }
                Ok(())
            }
            PrepError::EmptyResultWarning => write!(f, "No region survived filtering"),
            PrepError::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for PrepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PrepError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<IoError> for PrepError {
    fn from(e: IoError) -> Self {
        PrepError::Io(e)
    }
}

impl From<PrepError> for IoError {
    fn from(e: PrepError) -> Self {
        match e {
            PrepError::Io(e) => e,
            other => IoError::other(other.to_string()),
        }
    }
}
