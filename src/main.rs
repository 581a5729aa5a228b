use armadillo_prep::commands::prepare::{run_prepare, PrepConfig};
use armadillo_prep::commands::queries::search_rois;
use armadillo_prep::external::ExternalIndexer;
use armadillo_prep::faidx::FastaIndex;
use armadillo_prep::hit_filter::FilterConfig;
use armadillo_prep::package::OutputDir;
use armadillo_prep::region::read_rois;
use armadillo_prep::window::DEFAULT_PADDING;
use clap::Parser;
use log::info;
use rayon::ThreadPoolBuilder;
use std::fs::File;
use std::io::{self, BufReader};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Prepares the data needed by armadillo from alignment hits of the regions of interest.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Reference genome FASTA (indexed on the fly if `.fai` is missing)
    #[clap(short = 'g', long, value_parser)]
    reference: PathBuf,

    /// BLAST8 hits of the query regions, grouped by query (1-based `chrom:start-end[_len]` query ids)
    #[clap(short = 'i', long, value_parser, required_unless_present = "rois", conflicts_with = "rois")]
    hits: Option<PathBuf>,

    /// Regions of interest (1-based `chrom:start-end` or 0-based BED); searched against the reference with blat
    #[clap(short = 'r', long, value_parser)]
    rois: Option<PathBuf>,

    /// Minimum identity for a hit to be considered a copy of the ROI
    #[clap(short = 'I', long, value_parser, default_value_t = 90)]
    identity: u32,

    /// Maximum length difference allowed between each hit and the input sequence (%)
    #[clap(short = 'L', long, value_parser, default_value_t = 15)]
    lendiff: u32,

    /// Minimum length (bp) allowed to each region
    #[clap(short = 'm', long, value_parser, default_value_t = 100)]
    mlen: usize,

    /// Name of the output directory; the archive is written as <name>.tar.gz
    #[clap(short = 'o', long, value_parser, default_value = "armadillo_data")]
    output_name: String,

    /// Number of threads for parallel hit filtering.
    #[clap(short = 't', long, value_parser, default_value_t = NonZeroUsize::new(4).unwrap())]
    threads: NonZeroUsize,

    /// Verbosity level (0 = warn, 1 = info, 2 = debug)
    #[clap(short, long, default_value = "0")]
    verbose: u8,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    ThreadPoolBuilder::new()
        .num_threads(args.threads.into())
        .build_global()
        .map_err(|e| io::Error::other(format!("Failed to build thread pool: {e}")))?;

    let config = PrepConfig {
        filter: FilterConfig {
            identity_threshold: args.identity as f64,
            length_diff_percent: args.lendiff as f64,
            ..FilterConfig::default()
        },
        min_region_length: args.mlen,
        padding: DEFAULT_PADDING,
        archive_path: Some(PathBuf::from(format!("{}.tar.gz", args.output_name))),
    };

    let reference = FastaIndex::open(&args.reference)?;
    info!(
        "Loaded reference {} ({} sequences)",
        args.reference.display(),
        reference.len()
    );
    let output = OutputDir::create(&PathBuf::from(&args.output_name))?;

    // Kept alive until the hits have been consumed
    let work_dir = tempfile::Builder::new().prefix("armadillo-prep").tempdir()?;
    let hits_path = match (args.hits, args.rois) {
        (Some(hits), _) => hits,
        (None, Some(rois)) => {
            let rois = read_rois(&rois)?;
            info!("Read {} regions of interest", rois.len());
            search_rois(
                &rois,
                &reference,
                config.min_region_length,
                &PathBuf::from("blat"),
                &args.reference,
                work_dir.path(),
            )?
        }
        (None, None) => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Either --hits or --rois must be provided",
            ))
        }
    };

    let hits = BufReader::new(File::open(&hits_path)?);
    let summary = run_prepare(
        hits,
        &reference,
        &ExternalIndexer::default(),
        &output,
        &config,
    )?;

    info!(
        "{} query groups, {} with copies, {} canonical regions, {} windows written ({} lookup failures, {} duplicates without a window, {} indexing failures)",
        summary.query_groups,
        summary.valid_queries,
        summary.surviving,
        summary.windows_written,
        summary.lookup_failures,
        summary.orphaned_duplicates,
        summary.index_failures
    );

    Ok(())
}
