use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;

use gff_features::{
    criteria::{ALL_CONTIGS, DEFAULT_CONTIG_COLUMN, DEFAULT_START_COLUMN, DEFAULT_STOP_COLUMN},
    filter, FilterCriteria, Reader,
};

/// Filter a GFF-style annotation table by feature, contig and interval.
///
/// Matching rows are printed to stdout as tab-separated lines.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the tab-separated annotation table (no header)
    #[arg(short, long)]
    input: PathBuf,

    /// 0-based column holding feature types
    #[arg(short = 'f', long)]
    features_column: usize,

    /// Feature type to keep (exact match), e.g. gene or mRNA
    #[arg(short = 'F', long)]
    feature: String,

    /// 0-based column holding contig names
    #[arg(long, default_value_t = DEFAULT_CONTIG_COLUMN)]
    contig_column: usize,

    /// Contig to keep, or 'all' to keep every contig
    #[arg(short, long, default_value = ALL_CONTIGS)]
    contig: String,

    /// 0-based column holding start coordinates
    #[arg(long, default_value_t = DEFAULT_START_COLUMN)]
    start_column: usize,

    /// 0-based column holding stop coordinates
    #[arg(long, default_value_t = DEFAULT_STOP_COLUMN)]
    stop_column: usize,

    /// Keep rows whose start is >= this position
    #[arg(short, long, allow_negative_numbers = true)]
    start: Option<i64>,

    /// Keep rows whose stop is <= this position
    #[arg(short = 'e', long, allow_negative_numbers = true)]
    stop: Option<i64>,

    /// Treat lines starting with '#' as data
    #[arg(long)]
    keep_comments: bool,

    /// Logging verbosity level
    #[arg(short = 'L', long, value_enum, default_value_t = Level::Info)]
    level: Level,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => LevelFilter::Trace,
            Level::Debug => LevelFilter::Debug,
            Level::Info => LevelFilter::Info,
            Level::Warn => LevelFilter::Warn,
            Level::Error => LevelFilter::Error,
        }
    }
}

fn main() {
    let args = Args::parse();

    if let Err(err) = SimpleLogger::new().with_level(args.level.into()).init() {
        eprintln!("ERROR: could not initialize logger: {err}");
        std::process::exit(1);
    }

    if let Err(err) = run(args) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let criteria = FilterCriteria::new(args.features_column, args.feature)
        .contig_column(args.contig_column)
        .contig(args.contig)
        .start_column(args.start_column)
        .stop_column(args.stop_column)
        .start_opt(args.start)
        .stop_opt(args.stop);

    let mut builder = Reader::builder().from_path(&args.input);
    if args.keep_comments {
        builder = builder.keep_comments();
    }
    let dataset = builder.build()?.read_dataset()?;
    info!(
        "loaded {} rows from {}",
        dataset.len(),
        args.input.display()
    );

    info!("{}", criteria.plan());
    let kept = filter(&dataset, &criteria)?;
    info!("kept {} of {} rows", kept.len(), dataset.len());

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for row in &kept {
        writeln!(out, "{row}")?;
    }
    out.flush()?;

    Ok(())
}
