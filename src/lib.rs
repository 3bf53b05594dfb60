//! # gff-features
//!
//! Filter rows of a GFF-style annotation table by feature type, contig and
//! genomic-coordinate interval.
//!
//! ## Overview
//!
//! An annotation table is a headerless, tab-separated file whose columns are
//! addressed by 0-based index. This crate loads such a table into a
//! [`Dataset`] and narrows it with a single [`FilterCriteria`] value:
//!
//! 1. keep rows whose feature column equals the desired feature;
//! 2. if a contig is given, keep rows on that contig;
//! 3. if a start bound is given, keep rows with `start >= bound`;
//! 4. if a stop bound is given, keep rows with `stop <= bound`.
//!
//! Each stage only sees the survivors of the previous one, and the result keeps
//! the input's row order. Comparisons on feature and contig are exact.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gff_features::{features_from_gff, FilterCriteria};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let criteria = FilterCriteria::new(2, "gene")
//!         .contig("Scaffold_1531")
//!         .start(1)
//!         .stop(6_000_000);
//!
//!     let genes = features_from_gff("annotation.gff3", &criteria)?;
//!     for row in &genes {
//!         println!("{row}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Filtering an in-memory table
//!
//! ```
//! use gff_features::{filter, table::{Dataset, Row}, FilterCriteria};
//!
//! let dataset = Dataset::from_rows(vec![
//!     Row::from_iter(["Scaffold_1", "gene", "100", "200"]),
//!     Row::from_iter(["Scaffold_2", "gene", "50", "80"]),
//!     Row::from_iter(["Scaffold_1", "mRNA", "100", "200"]),
//! ])
//! .unwrap();
//!
//! let genes = filter(&dataset, &FilterCriteria::new(1, "gene")).unwrap();
//! assert_eq!(genes.len(), 2);
//!
//! let on_scaffold_1 = filter(&dataset, &FilterCriteria::new(1, "gene").contig("Scaffold_1")).unwrap();
//! assert_eq!(on_scaffold_1.len(), 1);
//! ```
//!
//! ## Feature Flags
//!
//! - `cli`: build the `gff-features` binary (adds `clap` and `simple_logger`)
//! - `rayon`: enable [`par_filter`] (adds `rayon`)
//! - `mmap`: enable memory-mapped reading (adds `memmap2`)
//! - `gzip`, `zstd`, `bz2`: read compressed tables, detected from the extension
//! - `compression`: alias for `gzip`

#![cfg_attr(doc, warn(missing_docs))]

pub mod criteria;
pub mod filter;
pub mod reader;
pub mod table;

use std::fmt;
use std::path::Path;

pub use criteria::{ContigSelector, FilterCriteria, FilterPlan, ALL_CONTIGS};
#[cfg(feature = "rayon")]
pub use filter::par_filter;
pub use filter::{filter, FilterError, FilterResult};
#[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
pub use reader::Compression;
pub use reader::{Reader, ReaderBuilder, ReaderError, ReaderMode, ReaderResult};
pub use table::{Dataset, Row, TableError};

/// Result alias for [`features_from_gff`].
pub type Result<T> = std::result::Result<T, Error>;

/// Any error raised while loading and filtering a table.
#[derive(Debug)]
pub enum Error {
    /// The table could not be loaded.
    Reader(ReaderError),
    /// The criteria could not be applied to the table.
    Filter(FilterError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Reader(err) => err.fmt(f),
            Error::Filter(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Reader(err) => Some(err),
            Error::Filter(err) => Some(err),
        }
    }
}

impl From<ReaderError> for Error {
    fn from(err: ReaderError) -> Self {
        Error::Reader(err)
    }
}

impl From<FilterError> for Error {
    fn from(err: FilterError) -> Self {
        Error::Filter(err)
    }
}

/// Loads the table at `path` and returns the rows matching `criteria`.
///
/// The selected [`FilterPlan`] is logged at `info` level before filtering.
///
/// A missing file surfaces as [`ReaderError::Io`]; no matches is an empty
/// [`Dataset`], not an error.
pub fn features_from_gff<P: AsRef<Path>>(path: P, criteria: &FilterCriteria) -> Result<Dataset> {
    let dataset = Reader::from_path(path)?.read_dataset()?;
    log::info!("{}", criteria.plan());
    Ok(filter(&dataset, criteria)?)
}
