use std::fmt;

/// Contig value meaning "do not filter by contig".
pub const ALL_CONTIGS: &str = "all";

/// Default column holding the contig (seqid) in GFF files.
pub const DEFAULT_CONTIG_COLUMN: usize = 0;
/// Default column holding the start coordinate in GFF files.
pub const DEFAULT_START_COLUMN: usize = 3;
/// Default column holding the stop coordinate in GFF files.
pub const DEFAULT_STOP_COLUMN: usize = 4;

/// Selects which contigs survive the contig stage.
///
/// # Example
///
/// ```
/// use gff_features::criteria::ContigSelector;
///
/// assert_eq!(ContigSelector::from("all"), ContigSelector::All);
/// assert_eq!(
///     ContigSelector::from("Scaffold_1"),
///     ContigSelector::Named("Scaffold_1".into())
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ContigSelector {
    /// Keep rows from every contig.
    #[default]
    All,
    /// Keep rows whose contig column equals this value exactly.
    Named(String),
}

impl ContigSelector {
    /// Returns the contig name, or `None` for [`ContigSelector::All`].
    pub fn name(&self) -> Option<&str> {
        match self {
            ContigSelector::All => None,
            ContigSelector::Named(name) => Some(name),
        }
    }
}

impl From<&str> for ContigSelector {
    fn from(value: &str) -> Self {
        if value == ALL_CONTIGS {
            ContigSelector::All
        } else {
            ContigSelector::Named(value.to_string())
        }
    }
}

impl From<String> for ContigSelector {
    fn from(value: String) -> Self {
        if value == ALL_CONTIGS {
            ContigSelector::All
        } else {
            ContigSelector::Named(value)
        }
    }
}

impl fmt::Display for ContigSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContigSelector::All => f.write_str(ALL_CONTIGS),
            ContigSelector::Named(name) => f.write_str(name),
        }
    }
}

/// Describes which rows [`filter`](crate::filter::filter) keeps.
///
/// Only the feature column and value are required; everything else defaults
/// to the usual GFF layout with no contig or coordinate restriction.
///
/// # Example
///
/// ```
/// use gff_features::FilterCriteria;
///
/// let criteria = FilterCriteria::new(2, "gene")
///     .contig("Scaffold_1531")
///     .start(5_000_000);
///
/// assert_eq!(criteria.contig_name(), Some("Scaffold_1531"));
/// assert_eq!(criteria.start_bound(), Some(5_000_000));
/// assert_eq!(criteria.stop_bound(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    features_column: usize,
    desired_feature: String,
    contig_column: usize,
    desired_contig: ContigSelector,
    start_column: usize,
    stop_column: usize,
    start: Option<i64>,
    stop: Option<i64>,
}

impl FilterCriteria {
    /// Creates criteria matching `desired_feature` in `features_column`.
    pub fn new<S: Into<String>>(features_column: usize, desired_feature: S) -> Self {
        Self {
            features_column,
            desired_feature: desired_feature.into(),
            contig_column: DEFAULT_CONTIG_COLUMN,
            desired_contig: ContigSelector::All,
            start_column: DEFAULT_START_COLUMN,
            stop_column: DEFAULT_STOP_COLUMN,
            start: None,
            stop: None,
        }
    }

    /// Overrides the column holding contig names.
    pub fn contig_column(mut self, column: usize) -> Self {
        self.contig_column = column;
        self
    }

    /// Restricts rows to a contig. Passing `"all"` removes the restriction.
    pub fn contig<C: Into<ContigSelector>>(mut self, contig: C) -> Self {
        self.desired_contig = contig.into();
        self
    }

    /// Overrides the column holding start coordinates.
    pub fn start_column(mut self, column: usize) -> Self {
        self.start_column = column;
        self
    }

    /// Overrides the column holding stop coordinates.
    pub fn stop_column(mut self, column: usize) -> Self {
        self.stop_column = column;
        self
    }

    /// Keeps rows whose start coordinate is `>= start`.
    pub fn start(mut self, start: i64) -> Self {
        self.start = Some(start);
        self
    }

    /// Keeps rows whose stop coordinate is `<= stop`.
    pub fn stop(mut self, stop: i64) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Sets or clears the inclusive lower bound.
    pub fn start_opt(mut self, start: Option<i64>) -> Self {
        self.start = start;
        self
    }

    /// Sets or clears the inclusive upper bound.
    pub fn stop_opt(mut self, stop: Option<i64>) -> Self {
        self.stop = stop;
        self
    }

    /// Returns the column holding feature types.
    #[inline]
    pub fn features_column_index(&self) -> usize {
        self.features_column
    }

    /// Returns the feature type to keep.
    #[inline]
    pub fn desired_feature(&self) -> &str {
        &self.desired_feature
    }

    /// Returns the column holding contig names.
    #[inline]
    pub fn contig_column_index(&self) -> usize {
        self.contig_column
    }

    /// Returns the contig selector.
    #[inline]
    pub fn desired_contig(&self) -> &ContigSelector {
        &self.desired_contig
    }

    /// Returns the contig to keep, or `None` when all contigs are kept.
    #[inline]
    pub fn contig_name(&self) -> Option<&str> {
        self.desired_contig.name()
    }

    /// Returns the column holding start coordinates.
    #[inline]
    pub fn start_column_index(&self) -> usize {
        self.start_column
    }

    /// Returns the column holding stop coordinates.
    #[inline]
    pub fn stop_column_index(&self) -> usize {
        self.stop_column
    }

    /// Returns the inclusive lower bound, if any.
    #[inline]
    pub fn start_bound(&self) -> Option<i64> {
        self.start
    }

    /// Returns the inclusive upper bound, if any.
    #[inline]
    pub fn stop_bound(&self) -> Option<i64> {
        self.stop
    }

    /// Returns the combination of stages these criteria will run.
    pub fn plan(&self) -> FilterPlan<'_> {
        let feature = self.desired_feature.as_str();
        let contig = self.contig_name();
        match (self.start, self.stop) {
            (None, None) => match contig {
                None => FilterPlan::Feature { feature },
                Some(contig) => FilterPlan::FeatureOnContig { feature, contig },
            },
            (start, stop) => FilterPlan::Interval {
                feature,
                contig,
                start,
                stop,
            },
        }
    }
}

/// The stage combination selected by a [`FilterCriteria`].
///
/// Its `Display` output is the progress message callers log before filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPlan<'a> {
    /// Feature stage only.
    Feature {
        /// Feature type to keep.
        feature: &'a str,
    },
    /// Feature and contig stages.
    FeatureOnContig {
        /// Feature type to keep.
        feature: &'a str,
        /// Contig to keep.
        contig: &'a str,
    },
    /// Feature stage, optional contig stage, and at least one bound stage.
    Interval {
        /// Feature type to keep.
        feature: &'a str,
        /// Contig to keep, `None` for all contigs.
        contig: Option<&'a str>,
        /// Inclusive lower bound on the start column.
        start: Option<i64>,
        /// Inclusive upper bound on the stop column.
        stop: Option<i64>,
    },
}

impl fmt::Display for FilterPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterPlan::Feature { feature } => {
                write!(f, "filtering for every {feature} in the annotation table")
            }
            FilterPlan::FeatureOnContig { feature, contig } => {
                write!(f, "filtering for every {feature} on contig {contig}")
            }
            FilterPlan::Interval {
                feature,
                contig,
                start,
                stop,
            } => {
                write!(f, "filtering for every {feature}")?;
                match contig {
                    Some(contig) => write!(f, " on contig {contig}")?,
                    None => f.write_str(" on all contigs")?,
                }
                match (start, stop) {
                    (Some(start), Some(stop)) => write!(
                        f,
                        " using {start} and {stop} as the start and stop positions"
                    ),
                    (Some(start), None) => {
                        write!(f, " using {start} as a start base pair cutoff")
                    }
                    (None, Some(stop)) => write!(f, " using {stop} as a stop base pair cutoff"),
                    (None, None) => Ok(()),
                }
            }
        }
    }
}
