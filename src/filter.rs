use std::fmt;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::{
    criteria::FilterCriteria,
    table::{Dataset, Row},
};

/// Result alias for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// An error that can occur while filtering a [`Dataset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// A column referenced by the criteria does not exist in the dataset.
    ColumnOutOfRange {
        /// Which criterion referenced the column (`features`, `contig`, ...).
        role: &'static str,
        /// The requested 0-based column.
        column: usize,
        /// Number of columns in the dataset.
        width: usize,
    },
    /// A coordinate field could not be parsed as an integer.
    InvalidCoordinate {
        /// 0-based index of the row in the input dataset.
        row: usize,
        /// The 0-based column holding the coordinate.
        column: usize,
        /// The raw field value.
        value: String,
    },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::ColumnOutOfRange {
                role,
                column,
                width,
            } => write!(
                f,
                "ERROR: {role} column {column} is out of range for a table with {width} columns"
            ),
            FilterError::InvalidCoordinate { row, column, value } => write!(
                f,
                "ERROR: could not parse '{value}' as integer in row {row}, column {column}"
            ),
        }
    }
}

impl std::error::Error for FilterError {}

/// Which side of the interval a bound stage enforces.
#[derive(Debug, Clone, Copy)]
enum Bound {
    /// `row[column] >= value`
    Lower,
    /// `row[column] <= value`
    Upper,
}

/// A single narrowing stage of the pipeline.
#[derive(Debug, Clone, Copy)]
enum Stage<'a> {
    Equals { column: usize, value: &'a str },
    Coordinate { column: usize, bound: Bound, value: i64 },
}

impl Stage<'_> {
    /// Tests one row. `index` is the row's position in the input dataset.
    fn keep(&self, index: usize, row: &Row) -> FilterResult<bool> {
        match *self {
            Stage::Equals { column, value } => Ok(&row[column] == value),
            Stage::Coordinate {
                column,
                bound,
                value,
            } => {
                let coord = match row.coordinate(column) {
                    Some(Ok(coord)) => coord,
                    _ => {
                        return Err(FilterError::InvalidCoordinate {
                            row: index,
                            column,
                            value: row.field(column).unwrap_or_default().to_string(),
                        })
                    }
                };
                Ok(match bound {
                    Bound::Lower => coord >= value,
                    Bound::Upper => coord <= value,
                })
            }
        }
    }
}

/// Builds the ordered stage list and validates every referenced column.
///
/// Columns are only checked for stages that will run, and not at all for an
/// empty dataset, which always filters to an empty dataset.
fn stages<'a>(dataset: &Dataset, criteria: &'a FilterCriteria) -> FilterResult<Vec<Stage<'a>>> {
    let width = dataset.width();
    let check = |role: &'static str, column: usize| -> FilterResult<usize> {
        if dataset.is_empty() || column < width {
            Ok(column)
        } else {
            Err(FilterError::ColumnOutOfRange {
                role,
                column,
                width,
            })
        }
    };

    let mut stages = Vec::with_capacity(4);
    stages.push(Stage::Equals {
        column: check("features", criteria.features_column_index())?,
        value: criteria.desired_feature(),
    });
    if let Some(contig) = criteria.contig_name() {
        stages.push(Stage::Equals {
            column: check("contig", criteria.contig_column_index())?,
            value: contig,
        });
    }
    if let Some(start) = criteria.start_bound() {
        stages.push(Stage::Coordinate {
            column: check("start", criteria.start_column_index())?,
            bound: Bound::Lower,
            value: start,
        });
    }
    if let Some(stop) = criteria.stop_bound() {
        stages.push(Stage::Coordinate {
            column: check("stop", criteria.stop_column_index())?,
            bound: Bound::Upper,
            value: stop,
        });
    }
    Ok(stages)
}

/// Returns the rows of `dataset` that match every supplied criterion.
///
/// Stages run in a fixed order, each one only over the survivors of the
/// previous stage: feature, contig (unless all contigs are selected), start
/// bound, stop bound. Both bounds are inclusive and independently optional;
/// an interval with `start > stop` simply yields no rows.
///
/// The input is left untouched and the result keeps the input's row order and
/// column layout.
///
/// # Example
///
/// ```
/// use gff_features::{filter, table::{Dataset, Row}, FilterCriteria};
///
/// let dataset = Dataset::from_rows(vec![
///     Row::from_iter(["Scaffold_1", "gene", "100", "200"]),
///     Row::from_iter(["Scaffold_2", "gene", "50", "80"]),
///     Row::from_iter(["Scaffold_1", "mRNA", "100", "200"]),
/// ])
/// .unwrap();
///
/// let criteria = FilterCriteria::new(1, "gene").start_column(2).stop_column(3).stop(150);
/// let kept = filter(&dataset, &criteria).unwrap();
/// assert_eq!(kept.rows(), &dataset.rows()[1..2]);
/// ```
pub fn filter(dataset: &Dataset, criteria: &FilterCriteria) -> FilterResult<Dataset> {
    let stages = stages(dataset, criteria)?;

    let mut survivors: Vec<usize> = (0..dataset.len()).collect();
    for stage in &stages {
        let mut kept = Vec::with_capacity(survivors.len());
        for idx in survivors {
            if stage.keep(idx, &dataset[idx])? {
                kept.push(idx);
            }
        }
        survivors = kept;
    }

    Ok(collect_rows(dataset, survivors))
}

/// Parallel variant of [`filter`].
///
/// Each stage is evaluated with rayon over the survivors of the previous one.
/// The output is identical to [`filter`], including row order. When several
/// rows hold unparsable coordinates, which of them is reported may differ.
///
/// This requires the `rayon` feature.
#[cfg(feature = "rayon")]
pub fn par_filter(dataset: &Dataset, criteria: &FilterCriteria) -> FilterResult<Dataset> {
    let stages = stages(dataset, criteria)?;

    let mut survivors: Vec<usize> = (0..dataset.len()).collect();
    for stage in &stages {
        let decisions = survivors
            .par_iter()
            .map(|&idx| stage.keep(idx, &dataset[idx]))
            .collect::<FilterResult<Vec<bool>>>()?;
        survivors = survivors
            .into_iter()
            .zip(decisions)
            .filter_map(|(idx, keep)| keep.then_some(idx))
            .collect();
    }

    Ok(collect_rows(dataset, survivors))
}

fn collect_rows(dataset: &Dataset, survivors: Vec<usize>) -> Dataset {
    let rows = survivors
        .into_iter()
        .map(|idx| dataset[idx].clone())
        .collect();
    Dataset::from_rows_unchecked(dataset.width(), rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_rows(vec![
            Row::from_iter(["chr1", "gene", "10", "20"]),
            Row::from_iter(["chr1", "exon", "12", "18"]),
            Row::from_iter(["chr2", "gene", "30", "40"]),
            Row::from_iter(["chr2", "gene", "5", "9"]),
        ])
        .unwrap()
    }

    fn gene() -> FilterCriteria {
        FilterCriteria::new(1, "gene").start_column(2).stop_column(3)
    }

    #[test]
    fn feature_stage_is_exact() {
        let data = sample();
        let kept = filter(&data, &FilterCriteria::new(1, "Gene")).unwrap();
        assert!(kept.is_empty());
        let kept = filter(&data, &FilterCriteria::new(1, "gen")).unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn bounds_are_inclusive() {
        let data = sample();
        let kept = filter(&data, &gene().start(10).stop(40)).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(&kept[0][2], "10");
        assert_eq!(&kept[1][3], "40");
    }

    #[test]
    fn stages_skip_unused_columns() {
        let data = sample();
        // start/stop columns would be out of range but no bounds are requested
        let criteria = FilterCriteria::new(1, "gene")
            .start_column(99)
            .stop_column(99);
        assert_eq!(filter(&data, &criteria).unwrap().len(), 3);
    }

    #[test]
    fn out_of_range_column_is_reported() {
        let data = sample();
        let err = filter(&data, &FilterCriteria::new(7, "gene")).unwrap_err();
        assert_eq!(
            err,
            FilterError::ColumnOutOfRange {
                role: "features",
                column: 7,
                width: 4
            }
        );
    }

    #[test]
    fn invalid_coordinate_reports_input_row() {
        let data = Dataset::from_rows(vec![
            Row::from_iter(["chr1", "gene", "10", "20"]),
            Row::from_iter(["chr1", "gene", "ten", "20"]),
        ])
        .unwrap();
        let err = filter(&data, &gene().start(1)).unwrap_err();
        assert_eq!(
            err,
            FilterError::InvalidCoordinate {
                row: 1,
                column: 2,
                value: "ten".into()
            }
        );
    }

    #[test]
    fn padded_coordinates_parse_like_row_coordinate() {
        let data = Dataset::from_rows(vec![
            Row::from_iter(["chr1", "gene", " 10 ", "20"]),
            Row::from_iter(["chr1", "gene", "1 0", "20"]),
        ])
        .unwrap();
        assert_eq!(data[0].coordinate(2), Some(Ok(10)));
        let err = filter(&data, &gene().start(10)).unwrap_err();
        assert_eq!(
            err,
            FilterError::InvalidCoordinate {
                row: 1,
                column: 2,
                value: "1 0".into()
            }
        );
    }

    #[test]
    fn coordinates_only_parsed_for_survivors() {
        let data = Dataset::from_rows(vec![
            Row::from_iter(["chr1", "gene", "10", "20"]),
            Row::from_iter(["chr1", "region", "start", "stop"]),
        ])
        .unwrap();
        let kept = filter(&data, &gene().start(1).stop(100)).unwrap();
        assert_eq!(kept.len(), 1);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn par_filter_matches_filter() {
        let data = sample();
        for criteria in [
            gene(),
            gene().contig("chr2"),
            gene().start(6),
            gene().stop(20),
            gene().start(6).stop(35),
        ] {
            assert_eq!(
                par_filter(&data, &criteria).unwrap(),
                filter(&data, &criteria).unwrap()
            );
        }
    }
}
