use std::fmt;
use std::ops::Index;

/// Result alias for table construction.
pub type TableResult<T> = Result<T, TableError>;

/// Errors raised while assembling a [`Dataset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A row does not have the same number of fields as the first row.
    RaggedRow {
        /// 0-based index of the offending row.
        row: usize,
        /// Width established by the first row.
        expected: usize,
        /// Number of fields found in the offending row.
        actual: usize,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::RaggedRow {
                row,
                expected,
                actual,
            } => write!(f, "row {row} had {actual} fields, expected {expected}"),
        }
    }
}

impl std::error::Error for TableError {}

/// A single row of an annotation table.
///
/// Fields are kept verbatim and addressed by their 0-based column index.
/// Numeric columns are parsed on demand through [`Row::coordinate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Row {
    fields: Vec<String>,
}

impl Row {
    /// Creates a row from its fields.
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Returns the number of fields in the row.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the row has no fields.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the field at `column`, if present.
    #[inline]
    pub fn field(&self, column: usize) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Parses the field at `column` as a genomic coordinate.
    ///
    /// Returns `None` if the column does not exist and `Some(Err(_))` if the
    /// field is not an integer. Surrounding whitespace is ignored.
    pub fn coordinate(&self, column: usize) -> Option<Result<i64, std::num::ParseIntError>> {
        self.field(column).map(|raw| raw.trim().parse::<i64>())
    }

    /// Returns all fields of the row.
    #[inline]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Consumes the row and returns its fields.
    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }
}

impl Index<usize> for Row {
    type Output = str;

    fn index(&self, column: usize) -> &str {
        &self.fields[column]
    }
}

impl<S: Into<String>> FromIterator<S> for Row {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Row {
    /// Renders the row as a tab-separated line (without trailing newline).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = self.fields.iter();
        if let Some(first) = fields.next() {
            f.write_str(first)?;
        }
        for field in fields {
            f.write_str("\t")?;
            f.write_str(field)?;
        }
        Ok(())
    }
}

/// An ordered, rectangular collection of [`Row`]s.
///
/// Every row of a dataset has exactly [`Dataset::width`] fields. The width is
/// checked once, when the dataset is built, so that column access by index
/// never has to deal with ragged rows afterwards.
///
/// # Example
///
/// ```
/// use gff_features::table::{Dataset, Row};
///
/// let rows = vec![
///     Row::from_iter(["Scaffold_1", "gene", "100", "200"]),
///     Row::from_iter(["Scaffold_2", "gene", "50", "80"]),
/// ];
/// let dataset = Dataset::from_rows(rows).unwrap();
/// assert_eq!(dataset.len(), 2);
/// assert_eq!(dataset.width(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    width: usize,
    rows: Vec<Row>,
}

impl Dataset {
    /// Creates an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dataset from rows, checking that all rows share the same arity.
    pub fn from_rows(rows: Vec<Row>) -> TableResult<Self> {
        let width = rows.first().map(Row::len).unwrap_or(0);
        if let Some((row, ragged)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(TableError::RaggedRow {
                row,
                expected: width,
                actual: ragged.len(),
            });
        }
        Ok(Self { width, rows })
    }

    /// Builds a dataset whose rows are already known to have `width` fields.
    pub(crate) fn from_rows_unchecked(width: usize, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == width));
        Self { width, rows }
    }

    /// Returns the number of fields per row (0 for an empty dataset).
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the dataset has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the rows in file order.
    #[inline]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns an iterator over the rows in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Consumes the dataset and returns its rows.
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl Index<usize> for Dataset {
    type Output = Row;

    fn index(&self, row: usize) -> &Row {
        &self.rows[row]
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl IntoIterator for Dataset {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
