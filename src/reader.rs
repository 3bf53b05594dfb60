use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

#[cfg(feature = "bz2")]
use bzip2::read::BzDecoder;
#[cfg(feature = "gzip")]
use flate2::read::MultiGzDecoder;
#[cfg(feature = "mmap")]
use memchr::memchr;
use memchr::memchr_iter;
#[cfg(feature = "mmap")]
use memmap2::MmapOptions;
#[cfg(feature = "zstd")]
use zstd::stream::read::Decoder as ZstdDecoder;

use crate::table::{Dataset, Row};

/// Result alias for reader operations.
pub type ReaderResult<T> = Result<T, ReaderError>;

/// An error that can occur when loading an annotation table.
#[derive(Debug)]
pub enum ReaderError {
    /// An I/O error, including a missing input file.
    Io(io::Error),
    /// An error that occurred when memory-mapping a file.
    #[cfg(feature = "mmap")]
    Mmap(io::Error),
    /// An error that occurred when decoding a line.
    InvalidEncoding {
        /// The line number where the error occurred.
        line: usize,
        /// The error message.
        message: String,
    },
    /// A record has a different number of fields than the first record.
    UnexpectedFieldCount {
        /// The line number where the error occurred.
        line: usize,
        /// The expected number of fields.
        expected: usize,
        /// The actual number of fields.
        actual: usize,
    },
    /// An error that occurred when building a reader.
    Builder(String),
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderError::Io(err) => write!(f, "I/O error: {err}"),
            #[cfg(feature = "mmap")]
            ReaderError::Mmap(err) => write!(f, "mmap error: {err}"),
            ReaderError::InvalidEncoding { line, message } => {
                write!(f, "invalid UTF-8 at line {line}: {message}")
            }
            ReaderError::UnexpectedFieldCount {
                line,
                expected,
                actual,
            } => write!(f, "line {line} had {actual} fields, expected {expected}"),
            ReaderError::Builder(msg) => write!(f, "builder error: {msg}"),
        }
    }
}

impl std::error::Error for ReaderError {
    /// Returns the source error, if any.
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReaderError::Io(err) => Some(err),
            #[cfg(feature = "mmap")]
            ReaderError::Mmap(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ReaderError {
    fn from(err: io::Error) -> Self {
        ReaderError::Io(err)
    }
}

impl ReaderError {
    /// Creates a new `ReaderError` for an unexpected field count.
    pub(crate) fn unexpected_field_count(
        line: usize,
        expected: usize,
        actual: usize,
    ) -> ReaderError {
        ReaderError::UnexpectedFieldCount {
            line,
            expected,
            actual,
        }
    }

    fn invalid_encoding(line: usize, message: impl Into<String>) -> ReaderError {
        ReaderError::InvalidEncoding {
            line,
            message: message.into(),
        }
    }
}

/// The mode to use when reading a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderMode {
    /// Read the file line by line. This is the default.
    Default,
    /// Memory-map the file. Requires the `mmap` feature and a plain
    /// (uncompressed) file on disk.
    Mmap,
}

/// The compression format of the input file.
#[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Detect the compression format from the file extension.
    #[default]
    Auto,
    /// No compression.
    None,
    /// Gzip compression.
    Gzip,
    /// Zstandard compression.
    Zstd,
    /// Bzip2 compression.
    Bzip2,
}

#[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
fn detect_compression_from_extension(path: &Path) -> Compression {
    let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    match ext {
        "gz" => Compression::Gzip,
        "zst" | "zstd" => Compression::Zstd,
        "bz2" | "bzip2" => Compression::Bzip2,
        _ => Compression::None,
    }
}

fn has_compressed_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        matches!(ext.to_str(), Some("gz" | "zst" | "zstd" | "bz2" | "bzip2"))
    })
}

/// A builder for creating a [`Reader`].
///
/// # Example
///
/// ```rust,no_run
/// use gff_features::{Reader, ReaderMode};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let dataset = Reader::builder()
///         .from_path("annotation.gff3")
///         .mode(ReaderMode::Default)
///         .buffer_capacity(128 * 1024)
///         .build()?
///         .read_dataset()?;
///
///     println!("{} rows", dataset.len());
///     Ok(())
/// }
/// ```
pub struct ReaderBuilder {
    source: Option<ReaderSource>,
    mode: ReaderMode,
    buffer_capacity: usize,
    skip_comments: bool,
    #[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
    compression: Compression,
}

impl Default for ReaderBuilder {
    fn default() -> Self {
        Self {
            source: None,
            mode: ReaderMode::Default,
            buffer_capacity: 64 * 1024,
            skip_comments: true,
            #[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
            compression: Compression::default(),
        }
    }
}

impl ReaderBuilder {
    /// Reads from a file path.
    pub fn from_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source = Some(ReaderSource::Path(path.as_ref().into()));
        self
    }

    /// Reads from an arbitrary byte stream.
    pub fn from_reader<T>(mut self, reader: T) -> Self
    where
        T: Read + Send + 'static,
    {
        self.source = Some(ReaderSource::Reader(Box::new(reader)));
        self
    }

    /// Sets the reading mode.
    pub fn mode(mut self, mode: ReaderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the buffer capacity for the reader.
    ///
    /// The default is 64 KB.
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(8 * 1024);
        self
    }

    /// Treats lines starting with `#` as data instead of skipping them.
    ///
    /// Blank lines are always skipped.
    pub fn keep_comments(mut self) -> Self {
        self.skip_comments = false;
        self
    }

    /// Sets the compression format of the input.
    #[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Builds the `Reader`.
    pub fn build(mut self) -> ReaderResult<Reader> {
        let source = self
            .source
            .take()
            .ok_or_else(|| ReaderError::Builder("ERROR: no input source configured".into()))?;

        let inner = match (source, self.mode) {
            (ReaderSource::Path(path), ReaderMode::Default) => {
                let stream = self.open_path_stream(&path)?;
                InnerSource::Buffered(BufReader::with_capacity(self.buffer_capacity, stream))
            }
            (ReaderSource::Path(path), ReaderMode::Mmap) => self.open_mmap(&path)?,
            (ReaderSource::Reader(reader), ReaderMode::Default) => {
                InnerSource::Buffered(BufReader::with_capacity(self.buffer_capacity, reader))
            }
            (ReaderSource::Reader(_), ReaderMode::Mmap) => {
                return Err(ReaderError::Builder(
                    "ERROR: mmap mode requires a filesystem path".into(),
                ))
            }
        };

        Ok(Reader {
            inner,
            buffer: String::with_capacity(1024),
            line_number: 0,
            width: None,
            skip_comments: self.skip_comments,
        })
    }

    /// Opens a path as a (possibly decompressing) stream.
    fn open_path_stream(&self, path: &Path) -> ReaderResult<Box<dyn Read + Send>> {
        #[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
        {
            let file = File::open(path)?;
            let compression = match self.compression {
                Compression::Auto => detect_compression_from_extension(path),
                other => other,
            };

            return match compression {
                Compression::None | Compression::Auto => Ok(Box::new(file)),
                Compression::Gzip => {
                    #[cfg(feature = "gzip")]
                    {
                        Ok(Box::new(MultiGzDecoder::new(file)))
                    }
                    #[cfg(not(feature = "gzip"))]
                    {
                        Err(ReaderError::Builder(
                            "gzip compression requested but the `gzip` feature is disabled".into(),
                        ))
                    }
                }
                Compression::Zstd => {
                    #[cfg(feature = "zstd")]
                    {
                        Ok(Box::new(ZstdDecoder::new(file)?))
                    }
                    #[cfg(not(feature = "zstd"))]
                    {
                        Err(ReaderError::Builder(
                            "zstd compression requested but the `zstd` feature is disabled".into(),
                        ))
                    }
                }
                Compression::Bzip2 => {
                    #[cfg(feature = "bz2")]
                    {
                        Ok(Box::new(BzDecoder::new(file)))
                    }
                    #[cfg(not(feature = "bz2"))]
                    {
                        Err(ReaderError::Builder(
                            "bzip2 compression requested but the `bz2` feature is disabled".into(),
                        ))
                    }
                }
            };
        }

        #[cfg(not(any(feature = "gzip", feature = "zstd", feature = "bz2")))]
        {
            if has_compressed_extension(path) {
                return Err(ReaderError::Builder(
                    "ERROR: enable compression features to read compressed inputs".into(),
                ));
            }
            Ok(Box::new(File::open(path)?))
        }
    }

    fn open_mmap(&self, path: &Path) -> ReaderResult<InnerSource> {
        if has_compressed_extension(path) {
            return Err(ReaderError::Builder(
                "ERROR: compression is only supported in buffered mode".into(),
            ));
        }

        #[cfg(feature = "mmap")]
        {
            let map = unsafe { MmapOptions::new().map(&File::open(path)?) }
                .map_err(ReaderError::Mmap)?;
            Ok(InnerSource::Mmap(MmapInner {
                data: map,
                cursor: 0,
            }))
        }

        #[cfg(not(feature = "mmap"))]
        {
            Err(ReaderError::Builder(
                "ERROR: enable the `mmap` feature to use mmap mode".into(),
            ))
        }
    }
}

/// Reader source
enum ReaderSource {
    Path(PathBuf),
    Reader(Box<dyn Read + Send>),
}

/// Inner reader source
enum InnerSource {
    Buffered(BufReader<Box<dyn Read + Send>>),
    #[cfg(feature = "mmap")]
    Mmap(MmapInner),
}

#[cfg(feature = "mmap")]
struct MmapInner {
    data: memmap2::Mmap,
    cursor: usize,
}

/// Loads a headerless, tab-separated annotation table.
///
/// The reader performs no format validation beyond requiring that every
/// record has the same number of fields as the first one. Empty fields are
/// preserved, so column indices always match the file layout.
///
/// # Example
///
/// ```
/// use gff_features::Reader;
///
/// let data = "chr1\t.\tgene\t10\t20\nchr1\t.\texon\t12\t18\n";
/// let dataset = Reader::from_reader(std::io::Cursor::new(data))
///     .unwrap()
///     .read_dataset()
///     .unwrap();
/// assert_eq!(dataset.len(), 2);
/// assert_eq!(&dataset[1][2], "exon");
/// ```
pub struct Reader {
    inner: InnerSource,
    buffer: String,
    line_number: usize,
    width: Option<usize>,
    skip_comments: bool,
}

impl Reader {
    /// Creates a new `ReaderBuilder` to configure a `Reader`.
    pub fn builder() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Creates a new `Reader` from a path.
    ///
    /// Compressed inputs are detected from the extension when the matching
    /// compression feature is enabled.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ReaderResult<Self> {
        Self::builder().from_path(path).build()
    }

    /// Creates a new `Reader` from a byte stream.
    pub fn from_reader<T>(reader: T) -> ReaderResult<Self>
    where
        T: Read + Send + 'static,
    {
        Self::builder().from_reader(reader).build()
    }

    /// Creates a new `Reader` backed by a memory-mapped file.
    #[cfg(feature = "mmap")]
    pub fn from_mmap<P: AsRef<Path>>(path: P) -> ReaderResult<Self> {
        Self::builder().from_path(path).mode(ReaderMode::Mmap).build()
    }

    /// Returns the current line number of the reader.
    pub fn current_line(&self) -> usize {
        self.line_number
    }

    /// Returns the field count established by the first record, if any.
    pub fn width(&self) -> Option<usize> {
        self.width
    }

    /// Returns an iterator over the records in the reader.
    pub fn records(&mut self) -> Records<'_> {
        Records { reader: self }
    }

    /// Reads every remaining record into a [`Dataset`].
    ///
    /// Stops at the first error.
    pub fn read_dataset(mut self) -> ReaderResult<Dataset> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_record() {
            rows.push(row?);
        }
        let width = self.width.unwrap_or(0);
        log::debug!(
            "loaded {} rows with {} columns from {} lines",
            rows.len(),
            width,
            self.line_number
        );
        Ok(Dataset::from_rows_unchecked(width, rows))
    }

    fn next_record(&mut self) -> Option<ReaderResult<Row>> {
        loop {
            match self.fill_buffer() {
                Ok(true) => {
                    self.line_number += 1;
                    if should_skip(&self.buffer, self.skip_comments) {
                        log::debug!("skipping line {}", self.line_number);
                        continue;
                    }
                    let row = split_fields(&self.buffer);
                    return Some(self.check_width(row));
                }
                Ok(false) => return None,
                Err(err) => return Some(Err(err)),
            }
        }
    }

    /// Enforces a rectangular table: the first record fixes the width.
    fn check_width(&mut self, row: Row) -> ReaderResult<Row> {
        match self.width {
            None => {
                self.width = Some(row.len());
                Ok(row)
            }
            Some(width) if width == row.len() => Ok(row),
            Some(width) => Err(ReaderError::unexpected_field_count(
                self.line_number,
                width,
                row.len(),
            )),
        }
    }

    /// Fills the buffer with the next line; returns `false` at end of input.
    fn fill_buffer(&mut self) -> ReaderResult<bool> {
        match &mut self.inner {
            InnerSource::Buffered(reader) => {
                self.buffer.clear();
                let bytes = match reader.read_line(&mut self.buffer) {
                    Ok(bytes) => bytes,
                    Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                        // the undecodable line is consumed either way
                        self.line_number += 1;
                        return Err(ReaderError::invalid_encoding(
                            self.line_number,
                            err.to_string(),
                        ));
                    }
                    Err(err) => return Err(ReaderError::Io(err)),
                };
                if bytes == 0 {
                    return Ok(false);
                }
                trim_line(&mut self.buffer);
                Ok(true)
            }
            #[cfg(feature = "mmap")]
            InnerSource::Mmap(inner) => {
                if inner.cursor >= inner.data.len() {
                    return Ok(false);
                }

                let data = &inner.data[inner.cursor..];
                let (line_bytes, advance) = match memchr(b'\n', data) {
                    Some(pos) => (&data[..pos], pos + 1),
                    None => (data, data.len()),
                };
                inner.cursor += advance;

                let line = match std::str::from_utf8(line_bytes) {
                    Ok(line) => line,
                    Err(err) => {
                        self.line_number += 1;
                        return Err(ReaderError::invalid_encoding(
                            self.line_number,
                            err.to_string(),
                        ));
                    }
                };

                self.buffer.clear();
                self.buffer.push_str(line.trim_end_matches('\r'));
                Ok(true)
            }
        }
    }
}

impl Iterator for Reader {
    type Item = ReaderResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

/// An iterator over the records in a `Reader`.
///
/// This struct is created by the `records` method on `Reader`.
pub struct Records<'a> {
    reader: &'a mut Reader,
}

impl Iterator for Records<'_> {
    type Item = ReaderResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_record()
    }
}

/// Splits a line on tabs, keeping empty fields.
fn split_fields(line: &str) -> Row {
    let bytes = line.as_bytes();
    let mut fields = Vec::with_capacity(9);
    let mut field_start = 0usize;
    for tab in memchr_iter(b'\t', bytes) {
        fields.push(line[field_start..tab].to_string());
        field_start = tab + 1;
    }
    fields.push(line[field_start..].to_string());
    Row::new(fields)
}

fn trim_line(line: &mut String) {
    while line.ends_with(['\n', '\r']) {
        line.pop();
    }
}

/// Returns `true` if the line carries no record.
///
/// Tabs are field separators, so a tab-only line is a row of empty fields.
fn should_skip(line: &str, skip_comments: bool) -> bool {
    let trimmed = line.trim_matches(' ');
    trimmed.is_empty() || (skip_comments && trimmed.starts_with('#'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_empty_fields() {
        let row = split_fields("chr1\t\tgene\t1\t");
        assert_eq!(row.len(), 5);
        assert_eq!(row.field(1), Some(""));
        assert_eq!(row.field(4), Some(""));
    }

    #[test]
    fn skip_rules() {
        assert!(should_skip("", true));
        assert!(should_skip("   ", false));
        assert!(should_skip("##gff-version 3", true));
        assert!(!should_skip("##gff-version 3", false));
        assert!(!should_skip("chr1\tgene", true));
        assert!(!should_skip("\t\t", true));
    }

    #[test]
    fn trim_line_strips_crlf() {
        let mut line = String::from("chr1\tgene\r\n");
        trim_line(&mut line);
        assert_eq!(line, "chr1\tgene");
    }

    #[test]
    fn builder_without_source_fails() {
        assert!(matches!(
            Reader::builder().build(),
            Err(ReaderError::Builder(_))
        ));
    }

    #[test]
    fn mmap_requires_path() {
        let result = Reader::builder()
            .from_reader(io::empty())
            .mode(ReaderMode::Mmap)
            .build();
        assert!(matches!(result, Err(ReaderError::Builder(_))));
    }
}
