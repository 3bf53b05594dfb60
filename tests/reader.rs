use std::io::Write;

#[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
use gff_features::reader::Compression;
use gff_features::reader::{Reader, ReaderError};

const GFF: &str = "##gff-version 3\n\
Scaffold_1\tTransDecoder\tgene\t100\t200\t.\t+\t.\tID=g1\n\
Scaffold_1\tTransDecoder\tmRNA\t100\t200\t.\t+\t.\tID=t1;Parent=g1\n\
\n\
Scaffold_2\tTransDecoder\tgene\t50\t80\t.\t-\t.\tID=g2\n";

#[test]
fn test_reader_from_string() {
    let reader = Reader::from_reader(std::io::Cursor::new(GFF.as_bytes())).unwrap();
    let dataset = reader.read_dataset().unwrap();
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.width(), 9);

    let first = &dataset[0];
    assert_eq!(first.field(0), Some("Scaffold_1"));
    assert_eq!(first.field(2), Some("gene"));
    assert_eq!(first.coordinate(3), Some(Ok(100)));
    assert_eq!(first.field(8), Some("ID=g1"));

    assert_eq!(dataset[2].field(0), Some("Scaffold_2"));
}

#[test]
fn test_reader_records_iterator() {
    let mut reader = Reader::from_reader(std::io::Cursor::new(GFF.as_bytes())).unwrap();
    let features: Vec<String> = reader
        .records()
        .map(|r| r.unwrap().field(2).unwrap().to_string())
        .collect();
    assert_eq!(features, vec!["gene", "mRNA", "gene"]);
    assert_eq!(reader.width(), Some(9));
    assert_eq!(reader.current_line(), 5);
}

#[test]
fn test_reader_keep_comments() {
    let data = "#chrom\tfeature\nchr1\tgene\n";
    let dataset = Reader::builder()
        .from_reader(std::io::Cursor::new(data.as_bytes()))
        .keep_comments()
        .build()
        .unwrap()
        .read_dataset()
        .unwrap();
    assert_eq!(dataset.len(), 2);
    assert_eq!(&dataset[0][0], "#chrom");
}

#[test]
fn test_reader_ragged_line() {
    let data = "chr1\t.\tgene\t10\t20\nmalformed_line\nchr2\t.\tgene\t50\t60";
    let mut reader = Reader::from_reader(std::io::Cursor::new(data.as_bytes())).unwrap();
    let records: Vec<_> = reader.records().collect();
    assert_eq!(records.len(), 3);

    assert!(records[0].is_ok());
    assert!(matches!(
        records[1],
        Err(ReaderError::UnexpectedFieldCount {
            line: 2,
            expected: 5,
            actual: 1
        })
    ));
    assert!(records[2].is_ok());
}

#[test]
fn test_read_dataset_rejects_ragged_table() {
    let data = "chr1\tgene\t10\t20\nchr1\tgene\t10\n";
    let result = Reader::from_reader(std::io::Cursor::new(data.as_bytes()))
        .unwrap()
        .read_dataset();
    assert!(matches!(
        result,
        Err(ReaderError::UnexpectedFieldCount { line: 2, .. })
    ));
}

#[test]
fn test_reader_crlf_input() {
    let data = "chr1\tgene\t10\t20\r\nchr2\tgene\t30\t40\r\n";
    let dataset = Reader::from_reader(std::io::Cursor::new(data.as_bytes()))
        .unwrap()
        .read_dataset()
        .unwrap();
    assert_eq!(dataset[0].field(3), Some("20"));
    assert_eq!(dataset[1].field(3), Some("40"));
}

#[test]
fn test_reader_empty_input() {
    let dataset = Reader::from_reader(std::io::Cursor::new(b"" as &[u8]))
        .unwrap()
        .read_dataset()
        .unwrap();
    assert!(dataset.is_empty());
    assert_eq!(dataset.width(), 0);
}

#[test]
fn test_reader_invalid_utf8() {
    let data: &[u8] = b"chr1\tgene\nchr\xff\tgene\n";
    let result = Reader::from_reader(std::io::Cursor::new(data))
        .unwrap()
        .read_dataset();
    assert!(matches!(
        result,
        Err(ReaderError::InvalidEncoding { line: 2, .. })
    ));
}

#[test]
fn test_reader_line_numbers_after_invalid_utf8() {
    let data: &[u8] = b"a\tb\nx\xff\ty\nc\td\ne\n";
    let mut reader = Reader::from_reader(std::io::Cursor::new(data)).unwrap();
    let records: Vec<_> = reader.records().collect();
    assert_eq!(records.len(), 4);

    assert!(records[0].is_ok());
    assert!(matches!(
        records[1],
        Err(ReaderError::InvalidEncoding { line: 2, .. })
    ));
    assert_eq!(records[2].as_ref().unwrap().field(0), Some("c"));
    assert!(matches!(
        records[3],
        Err(ReaderError::UnexpectedFieldCount {
            line: 4,
            expected: 2,
            actual: 1
        })
    ));
    assert_eq!(reader.current_line(), 4);
}

#[test]
fn test_reader_keeps_tab_only_rows() {
    let dataset = Reader::from_reader(std::io::Cursor::new("a\tb\tc\n\t\t\nd\te\tf\n".as_bytes()))
        .unwrap()
        .read_dataset()
        .unwrap();
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset[1].len(), 3);
    assert!(dataset[1].fields().iter().all(|field| field.is_empty()));
    assert_eq!(dataset[2].field(0), Some("d"));
}

#[test]
fn test_reader_from_path() {
    let mut file = tempfile::Builder::new().suffix(".gff3").tempfile().unwrap();
    file.write_all(GFF.as_bytes()).unwrap();
    file.flush().unwrap();

    let dataset = Reader::from_path(file.path())
        .unwrap()
        .read_dataset()
        .unwrap();
    assert_eq!(dataset.len(), 3);
}

#[test]
fn test_reader_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Reader::from_path(dir.path().join("missing.gff3"));
    match result {
        Err(ReaderError::Io(err)) => assert_eq!(err.kind(), std::io::ErrorKind::NotFound),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected a missing file error"),
    }
}

#[cfg(feature = "mmap")]
#[test]
fn test_reader_mmap_matches_buffered() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(GFF.as_bytes()).unwrap();
    file.flush().unwrap();

    let buffered = Reader::from_path(file.path())
        .unwrap()
        .read_dataset()
        .unwrap();
    let mapped = Reader::from_mmap(file.path())
        .unwrap()
        .read_dataset()
        .unwrap();
    assert_eq!(buffered, mapped);
}

#[cfg(feature = "mmap")]
#[test]
fn test_reader_mmap_line_numbers_after_invalid_utf8() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"a\tb\nx\xff\ty\nc\td\ne\n").unwrap();
    file.flush().unwrap();

    let mut reader = Reader::from_mmap(file.path()).unwrap();
    let records: Vec<_> = reader.records().collect();
    assert!(matches!(
        records[1],
        Err(ReaderError::InvalidEncoding { line: 2, .. })
    ));
    assert!(matches!(
        records[3],
        Err(ReaderError::UnexpectedFieldCount { line: 4, .. })
    ));
}

#[cfg(feature = "gzip")]
#[test]
fn test_reader_gzip_input() {
    let file = tempfile::Builder::new()
        .suffix(".gff3.gz")
        .tempfile()
        .unwrap();
    let mut encoder =
        flate2::write::GzEncoder::new(file.reopen().unwrap(), flate2::Compression::default());
    encoder.write_all(GFF.as_bytes()).unwrap();
    encoder.finish().unwrap();

    let dataset = Reader::from_path(file.path())
        .unwrap()
        .read_dataset()
        .unwrap();
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset[2].field(0), Some("Scaffold_2"));
}

#[cfg(feature = "zstd")]
#[test]
fn test_reader_zstd_input() {
    let mut file = tempfile::Builder::new().suffix(".gff3.zst").tempfile().unwrap();
    let compressed = zstd::stream::encode_all(GFF.as_bytes(), 0).unwrap();
    file.write_all(&compressed).unwrap();
    file.flush().unwrap();

    let dataset = Reader::from_path(file.path())
        .unwrap()
        .read_dataset()
        .unwrap();
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset[1].field(2), Some("mRNA"));
}

#[cfg(feature = "bz2")]
#[test]
fn test_reader_bzip2_input() {
    let file = tempfile::Builder::new().suffix(".gff3.bz2").tempfile().unwrap();
    let mut encoder =
        bzip2::write::BzEncoder::new(file.reopen().unwrap(), bzip2::Compression::default());
    encoder.write_all(GFF.as_bytes()).unwrap();
    encoder.finish().unwrap();

    let dataset = Reader::from_path(file.path())
        .unwrap()
        .read_dataset()
        .unwrap();
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset[0].coordinate(4), Some(Ok(200)));
}

#[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
#[test]
fn test_reader_compression_none_overrides_extension() {
    let mut file = tempfile::Builder::new().suffix(".gff3.gz").tempfile().unwrap();
    file.write_all(GFF.as_bytes()).unwrap();
    file.flush().unwrap();

    let dataset = Reader::builder()
        .from_path(file.path())
        .compression(Compression::None)
        .build()
        .unwrap()
        .read_dataset()
        .unwrap();
    assert_eq!(dataset.len(), 3);
}
