use std::io::Write;

use tempfile::NamedTempFile;

use crate::codec::Endian;
use crate::source::{endian, file_size, Source};

fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut f = NamedTempFile::new().expect("tempfile");
    f.write_all(bytes).expect("write");
    f.flush().expect("flush");
    f
}

#[test]
fn detects_native_byte_order() {
    let far_header = [2u8, 0, 0, 10];
    let far_payload = [1u8, 4];
    let f = write_temp(&[&far_header[..], &far_payload[..]].concat());

    let mut source = Source::open(f.path()).unwrap();
    let result = endian::detect(&mut source).unwrap();
    assert_eq!(result, Endian::Little);
}

#[test]
fn detects_swapped_byte_order() {
    let far_header = [0u8, 2, 0, 10];
    let far_payload = [1u8, 4];
    let f = write_temp(&[&far_header[..], &far_payload[..]].concat());

    let mut source = Source::open(f.path()).unwrap();
    let result = endian::detect(&mut source).unwrap();
    assert_eq!(result, Endian::Big);
}

#[test]
fn rejects_non_far_first_record() {
    let bogus_header = [2u8, 0, 5, 10];
    let f = write_temp(&bogus_header);
    let mut source = Source::open(f.path()).unwrap();
    assert!(endian::detect(&mut source).is_err());
}

#[test]
fn rejects_wrong_version() {
    let far_header = [2u8, 0, 0, 10];
    let far_payload = [1u8, 3];
    let f = write_temp(&[&far_header[..], &far_payload[..]].concat());
    let mut source = Source::open(f.path()).unwrap();
    let err = endian::detect(&mut source).unwrap_err();
    assert!(matches!(err, crate::source::SourceError::WrongVersion(3)));
}

#[test]
fn reopen_rewinds_to_start() {
    let payload = [1u8, 2, 3, 4];
    let f = write_temp(&payload);
    let mut source = Source::open(f.path()).unwrap();
    let mut buf = [0u8; 2];
    source.read_exact(&mut buf).unwrap();
    assert_eq!(buf, [1, 2]);
    source.reopen().unwrap();
    source.read_exact(&mut buf).unwrap();
    assert_eq!(buf, [1, 2]);
}

#[test]
fn skip_advances_without_returning_bytes() {
    let payload = [1u8, 2, 3, 4, 5];
    let f = write_temp(&payload);
    let mut source = Source::open(f.path()).unwrap();
    source.skip(3).unwrap();
    let mut buf = [0u8; 2];
    source.read_exact(&mut buf).unwrap();
    assert_eq!(buf, [4, 5]);
}

#[test]
fn short_read_reports_eof() {
    let f = write_temp(&[1u8, 2]);
    let mut source = Source::open(f.path()).unwrap();
    let mut buf = [0u8; 4];
    let err = source.read_exact(&mut buf).unwrap_err();
    assert!(err.is_eof());
}

#[test]
fn file_size_reports_plain_file_length() {
    let f = write_temp(&[0u8; 10]);
    assert_eq!(file_size(f.path()), 10);
}

#[test]
fn file_size_of_missing_file_is_zero() {
    assert_eq!(file_size("/nonexistent/path/does-not-exist.stdf"), 0);
}
