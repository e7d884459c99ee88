//! End-to-end archive reading against files built on the fly.

use std::fs;
use std::path::{Path, PathBuf};

use ergfile::{Column, ErgError, ErgFile};

/// Write `<name>` (16-byte header + `rows`) and `<name>.info` into `dir`.
fn write_archive(dir: &Path, name: &str, sidecar: &str, rows: &[u8]) -> PathBuf {
    let path = dir.join(name);
    let mut binary = vec![0u8; 16];
    binary.extend_from_slice(rows);
    fs::write(&path, binary).unwrap();

    let mut info_path = path.clone().into_os_string();
    info_path.push(".info");
    fs::write(info_path, sidecar).unwrap();
    path
}

fn int_double_rows(rows: &[(i32, f64)]) -> Vec<u8> {
    let mut packed = Vec::new();
    for (a, b) in rows {
        packed.extend_from_slice(&a.to_le_bytes());
        packed.extend_from_slice(&b.to_le_bytes());
    }
    packed
}

const TWO_SIGNAL_SIDECAR: &str = "File.ByteOrder = LittleEndian\n\
     File.At.1.Name = A\n\
     File.At.1.Type = Int\n\
     File.At.2.Name = B\n\
     File.At.2.Type = Double\n";

#[test]
fn test_two_signal_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let rows = int_double_rows(&[(1, 10.0), (2, 20.0), (3, 30.0)]);
    let path = write_archive(dir.path(), "run.erg", TWO_SIGNAL_SIDECAR, &rows);

    let archive = ErgFile::open(&path).unwrap();
    assert_eq!(archive.sample_count(), 3);
    assert_eq!(archive.layout().row_size(), 12);
    assert_eq!(archive.signal("A"), Some(Column::I32(vec![1, 2, 3])));
    assert_eq!(archive.signal("B"), Some(Column::F64(vec![10.0, 20.0, 30.0])));
}

#[test]
fn test_scaling_applied() {
    let dir = tempfile::tempdir().unwrap();
    let sidecar = "File.ByteOrder = LittleEndian\n\
         File.At.1.Name = T\n\
         File.At.1.Type = Double\n\
         Quantity.T.Factor = 2.0\n\
         Quantity.T.Offset = 5.0\n";
    let rows: Vec<u8> = [1.0f64, 2.0, 3.0]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    let path = write_archive(dir.path(), "scaled.erg", sidecar, &rows);

    let archive = ErgFile::open(&path).unwrap();
    assert_eq!(archive.signal("T"), Some(Column::F64(vec![7.0, 9.0, 11.0])));
    assert_eq!(archive.signal_as_f64("T"), Some(vec![7.0, 9.0, 11.0]));
}

#[test]
fn test_missing_signal_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let rows = int_double_rows(&[(1, 1.0)]);
    let path = write_archive(dir.path(), "run.erg", TWO_SIGNAL_SIDECAR, &rows);

    let archive = ErgFile::open(&path).unwrap();
    assert_eq!(archive.signal("C"), None);
    assert_eq!(archive.signal_as_f64("C"), None);
    assert_eq!(archive.signal_raw("C"), None);
    assert!(archive.signal_info("C").is_none());
}

#[test]
fn test_header_only_file_has_zero_samples() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(dir.path(), "empty.erg", TWO_SIGNAL_SIDECAR, &[]);

    let archive = ErgFile::open(&path).unwrap();
    assert_eq!(archive.sample_count(), 0);
    assert_eq!(archive.signal("A"), None);
    assert_eq!(archive.signal_as_f64("B"), None);
}

#[test]
fn test_ragged_tail_is_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let mut rows = int_double_rows(&[(1, 10.0), (2, 20.0)]);
    rows.extend_from_slice(&[0xAA; 5]);
    let path = write_archive(dir.path(), "ragged.erg", TWO_SIGNAL_SIDECAR, &rows);

    let archive = ErgFile::open(&path).unwrap();
    assert_eq!(archive.sample_count(), 2);
    assert_eq!(archive.signal("A"), Some(Column::I32(vec![1, 2])));
}

#[test]
fn test_raw_matches_packed_layout() {
    let dir = tempfile::tempdir().unwrap();
    let rows = int_double_rows(&[(7, 70.0), (8, 80.0)]);
    let path = write_archive(dir.path(), "raw.erg", TWO_SIGNAL_SIDECAR, &rows);

    let archive = ErgFile::open(&path).unwrap();
    let raw_a = archive.signal_raw("A").unwrap();
    let raw_b = archive.signal_raw("B").unwrap();
    for i in 0..2 {
        assert_eq!(raw_a[i * 4..(i + 1) * 4], rows[i * 12..i * 12 + 4]);
        assert_eq!(raw_b[i * 8..(i + 1) * 8], rows[i * 12 + 4..i * 12 + 12]);
    }
}

#[test]
fn test_integer_scaling_truncates_in_native_type() {
    let dir = tempfile::tempdir().unwrap();
    let sidecar = "File.ByteOrder = LittleEndian\n\
         File.At.1.Name = N\n\
         File.At.1.Type = Int\n\
         Quantity.N.Factor = 2.5\n\
         Quantity.N.Offset = 0.75\n";
    let rows: Vec<u8> = [10i32, 20].iter().flat_map(|v| v.to_le_bytes()).collect();
    let path = write_archive(dir.path(), "trunc.erg", sidecar, &rows);

    let archive = ErgFile::open(&path).unwrap();
    // Native path: factor and offset truncate to 2 and 0 in i32 space.
    assert_eq!(archive.signal("N"), Some(Column::I32(vec![20, 40])));
    // f64 path widens first and scales exactly.
    assert_eq!(archive.signal_as_f64("N"), Some(vec![25.75, 50.75]));
}

#[test]
fn test_unscaled_integer_column_passes_through() {
    let dir = tempfile::tempdir().unwrap();
    let sidecar = "File.ByteOrder = LittleEndian\n\
         File.At.1.Name = Flags\n\
         File.At.1.Type = UShort\n";
    let rows: Vec<u8> = [1u16, 0xFFFF, 42]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    let path = write_archive(dir.path(), "flags.erg", sidecar, &rows);

    let archive = ErgFile::open(&path).unwrap();
    assert_eq!(
        archive.signal("Flags"),
        Some(Column::U16(vec![1, 0xFFFF, 42]))
    );
    assert_eq!(
        archive.signal_as_f64("Flags"),
        Some(vec![1.0, 65535.0, 42.0])
    );
}

#[test]
fn test_bytes_column() {
    let dir = tempfile::tempdir().unwrap();
    let sidecar = "File.ByteOrder = LittleEndian\n\
         File.At.1.Name = Blob\n\
         File.At.1.Type = 3 Bytes\n\
         File.At.2.Name = V\n\
         File.At.2.Type = UChar\n\
         Quantity.Blob.Offset = 9.0\n";
    let rows = vec![1u8, 2, 3, 100, 4, 5, 6, 200];
    let path = write_archive(dir.path(), "blob.erg", sidecar, &rows);

    let archive = ErgFile::open(&path).unwrap();
    assert_eq!(
        archive.signal("Blob"),
        Some(Column::Bytes {
            width: 3,
            data: vec![1, 2, 3, 4, 5, 6],
        })
    );
    assert_eq!(archive.signal("V"), Some(Column::U8(vec![100, 200])));
    // Byte fields widen as 0.0, so only the offset survives.
    assert_eq!(archive.signal_as_f64("Blob"), Some(vec![9.0, 9.0]));
}

#[test]
fn test_unknown_type_among_valid_signals() {
    let dir = tempfile::tempdir().unwrap();
    let sidecar = "File.ByteOrder = LittleEndian\n\
         File.At.1.Name = A\n\
         File.At.1.Type = Int\n\
         File.At.2.Name = X\n\
         File.At.2.Type = Quaternion\n\
         File.At.3.Name = B\n\
         File.At.3.Type = Double\n";
    let rows = int_double_rows(&[(1, 10.0), (2, 20.0)]);
    let path = write_archive(dir.path(), "mixed.erg", sidecar, &rows);

    let archive = ErgFile::open(&path).unwrap();
    assert_eq!(archive.layout().row_size(), 12);
    assert_eq!(archive.signal("A"), Some(Column::I32(vec![1, 2])));
    assert_eq!(archive.signal("B"), Some(Column::F64(vec![10.0, 20.0])));
    assert_eq!(archive.signal("X"), None, "zero-size column has no data");
}

#[test]
fn test_all_unknown_types_fail_row_size_check() {
    let dir = tempfile::tempdir().unwrap();
    let sidecar = "File.ByteOrder = LittleEndian\n\
         File.At.1.Name = X\n\
         File.At.1.Type = Quaternion\n";
    let path = write_archive(dir.path(), "unknown.erg", sidecar, &[1, 2, 3, 4]);

    let err = ErgFile::open(&path).unwrap_err();
    assert!(matches!(err, ErgError::ZeroRowSize { signals: 1 }));
}

#[test]
fn test_no_signals_fail_row_size_check() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(
        dir.path(),
        "nosignals.erg",
        "File.ByteOrder = LittleEndian\n",
        &[],
    );

    let err = ErgFile::open(&path).unwrap_err();
    assert!(matches!(err, ErgError::ZeroRowSize { signals: 0 }));
}

#[test]
fn test_big_endian_archive_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let sidecar = "File.ByteOrder = BigEndian\n\
         File.At.1.Name = A\n\
         File.At.1.Type = Int\n";
    let path = write_archive(dir.path(), "big.erg", sidecar, &[0; 4]);

    let err = ErgFile::open(&path).unwrap_err();
    assert!(matches!(err, ErgError::UnsupportedByteOrder { .. }));
}

#[test]
fn test_missing_sidecar_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lonely.erg");
    fs::write(&path, vec![0u8; 32]).unwrap();

    let err = ErgFile::open(&path).unwrap_err();
    assert!(matches!(err, ErgError::Open { .. }));
}

#[test]
fn test_missing_binary_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ghost.erg");
    let mut info_path = path.clone().into_os_string();
    info_path.push(".info");
    fs::write(info_path, TWO_SIGNAL_SIDECAR).unwrap();

    let err = ErgFile::open(&path).unwrap_err();
    assert!(matches!(err, ErgError::Open { .. }));
}

#[test]
fn test_truncated_binary_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.erg");
    fs::write(&path, vec![0u8; 9]).unwrap();
    let mut info_path = path.clone().into_os_string();
    info_path.push(".info");
    fs::write(info_path, TWO_SIGNAL_SIDECAR).unwrap();

    let err = ErgFile::open(&path).unwrap_err();
    assert!(matches!(err, ErgError::Truncated { size: 9, .. }));
}

#[test]
fn test_signal_info_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let sidecar = "File.ByteOrder = LittleEndian\n\
         File.At.1.Name = Car.v\n\
         File.At.1.Type = Float\n\
         Quantity.Car.v.Unit = m/s\n\
         Quantity.Car.v.Factor = 3.6\n";
    let rows: Vec<u8> = [5.0f32, 10.0].iter().flat_map(|v| v.to_le_bytes()).collect();
    let path = write_archive(dir.path(), "meta.erg", sidecar, &rows);

    let archive = ErgFile::open(&path).unwrap();
    let info = archive.signal_info("Car.v").unwrap();
    assert_eq!(info.unit, "m/s");
    assert_eq!(info.factor, 3.6);
    assert_eq!(archive.info().get("File.ByteOrder"), Some("LittleEndian"));
    assert_eq!(archive.signal_index("Car.v"), Some(0));
}

#[test]
fn test_batch_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let rows = int_double_rows(&[(1, 10.0), (2, 20.0)]);
    let path = write_archive(dir.path(), "batch.erg", TWO_SIGNAL_SIDECAR, &rows);

    let archive = ErgFile::open(&path).unwrap();
    let columns = archive.signals_batch(&["B", "missing", "A"]);
    assert_eq!(columns.len(), 3);
    assert_eq!(columns[0], Some(Column::F64(vec![10.0, 20.0])));
    assert_eq!(columns[1], None);
    assert_eq!(columns[2], Some(Column::I32(vec![1, 2])));

    let doubles = archive.signals_batch_as_f64(&["A", "nope"]);
    assert_eq!(doubles[0], Some(vec![1.0, 2.0]));
    assert_eq!(doubles[1], None);
}

#[test]
fn test_close_consumes_the_handle() {
    let dir = tempfile::tempdir().unwrap();
    let rows = int_double_rows(&[(1, 1.0)]);
    let path = write_archive(dir.path(), "close.erg", TWO_SIGNAL_SIDECAR, &rows);

    let archive = ErgFile::open(&path).unwrap();
    archive.close();
}
