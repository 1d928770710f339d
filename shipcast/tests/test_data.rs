use chrono::NaiveDate;
use shipcast::{ForecastError, SeriesStore};
use std::io::Write;
use tempfile::NamedTempFile;

fn csv_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

fn month(y: i32, m: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, 1).unwrap()
}

#[test]
fn test_load_sorts_and_reindexes() {
    let file = csv_file(&[
        "date,shipped_qty",
        "2023-03-01,130",
        "2023-01-01,110",
        "2023-05-01,150",
        "2023-02-01,120",
    ]);

    let series = SeriesStore::from_csv(file.path()).unwrap();
    let view = series.as_slice();

    assert_eq!(series.len(), 5);
    assert_eq!(view.first_month(), Some(month(2023, 1)));
    assert_eq!(view.last_month(), Some(month(2023, 5)));
    assert_eq!(
        view.values(),
        vec![Some(110.0), Some(120.0), Some(130.0), None, Some(150.0)]
    );
    assert_eq!(view.missing_count(), 1);
}

#[test]
fn test_load_normalises_mid_month_dates() {
    let file = csv_file(&["date,shipped_qty", "2023-01-15,1.5", "2023-02-28,2.5"]);

    let series = SeriesStore::from_csv(file.path()).unwrap();
    assert_eq!(series.as_slice().months(), vec![month(2023, 1), month(2023, 2)]);
}

#[test]
fn test_empty_cells_are_missing_values() {
    let file = csv_file(&["date,shipped_qty", "2023-01-01,10", "2023-02-01,", "2023-03-01,30"]);

    let series = SeriesStore::from_csv(file.path()).unwrap();
    assert_eq!(series.as_slice().values(), vec![Some(10.0), None, Some(30.0)]);
}

#[test]
fn test_duplicate_months_rejected() {
    let file = csv_file(&["date,shipped_qty", "2023-01-01,10", "2023-01-20,12"]);

    match SeriesStore::from_csv(file.path()) {
        Err(ForecastError::DataFormatError(msg)) => assert!(msg.contains("2023-01")),
        other => panic!("expected DataFormatError, got {:?}", other),
    }
}

#[test]
fn test_missing_quantity_column() {
    let file = csv_file(&["date,qty", "2023-01-01,10"]);

    assert!(matches!(
        SeriesStore::from_csv(file.path()),
        Err(ForecastError::DataFormatError(_))
    ));
}

#[test]
fn test_non_numeric_quantity() {
    let file = csv_file(&["date,shipped_qty", "2023-01-01,ten", "2023-02-01,eleven"]);

    assert!(matches!(
        SeriesStore::from_csv(file.path()),
        Err(ForecastError::DataFormatError(_))
    ));
}

#[test]
fn test_unparseable_date() {
    let file = csv_file(&["date,shipped_qty", "first of may,10"]);

    match SeriesStore::from_csv(file.path()) {
        Err(ForecastError::DataFormatError(msg)) => assert!(msg.contains("first of may")),
        other => panic!("expected DataFormatError, got {:?}", other),
    }
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        SeriesStore::from_csv("does/not/exist.csv"),
        Err(ForecastError::IoError(_))
    ));
}

#[test]
fn test_from_reader() {
    let bytes = b"date,shipped_qty\n2024-01,5\n2024-02,6\n";
    let series = SeriesStore::from_reader(&bytes[..]).unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series.as_slice().observed_values(), vec![5.0, 6.0]);
}
