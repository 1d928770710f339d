use chrono::NaiveDate;
use rstest::rstest;
use shipcast::{split, ForecastError, TimeSeries};

fn series(n: usize) -> TimeSeries {
    let values: Vec<f64> = (0..n).map(|v| 10.0 + v as f64).collect();
    TimeSeries::from_values(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), &values).unwrap()
}

#[rstest]
#[case(12, 3)]
#[case(12, 1)]
#[case(12, 11)]
#[case(2, 1)]
#[case(48, 12)]
fn test_split_partitions_series(#[case] len: usize, #[case] horizon: usize) {
    let s = series(len);
    let parts = split(s.as_slice(), horizon).unwrap();

    assert_eq!(parts.train.len(), len - horizon);
    assert_eq!(parts.test.len(), horizon);

    let mut months = parts.train.months();
    months.extend(parts.test.months());
    assert_eq!(months, s.as_slice().months());
    assert!(parts.train.last_month() < parts.test.first_month());
}

#[rstest]
#[case(5, 0)]
#[case(5, 5)]
#[case(5, 9)]
#[case(1, 1)]
fn test_split_rejects_horizon(#[case] len: usize, #[case] horizon: usize) {
    let s = series(len);
    assert!(matches!(
        split(s.as_slice(), horizon),
        Err(ForecastError::InvalidHorizonError { .. })
    ));
}

#[test]
fn test_split_does_not_copy() {
    let s = series(6);
    let parts = split(s.as_slice(), 2).unwrap();

    assert!(std::ptr::eq(
        parts.train.observations().as_ptr(),
        s.observations().as_ptr()
    ));
}
