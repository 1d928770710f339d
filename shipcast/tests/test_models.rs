use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rstest::rstest;
use shipcast::config::validate_model;
use shipcast::models::{
    Arima, Component, HoltWinters, ModelKind, ModelSpec, MovingAverage, Prophet, Sarima,
};
use shipcast::series::following_months;
use shipcast::{split, ForecastError, ForecastModel, TimeSeries};
use std::f64::consts::PI;

/// Four years of trend, yearly season and a small deterministic irregular part
fn shipments() -> TimeSeries {
    let values: Vec<f64> = (0..48)
        .map(|t| {
            let season = 20.0 * (2.0 * PI * t as f64 / 12.0).sin();
            let irregular = ((t * 7) % 5) as f64 * 1.5 - 3.0;
            200.0 + 1.5 * t as f64 + season + irregular
        })
        .collect();
    TimeSeries::from_values(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), &values).unwrap()
}

#[rstest]
#[case(ModelKind::MovingAverage)]
#[case(ModelKind::Arima)]
#[case(ModelKind::Sarima)]
#[case(ModelKind::HoltWinters)]
#[case(ModelKind::Prophet)]
fn test_forecast_contract(#[case] kind: ModelKind) {
    let series = shipments();
    let parts = split(series.as_slice(), 3).unwrap();
    let spec = ModelSpec::default_for(kind);

    let forecast = spec.forecast(parts.train, 3).unwrap();

    assert_eq!(forecast.model(), kind);
    assert_eq!(forecast.horizon(), 3);
    assert_eq!(
        forecast.months(),
        following_months(parts.train.last_month().unwrap(), 3).unwrap()
    );
    assert_eq!(forecast.months(), parts.test.months());
    assert!(forecast.values().iter().all(|v| v.is_finite()));
}

#[rstest]
#[case(ModelKind::MovingAverage)]
#[case(ModelKind::Arima)]
#[case(ModelKind::Sarima)]
#[case(ModelKind::HoltWinters)]
#[case(ModelKind::Prophet)]
fn test_forecast_is_deterministic(#[case] kind: ModelKind) {
    let series = shipments();
    let spec = ModelSpec::default_for(kind);

    let first = spec.forecast(series.as_slice(), 4).unwrap();
    let second = spec.forecast(series.as_slice(), 4).unwrap();
    assert_eq!(first, second);
}

#[rstest]
#[case(1, 1)]
#[case(3, 3)]
#[case(6, 12)]
#[case(12, 2)]
fn test_moving_average_on_constant_series(#[case] window: usize, #[case] horizon: usize) {
    let series =
        TimeSeries::from_values(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(), &[42.5; 12]).unwrap();
    let spec = ModelSpec::MovingAverage(MovingAverage::new(window).unwrap());

    let forecast = spec.forecast(series.as_slice(), horizon).unwrap();
    assert_eq!(forecast.values(), vec![42.5; horizon]);
}

#[test]
fn test_zero_horizon_rejected_for_every_model() {
    let series = shipments();
    for kind in ModelKind::ALL {
        assert!(matches!(
            ModelSpec::default_for(kind).forecast(series.as_slice(), 0),
            Err(ForecastError::InvalidHorizonError { horizon: 0, .. })
        ));
    }
}

#[test]
fn test_holt_winters_needs_two_seasons_for_any_components() {
    let short = TimeSeries::from_values(
        NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
        &(0..23).map(|t| 10.0 + t as f64).collect::<Vec<_>>(),
    )
    .unwrap();

    for (trend, seasonal) in [
        (Component::Additive, Component::Additive),
        (Component::None, Component::None),
        (Component::Multiplicative, Component::None),
    ] {
        let spec = ModelSpec::HoltWinters(HoltWinters::new(trend, seasonal, 12).unwrap());
        assert!(matches!(
            spec.forecast(short.as_slice(), 3),
            Err(ForecastError::InsufficientDataError { needed: 24, got: 23, .. })
        ));
    }
}

#[test]
fn test_arima_on_short_series() {
    let series = TimeSeries::from_values(
        NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
        &[5.0, 6.0, 7.0],
    )
    .unwrap();
    let spec = ModelSpec::Arima(Arima::new(2, 1, 2).unwrap());

    assert!(matches!(
        spec.forecast(series.as_slice(), 1),
        Err(ForecastError::InsufficientDataError { .. })
    ));
}

#[test]
fn test_sarima_follows_season() {
    let series = shipments();
    let parts = split(series.as_slice(), 6).unwrap();
    let spec = ModelSpec::Sarima(Sarima::new((0, 1, 0), (0, 1, 0, 12)).unwrap());

    let forecast = spec.forecast(parts.train, 6).unwrap();
    let actual = parts.test.observed_values();

    // Seasonal random walk with drift stays within the irregular noise
    for (got, want) in forecast.values().iter().zip(actual) {
        assert!((got - want).abs() < 10.0, "forecast {} vs actual {}", got, want);
    }
}

#[test]
fn test_prophet_ignores_missing_months() {
    let series = shipments();
    let mut points = series.observations().to_vec();
    points[10].value = None;
    points[20].value = None;
    let gappy = TimeSeries::from_observations(points).unwrap();

    let forecast = ModelSpec::Prophet(Prophet::default())
        .forecast(gappy.as_slice(), 3)
        .unwrap();
    assert_eq!(forecast.horizon(), 3);
}

#[test]
fn test_interpolating_models_accept_interior_gaps() {
    let series = shipments();
    let mut points = series.observations().to_vec();
    points[30].value = None;
    let gappy = TimeSeries::from_observations(points).unwrap();

    for kind in [ModelKind::Arima, ModelKind::HoltWinters] {
        let forecast = ModelSpec::default_for(kind).forecast(gappy.as_slice(), 2).unwrap();
        assert!(forecast.values().iter().all(|v| v.is_finite()));
    }
}

fn assert_invalid<M: ForecastModel>(model: M) {
    let series = shipments();
    assert!(
        matches!(
            model.forecast(series.as_slice(), 3),
            Err(ForecastError::InvalidParameter(_))
        ),
        "{:?} should be rejected",
        model
    );
}

#[test]
fn test_models_called_directly_check_parameters() {
    assert_invalid(MovingAverage { window: 0 });
    assert_invalid(HoltWinters {
        trend: Component::Additive,
        seasonal: Component::Additive,
        seasonal_periods: 0,
    });
    assert_invalid(HoltWinters {
        trend: Component::None,
        seasonal: Component::Multiplicative,
        seasonal_periods: 1,
    });
    assert_invalid(Sarima {
        s: 0,
        big_d: 0,
        big_p: 1,
        ..Sarima::default()
    });
    assert_invalid(Prophet {
        changepoint_range: 0.0,
        ..Prophet::default()
    });
}

#[test]
fn test_arima_orders_beyond_dashboard_range() {
    let wide = Arima { p: 6, d: 0, q: 0 };

    // Usable directly, but not through a validated configuration
    assert!(wide.validate().is_ok());
    assert!(matches!(
        validate_model(&ModelSpec::Arima(wide)),
        Err(ForecastError::InvalidParameter(_))
    ));
}
