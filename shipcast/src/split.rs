//! Train/test partitioning of a monthly series

use crate::error::{ForecastError, Result};
use crate::series::SeriesSlice;

/// Default number of held-out months
pub const DEFAULT_HORIZON: usize = 3;

/// A series partitioned into a training prefix and a testing suffix
#[derive(Debug, Clone, Copy)]
pub struct Split<'a> {
    /// All but the last `horizon` months
    pub train: SeriesSlice<'a>,
    /// The last `horizon` months
    pub test: SeriesSlice<'a>,
}

impl Split<'_> {
    /// Number of held-out months
    pub fn horizon(&self) -> usize {
        self.test.len()
    }
}

/// Split off the last `horizon` months for testing.
///
/// `horizon` must satisfy `0 < horizon < series.len()`.
pub fn split(series: SeriesSlice<'_>, horizon: usize) -> Result<Split<'_>> {
    let len = series.len();
    if horizon == 0 || horizon >= len {
        return Err(ForecastError::InvalidHorizonError { horizon, len });
    }

    let cut = len - horizon;
    Ok(Split {
        train: series.slice(0, cut),
        test: series.slice(cut, len),
    })
}
