//! Per-asset price series and their date-aligned combination

use chrono::{NaiveDate, TimeDelta};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::error::DataError;

/// Ordered (date, price) pairs for one ticker
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub ticker: String,
    pub points: Vec<(NaiveDate, f64)>,
}

impl PriceSeries {
    /// Create a series; the ticker is upper-cased
    pub fn new(ticker: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Self {
        Self {
            ticker: ticker.into().to_uppercase(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Prices for several assets on a common set of trading dates
///
/// Every column has exactly one price per date and dates are strictly
/// increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    tickers: Vec<String>,
    dates: Vec<NaiveDate>,
    columns: Vec<Vec<f64>>,
}

impl PriceHistory {
    /// Build from already aligned columns (one per ticker)
    pub fn from_columns(
        tickers: Vec<String>,
        dates: Vec<NaiveDate>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self, DataError> {
        if tickers.is_empty() {
            return Err(DataError::NoAssets);
        }
        if columns.len() != tickers.len() {
            return Err(DataError::ColumnCount {
                tickers: tickers.len(),
                columns: columns.len(),
            });
        }

        let tickers: Vec<String> = tickers.into_iter().map(|t| t.to_uppercase()).collect();
        check_unique(&tickers)?;

        for (ticker, column) in tickers.iter().zip(&columns) {
            if column.len() != dates.len() {
                return Err(DataError::Misaligned {
                    ticker: ticker.clone(),
                    got: column.len(),
                    expected: dates.len(),
                });
            }
        }

        for pair in dates.windows(2) {
            if pair[1] <= pair[0] {
                return Err(DataError::UnorderedDates {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }

        Ok(Self {
            tickers,
            dates,
            columns,
        })
    }

    /// Align independent series onto common dates
    ///
    /// Dates are the union across all series. A date missing from one asset
    /// takes that asset's price from the previous date, but only when that
    /// previous price was observed (at most one consecutive fill). Dates
    /// still missing any asset are dropped. Duplicate dates within a series
    /// keep the last price.
    pub fn align(series: Vec<PriceSeries>) -> Result<Self, DataError> {
        if series.is_empty() {
            return Err(DataError::NoAssets);
        }

        let tickers: Vec<String> = series.iter().map(|s| s.ticker.to_uppercase()).collect();
        check_unique(&tickers)?;

        let mut observed: Vec<BTreeMap<NaiveDate, f64>> = Vec::with_capacity(series.len());
        for s in &series {
            if s.points.is_empty() {
                return Err(DataError::EmptySeries(s.ticker.clone()));
            }
            observed.push(s.points.iter().copied().collect());
        }

        let all_dates: BTreeSet<NaiveDate> = observed
            .iter()
            .flat_map(|m| m.keys().copied())
            .collect();

        let mut dates = Vec::with_capacity(all_dates.len());
        let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(all_dates.len()); series.len()];
        let mut previous: Option<NaiveDate> = None;

        for date in all_dates {
            let row: Option<Vec<f64>> = observed
                .iter()
                .map(|prices| {
                    prices
                        .get(&date)
                        .or_else(|| previous.and_then(|p| prices.get(&p)))
                        .copied()
                })
                .collect();

            if let Some(row) = row {
                dates.push(date);
                for (column, price) in columns.iter_mut().zip(row) {
                    column.push(price);
                }
            }
            previous = Some(date);
        }

        tracing::debug!(
            "Aligned {} series onto {} common dates",
            tickers.len(),
            dates.len()
        );

        Ok(Self {
            tickers,
            dates,
            columns,
        })
    }

    /// Keep only dates within `days` calendar days of the last date
    ///
    /// A window reaching past the earliest representable date keeps every row.
    pub fn trailing_days(&self, days: u32) -> Self {
        let Some(&last) = self.dates.last() else {
            return self.clone();
        };
        let skip = match TimeDelta::try_days(i64::from(days))
            .and_then(|window| last.checked_sub_signed(window))
        {
            Some(start) => self.dates.partition_point(|d| *d < start),
            None => 0,
        };

        Self {
            tickers: self.tickers.clone(),
            dates: self.dates[skip..].to_vec(),
            columns: self.columns.iter().map(|c| c[skip..].to_vec()).collect(),
        }
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Price column for the asset at `index`
    pub fn column(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    pub fn num_assets(&self) -> usize {
        self.tickers.len()
    }

    /// Number of aligned dates
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

fn check_unique(tickers: &[String]) -> Result<(), DataError> {
    let mut seen = HashSet::new();
    for ticker in tickers {
        if !seen.insert(ticker.as_str()) {
            return Err(DataError::DuplicateTicker(ticker.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_align_identical_dates() {
        let a = PriceSeries::new("aapl", vec![(d(1), 10.0), (d(4), 11.0), (d(5), 12.0)]);
        let b = PriceSeries::new("msft", vec![(d(1), 20.0), (d(4), 21.0), (d(5), 22.0)]);

        let history = PriceHistory::align(vec![a, b]).unwrap();

        assert_eq!(history.tickers(), &["AAPL".to_string(), "MSFT".to_string()]);
        assert_eq!(history.len(), 3);
        assert_eq!(history.column(1), &[20.0, 21.0, 22.0]);
    }

    #[test]
    fn test_align_fills_single_gap() {
        let a = PriceSeries::new("A", vec![(d(1), 10.0), (d(4), 11.0), (d(5), 12.0)]);
        let b = PriceSeries::new("B", vec![(d(1), 20.0), (d(5), 22.0)]);

        let history = PriceHistory::align(vec![a, b]).unwrap();

        assert_eq!(history.dates(), &[d(1), d(4), d(5)]);
        assert_eq!(history.column(1), &[20.0, 20.0, 22.0]);
    }

    #[test]
    fn test_align_drops_rows_after_two_missing() {
        let a = PriceSeries::new(
            "A",
            vec![(d(1), 10.0), (d(4), 11.0), (d(5), 12.0), (d(6), 13.0)],
        );
        let b = PriceSeries::new("B", vec![(d(1), 20.0), (d(6), 23.0)]);

        let history = PriceHistory::align(vec![a, b]).unwrap();

        // d(4) is filled from d(1); d(5) would need a second consecutive fill
        assert_eq!(history.dates(), &[d(1), d(4), d(6)]);
        assert_eq!(history.column(0), &[10.0, 11.0, 13.0]);
        assert_eq!(history.column(1), &[20.0, 20.0, 23.0]);
    }

    #[test]
    fn test_align_leading_gap_is_dropped() {
        let a = PriceSeries::new("A", vec![(d(1), 10.0), (d(4), 11.0)]);
        let b = PriceSeries::new("B", vec![(d(4), 21.0)]);

        let history = PriceHistory::align(vec![a, b]).unwrap();
        assert_eq!(history.dates(), &[d(4)]);
    }

    #[test]
    fn test_align_keeps_last_duplicate() {
        let a = PriceSeries::new("A", vec![(d(1), 10.0), (d(1), 10.5), (d(4), 11.0)]);
        let history = PriceHistory::align(vec![a]).unwrap();
        assert_eq!(history.column(0), &[10.5, 11.0]);
    }

    #[test]
    fn test_align_errors() {
        assert_eq!(PriceHistory::align(vec![]), Err(DataError::NoAssets));

        let empty = PriceSeries::new("ZZZ", vec![]);
        assert_eq!(
            PriceHistory::align(vec![empty]),
            Err(DataError::EmptySeries("ZZZ".to_string()))
        );

        let a = PriceSeries::new("a", vec![(d(1), 1.0)]);
        let b = PriceSeries::new("A", vec![(d(1), 1.0)]);
        assert_eq!(
            PriceHistory::align(vec![a, b]),
            Err(DataError::DuplicateTicker("A".to_string()))
        );
    }

    #[test]
    fn test_from_columns_rejects_mismatch() {
        let err = PriceHistory::from_columns(
            vec!["A".into(), "B".into()],
            vec![d(1), d(4)],
            vec![vec![1.0, 2.0], vec![1.0]],
        )
        .unwrap_err();

        assert!(matches!(err, DataError::Misaligned { got: 1, expected: 2, .. }));
    }

    #[test]
    fn test_from_columns_rejects_unordered_dates() {
        let err = PriceHistory::from_columns(
            vec!["A".into()],
            vec![d(4), d(1)],
            vec![vec![1.0, 2.0]],
        )
        .unwrap_err();

        assert!(matches!(err, DataError::UnorderedDates { .. }));
    }

    #[test]
    fn test_trailing_days() {
        let history = PriceHistory::from_columns(
            vec!["A".into()],
            vec![d(1), d(4), d(5), d(8)],
            vec![vec![1.0, 2.0, 3.0, 4.0]],
        )
        .unwrap();

        let recent = history.trailing_days(4);
        assert_eq!(recent.dates(), &[d(4), d(5), d(8)]);
        assert_eq!(recent.column(0), &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_trailing_days_window_past_calendar_keeps_all_rows() {
        let history = PriceHistory::from_columns(
            vec!["A".into()],
            vec![d(1), d(4), d(5)],
            vec![vec![1.0, 2.0, 3.0]],
        )
        .unwrap();

        let all = history.trailing_days(100_000_000);
        assert_eq!(all, history);

        let widest = history.trailing_days(u32::MAX);
        assert_eq!(widest.len(), 3);
    }

    #[test]
    fn test_trailing_days_zero_keeps_last_date() {
        let history = PriceHistory::from_columns(
            vec!["A".into()],
            vec![d(1), d(4), d(5)],
            vec![vec![1.0, 2.0, 3.0]],
        )
        .unwrap();

        let last = history.trailing_days(0);
        assert_eq!(last.dates(), &[d(5)]);
    }
}
