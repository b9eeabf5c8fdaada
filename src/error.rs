use chrono::NaiveDate;
use thiserror::Error;

/// Insufficient, misaligned or invalid price data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("No assets supplied")]
    NoAssets,

    #[error("No data returned for ticker: {0}")]
    EmptySeries(String),

    #[error("Ticker supplied more than once: {0}")]
    DuplicateTicker(String),

    #[error("Insufficient data: got {got} rows, need at least {need}")]
    InsufficientData { got: usize, need: usize },

    #[error("Invalid price {price} for {ticker} on {date}")]
    InvalidPrice {
        ticker: String,
        date: NaiveDate,
        price: f64,
    },

    #[error("Misaligned series: {ticker} has {got} prices, expected {expected}")]
    Misaligned {
        ticker: String,
        got: usize,
        expected: usize,
    },

    #[error("Expected one price column per ticker: {tickers} tickers, {columns} columns")]
    ColumnCount { tickers: usize, columns: usize },

    #[error("Dates must be strictly increasing ({previous} followed by {next})")]
    UnorderedDates { previous: NaiveDate, next: NaiveDate },

    #[error("Invalid risk-free rate: {0}")]
    InvalidRiskFreeRate(f64),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Failed to read prices: {0}")]
    Load(String),
}

/// The covariance matrix cannot be used for a stable solve
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SingularMatrixError {
    #[error("Covariance matrix is empty")]
    Empty,

    #[error("Dimension mismatch: {means} mean returns for a {rows}x{cols} covariance matrix")]
    DimensionMismatch { means: usize, rows: usize, cols: usize },

    #[error("Covariance matrix contains non-finite values")]
    NonFinite,

    #[error("Covariance matrix is singular (zero variance or collinear assets)")]
    Singular,

    #[error("Covariance matrix is ill-conditioned: condition number {condition_number:.3e} exceeds {limit:.3e}")]
    IllConditioned { condition_number: f64, limit: f64 },
}

/// Either failure of an estimate-then-solve run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KellyError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Computation error: {0}")]
    SingularMatrix(#[from] SingularMatrixError),
}

/// Validation functions
pub fn validate_risk_free_rate(rate: f64) -> Result<(), DataError> {
    if !rate.is_finite() || rate <= -1.0 {
        return Err(DataError::InvalidRiskFreeRate(rate));
    }
    Ok(())
}

pub fn validate_price(ticker: &str, date: NaiveDate, price: f64) -> Result<(), DataError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(DataError::InvalidPrice {
            ticker: ticker.to_string(),
            date,
            price,
        });
    }
    Ok(())
}
