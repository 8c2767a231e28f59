use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FORECAST_HORIZON: u32 = 10;

/// Symbols every association request is mined against, next to the queried one.
pub const REFERENCE_TICKERS: [&str; 3] = ["AAPL", "MSFT", "GOOG"];

pub const MIN_SUPPORT: f64 = 0.2;
pub const MIN_LIFT: f64 = 1.0;

pub const VALIDATION_MESSAGE: &str = "Please enter a valid stock symbol";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionQuery {
    pub symbol: String,
    pub forecast_horizon: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptySymbol;

impl std::fmt::Display for EmptySymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(VALIDATION_MESSAGE)
    }
}

impl std::error::Error for EmptySymbol {}

impl PredictionQuery {
    pub fn parse(raw: &str) -> Result<Self, EmptySymbol> {
        let symbol = normalize_symbol(raw).ok_or(EmptySymbol)?;
        let (start_date, end_date) = analysis_window();
        Ok(Self {
            symbol,
            forecast_horizon: DEFAULT_FORECAST_HORIZON,
            start_date,
            end_date,
        })
    }

    /// Queried symbol first, then the reference set in fixed order.
    pub fn association_tickers(&self) -> Vec<String> {
        std::iter::once(self.symbol.clone())
            .chain(REFERENCE_TICKERS.iter().map(|t| t.to_string()))
            .collect()
    }
}

pub fn normalize_symbol(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_uppercase())
}

fn analysis_window() -> (NaiveDate, NaiveDate) {
    // Fixed one-year window the correlation and analysis endpoints are queried over.
    (
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
    )
}
