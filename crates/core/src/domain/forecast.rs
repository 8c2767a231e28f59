use crate::time::calendar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Predicted prices labelled with client-side dates. The length follows what the
/// service returned, not the requested horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn from_predictions(predictions: Vec<f64>, today: NaiveDate) -> Self {
        let dates = calendar::consecutive_dates(today, predictions.len());
        let points = dates
            .into_iter()
            .zip(predictions)
            .map(|(date, price)| ForecastPoint { date, price })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn initial_price(&self) -> Option<f64> {
        self.points.first().map(|p| p.price)
    }

    pub fn final_price(&self) -> Option<f64> {
        self.points.last().map(|p| p.price)
    }

    pub fn metrics(&self) -> ForecastMetrics {
        let initial = self.initial_price().unwrap_or(0.0);
        let last = self.final_price().unwrap_or(0.0);
        ForecastMetrics {
            initial_price: initial,
            final_price: last,
            change_percent: percent_change(initial, last),
        }
    }

    /// Change of the point at `index` relative to the first point.
    pub fn change_from_initial(&self, index: usize) -> Option<f64> {
        let initial = self.initial_price()?;
        let point = self.points.get(index)?;
        Some(percent_change(initial, point.price))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    pub initial_price: f64,
    pub final_price: f64,
    pub change_percent: f64,
}

impl ForecastMetrics {
    pub fn is_gain(&self) -> bool {
        self.final_price >= self.initial_price
    }
}

/// Zero (or non-finite) base yields 0 instead of an infinity.
pub fn percent_change(from: f64, to: f64) -> f64 {
    if from == 0.0 || !from.is_finite() {
        return 0.0;
    }
    let pct = (to - from) / from * 100.0;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}
