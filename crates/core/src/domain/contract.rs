//! Request and response bodies of the external prediction service.

use crate::domain::association::AssociationRule;
use crate::domain::query::{PredictionQuery, MIN_LIFT, MIN_SUPPORT};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UNKNOWN_SERVER_ERROR: &str = "Unknown error";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub stock_symbol: String,
    pub forecast_horizon: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRequest {
    pub tickers: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub min_support: f64,
    pub min_lift: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<&PredictionQuery> for ForecastRequest {
    fn from(q: &PredictionQuery) -> Self {
        Self {
            stock_symbol: q.symbol.clone(),
            forecast_horizon: q.forecast_horizon,
        }
    }
}

impl From<&PredictionQuery> for AssociationRequest {
    fn from(q: &PredictionQuery) -> Self {
        Self {
            tickers: q.association_tickers(),
            start_date: q.start_date,
            end_date: q.end_date,
            min_support: MIN_SUPPORT,
            min_lift: MIN_LIFT,
        }
    }
}

impl From<&PredictionQuery> for AnalysisRequest {
    fn from(q: &PredictionQuery) -> Self {
        Self {
            symbol: q.symbol.clone(),
            start_date: q.start_date,
            end_date: q.end_date,
        }
    }
}

/// Both shapes the forecast endpoint has been seen to answer with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ForecastResponse {
    Flat {
        predictions: Vec<f64>,
    },
    Nested {
        forecast_data: ForecastData,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastData {
    pub predictions: Vec<f64>,
    // Server timestamps are ignored; labels are generated client-side.
    #[serde(default)]
    pub dates: Vec<String>,
}

impl ForecastResponse {
    pub fn into_predictions(self) -> Vec<f64> {
        match self {
            ForecastResponse::Flat { predictions } => predictions,
            ForecastResponse::Nested { forecast_data } => forecast_data.predictions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssociationResponse {
    #[serde(default)]
    pub rules: Vec<AssociationRule>,
}

/// Message carried by a non-success response: the `detail` field the service
/// attaches to its errors, verbatim when it is a string.
pub fn server_error_detail(body: &str) -> String {
    let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(body) else {
        return UNKNOWN_SERVER_ERROR.to_string();
    };
    match obj.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Null) | None => UNKNOWN_SERVER_ERROR.to_string(),
        Some(Value::String(_)) => UNKNOWN_SERVER_ERROR.to_string(),
        Some(other) => other.to_string(),
    }
}
