use serde::{Deserialize, Deserializer, Serialize};

pub const NOT_AVAILABLE: &str = "N/A";

/// Pass-through record from `/comprehensive_analysis`. Sub-records default instead
/// of failing the decode; the service omits some of them when history is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveAnalysis {
    #[serde(default)]
    pub basic_info: BasicInfo,
    #[serde(default)]
    pub price_metrics: PriceMetrics,
    #[serde(default)]
    pub financial_health: FinancialHealth,
    #[serde(default)]
    pub performance_analysis: PerformanceAnalysis,
    #[serde(default)]
    pub risk_assessment: RiskAssessment,
    #[serde(default)]
    pub analyst_recommendations: Option<AnalystRecommendations>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicInfo {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub company_name: String,
    #[serde(default = "not_available", deserialize_with = "null_as_not_available")]
    pub sector: String,
    #[serde(default = "not_available", deserialize_with = "null_as_not_available")]
    pub industry: String,
}

impl Default for BasicInfo {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            sector: not_available(),
            industry: not_available(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceMetrics {
    #[serde(default)]
    pub current_price: f64,
    #[serde(default)]
    pub fifty_two_week_high: f64,
    #[serde(default)]
    pub fifty_two_week_low: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialHealth {
    #[serde(default)]
    pub market_cap: f64,
    #[serde(default)]
    pub pe_ratio: f64,
    /// Fraction, not percent.
    #[serde(default)]
    pub dividend_yield: f64,
    #[serde(default)]
    pub beta: f64,
}

impl FinancialHealth {
    pub fn market_cap_billions(&self) -> f64 {
        self.market_cap / 1_000_000_000.0
    }

    pub fn dividend_yield_percent(&self) -> f64 {
        self.dividend_yield * 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
    #[serde(default)]
    pub monthly_returns: Vec<MonthlyReturn>,
    /// Annualized, in percent.
    #[serde(default)]
    pub volatility: f64,
    #[serde(default)]
    pub sharpe_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    /// e.g. "March 2023".
    pub month: String,
    /// Percent.
    #[serde(rename = "return")]
    pub return_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    #[serde(default = "not_available", deserialize_with = "null_as_not_available")]
    pub volatility_category: String,
    #[serde(default = "not_available", deserialize_with = "null_as_not_available")]
    pub investment_risk_level: String,
}

impl Default for RiskAssessment {
    fn default() -> Self {
        Self {
            volatility_category: not_available(),
            investment_risk_level: not_available(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalystRecommendations {
    #[serde(default)]
    pub buy: u32,
    #[serde(default)]
    pub hold: u32,
    #[serde(default)]
    pub sell: u32,
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

// The service forwards upstream `None`s as JSON null; treat them like a missing key.
fn null_as_not_available<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(not_available))
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}
