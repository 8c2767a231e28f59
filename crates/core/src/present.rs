//! Display values derived from a [`PredictionView`]. No I/O; the CLI (or any
//! other sink) only lays these out.

use crate::domain::analysis::ComprehensiveAnalysis;
use crate::domain::association::AssociationRule;
use crate::domain::forecast::ForecastSeries;
use crate::orchestrator::PredictionView;
use crate::time::calendar;
use serde::Serialize;

pub const NO_INSIGHTS_MESSAGE: &str = "No significant market insights found for the selected stocks.";
pub const NO_INSIGHTS_HINT: &str = "Try different stock combinations";
pub const INSIGHTS_UNAVAILABLE_MESSAGE: &str = "Market insights could not be loaded for this query.";

pub const TROUBLESHOOTING: [&str; 4] = [
    "Verify the stock symbol (e.g., AAPL for Apple, GOOGL for Google)",
    "Check your internet connection",
    "Ensure the backend prediction server is running",
    "Try a different stock symbol",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Positive,
    Neutral,
    Negative,
}

impl Tone {
    pub fn of_change(change: f64) -> Self {
        if change >= 0.0 {
            Tone::Positive
        } else {
            Tone::Negative
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub date: String,
    pub price: String,
}

pub fn forecast_rows(series: &ForecastSeries) -> Vec<ForecastRow> {
    series
        .points
        .iter()
        .map(|p| ForecastRow {
            date: calendar::format_ymd(p.date),
            price: format!("${:.2}", p.price),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Axis label, e.g. "Oct 16".
    pub label: String,
    pub price: f64,
    /// Relative to the first point, percent.
    pub change_percent: f64,
}

pub fn chart_points(series: &ForecastSeries) -> Vec<ChartPoint> {
    series
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| ChartPoint {
            label: p.date.format("%b %-d").to_string(),
            price: p.price,
            change_percent: series.change_from_initial(i).unwrap_or(0.0),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSummary {
    pub initial_price: String,
    pub final_price: String,
    pub change: String,
    pub tone: Tone,
}

/// `None` for an empty series, which renders no summary at all.
pub fn price_summary(series: &ForecastSeries) -> Option<PriceSummary> {
    if series.is_empty() {
        return None;
    }
    let m = series.metrics();
    Some(PriceSummary {
        initial_price: format_usd(m.initial_price),
        final_price: format_usd(m.final_price),
        change: format!("{:.2}%", m.change_percent),
        tone: if m.is_gain() {
            Tone::Positive
        } else {
            Tone::Negative
        },
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleLine {
    pub label: String,
    pub lift: String,
    pub support: String,
    pub confidence: String,
}

impl From<&AssociationRule> for RuleLine {
    fn from(rule: &AssociationRule) -> Self {
        Self {
            label: rule.label(),
            lift: format!("Lift: {:.2}", rule.lift),
            support: format!("Support: {:.4}", rule.support),
            confidence: format!("Confidence: {:.4}", rule.confidence),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InsightsPanel {
    Rules { rules: Vec<RuleLine> },
    NoSignificantInsights,
    /// The association call failed or never ran.
    Unavailable,
    Loading,
}

pub fn insights_panel(view: &PredictionView) -> InsightsPanel {
    match &view.association_rules {
        Some(rules) if rules.is_empty() => InsightsPanel::NoSignificantInsights,
        Some(rules) => InsightsPanel::Rules {
            rules: rules.iter().map(RuleLine::from).collect(),
        },
        None if view.loading() => InsightsPanel::Loading,
        None => InsightsPanel::Unavailable,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisHighlights {
    pub company_name: String,
    pub sector: String,
    pub industry: String,
    pub current_price: String,
    pub fifty_two_week_high: String,
    pub fifty_two_week_low: String,
    pub market_cap: String,
    pub pe_ratio: String,
    pub dividend_yield: String,
    pub beta: String,
    pub volatility: String,
    pub volatility_tone: Tone,
    pub sharpe_ratio: String,
    pub risk_level: String,
    pub risk_level_tone: Tone,
    pub monthly_returns: Vec<(String, String, Tone)>,
    pub recommendations: Option<(u32, u32, u32)>,
}

pub fn analysis_highlights(a: &ComprehensiveAnalysis) -> AnalysisHighlights {
    let perf = &a.performance_analysis;
    let risk = &a.risk_assessment;
    AnalysisHighlights {
        company_name: a.basic_info.company_name.clone(),
        sector: a.basic_info.sector.clone(),
        industry: a.basic_info.industry.clone(),
        current_price: format_usd_plain(a.price_metrics.current_price),
        fifty_two_week_high: format_usd_plain(a.price_metrics.fifty_two_week_high),
        fifty_two_week_low: format_usd_plain(a.price_metrics.fifty_two_week_low),
        market_cap: format!("${:.2}B", a.financial_health.market_cap_billions()),
        pe_ratio: format!("{:.2}", a.financial_health.pe_ratio),
        dividend_yield: format!("{:.2}%", a.financial_health.dividend_yield_percent()),
        beta: format!("{:.2}", a.financial_health.beta),
        volatility: format!("{:.2}% ({})", perf.volatility, risk.volatility_category),
        volatility_tone: volatility_tone(&risk.volatility_category),
        sharpe_ratio: format!("{:.2}", perf.sharpe_ratio),
        risk_level: risk.investment_risk_level.clone(),
        risk_level_tone: risk_level_tone(&risk.investment_risk_level),
        monthly_returns: perf
            .monthly_returns
            .iter()
            .map(|m| (m.month.clone(), format!("{}%", m.return_pct), Tone::of_change(m.return_pct)))
            .collect(),
        recommendations: a
            .analyst_recommendations
            .map(|r| (r.buy, r.hold, r.sell)),
    }
}

pub fn volatility_tone(category: &str) -> Tone {
    match category {
        "Low" => Tone::Positive,
        "Moderate" => Tone::Neutral,
        _ => Tone::Negative,
    }
}

pub fn risk_level_tone(level: &str) -> Tone {
    match level {
        "Conservative" => Tone::Positive,
        "Moderate" => Tone::Neutral,
        _ => Tone::Negative,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPanel {
    pub message: String,
    pub troubleshooting: Vec<&'static str>,
}

pub fn error_panel(view: &PredictionView) -> Option<ErrorPanel> {
    let err = view.error()?;
    Some(ErrorPanel {
        message: err.user_message(),
        troubleshooting: TROUBLESHOOTING.to_vec(),
    })
}

/// `$1,234.56`: thousands separators, two decimals.
pub fn format_usd(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}${}.{frac_part}", group_thousands(int_part))
}

/// `$1,234.5`: thousands separators, decimals only as needed (at most three).
pub fn format_usd_plain(value: f64) -> String {
    let digits = format_number(value.abs());
    if value < 0.0 && digits != "0" {
        format!("-${digits}")
    } else {
        format!("${digits}")
    }
}

/// `38,150.3`: thousands separators, trailing zeros dropped, at most three decimals.
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.3}", value.abs());
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    let grouped = match trimmed.split_once('.') {
        Some((int_part, frac_part)) => format!("{}.{frac_part}", group_thousands(int_part)),
        None => group_thousands(trimmed),
    };
    if value < 0.0 && grouped != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
