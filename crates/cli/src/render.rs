//! Terminal layout for prediction views and market trends.

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use stockcast_core::domain::forecast::ForecastSeries;
use stockcast_core::domain::market_trends::{MarketTrends, SectorPerformance};
use stockcast_core::orchestrator::PredictionView;
use stockcast_core::present::{self, InsightsPanel, Tone};
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ViewMode {
    /// One text bar per forecast point
    #[default]
    Chart,
    /// Date / predicted price table
    Table,
}

#[derive(Tabled)]
struct PriceRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Predicted Price")]
    price: String,
}

#[derive(Tabled)]
struct KeyValue {
    #[tabled(rename = "Metric")]
    key: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct IndexRow {
    #[tabled(rename = "Index")]
    name: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "%")]
    percent: String,
}

#[derive(Tabled)]
struct SectorRow {
    #[tabled(rename = "Sector")]
    sector: String,
    #[tabled(rename = "1 Day")]
    one_day: String,
    #[tabled(rename = "1 Week")]
    one_week: String,
    #[tabled(rename = "1 Month")]
    one_month: String,
    #[tabled(rename = "3 Months")]
    three_months: String,
    #[tabled(rename = "YTD")]
    ytd: String,
    #[tabled(rename = "1 Year")]
    one_year: String,
}

pub fn prediction(view: &PredictionView, mode: ViewMode) -> String {
    let mut out = Vec::new();

    if let Some(q) = &view.query {
        out.push(heading(&format!("Stock Price Prediction: {}", q.symbol)));
    }

    if let Some(series) = &view.forecast {
        out.push(heading("Forecast"));
        out.push(match mode {
            ViewMode::Chart => forecast_chart(series),
            ViewMode::Table => forecast_table(series),
        });
        if let Some(s) = present::price_summary(series) {
            out.push(format!(
                "Initial {}  Final {}  Change {}",
                s.initial_price.bold(),
                s.final_price.bold(),
                paint(&s.change, s.tone).bold()
            ));
        }
    }

    if view.query.is_some() {
        out.push(heading("Market Insights"));
        out.push(insights(&present::insights_panel(view)));
    }

    if let Some(a) = &view.analysis {
        out.push(heading("Comprehensive Analysis"));
        out.push(analysis(&present::analysis_highlights(a)));
    }

    if let Some(panel) = present::error_panel(view) {
        out.push(heading("Error"));
        out.push(paint(&panel.message, Tone::Negative).to_string());
        out.push("Troubleshooting:".bold().to_string());
        for tip in panel.troubleshooting {
            out.push(format!("  • {tip}"));
        }
    }

    out.join("\n")
}

pub fn forecast_table(series: &ForecastSeries) -> String {
    let rows = present::forecast_rows(series).into_iter().map(|r| PriceRow {
        date: r.date,
        price: r.price,
    });
    table(rows)
}

pub fn forecast_chart(series: &ForecastSeries) -> String {
    let points = present::chart_points(series);
    let (min, max) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.price), hi.max(p.price))
    });

    points
        .iter()
        .map(|p| {
            let change = format!("{:+.2}%", p.change_percent);
            format!(
                "{:>6} │{:<width$} ${:.2} {}",
                p.label,
                bar(p.price, min, max, BAR_WIDTH).cyan(),
                p.price,
                paint(&change, Tone::of_change(p.change_percent)),
                width = BAR_WIDTH
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn insights(panel: &InsightsPanel) -> String {
    match panel {
        InsightsPanel::Rules { rules } => rules
            .iter()
            .map(|r| {
                format!(
                    "  • {}  {}  {}  {}",
                    r.label.bold(),
                    r.lift,
                    r.support.dimmed(),
                    r.confidence.dimmed()
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        InsightsPanel::NoSignificantInsights => format!(
            "{}\n{}",
            present::NO_INSIGHTS_MESSAGE,
            present::NO_INSIGHTS_HINT.dimmed()
        ),
        InsightsPanel::Unavailable => present::INSIGHTS_UNAVAILABLE_MESSAGE.dimmed().to_string(),
        InsightsPanel::Loading => "Loading…".dimmed().to_string(),
    }
}

fn analysis(h: &present::AnalysisHighlights) -> String {
    let rows = vec![
        kv("Company", h.company_name.clone()),
        kv("Sector", h.sector.clone()),
        kv("Industry", h.industry.clone()),
        kv("Current Price", h.current_price.clone()),
        kv("52W High", h.fifty_two_week_high.clone()),
        kv("52W Low", h.fifty_two_week_low.clone()),
        kv("Market Cap", h.market_cap.clone()),
        kv("P/E Ratio", h.pe_ratio.clone()),
        kv("Dividend Yield", h.dividend_yield.clone()),
        kv("Beta", h.beta.clone()),
        kv("Volatility", paint(&h.volatility, h.volatility_tone).to_string()),
        kv("Sharpe Ratio", h.sharpe_ratio.clone()),
        kv("Risk Level", paint(&h.risk_level, h.risk_level_tone).to_string()),
    ];
    let mut out = vec![table(rows)];

    if !h.monthly_returns.is_empty() {
        out.push("Monthly Returns".bold().to_string());
        for (month, ret, tone) in &h.monthly_returns {
            out.push(format!("  {month:<16} {}", paint(ret, *tone)));
        }
    }

    if let Some((buy, hold, sell)) = h.recommendations {
        out.push(format!(
            "Analyst Recommendations  {} {}  {} {}  {} {}",
            "Buy".green(),
            buy,
            "Hold".yellow(),
            hold,
            "Sell".red(),
            sell
        ));
    }

    out.join("\n")
}

pub fn trends(t: &MarketTrends) -> String {
    let mut out = vec![heading("Market Indices")];
    out.push(table(t.market_indices.iter().map(|i| {
        let arrow = if i.change >= 0.0 { "▲" } else { "▼" };
        let tone = Tone::of_change(i.change);
        IndexRow {
            name: i.name.clone(),
            current: present::format_number(i.current),
            change: paint(
                &format!("{arrow} {}", present::format_number(i.change.abs())),
                tone,
            )
            .to_string(),
            percent: paint(&format!("{:.2}%", i.percent_change), tone).to_string(),
        }
    })));

    out.push(heading("Top Performing Sectors"));
    out.push(table(t.top_performing_sectors.iter().map(sector_row)));
    out.push(heading("Bottom Performing Sectors"));
    out.push(table(t.bottom_performing_sectors.iter().map(sector_row)));

    out.push(heading("Market Volatility (VIX)"));
    let (min, max) = t
        .market_volatility
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.value), hi.max(p.value))
        });
    for p in &t.market_volatility {
        out.push(format!(
            "{:>7} │{:<width$} {:.1}",
            p.date,
            bar(p.value, min, max, BAR_WIDTH).magenta(),
            p.value,
            width = BAR_WIDTH
        ));
    }

    out.push(heading("Sector Momentum"));
    for s in &t.sector_rotation {
        out.push(format!(
            "{:<24} │{:<width$} {:.1}%",
            s.sector,
            bar(s.momentum, 0.0, 1.0, BAR_WIDTH).green(),
            s.momentum * 100.0,
            width = BAR_WIDTH
        ));
    }

    out.join("\n")
}

fn sector_row(s: &SectorPerformance) -> SectorRow {
    let pct = |v: f64| paint(&format!("{v:.2}%"), Tone::of_change(v)).to_string();
    SectorRow {
        sector: s.sector.clone(),
        one_day: pct(s.one_day),
        one_week: pct(s.one_week),
        one_month: pct(s.one_month),
        three_months: pct(s.three_months),
        ytd: pct(s.ytd),
        one_year: pct(s.one_year),
    }
}

fn table<T: Tabled>(rows: impl IntoIterator<Item = T>) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::left()))
        .to_string()
}

fn kv(key: &'static str, value: String) -> KeyValue {
    KeyValue { key, value }
}

fn heading(title: &str) -> String {
    format!("\n{}", title.bold().underline())
}

fn paint(s: &str, tone: Tone) -> ColoredString {
    match tone {
        Tone::Positive => s.green(),
        Tone::Neutral => s.yellow(),
        Tone::Negative => s.red(),
    }
}

/// Bar length in `1..=width`, linear in `value` over `[min, max]`.
fn bar(value: f64, min: f64, max: f64, width: usize) -> String {
    let span = max - min;
    let frac = if span > 0.0 && span.is_finite() {
        ((value - min) / span).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let len = 1 + (frac * (width - 1) as f64).round() as usize;
    "█".repeat(len)
}
