use stockcast_core::domain::market_trends::{
    MarketIndex, MarketTrends, SectorMomentum, SectorPerformance, VolatilityPoint,
};

/// The fixed document served by `/api/market-trends`.
pub fn market_trends() -> MarketTrends {
    MarketTrends {
        top_performing_sectors: vec![
            sector("Technology", [1.2, 3.5, 5.8, 12.3, 15.7, 28.4]),
            sector("Healthcare", [0.8, 2.1, 4.2, 9.5, 11.2, 18.9]),
            sector("Consumer Discretionary", [0.6, 1.9, 3.7, 8.1, 10.5, 16.2]),
        ],
        bottom_performing_sectors: vec![
            sector("Energy", [-0.7, -2.1, -3.5, -7.2, -9.8, -12.4]),
            sector("Utilities", [-0.5, -1.8, -2.9, -5.6, -7.2, -9.8]),
            sector("Real Estate", [-0.3, -1.2, -2.1, -4.3, -5.9, -8.2]),
        ],
        market_indices: vec![
            index("S&P 500", 4782.82, 35.21, 0.74),
            index("Dow Jones", 38150.30, 368.95, 0.97),
            index("NASDAQ", 15628.04, 125.45, 0.81),
            index("Russell 2000", 2018.56, 12.75, 0.63),
        ],
        market_volatility: [
            18.5, 17.2, 19.8, 16.3, 15.9, 14.7, 13.8, 15.2, 16.8, 18.1, 16.5, 15.3,
        ]
        .into_iter()
        .enumerate()
        .map(|(i, value)| VolatilityPoint {
            date: format!("2023-{:02}", i + 1),
            value,
        })
        .collect(),
        sector_rotation: [
            ("Technology", 0.85),
            ("Healthcare", 0.72),
            ("Financials", 0.65),
            ("Consumer Discretionary", 0.58),
            ("Communication Services", 0.52),
            ("Industrials", 0.48),
            ("Materials", 0.42),
            ("Consumer Staples", 0.38),
            ("Real Estate", 0.32),
            ("Utilities", 0.25),
            ("Energy", 0.18),
        ]
        .into_iter()
        .map(|(sector, momentum)| SectorMomentum {
            sector: sector.to_string(),
            momentum,
        })
        .collect(),
    }
}

/// `[1d, 1w, 1m, 3m, ytd, 1y]`
fn sector(name: &str, r: [f64; 6]) -> SectorPerformance {
    SectorPerformance {
        sector: name.to_string(),
        one_day: r[0],
        one_week: r[1],
        one_month: r[2],
        three_months: r[3],
        ytd: r[4],
        one_year: r[5],
    }
}

fn index(name: &str, current: f64, change: f64, percent_change: f64) -> MarketIndex {
    MarketIndex {
        name: name.to_string(),
        current,
        change,
        percent_change,
    }
}
