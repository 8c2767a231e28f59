use serde::{Deserialize, Serialize};

/// Document served by `GET /api/market-trends`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketTrends {
    pub top_performing_sectors: Vec<SectorPerformance>,
    pub bottom_performing_sectors: Vec<SectorPerformance>,
    pub market_indices: Vec<MarketIndex>,
    pub market_volatility: Vec<VolatilityPoint>,
    pub sector_rotation: Vec<SectorMomentum>,
}

/// Period returns in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorPerformance {
    pub sector: String,
    pub one_day: f64,
    pub one_week: f64,
    pub one_month: f64,
    pub three_months: f64,
    pub ytd: f64,
    pub one_year: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketIndex {
    pub name: String,
    pub current: f64,
    pub change: f64,
    pub percent_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityPoint {
    /// `YYYY-MM`.
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorMomentum {
    pub sector: String,
    /// 0..=1.
    pub momentum: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn uses_camel_case_keys() {
        let s = SectorPerformance {
            sector: "Technology".to_string(),
            one_day: 1.2,
            one_week: 3.5,
            one_month: 5.8,
            three_months: 12.3,
            ytd: 15.7,
            one_year: 28.4,
        };
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(
            v,
            json!({
                "sector": "Technology",
                "oneDay": 1.2,
                "oneWeek": 3.5,
                "oneMonth": 5.8,
                "threeMonths": 12.3,
                "ytd": 15.7,
                "oneYear": 28.4
            })
        );

        let idx: MarketIndex = serde_json::from_value(json!({
            "name": "S&P 500", "current": 4782.82, "change": 35.21, "percentChange": 0.74
        }))
        .unwrap();
        assert_eq!(idx.percent_change, 0.74);
    }
}
