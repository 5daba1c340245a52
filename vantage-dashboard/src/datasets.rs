use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Daily sales for one region, as charted on the Sales Analysis page
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub region: String,
    pub points: Vec<SalesPoint>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SalesPoint {
    pub date: NaiveDate,
    pub revenue: u64,
}

/// Customer retention for one quarter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Retention {
    pub period: String,
    pub total: u32,
    pub retained: u32,
}

pub const REGIONS: [&str; 4] = ["region-north", "region-south", "region-east", "region-west"];
pub const PERIODS: [&str; 4] = ["q1", "q2", "q3", "q4"];

const REVENUE_BASE: [u64; 7] = [1200, 1350, 980, 1610, 1475, 1720, 1390];

/// Seven days of hard-coded revenue starting at `start`
pub fn sales_series(region: &str, start: NaiveDate) -> TimeSeries {
    let offset = REGIONS.iter().position(|r| *r == region).unwrap_or(0) as u64;
    let points = REVENUE_BASE
        .iter()
        .enumerate()
        .filter_map(|(day, base)| {
            start
                .checked_add_days(Days::new(day as u64))
                .map(|date| SalesPoint {
                    date,
                    revenue: base + offset * 150,
                })
        })
        .collect();

    TimeSeries {
        region: region.to_string(),
        points,
    }
}

pub fn retention(period: &str) -> Retention {
    let (total, retained) = match period {
        "q1" => (420, 298),
        "q2" => (515, 371),
        "q3" => (468, 309),
        "q4" => (602, 455),
        _ => (0, 0),
    };

    Retention {
        period: period.to_string(),
        total,
        retained,
    }
}
