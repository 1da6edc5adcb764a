use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fixed width of the problem-slot section of the output table.
pub const MAX_PROBLEM_SLOTS: usize = 5;

/// Marker for a slot column with no problem, distinct from an absent column.
pub const SLOT_NULL_MARKER: &str = "NA";

/// Placeholder for scalar fields a later extraction stage will fill in.
pub const TBD_SENTINEL: &str = "TBD";

/// Rating recorded when no danger level appears on the page.
pub const NO_RATING: &str = "None";

pub fn forecast_id(date: NaiveDate) -> String {
    format!("f{}", date.format("%Y%m%d"))
}

#[derive(Debug, Clone, Serialize)]
pub struct ProblemObservation {
    pub forecast_id: String,
    pub date: NaiveDate,
    /// 1-based, first-appearance order on the page. Positional, not severity.
    pub slot_index: usize,
    pub problem_type: String,
    pub danger_rating: String,
}

/// One wide row per forecast date, fixed slot width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRow {
    pub forecast_id: String,
    pub date: NaiveDate,
    pub problem_slots: [String; MAX_PROBLEM_SLOTS],
    pub danger_rating: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDigest {
    pub date: NaiveDate,
    pub page_sha256: String,
    pub problem_count: usize,
    pub danger_rating: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapePaths {
    pub out_path: String,
    pub manifest_dir: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeCounts {
    pub dates_requested: usize,
    pub dates_fetched: usize,
    pub dates_failed: usize,
    pub dates_empty: usize,
    pub observations: usize,
    pub forecast_rows: usize,
    pub problems_dropped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub paths: ScrapePaths,
    pub counts: ScrapeCounts,
    pub pages: Vec<PageDigest>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_id_is_prefixed_compact_date() {
        let date = NaiveDate::from_ymd_opt(2024, 11, 24).unwrap();
        assert_eq!(forecast_id(date), "f20241124");
    }
}
