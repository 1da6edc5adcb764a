use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::{
    ForecastRow, MAX_PROBLEM_SLOTS, ProblemObservation, SLOT_NULL_MARKER, TBD_SENTINEL,
};
use crate::util::ensure_directory;

/// An observation that did not fit the fixed slot width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DroppedProblem {
    pub forecast_id: String,
    pub slot_index: usize,
    pub problem_type: String,
}

#[derive(Debug, Default)]
pub(crate) struct ReshapeOutcome {
    pub rows: Vec<ForecastRow>,
    pub dropped: Vec<DroppedProblem>,
}

/// Pivot flat (date, slot) observations into one fixed-width row per
/// forecast. Pure: the same input always yields the same rows.
pub(crate) fn reshape(observations: &[ProblemObservation]) -> ReshapeOutcome {
    let mut order: Vec<String> = Vec::new();
    let mut rows: HashMap<String, ForecastRow> = HashMap::new();
    let mut dropped = Vec::new();

    for observation in observations {
        let row = rows
            .entry(observation.forecast_id.clone())
            .or_insert_with(|| {
                order.push(observation.forecast_id.clone());
                ForecastRow {
                    forecast_id: observation.forecast_id.clone(),
                    date: observation.date,
                    problem_slots: std::array::from_fn(|_| SLOT_NULL_MARKER.to_string()),
                    danger_rating: observation.danger_rating.clone(),
                }
            });

        if observation.slot_index == 0 || observation.slot_index > MAX_PROBLEM_SLOTS {
            dropped.push(DroppedProblem {
                forecast_id: observation.forecast_id.clone(),
                slot_index: observation.slot_index,
                problem_type: observation.problem_type.clone(),
            });
            continue;
        }

        row.problem_slots[observation.slot_index - 1] = observation.problem_type.clone();
    }

    let mut rows: Vec<ForecastRow> = order
        .into_iter()
        .filter_map(|forecast_id| rows.remove(&forecast_id))
        .collect();
    rows.sort_by_key(|row| row.date);

    ReshapeOutcome { rows, dropped }
}

pub(crate) fn table_header() -> Vec<String> {
    let mut header = vec!["forecast_id".to_string(), "date".to_string()];
    for slot in 1..=MAX_PROBLEM_SLOTS {
        header.push(format!("Avalanche Problem #{slot}"));
    }
    header.extend(
        [
            "danger_rating",
            "danger_low",
            "danger_mid",
            "danger_high",
            "likelihood",
            "size",
        ]
        .map(String::from),
    );
    header
}

pub(crate) fn render_forecast_table(rows: &[ForecastRow]) -> String {
    let mut lines = vec![row_to_csv(&table_header())];

    for row in rows {
        let mut cells = vec![row.forecast_id.clone(), row.date.to_string()];
        cells.extend(row.problem_slots.iter().cloned());
        cells.push(row.danger_rating.clone());
        // Sub-ratings, likelihood and size await a later extraction stage.
        cells.extend(std::iter::repeat_n(TBD_SENTINEL.to_string(), 5));
        lines.push(row_to_csv(&cells));
    }

    let mut table = lines.join("\n");
    table.push('\n');
    table
}

pub(crate) fn write_forecast_table(path: &Path, rows: &[ForecastRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    fs::write(path, render_forecast_table(rows))
        .with_context(|| format!("failed to write forecast table: {}", path.display()))
}

fn row_to_csv(cells: &[String]) -> String {
    cells
        .iter()
        .map(|cell| escape_csv_cell(cell))
        .collect::<Vec<String>>()
        .join(",")
}

fn escape_csv_cell(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
