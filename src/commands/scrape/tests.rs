use std::collections::HashMap;

use anyhow::bail;
use chrono::NaiveDate;

use crate::model::{MAX_PROBLEM_SLOTS, ProblemObservation, forecast_id};

use super::extract::{
    CANONICAL_PROBLEMS, ProblemExtractor, extract_danger_rating, normalize_problem_label,
};
use super::fetch::{ForecastPage, PageFetcher, forecast_url};
use super::reshape::{render_forecast_table, reshape, table_header};
use super::run::collect_observations;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn observation(date_: NaiveDate, slot_index: usize, problem_type: &str) -> ProblemObservation {
    ProblemObservation {
        forecast_id: forecast_id(date_),
        date: date_,
        slot_index,
        problem_type: problem_type.to_string(),
        danger_rating: "MODERATE".to_string(),
    }
}

struct StubFetcher {
    pages: HashMap<NaiveDate, ForecastPage>,
}

impl PageFetcher for StubFetcher {
    fn fetch(&self, date: NaiveDate) -> anyhow::Result<ForecastPage> {
        match self.pages.get(&date) {
            Some(page) => Ok(page.clone()),
            None => bail!("navigation timed out"),
        }
    }
}

fn page(body_text: &str, emphasized: &[&str]) -> ForecastPage {
    ForecastPage {
        body_text: body_text.to_string(),
        emphasized: emphasized.iter().map(ToString::to_string).collect(),
    }
}

#[test]
fn forecast_url_segments_are_not_zero_padded() {
    assert_eq!(
        forecast_url("salt-lake", date(2025, 4, 9)),
        "https://utahavalanchecenter.org/forecast/salt-lake/4/9/2025"
    );
    assert_eq!(
        forecast_url("salt-lake", date(2024, 11, 24)),
        "https://utahavalanchecenter.org/forecast/salt-lake/11/24/2024"
    );
}

#[test]
fn normalize_maps_known_aliases_to_canonical_labels() {
    let cases = [
        ("Storm Slab", "New Snow"),
        ("Loose Dry", "New Snow"),
        ("Dry Loose", "New Snow"),
        ("Wind Slab", "Wind-Drifted Snow"),
        ("Wind Drifted Snow", "Wind-Drifted Snow"),
        ("Persistent Slab", "Persistent Weak Layer"),
        ("Wet Slab", "Wet Snow"),
        ("Loose Wet", "Wet Snow"),
        ("Wet Loose", "Wet Snow"),
        ("Glide Avalanche", "Gliding Snow"),
        ("Cornice Fall", "Cornices"),
        ("Cornices", "Cornices"),
    ];

    for (raw, canonical) in cases {
        assert_eq!(normalize_problem_label(raw), canonical);
        assert!(CANONICAL_PROBLEMS.contains(&canonical));
    }
}

#[test]
fn normalize_passes_unknown_labels_through_unchanged() {
    assert_eq!(normalize_problem_label("Deep Slab"), "Deep Slab");
    // Exact-string matching: case and whitespace variants are unknown.
    assert_eq!(normalize_problem_label("wind slab"), "wind slab");
    assert_eq!(normalize_problem_label("Wind Slab "), "Wind Slab ");
}

#[test]
fn extract_returns_empty_for_text_without_problem_headings() {
    let extractor = ProblemExtractor::new().unwrap();
    let extraction = extractor.extract("General conditions remain stable today.\n", &[]);

    assert!(extraction.problems.is_empty());
    assert_eq!(extraction.danger_rating, "None");
}

#[test]
fn extract_preserves_page_order_and_drops_duplicates() {
    let extractor = ProblemExtractor::new().unwrap();
    let text = "Avalanche Problem #1\nWind Slab\n\
                Avalanche Problem #2\nWind Drifted Snow\n\
                Avalanche Problem #3\nStorm Slab\n";

    let extraction = extractor.extract(text, &[]);
    // Both wind titles normalize to the same category; the second is dropped.
    assert_eq!(extraction.problems, vec!["Wind-Drifted Snow", "New Snow"]);
}

#[test]
fn extract_matches_heading_case_insensitively_and_without_number() {
    let extractor = ProblemExtractor::new().unwrap();
    let text = "AVALANCHE PROBLEM # 2\nCornice Fall\nAvalanche Problem\nGlide Avalanche\n";

    let extraction = extractor.extract(text, &[]);
    assert_eq!(extraction.problems, vec!["Cornices", "Gliding Snow"]);
}

#[test]
fn danger_rating_takes_first_matching_token_in_page_order() {
    let emphasized = ["Tuesday", "considerable", "HIGH"].map(String::from);
    assert_eq!(extract_danger_rating(&emphasized), "CONSIDERABLE");
}

#[test]
fn danger_rating_defaults_to_none_sentinel() {
    assert_eq!(extract_danger_rating(&[]), "None");
    assert_eq!(
        extract_danger_rating(&["Forecast".to_string(), "Wasatch".to_string()]),
        "None"
    );
}

#[test]
fn reshape_emits_one_row_per_forecast_with_all_slots_populated() {
    let first = date(2024, 12, 1);
    let second = date(2024, 12, 2);
    let observations = vec![
        observation(second, 1, "Wet Snow"),
        observation(first, 1, "New Snow"),
        observation(first, 2, "Cornices"),
    ];

    let outcome = reshape(&observations);
    assert_eq!(outcome.rows.len(), 2);
    assert!(outcome.dropped.is_empty());

    // Rows come out in ascending date order.
    let row = &outcome.rows[0];
    assert_eq!(row.forecast_id, "f20241201");
    assert_eq!(row.problem_slots[0], "New Snow");
    assert_eq!(row.problem_slots[1], "Cornices");
    assert_eq!(&row.problem_slots[2..], ["NA", "NA", "NA"]);

    let row = &outcome.rows[1];
    assert_eq!(row.forecast_id, "f20241202");
    assert_eq!(row.problem_slots[0], "Wet Snow");
    assert!(row.problem_slots[1..].iter().all(|slot| slot == "NA"));
}

#[test]
fn reshape_is_idempotent() {
    let observations = vec![
        observation(date(2025, 1, 5), 1, "Wind-Drifted Snow"),
        observation(date(2025, 1, 5), 2, "Persistent Weak Layer"),
    ];

    let first = reshape(&observations);
    let second = reshape(&observations);
    assert_eq!(first.rows, second.rows);
    assert_eq!(first.dropped, second.dropped);
}

#[test]
fn reshape_surfaces_problems_beyond_slot_capacity() {
    let day = date(2025, 2, 10);
    let observations: Vec<ProblemObservation> = (1..=MAX_PROBLEM_SLOTS + 1)
        .map(|slot| observation(day, slot, "New Snow"))
        .collect();

    let outcome = reshape(&observations);
    assert_eq!(outcome.rows.len(), 1);
    assert_eq!(outcome.dropped.len(), 1);
    assert_eq!(outcome.dropped[0].slot_index, MAX_PROBLEM_SLOTS + 1);
    assert_eq!(outcome.dropped[0].forecast_id, forecast_id(day));
}

#[test]
fn table_header_has_fixed_slot_columns() {
    let header = table_header();
    assert_eq!(
        header,
        vec![
            "forecast_id",
            "date",
            "Avalanche Problem #1",
            "Avalanche Problem #2",
            "Avalanche Problem #3",
            "Avalanche Problem #4",
            "Avalanche Problem #5",
            "danger_rating",
            "danger_low",
            "danger_mid",
            "danger_high",
            "likelihood",
            "size",
        ]
    );
}

#[test]
fn rendered_table_fills_missing_slots_and_placeholders() {
    let outcome = reshape(&[observation(date(2024, 11, 24), 1, "Wet Snow")]);
    let table = render_forecast_table(&outcome.rows);
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[1],
        "f20241124,2024-11-24,Wet Snow,NA,NA,NA,NA,MODERATE,TBD,TBD,TBD,TBD,TBD"
    );
}

#[test]
fn collector_pivots_two_problem_page_into_single_row() {
    let day = date(2025, 3, 1);
    let fetcher = StubFetcher {
        pages: HashMap::from([(
            day,
            page(
                "Avalanche Problem #1\nWind Slab\nAvalanche Problem #2\nPersistent Slab\n",
                &[],
            ),
        )]),
    };
    let extractor = ProblemExtractor::new().unwrap();

    let outcome = collect_observations(&[day], &fetcher, &extractor);
    assert_eq!(outcome.observations.len(), 2);
    assert_eq!(outcome.dates_fetched, 1);

    let reshaped = reshape(&outcome.observations);
    assert_eq!(reshaped.rows.len(), 1);

    let row = &reshaped.rows[0];
    assert_eq!(row.problem_slots[0], "Wind-Drifted Snow");
    assert_eq!(row.problem_slots[1], "Persistent Weak Layer");
    assert!(row.problem_slots[2..].iter().all(|slot| slot == "NA"));
    assert_eq!(row.danger_rating, "None");
}

#[test]
fn collector_skips_failed_dates_and_continues() {
    let first = date(2025, 3, 1);
    let missing = date(2025, 3, 2);
    let third = date(2025, 3, 3);

    let body = "Avalanche Problem #1\nStorm Slab\n";
    let fetcher = StubFetcher {
        pages: HashMap::from([
            (first, page(body, &["MODERATE"])),
            (third, page(body, &["HIGH"])),
        ]),
    };
    let extractor = ProblemExtractor::new().unwrap();

    let outcome = collect_observations(&[first, missing, third], &fetcher, &extractor);
    assert_eq!(outcome.dates_fetched, 2);
    assert_eq!(outcome.dates_failed, 1);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("2025-03-02"));

    let reshaped = reshape(&outcome.observations);
    assert_eq!(reshaped.rows.len(), 2);
    assert!(
        reshaped
            .rows
            .iter()
            .all(|row| row.forecast_id != forecast_id(missing))
    );
}

#[test]
fn collector_counts_pages_without_problems_as_empty() {
    let day = date(2025, 4, 9);
    let fetcher = StubFetcher {
        pages: HashMap::from([(day, page("Mountain weather summary only.\n", &["LOW"]))]),
    };
    let extractor = ProblemExtractor::new().unwrap();

    let outcome = collect_observations(&[day], &fetcher, &extractor);
    assert_eq!(outcome.dates_fetched, 1);
    assert_eq!(outcome.dates_empty, 1);
    assert!(outcome.observations.is_empty());

    // The digest still records the visit, rating included.
    assert_eq!(outcome.pages.len(), 1);
    assert_eq!(outcome.pages[0].danger_rating, "LOW");
    assert_eq!(outcome.pages[0].problem_count, 0);
}
