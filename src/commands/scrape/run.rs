use std::time::Duration;

use anyhow::{Result, bail};
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::cli::ScrapeArgs;
use crate::model::{
    PageDigest, ProblemObservation, ScrapeCounts, ScrapePaths, ScrapeRunManifest, forecast_id,
};
use crate::util::{now_utc_string, sha256_text, utc_compact_string, write_json_pretty};

use super::extract::{CANONICAL_PROBLEMS, ProblemExtractor};
use super::fetch::{BrowserFetcher, PageFetcher};
use super::reshape::{reshape, write_forecast_table};

pub fn run(args: ScrapeArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    if args.end_date < args.start_date {
        bail!(
            "end date {} precedes start date {}",
            args.end_date,
            args.start_date
        );
    }

    let manifest_dir = args.manifest_dir.clone().unwrap_or_else(|| {
        args.out_path
            .parent()
            .map(|parent| parent.join("manifests"))
            .unwrap_or_else(|| "manifests".into())
    });
    let manifest_path = manifest_dir.join(format!(
        "scrape_run_{}.json",
        utc_compact_string(started_ts)
    ));

    let dates: Vec<NaiveDate> = args
        .start_date
        .iter_days()
        .take_while(|date| *date <= args.end_date)
        .collect();

    info!(
        run_id = %run_id,
        location = %args.location,
        start_date = %args.start_date,
        end_date = %args.end_date,
        dates = dates.len(),
        "starting scrape"
    );

    let fetcher = BrowserFetcher::new(&args.location, Duration::from_secs(args.settle_secs))?;
    let extractor = ProblemExtractor::new()?;

    let outcome = collect_observations(&dates, &fetcher, &extractor);

    let reshaped = reshape(&outcome.observations);
    for drop in &reshaped.dropped {
        warn!(
            forecast_id = %drop.forecast_id,
            slot_index = drop.slot_index,
            problem_type = %drop.problem_type,
            "problem beyond slot capacity dropped from table"
        );
    }

    write_forecast_table(&args.out_path, &reshaped.rows)?;
    info!(
        path = %args.out_path.display(),
        rows = reshaped.rows.len(),
        "wrote forecast table"
    );

    let manifest = ScrapeRunManifest {
        manifest_version: 1,
        run_id,
        status: if reshaped.rows.is_empty() {
            "completed_empty".to_string()
        } else {
            "completed".to_string()
        },
        started_at,
        updated_at: now_utc_string(),
        command: render_scrape_command(&args),
        paths: ScrapePaths {
            out_path: args.out_path.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
        },
        counts: ScrapeCounts {
            dates_requested: dates.len(),
            dates_fetched: outcome.dates_fetched,
            dates_failed: outcome.dates_failed,
            dates_empty: outcome.dates_empty,
            observations: outcome.observations.len(),
            forecast_rows: reshaped.rows.len(),
            problems_dropped: reshaped.dropped.len(),
        },
        pages: outcome.pages,
        warnings: outcome.warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote run manifest");

    if reshaped.rows.is_empty() {
        bail!("no forecast rows produced for {} requested dates", dates.len());
    }

    Ok(())
}

#[derive(Debug, Default)]
pub(crate) struct CollectOutcome {
    pub observations: Vec<ProblemObservation>,
    pub pages: Vec<PageDigest>,
    pub warnings: Vec<String>,
    pub dates_fetched: usize,
    pub dates_failed: usize,
    pub dates_empty: usize,
}

/// Visit each date once, in order. A failed date contributes zero rows and
/// never aborts the run.
pub(crate) fn collect_observations(
    dates: &[NaiveDate],
    fetcher: &dyn PageFetcher,
    extractor: &ProblemExtractor,
) -> CollectOutcome {
    let mut outcome = CollectOutcome::default();

    for &date in dates {
        let forecast_id = forecast_id(date);
        info!(date = %date, forecast_id = %forecast_id, "fetching forecast page");

        let page = match fetcher.fetch(date) {
            Ok(page) => page,
            Err(err) => {
                warn!(date = %date, error = %err, "skipping forecast date");
                outcome.warnings.push(format!("{date}: {err:#}"));
                outcome.dates_failed += 1;
                continue;
            }
        };
        outcome.dates_fetched += 1;

        let extraction = extractor.extract(&page.body_text, &page.emphasized);
        outcome.pages.push(PageDigest {
            date,
            page_sha256: sha256_text(&page.body_text),
            problem_count: extraction.problems.len(),
            danger_rating: extraction.danger_rating.clone(),
        });

        if extraction.problems.is_empty() {
            warn!(
                date = %date,
                "no avalanche problems found; date will be absent from the output table"
            );
            outcome.dates_empty += 1;
            continue;
        }

        info!(
            date = %date,
            problems = ?extraction.problems,
            danger_rating = %extraction.danger_rating,
            "extracted forecast"
        );

        for problem in &extraction.problems {
            if !CANONICAL_PROBLEMS.contains(&problem.as_str()) {
                warn!(
                    date = %date,
                    label = %problem,
                    "problem label not in canonical vocabulary; keeping raw text"
                );
            }
        }

        for (index, problem) in extraction.problems.iter().enumerate() {
            outcome.observations.push(ProblemObservation {
                forecast_id: forecast_id.clone(),
                date,
                slot_index: index + 1,
                problem_type: problem.clone(),
                danger_rating: extraction.danger_rating.clone(),
            });
        }
    }

    outcome
}

fn render_scrape_command(args: &ScrapeArgs) -> String {
    format!(
        "avyscrape scrape --start-date {} --end-date {} --out-path {} --location {} --settle-secs {}",
        args.start_date,
        args.end_date,
        args.out_path.display(),
        args.location,
        args.settle_secs
    )
}
