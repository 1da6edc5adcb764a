use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::ScrapeRunManifest;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.manifest_dir.clone().unwrap_or_else(|| {
        args.out_path
            .parent()
            .map(|parent| parent.join("manifests"))
            .unwrap_or_else(|| "manifests".into())
    });

    info!(out_path = %args.out_path.display(), "status requested");

    match latest_run_manifest(&manifest_dir)? {
        Some(manifest_path) => {
            let raw = fs::read(&manifest_path)
                .with_context(|| format!("failed to read {}", manifest_path.display()))?;
            let manifest: ScrapeRunManifest = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", manifest_path.display()))?;

            info!(
                run_id = %manifest.run_id,
                status = %manifest.status,
                started_at = %manifest.started_at,
                updated_at = %manifest.updated_at,
                dates_requested = manifest.counts.dates_requested,
                dates_fetched = manifest.counts.dates_fetched,
                dates_failed = manifest.counts.dates_failed,
                dates_empty = manifest.counts.dates_empty,
                forecast_rows = manifest.counts.forecast_rows,
                problems_dropped = manifest.counts.problems_dropped,
                warnings = manifest.warnings.len(),
                "loaded run manifest"
            );
        }
        None => warn!(path = %manifest_dir.display(), "no run manifest found"),
    }

    if args.out_path.exists() {
        let table = fs::read_to_string(&args.out_path)
            .with_context(|| format!("failed to read {}", args.out_path.display()))?;
        let data_rows = table.lines().count().saturating_sub(1);

        info!(
            path = %args.out_path.display(),
            forecast_rows = data_rows,
            "forecast table status"
        );
    } else {
        warn!(path = %args.out_path.display(), "forecast table missing");
    }

    Ok(())
}

fn latest_run_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;

    let mut manifests: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list {}", manifest_dir.display()))?
            .path();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        if name.starts_with("scrape_run_") && name.ends_with(".json") {
            manifests.push(path);
        }
    }

    // Run ids embed a compact UTC timestamp, so name order is time order.
    manifests.sort();
    Ok(manifests.pop())
}
