use anyhow::{Context, Result};
use regex::Regex;

use crate::model::NO_RATING;

/// Canonical problem categories used for downstream modeling.
pub(crate) const CANONICAL_PROBLEMS: [&str; 6] = [
    "New Snow",
    "Wind-Drifted Snow",
    "Persistent Weak Layer",
    "Wet Snow",
    "Gliding Snow",
    "Cornices",
];

const DANGER_LEVELS: [&str; 5] = ["LOW", "MODERATE", "CONSIDERABLE", "HIGH", "EXTREME"];

/// Map a forecast's surface form onto a canonical category. Exact-string
/// keyed, case-preserving; unknown labels pass through unchanged.
pub(crate) fn normalize_problem_label(raw: &str) -> &str {
    match raw {
        "Storm Slab" | "Loose Dry" | "Dry Loose" => "New Snow",
        "Wind Slab" | "Wind Drifted Snow" => "Wind-Drifted Snow",
        "Persistent Slab" => "Persistent Weak Layer",
        "Wet Slab" | "Loose Wet" | "Wet Loose" => "Wet Snow",
        "Glide Avalanche" => "Gliding Snow",
        "Cornice Fall" | "Cornices" => "Cornices",
        _ => raw,
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PageExtraction {
    /// Normalized problem labels, page order, first occurrence kept.
    pub problems: Vec<String>,
    pub danger_rating: String,
}

pub(crate) struct ProblemExtractor {
    title_line: Regex,
}

impl ProblemExtractor {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            // "Avalanche Problem", an optional "#<n>", then the title on
            // the following line.
            title_line: Regex::new(r"(?i)Avalanche Problem\s*(?:#?\s*\d+)?\s*\n([^\n]+)")
                .context("failed to compile problem title regex")?,
        })
    }

    pub(crate) fn extract(&self, body_text: &str, emphasized: &[String]) -> PageExtraction {
        let mut problems: Vec<String> = Vec::new();

        for captures in self.title_line.captures_iter(body_text) {
            let raw_title = captures[1].trim();
            if raw_title.is_empty() {
                continue;
            }

            let normalized = normalize_problem_label(raw_title);
            if !problems.iter().any(|seen| seen == normalized) {
                problems.push(normalized.to_string());
            }
        }

        PageExtraction {
            problems,
            danger_rating: extract_danger_rating(emphasized),
        }
    }
}

/// First emphasized token that names a danger level, in page order.
pub(crate) fn extract_danger_rating(emphasized: &[String]) -> String {
    emphasized
        .iter()
        .map(|token| token.trim().to_uppercase())
        .find(|token| DANGER_LEVELS.contains(&token.as_str()))
        .unwrap_or_else(|| NO_RATING.to_string())
}
