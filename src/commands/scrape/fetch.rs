use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate};
use headless_chrome::{Browser, LaunchOptions, Tab};

const FORECAST_BASE_URL: &str = "https://utahavalanchecenter.org/forecast";

/// Rendered content of one forecast page: the visible body text plus the
/// short emphasized fragments the danger rating is printed in.
#[derive(Debug, Clone)]
pub(crate) struct ForecastPage {
    pub body_text: String,
    pub emphasized: Vec<String>,
}

/// Injectable page-retrieval capability. The scrape pipeline only ever sees
/// this seam, so extraction and reshaping are testable without a browser.
pub(crate) trait PageFetcher {
    fn fetch(&self, date: NaiveDate) -> Result<ForecastPage>;
}

pub(crate) struct BrowserFetcher {
    // The browser handle must outlive the tab.
    _browser: Browser,
    tab: Arc<Tab>,
    location: String,
    settle: Duration,
}

impl BrowserFetcher {
    pub(crate) fn new(location: &str, settle: Duration) -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .window_size(Some((1920, 1080)))
            .build()
            .map_err(|err| anyhow!("failed to assemble browser launch options: {err}"))?;

        let browser = Browser::new(options).context("failed to launch headless browser")?;
        let tab = browser.new_tab().context("failed to open browser tab")?;

        Ok(Self {
            _browser: browser,
            tab,
            location: location.to_string(),
            settle,
        })
    }
}

/// Forecast pages are addressed by unpadded month/day segments.
pub(crate) fn forecast_url(location: &str, date: NaiveDate) -> String {
    format!(
        "{}/{}/{}/{}/{}",
        FORECAST_BASE_URL,
        location,
        date.month(),
        date.day(),
        date.year()
    )
}

impl PageFetcher for BrowserFetcher {
    fn fetch(&self, date: NaiveDate) -> Result<ForecastPage> {
        let url = forecast_url(&self.location, date);

        self.tab
            .navigate_to(&url)
            .with_context(|| format!("failed to navigate to {url}"))?;
        self.tab
            .wait_until_navigated()
            .with_context(|| format!("page load did not complete for {url}"))?;

        // The forecast body is rendered client-side after load.
        thread::sleep(self.settle);

        let body_text = self
            .tab
            .find_element("body")
            .and_then(|body| body.get_inner_text())
            .with_context(|| format!("failed to read rendered text from {url}"))?;

        let emphasized = self
            .tab
            .find_elements("strong")
            .map(|elements| {
                elements
                    .iter()
                    .filter_map(|element| element.get_inner_text().ok())
                    .map(|text| text.trim().to_string())
                    .filter(|text| !text.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(ForecastPage {
            body_text,
            emphasized,
        })
    }
}
