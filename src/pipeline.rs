//! High-level orchestration of the report pipeline.
//!
//! Data flows strictly forward: loader, aggregator, then narrative and
//! charts, then the composer. Only loading and composition can abort the
//! run; every other stage degrades and the report still gets written.

use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};

use crate::charts;
use crate::compose::{self, ChartSet};
use crate::config::Config;
use crate::loader;
use crate::metrics;
use crate::narrative;
use crate::types::BrandingContext;

/// Run the full pipeline. Returns the written report path.
pub fn run(config: &Config) -> Result<PathBuf> {
    info!("loading honeypot events from {}", config.input_path.display());
    let events = loader::load_events(&config.input_path)
        .wrap_err("failed to load honeypot spreadsheet")?;
    info!("loaded {} events", events.len());

    let summary = metrics::aggregate(&events);
    info!(
        "aggregated {} events across {} categories, {} unique sources",
        summary.total_events,
        summary.ranked_categories.len(),
        summary.unique_sources
    );

    let branding = resolve_branding(&config.logo_path);
    info!("reporting for organization '{}'", branding.organization);

    let narrative_text = narrative::generate(config, &summary);

    let chart_set = render_charts(&summary);

    let output = compose::compose_report(config, &branding, &summary, &narrative_text, &chart_set)
        .wrap_err("failed to compose report document")?;

    Ok(output)
}

/// Resolve branding from the configured logo path.
///
/// The path may be a concrete image file or a directory, in which case
/// the first image file by name is used. With no usable logo the branding
/// degrades to a generic placeholder and the run continues.
pub fn resolve_branding(logo_path: &Path) -> BrandingContext {
    if logo_path.is_file() {
        return BrandingContext::from_logo(logo_path);
    }

    if logo_path.is_dir() {
        match first_image_in(logo_path) {
            Some(found) => return BrandingContext::from_logo(&found),
            None => warn!("no logo image found in {}", logo_path.display()),
        }
    } else {
        warn!("logo path {} does not exist", logo_path.display());
    }
    BrandingContext::placeholder()
}

fn first_image_in(dir: &Path) -> Option<PathBuf> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| {
                    e.eq_ignore_ascii_case("png")
                        || e.eq_ignore_ascii_case("jpg")
                        || e.eq_ignore_ascii_case("jpeg")
                })
                .unwrap_or(false)
        })
        .collect();
    images.sort();
    images.into_iter().next()
}

/// Render all charts, degrading to omission on failure. A render failure
/// indicates a broken drawing environment, not bad metrics, so it costs
/// the chart image but never the report.
fn render_charts(summary: &crate::types::MetricsSummary) -> ChartSet {
    let mut set = ChartSet::default();

    match charts::category_chart(summary) {
        Ok(png) => set.categories = Some(png),
        Err(e) => warn!("category chart skipped: {}", e),
    }
    match charts::top_sources_chart(summary) {
        Ok(png) => set.top_sources = Some(png),
        Err(e) => warn!("top sources chart skipped: {}", e),
    }
    match charts::timeline_chart(summary) {
        Ok(png) => set.timeline = Some(png),
        Err(e) => warn!("timeline chart skipped: {}", e),
    }
    match charts::severity_chart(summary) {
        Ok(png) => set.severity = Some(png),
        Err(e) => warn!("severity chart skipped: {}", e),
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_branding_from_file() {
        let dir = tempdir().unwrap();
        let logo = dir.path().join("meta_corp_logo.png");
        fs::write(&logo, b"not a real png").unwrap();

        let branding = resolve_branding(&logo);
        assert_eq!(branding.organization, "Meta Corp Logo");
        assert_eq!(branding.logo_path.as_deref(), Some(logo.as_path()));
    }

    #[test]
    fn test_resolve_branding_from_directory_picks_first_by_name() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("zeta_corp.png"), b"x").unwrap();
        fs::write(dir.path().join("acme_widgets.jpg"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let branding = resolve_branding(dir.path());
        assert_eq!(branding.organization, "Acme Widgets");
    }

    #[test]
    fn test_resolve_branding_missing_degrades() {
        let branding = resolve_branding(Path::new("/nonexistent/logos"));
        assert_eq!(branding, BrandingContext::placeholder());
    }
}
