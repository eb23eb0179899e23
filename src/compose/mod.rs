//! Document composition: assembles the final report artifact.
//!
//! The composer is a straight pipeline over a fixed section order: cover
//! page, TOC placeholder, content sections, about page, then header and
//! footer. It is the only stage allowed to abort the run; on failure no
//! partial output file is left on disk.

pub mod docx;
pub mod template;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{info, warn};
use thiserror::Error;

use crate::charts;
use crate::config::Config;
use crate::types::{BrandingContext, MetricsSummary};

use docx::ReportDocument;
use template::ReportTemplate;

/// Content section headings, in the order they appear in the report.
pub const SECTION_TITLES: [&str; 5] = [
    "Overview",
    "Attack Categories",
    "Top Offenders",
    "Daily Timeline",
    "Severity Breakdown",
];

/// Fatal composition failures.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("report template not found at {path}: {source}")]
    TemplateMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("report template is missing required block [{block}]")]
    MissingBlock { block: &'static str },

    #[error("report template never references required placeholder {placeholder}")]
    MissingPlaceholder { placeholder: &'static str },

    #[error("failed to package document: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("document serialization failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rendered chart images for embedding. A `None` chart is simply omitted
/// from its section; the table still carries the data.
#[derive(Debug, Default)]
pub struct ChartSet {
    pub categories: Option<Vec<u8>>,
    pub top_sources: Option<Vec<u8>>,
    pub timeline: Option<Vec<u8>>,
    pub severity: Option<Vec<u8>>,
}

/// Assemble and write the report. Returns the output path on success.
pub fn compose_report(
    config: &Config,
    branding: &BrandingContext,
    summary: &MetricsSummary,
    narrative: &str,
    chart_set: &ChartSet,
) -> Result<PathBuf, ComposeError> {
    let template = ReportTemplate::load(&config.template_path)?;
    let logo = load_logo(branding.logo_path.as_deref());

    let period = match summary.period {
        Some((start, end)) => format!(
            "{} to {}",
            start.format("%d/%m/%Y"),
            end.format("%d/%m/%Y")
        ),
        None => "no event data".to_string(),
    };
    let issued = Local::now().format("%d/%m/%Y").to_string();
    let substitutions: [(&str, &str); 3] = [
        ("organization", branding.organization.as_str()),
        ("period", period.as_str()),
        ("issued", issued.as_str()),
    ];

    let mut doc = ReportDocument::new();

    // Cover page, in its own section without header/footer.
    doc.add_cover_line(&template.render("cover.title", &substitutions), 84, true);
    doc.add_cover_line(&template.render("cover.subtitle", &substitutions), 32, false);
    match logo.clone() {
        Some((bytes, ext, px)) => doc.add_image(bytes, &ext, px, docx::COVER_LOGO_WIDTH_EMU),
        None => doc.add_cover_line("[Organization Logo]", 32, false),
    }
    doc.add_cover_line(&branding.organization, 40, true);
    doc.add_cover_line(&template.render("cover.period", &substitutions), 22, false);
    doc.end_cover_section();

    // TOC placeholder: an updatable field, resolved by the viewer.
    doc.add_toc_field();
    doc.add_page_break();

    // Overview.
    doc.add_heading(SECTION_TITLES[0]);
    doc.add_paragraph(&overview_line(summary, &period));
    for paragraph in narrative.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        doc.add_paragraph(paragraph);
    }

    // Attack categories.
    doc.add_heading(SECTION_TITLES[1]);
    embed_chart(&mut doc, &chart_set.categories, (charts::CHART_WIDTH, charts::CHART_HEIGHT));
    doc.add_table(
        &["Category", "Events"],
        &count_rows(&summary.ranked_categories),
    );

    // Top offenders.
    doc.add_heading(SECTION_TITLES[2]);
    embed_chart(&mut doc, &chart_set.top_sources, (charts::CHART_WIDTH, charts::CHART_HEIGHT));
    doc.add_table(&["Source IP", "Events"], &count_rows(&summary.top_sources));

    // Daily timeline.
    doc.add_heading(SECTION_TITLES[3]);
    embed_chart(&mut doc, &chart_set.timeline, (charts::CHART_WIDTH, charts::CHART_HEIGHT));
    let day_rows: Vec<Vec<String>> = summary
        .daily_counts
        .iter()
        .map(|(date, count)| vec![date.format("%d/%m/%Y").to_string(), count.to_string()])
        .collect();
    doc.add_table(&["Date", "Events"], &day_rows);

    // Severity breakdown.
    doc.add_heading(SECTION_TITLES[4]);
    embed_chart(&mut doc, &chart_set.severity, (charts::PIE_WIDTH, charts::PIE_HEIGHT));
    let severity_rows: Vec<Vec<String>> = summary
        .severity_counts
        .iter()
        .map(|(severity, count)| vec![severity.label().to_string(), count.to_string()])
        .collect();
    doc.add_table(&["Severity", "Events"], &severity_rows);

    // About page.
    doc.add_page_break();
    doc.add_heading(&template.render("about.heading", &substitutions));
    for paragraph in template
        .render("about.body", &substitutions)
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        doc.add_paragraph(paragraph);
    }

    // Header/footer on every content page.
    doc.set_header(&branding.organization, logo);
    doc.set_footer(&format!("© {}", branding.organization));

    // Assemble fully in memory first so a failure leaves nothing behind.
    let bytes = doc.serialize()?;

    if let Some(parent) = config.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| ComposeError::Write {
                path: config.output_path.clone(),
                source,
            })?;
        }
    }
    fs::write(&config.output_path, &bytes).map_err(|source| ComposeError::Write {
        path: config.output_path.clone(),
        source,
    })?;

    info!(
        "report written to {} ({} bytes)",
        config.output_path.display(),
        bytes.len()
    );
    Ok(config.output_path.clone())
}

fn overview_line(summary: &MetricsSummary, period: &str) -> String {
    format!(
        "The honeypot deployment recorded {} events from {} unique source IPs ({}).",
        summary.total_events, summary.unique_sources, period
    )
}

fn embed_chart(doc: &mut ReportDocument, chart: &Option<Vec<u8>>, px: (u32, u32)) {
    if let Some(bytes) = chart {
        doc.add_image(bytes.clone(), "png", px, docx::BODY_IMAGE_WIDTH_EMU);
    }
}

fn count_rows(pairs: &[(String, u64)]) -> Vec<Vec<String>> {
    pairs
        .iter()
        .map(|(label, count)| vec![label.clone(), count.to_string()])
        .collect()
}

/// Read the logo image and its pixel dimensions. Unreadable logos degrade
/// to a text placeholder rather than aborting the run.
fn load_logo(path: Option<&Path>) -> Option<(Vec<u8>, String, (u32, u32))> {
    let path = path?;
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => "png".to_string(),
        Some(ext) if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") => {
            "jpeg".to_string()
        }
        _ => {
            warn!("unsupported logo format at {}, using placeholder", path.display());
            return None;
        }
    };

    let dimensions = match image::image_dimensions(path) {
        Ok(dims) => dims,
        Err(e) => {
            warn!("failed to read logo {}: {}", path.display(), e);
            return None;
        }
    };
    match fs::read(path) {
        Ok(bytes) => Some((bytes, ext, dimensions)),
        Err(e) => {
            warn!("failed to read logo {}: {}", path.display(), e);
            None
        }
    }
}
