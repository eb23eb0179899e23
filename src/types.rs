//! Shared data model for the report pipeline.
//!
//! Events are immutable once loaded; the metrics summary is a pure function
//! of the events and is never mutated after aggregation.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// One row of honeypot telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoneypotEvent {
    pub timestamp: NaiveDateTime,
    pub source_ip: String,
    pub category: String,
    pub severity: Severity,
    pub detail: Option<String>,
}

/// Discrete severity levels. Anything the loader cannot recognize is
/// bucketed as `Unknown` rather than dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl Severity {
    /// Display order used in tables and the severity chart.
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Unknown,
    ];

    /// Parse a severity label case-insensitively.
    pub fn parse(s: &str) -> Severity {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" | "crit" => Severity::Critical,
            "high" => Severity::High,
            "medium" | "med" => Severity::Medium,
            "low" => Severity::Low,
            _ => Severity::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Unknown => "Unknown",
        }
    }
}

/// Read-only aggregate derived from the full event set.
///
/// Re-running aggregation on identical input yields an identical summary;
/// all orderings carry documented tie-breaks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSummary {
    /// Number of events that survived loading.
    pub total_events: u64,
    /// Distinct source IPs across all events.
    pub unique_sources: u64,
    /// Categories ranked by count descending, name ascending on ties.
    pub ranked_categories: Vec<(String, u64)>,
    /// Top offending IPs by count descending, lexical IP order on ties.
    pub top_sources: Vec<(String, u64)>,
    /// Per-day counts spanning the observed min..max date; zero-filled.
    pub daily_counts: Vec<(NaiveDate, u64)>,
    /// Counts per severity level in `Severity::ALL` order.
    pub severity_counts: Vec<(Severity, u64)>,
    /// Observed analysis period (min and max event date), if any.
    pub period: Option<(NaiveDate, NaiveDate)>,
}

/// Branding resolved at startup from the logo file.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandingContext {
    /// Display name derived from the logo file's base name.
    pub organization: String,
    /// Resolved logo image path; `None` degrades to a text placeholder.
    pub logo_path: Option<PathBuf>,
}

impl BrandingContext {
    /// Resolve branding from a concrete logo file.
    pub fn from_logo(path: &Path) -> BrandingContext {
        let organization = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(derive_organization_name)
            .unwrap_or_else(|| "Organization".to_string());
        BrandingContext {
            organization,
            logo_path: Some(path.to_path_buf()),
        }
    }

    /// Placeholder branding used when no logo is available.
    pub fn placeholder() -> BrandingContext {
        BrandingContext {
            organization: "Organization".to_string(),
            logo_path: None,
        }
    }
}

/// Derive an organization display name from a logo file name.
///
/// Rule: strip the final extension, split the remainder on underscores,
/// hyphens, dots, and whitespace, title-case each word, and join with
/// single spaces. `meta_corp_logo.png` becomes `Meta Corp Logo`.
pub fn derive_organization_name(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => file_name,
    };

    let words: Vec<String> = stem
        .split(|c: char| c == '_' || c == '-' || c == '.' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(title_case)
        .collect();

    if words.is_empty() {
        "Organization".to_string()
    } else {
        words.join(" ")
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("HIGH"), Severity::High);
        assert_eq!(Severity::parse(" critical "), Severity::Critical);
        assert_eq!(Severity::parse("Med"), Severity::Medium);
        assert_eq!(Severity::parse("low"), Severity::Low);
        assert_eq!(Severity::parse("severe"), Severity::Unknown);
        assert_eq!(Severity::parse(""), Severity::Unknown);
    }

    #[test]
    fn test_derive_organization_name_underscores() {
        assert_eq!(derive_organization_name("meta_corp_logo.png"), "Meta Corp Logo");
    }

    #[test]
    fn test_derive_organization_name_mixed_case() {
        assert_eq!(derive_organization_name("ACME-widgets.jpg"), "Acme Widgets");
        assert_eq!(derive_organization_name("globex.PNG"), "Globex");
    }

    #[test]
    fn test_derive_organization_name_multiple_extensions() {
        // Only the final extension is stripped; inner dots separate words.
        assert_eq!(derive_organization_name("report.logo.tar.png"), "Report Logo Tar");
    }

    #[test]
    fn test_derive_organization_name_degenerate() {
        assert_eq!(derive_organization_name(".png"), "Png");
        assert_eq!(derive_organization_name("___.png"), "Organization");
    }

    #[test]
    fn test_branding_from_logo() {
        let ctx = BrandingContext::from_logo(Path::new("logos/meta_corp_logo.png"));
        assert_eq!(ctx.organization, "Meta Corp Logo");
        assert!(ctx.logo_path.is_some());
    }
}
