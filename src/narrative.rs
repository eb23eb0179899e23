//! Remote narrative generation with a local fallback.
//!
//! One outbound chat-completions call per run. Any failure at all -
//! missing credential, transport error, non-success status, malformed
//! body - is logged and replaced by a fixed fallback sentence so the
//! report always completes. No retries.

use log::{info, warn};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::Config;
use crate::types::MetricsSummary;

/// Inserted into the overview section whenever the remote call cannot
/// produce prose.
pub const FALLBACK_NARRATIVE: &str =
    "Automated analysis unavailable; see metrics tables above.";

/// Internal failure modes; never propagated past this module.
#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("request failed: {0}")]
    Request(#[from] Box<ureq::Error>),

    #[error("failed to decode response body: {0}")]
    Decode(#[from] std::io::Error),

    #[error("response contained no narrative content")]
    Empty,
}

/// Generate narrative prose for the overview section.
///
/// Infallible at this boundary: on any failure the fixed fallback text is
/// returned and a warning is logged for operator visibility.
pub fn generate(config: &Config, summary: &MetricsSummary) -> String {
    let key = match config.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => key,
        _ => {
            warn!("narrative API key not configured; using fallback narrative");
            return FALLBACK_NARRATIVE.to_string();
        }
    };

    let prompt = build_prompt(summary);
    match request_narrative(config, key, &prompt) {
        Ok(text) => {
            info!("narrative generated ({} characters)", text.len());
            text
        }
        Err(e) => {
            warn!("narrative generation failed, using fallback: {}", e);
            FALLBACK_NARRATIVE.to_string()
        }
    }
}

/// Serialize the metrics summary into a compact analyst prompt.
pub fn build_prompt(summary: &MetricsSummary) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(
        "You are a cybersecurity analyst reviewing honeypot telemetry. \
         Write two to three paragraphs of plain-prose analysis of the \
         aggregated metrics below. Describe notable attack categories, \
         offender concentration, timing patterns, and severity posture. \
         Do not use headings, bullet lists, or markdown tables."
            .to_string(),
    );
    lines.push(String::new());

    if let Some((start, end)) = summary.period {
        lines.push(format!(
            "Analysis period: {} to {}",
            start.format("%d/%m/%Y"),
            end.format("%d/%m/%Y")
        ));
    }
    lines.push(format!("Total events: {}", summary.total_events));
    lines.push(format!("Unique source IPs: {}", summary.unique_sources));

    if !summary.ranked_categories.is_empty() {
        lines.push("Events by category:".to_string());
        for (category, count) in &summary.ranked_categories {
            lines.push(format!("  {}: {}", category, count));
        }
    }

    if !summary.top_sources.is_empty() {
        lines.push("Top offending source IPs:".to_string());
        for (ip, count) in &summary.top_sources {
            lines.push(format!("  {}: {}", ip, count));
        }
    }

    lines.push("Severity distribution:".to_string());
    for (severity, count) in &summary.severity_counts {
        lines.push(format!("  {}: {}", severity.label(), count));
    }

    if !summary.daily_counts.is_empty() {
        lines.push("Daily event counts:".to_string());
        for (date, count) in &summary.daily_counts {
            lines.push(format!("  {}: {}", date.format("%Y-%m-%d"), count));
        }
    }

    lines.join("\n")
}

/// Perform the single chat-completions request.
fn request_narrative(config: &Config, key: &str, prompt: &str) -> Result<String, NarrativeError> {
    let url = format!(
        "{}/chat/completions",
        config.api_base_url.trim_end_matches('/')
    );

    let agent = ureq::AgentBuilder::new()
        .timeout(config.api_timeout)
        .build();

    let body = json!({
        "model": config.api_model,
        "messages": [
            {
                "role": "system",
                "content": "You are a cybersecurity analyst writing structured reports."
            },
            { "role": "user", "content": prompt }
        ],
        "temperature": 0.3,
        "max_tokens": 1500,
    });

    let response = agent
        .post(&url)
        .set("Authorization", &format!("Bearer {}", key))
        .send_json(body)
        .map_err(Box::new)?;

    let value: Value = response.into_json()?;
    let content = value["choices"][0]["message"]["content"]
        .as_str()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(NarrativeError::Empty)?;

    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::aggregate;
    use crate::types::{HoneypotEvent, Severity};
    use chrono::NaiveDateTime;
    use std::path::PathBuf;
    use std::time::Duration;

    fn test_config(api_key: Option<&str>, base_url: &str) -> Config {
        Config {
            input_path: PathBuf::from("unused.csv"),
            logo_path: PathBuf::from("unused.png"),
            template_path: PathBuf::from("unused.txt"),
            output_path: PathBuf::from("unused.docx"),
            api_base_url: base_url.to_string(),
            api_model: "test-model".to_string(),
            api_key: api_key.map(str::to_string),
            api_timeout: Duration::from_secs(2),
        }
    }

    fn sample_summary() -> MetricsSummary {
        let events = vec![HoneypotEvent {
            timestamp: NaiveDateTime::parse_from_str("2025-04-01 10:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            source_ip: "203.0.113.5".to_string(),
            category: "ssh-bruteforce".to_string(),
            severity: Severity::High,
            detail: None,
        }];
        aggregate(&events)
    }

    #[test]
    fn test_prompt_contains_metrics() {
        let prompt = build_prompt(&sample_summary());
        assert!(prompt.contains("Total events: 1"));
        assert!(prompt.contains("ssh-bruteforce: 1"));
        assert!(prompt.contains("203.0.113.5: 1"));
        assert!(prompt.contains("High: 1"));
        assert!(prompt.contains("01/04/2025"));
    }

    #[test]
    fn test_missing_key_falls_back_without_network() {
        let config = test_config(None, "http://127.0.0.1:9");
        assert_eq!(generate(&config, &sample_summary()), FALLBACK_NARRATIVE);
    }

    #[test]
    fn test_blank_key_falls_back_without_network() {
        let config = test_config(Some("   "), "http://127.0.0.1:9");
        assert_eq!(generate(&config, &sample_summary()), FALLBACK_NARRATIVE);
    }

    #[test]
    fn test_unreachable_endpoint_falls_back() {
        // Discard port on loopback: the connection fails immediately and
        // the client must swallow the error.
        let config = test_config(Some("test-key"), "http://127.0.0.1:9");
        assert_eq!(generate(&config, &sample_summary()), FALLBACK_NARRATIVE);
    }
}
