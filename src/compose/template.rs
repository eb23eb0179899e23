//! Pre-authored report boilerplate with placeholder substitution.
//!
//! The template file is a sequence of `[key]` blocks of plain text.
//! Dynamic values are spliced in via `{{placeholder}}` markers. A missing
//! template file, block, or required placeholder is a fatal compose
//! failure: without the skeleton there is no well-defined report.

use std::collections::BTreeMap;
use std::path::Path;

use super::ComposeError;

/// Placeholders the template must reference somewhere.
pub const REQUIRED_PLACEHOLDERS: [&str; 3] = ["{{organization}}", "{{period}}", "{{issued}}"];

/// Blocks the composer reads.
pub const REQUIRED_BLOCKS: [&str; 5] = [
    "cover.title",
    "cover.subtitle",
    "cover.period",
    "about.heading",
    "about.body",
];

/// Parsed template blocks.
#[derive(Debug, Clone)]
pub struct ReportTemplate {
    blocks: BTreeMap<String, String>,
}

impl ReportTemplate {
    /// Load and validate the template at `path`.
    pub fn load(path: &Path) -> Result<ReportTemplate, ComposeError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            ComposeError::TemplateMissing {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::parse(&content)
    }

    /// Parse template content and validate structural requirements.
    pub fn parse(content: &str) -> Result<ReportTemplate, ComposeError> {
        let mut blocks: BTreeMap<String, String> = BTreeMap::new();
        let mut current: Option<(String, Vec<String>)> = None;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with('[') && trimmed.ends_with(']') && trimmed.len() > 2 {
                if let Some((key, lines)) = current.take() {
                    blocks.insert(key, join_block(&lines));
                }
                current = Some((trimmed[1..trimmed.len() - 1].to_string(), Vec::new()));
            } else if let Some((_, ref mut lines)) = current {
                lines.push(line.to_string());
            }
        }
        if let Some((key, lines)) = current.take() {
            blocks.insert(key, join_block(&lines));
        }

        for block in REQUIRED_BLOCKS {
            if !blocks.contains_key(block) {
                return Err(ComposeError::MissingBlock { block });
            }
        }

        let all_text: String = blocks.values().cloned().collect::<Vec<_>>().join("\n");
        for placeholder in REQUIRED_PLACEHOLDERS {
            if !all_text.contains(placeholder) {
                return Err(ComposeError::MissingPlaceholder { placeholder });
            }
        }

        Ok(ReportTemplate { blocks })
    }

    /// Render a block with the given placeholder substitutions.
    pub fn render(&self, block: &'static str, substitutions: &[(&str, &str)]) -> String {
        let mut text = self.blocks.get(block).cloned().unwrap_or_default();
        for (placeholder, value) in substitutions {
            text = text.replace(&format!("{{{{{}}}}}", placeholder), value);
        }
        text
    }
}

fn join_block(lines: &[String]) -> String {
    lines.join("\n").trim().to_string()
}
