//! # Decoy Report - Honeypot telemetry report generator
//!
//! This library turns a spreadsheet of honeypot telemetry into a branded
//! DOCX report with summary metrics, charts, and an optional AI-written
//! narrative.
//!
//! ## Architecture
//!
//! The pipeline is strictly linear and synchronous:
//!
//! ```text
//! loader -> metrics -> { narrative, charts } -> compose -> output file
//! ```
//!
//! - `config`: explicit run configuration (paths, narrative API settings)
//! - `types`: shared data model (events, summaries, branding)
//! - `loader`: CSV ingestion with partial-success row handling
//! - `metrics`: deterministic aggregation of loaded events
//! - `narrative`: single-attempt remote narrative call with local fallback
//! - `charts`: deterministic PNG chart rendering
//! - `compose`: DOCX assembly (cover, field-code TOC, sections, about page)
//! - `pipeline`: high-level orchestration of the stages above
//!
//! ## Error Handling
//!
//! Fatal stages (`loader`, `compose`) expose `thiserror` enums that the
//! pipeline propagates as `color_eyre` reports; everything else degrades
//! gracefully so a run always terminates with a usable report.

pub mod charts;
pub mod compose;
pub mod config;
pub mod loader;
pub mod metrics;
pub mod narrative;
pub mod pipeline;
pub mod types;
