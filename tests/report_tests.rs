//! End-to-end tests for the report pipeline.
//!
//! These run the real pipeline against scratch inputs and inspect the
//! written DOCX package. The narrative stage is exercised in fallback
//! mode (no API key), which is the degraded-but-successful path the
//! pipeline must always support.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use decoy_report::compose::SECTION_TITLES;
use decoy_report::config::Config;
use decoy_report::metrics;
use decoy_report::narrative::FALLBACK_NARRATIVE;
use decoy_report::pipeline;
use decoy_report::{loader, narrative};

const CSV: &str = "\
timestamp,source_ip,category,severity,detail
2025-04-01 02:14:09,203.0.113.5,ssh-bruteforce,High,root login attempt
2025-04-01 03:27:51,198.51.100.7,port-scan,Low,SYN sweep
2025-04-02 11:42:30,203.0.113.5,ssh-bruteforce,Critical,admin login attempt
2025-04-03 00:05:12,192.0.2.44,http-exploit,bogus-severity,
";

fn repo_template() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/report_template.txt")
}

fn write_logo(path: &Path) {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([27, 27, 112]));
    img.save(path).unwrap();
}

fn test_config(dir: &TempDir, csv: &str) -> Config {
    let input = dir.path().join("events.csv");
    fs::write(&input, csv).unwrap();
    let logo = dir.path().join("meta_corp_logo.png");
    write_logo(&logo);

    Config {
        input_path: input,
        logo_path: logo,
        template_path: repo_template(),
        output_path: dir.path().join("out/honeypot_report.docx"),
        api_base_url: "http://127.0.0.1:9".to_string(),
        api_model: "test-model".to_string(),
        api_key: None,
        api_timeout: Duration::from_secs(1),
    }
}

fn read_part(docx: &Path, part: &str) -> String {
    let file = fs::File::open(docx).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut content = String::new();
    archive
        .by_name(part)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}

#[test]
fn full_pipeline_writes_structured_report() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, CSV);

    let output = pipeline::run(&config).unwrap();
    assert!(output.exists());

    let document = read_part(&output, "word/document.xml");

    // Sections appear in the fixed order.
    let mut cursor = 0;
    for title in SECTION_TITLES {
        let at = document[cursor..]
            .find(title)
            .unwrap_or_else(|| panic!("section '{}' missing or out of order", title));
        cursor += at;
    }

    // Branding derived from the logo file name.
    assert!(document.contains("Meta Corp Logo"));

    // TOC is an unresolved field instruction, not precomputed entries.
    assert!(document.contains("TOC \\o"));
    assert!(document.contains("w:dirty=\"true\""));

    // Fallback narrative (no API key) made it into the overview.
    assert!(document.contains(FALLBACK_NARRATIVE));

    // Metric figures flow into the tables.
    assert!(document.contains("ssh-bruteforce"));
    assert!(document.contains("203.0.113.5"));

    // Header carries an unresolved PAGE field; footer carries branding.
    let header = read_part(&output, "word/header1.xml");
    assert!(header.contains(" PAGE "));
    let footer = read_part(&output, "word/footer1.xml");
    assert!(footer.contains("Meta Corp Logo"));
}

#[test]
fn empty_spreadsheet_still_yields_complete_report() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, "timestamp,source_ip,category,severity,detail\n");

    let output = pipeline::run(&config).unwrap();
    let document = read_part(&output, "word/document.xml");

    for title in SECTION_TITLES {
        assert!(document.contains(title), "missing section '{}'", title);
    }
    assert!(document.contains("recorded 0 events"));
    assert!(document.contains("no event data"));
}

#[test]
fn missing_spreadsheet_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir, CSV);
    config.input_path = dir.path().join("nope.csv");
    fs::remove_file(&config.input_path).ok();

    let err = pipeline::run(&config).unwrap_err();
    assert!(err.to_string().contains("honeypot spreadsheet"));
    assert!(!config.output_path.exists());
}

#[test]
fn narrative_failure_does_not_fail_the_run() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir, CSV);
    // Key present but endpoint unreachable: the client must fall back.
    config.api_key = Some("test-key".to_string());

    let events = loader::load_events(&config.input_path).unwrap();
    let summary = metrics::aggregate(&events);
    assert_eq!(narrative::generate(&config, &summary), FALLBACK_NARRATIVE);

    let output = pipeline::run(&config).unwrap();
    assert!(output.exists());
}

#[test]
fn reruns_produce_identical_metrics_and_section_order() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, CSV);

    let events = loader::load_events(&config.input_path).unwrap();
    let first = metrics::aggregate(&events);
    let second = metrics::aggregate(&events);
    assert_eq!(first, second);

    let out_a = pipeline::run(&config).unwrap();
    let doc_a = read_part(&out_a, "word/document.xml");
    let out_b = pipeline::run(&config).unwrap();
    let doc_b = read_part(&out_b, "word/document.xml");

    // Body structure is identical up to the issue date, which both runs
    // share here; a strict equality check keeps this honest.
    assert_eq!(doc_a, doc_b);
}

#[test]
fn unknown_severity_rows_are_kept_and_bucketed() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, CSV);

    let events = loader::load_events(&config.input_path).unwrap();
    assert_eq!(events.len(), 4);

    let summary = metrics::aggregate(&events);
    let total: u64 = summary.ranked_categories.iter().map(|(_, c)| c).sum();
    assert_eq!(total, 4);

    let unknown = summary
        .severity_counts
        .iter()
        .find(|(s, _)| s.label() == "Unknown")
        .map(|(_, c)| *c)
        .unwrap();
    assert_eq!(unknown, 1);
}
