use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use decoy_report::config::Config;
use decoy_report::pipeline;

/// Honeypot telemetry report generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the honeypot telemetry spreadsheet (CSV with header row)
    #[arg(short, long, default_value = "data/honeypot_events.csv")]
    input: PathBuf,

    /// Organization logo image file, or a directory scanned for one
    #[arg(short, long, default_value = "logos")]
    logo: PathBuf,

    /// Report boilerplate template
    #[arg(short, long, default_value = "assets/report_template.txt")]
    template: PathBuf,

    /// Output path for the generated report
    #[arg(short, long, default_value = "output/honeypot_report.docx")]
    output: PathBuf,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting decoy-report generator");
    info!("Input spreadsheet: {:?}", args.input);
    info!("Logo path: {:?}", args.logo);
    info!("Output path: {:?}", args.output);

    let config = Config::resolve(args.input, args.logo, args.template, args.output);

    let output = pipeline::run(&config)?;

    info!("Report generation completed: {:?}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let args = Args::parse_from(&["decoy-report"]);
        assert_eq!(args.input, PathBuf::from("data/honeypot_events.csv"));
        assert_eq!(args.logo, PathBuf::from("logos"));
        assert_eq!(args.output, PathBuf::from("output/honeypot_report.docx"));
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from(&[
            "decoy-report",
            "--input", "events.csv",
            "--logo", "logos/meta_corp_logo.png",
            "--output", "report.docx",
        ]);
        assert_eq!(args.input, PathBuf::from("events.csv"));
        assert_eq!(args.logo, PathBuf::from("logos/meta_corp_logo.png"));
        assert_eq!(args.output, PathBuf::from("report.docx"));
    }
}
