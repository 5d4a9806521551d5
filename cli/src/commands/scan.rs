//! Ad-hoc sensitive data scan

use crate::config;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use colored::Colorize;
use sentinel_common::PolicyStore;
use sentinel_dlp::SensitiveDataScanner;
use std::path::Path;
use tabled::Tabled;

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Span")]
    span: String,
    #[tabled(rename = "Match")]
    masked: String,
}

pub fn handle(config_path: Option<&Path>, text: &str, format: OutputFormat) -> Result<()> {
    let config = config::load(config_path)?;
    let policy = PolicyStore::from_config(config.policy)?;
    let scanner = SensitiveDataScanner::from_policy(&policy)?;
    let report = scanner.scan_detailed(text);

    match format {
        OutputFormat::Json => OutputFormat::print_json(&report)?,
        OutputFormat::Table => {
            if !report.has_matches() {
                println!("{}", "No sensitive data detected".green());
                return Ok(());
            }
            println!(
                "{} {}",
                "Sensitive data detected:".red().bold(),
                report.labels.join(", ")
            );
            let rows = report.matches.iter().map(|m| MatchRow {
                label: m.label.clone(),
                span: format!("{}..{}", m.start, m.end),
                masked: m.masked_text(),
            });
            println!("{}", output::table(rows));
        }
    }
    Ok(())
}
