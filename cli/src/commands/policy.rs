//! Policy store display

use crate::config;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use colored::Colorize;
use sentinel_common::{PatternDef, PolicyStore, SensitivityTier};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tabled::Tabled;

#[derive(Serialize)]
struct PolicyView<'a> {
    approved_domains: &'a [String],
    external_ai_services: &'a [String],
    malicious_domains: &'a [String],
    sensitive_patterns: &'a [PatternDef],
    departments: &'a BTreeMap<String, SensitivityTier>,
}

#[derive(Tabled)]
struct PatternRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Pattern")]
    pattern: String,
}

pub fn handle(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = config::load(config_path)?;
    let policy = PolicyStore::from_config(config.policy)?;

    match format {
        OutputFormat::Json => OutputFormat::print_json(&PolicyView {
            approved_domains: policy.approved_domains(),
            external_ai_services: policy.external_ai_services(),
            malicious_domains: policy.malicious_domains(),
            sensitive_patterns: policy.sensitive_patterns(),
            departments: policy.departments(),
        })?,
        OutputFormat::Table => {
            println!("{}", "Domain Lists".bold());
            output::print_pairs([
                ("approved", policy.approved_domains().join(", ")),
                ("external AI", policy.external_ai_services().join(", ")),
                ("malicious", policy.malicious_domains().join(", ")),
            ]);

            println!("\n{}", "Sensitive Patterns".bold());
            let rows = policy.sensitive_patterns().iter().map(|p| PatternRow {
                label: p.label.clone(),
                pattern: p.pattern.clone(),
            });
            println!("{}", output::table(rows));

            println!("\n{}", "Department Sensitivity".bold());
            output::print_pairs(
                policy
                    .departments()
                    .iter()
                    .map(|(dept, tier)| (dept.as_str(), tier.as_str().to_string())),
            );
        }
    }
    Ok(())
}
