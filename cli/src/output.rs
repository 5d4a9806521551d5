//! Output formatting

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use sentinel_common::{AnalysisResult, RiskCategory};
use sentinel_engine::BatchAnalytics;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(data)?);
        Ok(())
    }
}

/// Category colored by severity
pub fn colored_category(category: RiskCategory) -> ColoredString {
    let name = category.as_str();
    match category {
        RiskCategory::Approved => name.green(),
        RiskCategory::LowRisk => name.cyan(),
        RiskCategory::MediumRisk => name.yellow(),
        RiskCategory::HighRisk => name.red(),
        RiskCategory::Critical => name.red().bold(),
    }
}

pub fn table<T: Tabled>(rows: impl IntoIterator<Item = T>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Department")]
    department: String,
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Score")]
    score: u8,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Sensitive")]
    sensitive: String,
}

pub fn print_results(results: &[AnalysisResult]) {
    let rows = results.iter().enumerate().map(|(i, r)| ResultRow {
        index: i + 1,
        user: r.log_entry.user_or_unknown().to_string(),
        department: r.log_entry.department_or_unknown().to_string(),
        domain: r.log_entry.domain(),
        category: r.risk_category.to_string(),
        score: r.risk_score,
        method: r.analysis_method.to_string(),
        sensitive: r.detected_sensitive_data.join(", "),
    });
    println!("{}", table(rows));

    for (i, r) in results.iter().enumerate() {
        if !r.risk_category.requires_escalation() {
            continue;
        }
        println!(
            "\n{} {} {}",
            format!("[{}]", i + 1).bold(),
            colored_category(r.risk_category),
            r.reasoning
        );
        println!("    Action: {}", r.recommended_action);
        if let Some(actions) = &r.mitigation_actions {
            for action in actions {
                println!("    {} {}", "↳".dimmed(), action);
            }
        }
        if let Some(error) = &r.error {
            println!("    {} {}", "error:".yellow(), error);
        }
    }
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub fn print_analytics(analytics: &BatchAnalytics) {
    println!("\n{}", "Risk Summary".bold());
    println!(
        "Requests: {}  Threats: {}  Average score: {:.1}",
        analytics.total,
        if analytics.total_threats > 0 {
            analytics.total_threats.to_string().red()
        } else {
            analytics.total_threats.to_string().green()
        },
        analytics.avg_risk_score
    );

    let distribution = RiskCategory::ALL.iter().map(|c| CountRow {
        key: c.to_string(),
        value: analytics.count(*c).to_string(),
    });
    println!("{}", table(distribution));

    if !analytics.department_risk.is_empty() {
        println!("\n{}", "Department Risk".bold());
        let rows = analytics.department_risk.iter().map(|(dept, score)| CountRow {
            key: dept.clone(),
            value: format!("{:.1}", score),
        });
        println!("{}", table(rows));
    }

    if !analytics.sensitive_data_breakdown.is_empty() {
        println!("\n{}", "Sensitive Data".bold());
        let rows = analytics.sensitive_data_breakdown.iter().map(|(label, n)| CountRow {
            key: label.clone(),
            value: n.to_string(),
        });
        println!("{}", table(rows));
    }
}

pub fn print_pairs<'a>(rows: impl IntoIterator<Item = (&'a str, String)>) {
    let rows = rows.into_iter().map(|(key, value)| CountRow {
        key: key.to_string(),
        value,
    });
    println!("{}", table(rows));
}
