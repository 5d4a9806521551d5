//! Search past analysis results

use crate::history;
use crate::output::OutputFormat;
use anyhow::Result;
use colored::Colorize;
use sentinel_engine::memory::NO_MATCHES;
use sentinel_engine::MemoryStore;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct SearchReport<'a> {
    query: &'a str,
    records: Vec<&'a str>,
}

pub fn handle(history_path: Option<&Path>, query: &str, limit: usize, format: OutputFormat) -> Result<()> {
    let path = history::resolve(history_path)?;
    let store = history::load(&path)?;
    let found = store.search(query, limit);

    match format {
        OutputFormat::Json => {
            let records = if found == NO_MATCHES {
                Vec::new()
            } else {
                found.split("\n---\n").collect()
            };
            OutputFormat::print_json(&SearchReport { query, records })?
        }
        OutputFormat::Table => {
            if found == NO_MATCHES {
                println!("{}", found.yellow());
            } else {
                println!("{}", found);
            }
        }
    }
    Ok(())
}
