//! Configuration commands

use crate::config;
use anyhow::{bail, Result};
use sentinel_engine::SentinelConfig;
use std::path::Path;

/// Print the resolved configuration as TOML, API keys redacted
pub fn show(config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load(config_path)?;
    redact(&mut config.backend.api_key);
    redact(&mut config.threat_intel.api_key);
    println!("{}", config.to_toml_string()?);
    Ok(())
}

pub fn init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = config::resolve(config_path)?;
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let written = config::save(&SentinelConfig::default(), Some(&path))?;
    println!("Wrote {}", written.display());
    Ok(())
}

fn redact(key: &mut Option<String>) {
    if key.is_some() {
        *key = Some("********".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        let mut key = Some("sk-secret".to_string());
        redact(&mut key);
        assert_eq!(key.as_deref(), Some("********"));

        let mut none = None;
        redact(&mut none);
        assert!(none.is_none());
    }
}
