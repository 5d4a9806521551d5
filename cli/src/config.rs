//! CLI configuration loading

use anyhow::{Context, Result};
use sentinel_engine::SentinelConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Load the configuration file (defaults when absent), then apply the environment
pub fn load(path: Option<&Path>) -> Result<SentinelConfig> {
    let path = resolve(path)?;
    let mut config = if path.exists() {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        SentinelConfig::from_toml_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?
    } else {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        SentinelConfig::default()
    };

    config.apply_env();
    Ok(config)
}

/// Write a configuration file, creating parent directories
pub fn save(config: &SentinelConfig, path: Option<&Path>) -> Result<PathBuf> {
    let path = resolve(path)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let content = config.to_toml_string()?;
    fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// Explicit path, or `~/.ai-sentinel/config.toml`
pub fn resolve(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => {
            let home = dirs::home_dir().context("cannot find home directory")?;
            Ok(home.join(".ai-sentinel").join("config.toml"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("ai-sentinel-missing-config.toml");
        let _ = fs::remove_file(&path);
        let config = load(Some(&path)).unwrap();
        assert_eq!(config.engine.concurrency, 4);
    }

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("ai-sentinel-cfg-{}", std::process::id()));
        let path = dir.join("config.toml");
        let mut config = SentinelConfig::default();
        config.engine.concurrency = 9;

        let written = save(&config, Some(&path)).unwrap();
        assert_eq!(written, path);
        assert_eq!(load(Some(&path)).unwrap().engine.concurrency, 9);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_default_location() {
        let path = resolve(None).unwrap();
        assert!(path.ends_with(".ai-sentinel/config.toml"));
    }
}
