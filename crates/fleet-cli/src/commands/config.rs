//! Configuration commands

use anyhow::{Context, Result};
use clap::Subcommand;
use fleet_core::FleetConfig;
use std::path::Path;
use tracing::debug;

/// Configuration file operations
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Validate the config file and print the effective settings
    Check,

    /// Print the default configuration as TOML
    Defaults,
}

/// Load the config file if it exists, otherwise fall back to defaults
pub fn load_or_default(path: &Path) -> Result<FleetConfig> {
    if path.exists() {
        FleetConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))
    } else {
        debug!(path = %path.display(), "no config file, using defaults");
        Ok(FleetConfig::default())
    }
}

/// Execute a configuration command
pub fn run(command: ConfigCommand, path: &Path) -> Result<()> {
    match command {
        ConfigCommand::Check => {
            let config = FleetConfig::load_from_file(path)
                .with_context(|| format!("loading {}", path.display()))?;
            println!("{} is valid", path.display());
            print!("{}", render(&config)?);
        }
        ConfigCommand::Defaults => {
            print!("{}", render(&FleetConfig::default())?);
        }
    }
    Ok(())
}

fn render(config: &FleetConfig) -> Result<String> {
    toml::to_string_pretty(config).context("serializing configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, FleetConfig::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pagination]\ndefault_limit = 0").unwrap();
        assert!(load_or_default(file.path()).is_err());
    }

    #[test]
    fn test_defaults_render_and_reload() {
        let rendered = render(&FleetConfig::default()).unwrap();
        assert_eq!(
            FleetConfig::from_toml_str(&rendered).unwrap(),
            FleetConfig::default()
        );
    }
}
