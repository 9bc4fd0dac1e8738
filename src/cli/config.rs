//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::{
    config::{MatteConfig, OutputFormat},
    matte::color::KeyColor,
};
use anyhow::{Context, Result};

/// Convert CLI arguments to a `MatteConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the matte configuration from CLI arguments.
    ///
    /// Starts from `--config` (or the defaults) and applies every flag given
    /// on the command line on top.
    pub(crate) fn from_cli(cli: &Cli) -> Result<MatteConfig> {
        let mut config = match &cli.config {
            Some(path) => MatteConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?,
            None => MatteConfig::default(),
        };

        if let Some(hex) = &cli.key_color {
            config.key_color = KeyColor::from_hex(hex).context("Invalid --key-color")?;
        }
        if let Some(tolerance) = cli.tight_tolerance {
            config.tight_tolerance = tolerance;
        }
        if let Some(tolerance) = cli.flood_tolerance {
            config.flood_tolerance = tolerance;
        }
        if let Some(stride) = cli.seed_stride {
            config.seed_stride = stride;
        }
        if let Some(format) = cli.format {
            config.output_format = OutputFormat::from(format);
        }
        config.debug = config.debug || cli.verbose >= 1;

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Validate CLI arguments for consistency
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        let uses_stdin = cli.input.iter().any(|input| input == "-");

        if uses_stdin && cli.input.len() > 1 {
            anyhow::bail!("stdin (-) can only be used as the sole input");
        }
        if cli.base64 && !uses_stdin {
            anyhow::bail!("--base64 only applies to stdin input (-)");
        }
        if let Some(pattern) = &cli.pattern {
            glob::Pattern::new(pattern)
                .with_context(|| format!("Invalid --pattern '{}'", pattern))?;
        }
        if let Some(hex) = &cli.key_color {
            KeyColor::from_hex(hex).context("Invalid --key-color")?;
        }

        Ok(())
    }
}
