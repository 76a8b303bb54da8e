use super::super::output::Output;
use crate::config::{CliOverrides, FanjoinConfig};
use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display the merged configuration
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },
    /// Check that the merged configuration loads and is valid
    Validate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
}

pub async fn execute(args: ConfigArgs, custom_config: Option<&str>, output: &Output) -> Result<()> {
    let config = FanjoinConfig::load_with(custom_config, &CliOverrides::default())?;

    match args.command {
        ConfigCommand::Show { format } => {
            let rendered = match format {
                ConfigFormat::Toml => config.to_toml()?,
                ConfigFormat::Json => config.to_json()?,
            };
            output.result(rendered.trim_end());
        }
        ConfigCommand::Validate => {
            output.success("Configuration is valid");
            output.key_value("prime workers", &config.default_prime_workers().to_string());
            output.key_value(
                "search grid",
                &format!("{}x{}", config.search.rows, config.search.cols),
            );
        }
    }

    Ok(())
}
