use anyhow::{Context, Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Output rendering for run reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub progress: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimesConfig {
    /// 0 derives the count from available cores
    pub workers: usize,
    pub thread_percentage: u8,
    pub max_threads: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub target: i64,
    pub rows: usize,
    pub cols: usize,
    /// 0 means one worker per row
    pub workers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Fully merged configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanjoinConfig {
    pub engine: EngineConfig,
    pub primes: PrimesConfig,
    pub search: SearchConfig,
    pub output: OutputConfig,
}

/// Values set on the command line, highest priority layer
///
/// `None` leaves the lower layers untouched.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub progress: Option<bool>,
    pub target: Option<i64>,
    pub rows: Option<usize>,
    pub cols: Option<usize>,
    pub format: Option<OutputFormat>,
}

impl CliOverrides {
    fn apply(&self, figment: Figment) -> Figment {
        fn set<T: Serialize>(
            figment: Figment,
            section: &str,
            key: &str,
            value: Option<T>,
        ) -> Figment {
            match value {
                Some(value) => figment.merge(Serialized::defaults(
                    serde_json::json!({ section: { key: value } }),
                )),
                None => figment,
            }
        }

        let figment = set(figment, "engine", "progress", self.progress);
        let figment = set(figment, "search", "target", self.target);
        let figment = set(figment, "search", "rows", self.rows);
        let figment = set(figment, "search", "cols", self.cols);
        set(figment, "output", "format", self.format)
    }
}

impl FanjoinConfig {
    pub fn load() -> Result<Self> {
        Self::load_with(None, &CliOverrides::default())
    }

    /// Merge every layer and extract the typed configuration
    pub fn load_with(custom_config: Option<&str>, overrides: &CliOverrides) -> Result<Self> {
        let figment = Self::figment(custom_config, overrides)?;
        let config: FanjoinConfig = figment
            .extract()
            .context("Failed to parse merged configuration")?;
        config.validate()?;
        tracing::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    fn figment(custom_config: Option<&str>, overrides: &CliOverrides) -> Result<Figment> {
        let user_config = Self::user_config_path();
        let mut figment = Figment::new()
            .merge(Toml::string(DEFAULT_CONFIG))
            .merge(Toml::file(&user_config))
            .merge(Json::file(user_config.replace(".toml", ".json")))
            .merge(Yaml::file(user_config.replace(".toml", ".yaml")))
            .merge(Toml::file("fanjoin.toml"))
            .merge(Json::file("fanjoin.json"))
            .merge(Yaml::file("fanjoin.yaml"));

        if let Some(custom_path) = custom_config {
            let path = Path::new(custom_path);
            if !path.is_file() {
                bail!("Config file not found: {}", custom_path);
            }
            figment = match path.extension().and_then(|e| e.to_str()) {
                Some("json") => figment.merge(Json::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }

        // Environment beats every file, CLI flags beat the environment
        figment = figment.merge(Env::prefixed("FANJOIN_").split("__"));
        Ok(overrides.apply(figment))
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.rows == 0 || self.search.cols == 0 {
            bail!(
                "search grid dimensions must be non-zero, got {}x{}",
                self.search.rows,
                self.search.cols
            );
        }
        if !(1..=100).contains(&self.primes.thread_percentage) {
            bail!(
                "primes.thread_percentage must be between 1 and 100, got {}",
                self.primes.thread_percentage
            );
        }
        Ok(())
    }

    /// Worker count for prime enumeration when none was given explicitly
    pub fn default_prime_workers(&self) -> usize {
        if self.primes.workers > 0 {
            self.primes.workers
        } else {
            crate::parallel::calculate_optimal_workers(
                self.primes.max_threads,
                self.primes.thread_percentage,
            )
        }
    }

    /// Configured search workers; a configured 0 means one worker per grid row
    pub fn search_workers(&self) -> Option<usize> {
        (self.search.workers > 0).then_some(self.search.workers)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration as TOML")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize configuration as JSON")
    }

    fn user_config_path() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{home}/.config/fanjoin/config.toml"),
            Err(_) => "~/.config/fanjoin/config.toml".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn isolate_home(jail: &mut Jail) {
        let home = jail.directory().to_path_buf();
        jail.set_env("HOME", home.display());
    }

    fn load_in_jail(custom: Option<&str>, overrides: &CliOverrides) -> FanjoinConfig {
        FanjoinConfig::load_with(custom, overrides).expect("config should load")
    }

    #[test]
    fn test_defaults() {
        Jail::expect_with(|jail| {
            isolate_home(jail);
            let config = load_in_jail(None, &CliOverrides::default());
            assert!(!config.engine.progress);
            assert_eq!(config.primes.workers, 0);
            assert_eq!(config.primes.thread_percentage, 75);
            assert_eq!(config.search.target, 1);
            assert_eq!((config.search.rows, config.search.cols), (100, 1000));
            assert_eq!(config.search_workers(), None);
            assert_eq!(config.output.format, OutputFormat::Text);
            assert!(config.default_prime_workers() >= 1);
            Ok(())
        });
    }

    #[test]
    fn test_layer_priority() {
        Jail::expect_with(|jail| {
            isolate_home(jail);
            std::fs::create_dir_all(".config/fanjoin").map_err(|e| e.to_string())?;
            jail.create_file(
                ".config/fanjoin/config.toml",
                "[search]\ntarget = 2\nrows = 5\n[primes]\nworkers = 3\n",
            )?;
            jail.create_file("fanjoin.toml", "[search]\ntarget = 3\n")?;
            jail.set_env("FANJOIN_SEARCH__ROWS", "7");

            let config = load_in_jail(None, &CliOverrides::default());
            assert_eq!(config.search.target, 3);
            assert_eq!(config.search.rows, 7);
            assert_eq!(config.primes.workers, 3);
            assert_eq!(config.default_prime_workers(), 3);

            let overrides = CliOverrides {
                rows: Some(9),
                format: Some(OutputFormat::Json),
                ..Default::default()
            };
            let config = load_in_jail(None, &overrides);
            assert_eq!(config.search.rows, 9);
            assert_eq!(config.output.format, OutputFormat::Json);
            Ok(())
        });
    }

    #[test]
    fn test_custom_config_by_extension() {
        Jail::expect_with(|jail| {
            isolate_home(jail);
            jail.create_file("custom.json", r#"{"output": {"format": "json"}}"#)?;
            jail.create_file("custom.yaml", "engine:\n  progress: true\n")?;

            let config = load_in_jail(Some("custom.json"), &CliOverrides::default());
            assert_eq!(config.output.format, OutputFormat::Json);

            let config = load_in_jail(Some("custom.yaml"), &CliOverrides::default());
            assert!(config.engine.progress);
            Ok(())
        });
    }

    #[test]
    fn test_missing_custom_config_is_an_error() {
        Jail::expect_with(|jail| {
            isolate_home(jail);
            assert!(FanjoinConfig::load_with(Some("nope.toml"), &CliOverrides::default()).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_rejected() {
        Jail::expect_with(|jail| {
            isolate_home(jail);
            jail.create_file("fanjoin.toml", "[search]\ncols = 0\n")?;
            assert!(FanjoinConfig::load().is_err());

            jail.create_file("fanjoin.toml", "[output]\nformat = \"xml\"\n")?;
            assert!(FanjoinConfig::load().is_err());
            Ok(())
        });
    }

    #[test]
    fn test_serializes_back_to_toml_and_json() {
        Jail::expect_with(|jail| {
            isolate_home(jail);
            let config = FanjoinConfig::load().unwrap();
            let toml = config.to_toml().unwrap();
            assert!(toml.contains("[search]"));
            let json: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
            assert_eq!(json["output"]["format"], "text");
            Ok(())
        });
    }
}
