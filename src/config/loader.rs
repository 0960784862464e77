//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::EngineConfig;
use crate::common::errors::{EngineError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with ENGINE__)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<EngineConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("ENGINE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| EngineError::Configuration(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| EngineError::Configuration(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::ValuationConfig;
    use config::FileFormat;
    use pretty_assertions::assert_eq;

    fn parse_toml(source: &str) -> EngineConfig {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_config(Some("does_not_exist.toml")).unwrap();
        assert!(config.instruments.is_empty());
        assert_eq!(config.history.max_len, 300);
    }

    #[test]
    fn test_toml_instrument_table_parses() {
        let config = parse_toml(
            r#"
            [[instruments]]
            name = "GRANITE"
            position_limit = 20
            valuation = { strategy = "fixed", value = 10000.0 }

            [[instruments]]
            name = "hamper"
            position_limit = 60
            [instruments.valuation]
            strategy = "basket"
            components = { acorn = 6, berry = 3 }
            "#,
        );
        assert_eq!(config.instruments.len(), 2);
        assert_eq!(config.instruments[0].name, "GRANITE");
        match &config.instruments[1].valuation {
            ValuationConfig::Basket { components } => {
                assert_eq!(components.get("acorn"), Some(&6));
                assert_eq!(components.get("berry"), Some(&3));
            }
            other => panic!("expected basket valuation, got {other:?}"),
        }
    }

    #[test]
    fn test_toml_overrides_section_defaults() {
        let config = parse_toml(
            r#"
            [quoting]
            offset_multiplier = 0.5

            [arbitrage.band]
            mode = "z_score"
            window = 20
            "#,
        );
        assert_eq!(config.quoting.offset_multiplier, 0.5);
        // untouched fields keep their defaults
        assert_eq!(config.quoting.size_cap, 10);
        assert_eq!(
            config.arbitrage.band,
            crate::config::types::BandConfig::ZScore {
                window: 20,
                min_z: 1.0,
                fallback_std: 2.0
            }
        );
    }
}
