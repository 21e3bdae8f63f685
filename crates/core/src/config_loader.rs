use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};

pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";
const JSON_CONFIG_PATH: &str = "config/Config.json";
const ENV_PREFIX: &str = "OPTION_INSIGHT_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from the default TOML path, environment variables, and JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or fail validation.
    pub fn load() -> Result<AppConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Loads configuration layered as: built-in defaults, the TOML file at
    /// `path`, `OPTION_INSIGHT_*` environment variables (`__` separates
    /// nested keys), then `config/Config.json` for keys not yet set.
    ///
    /// Missing files are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or fail validation.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Self::figment(path)
            .extract()
            .with_context(|| format!("Failed to load configuration from {path}"))?;

        config.validate()?;
        Ok(config)
    }

    fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .join(Json::file(JSON_CONFIG_PATH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn layers_file_and_environment_over_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "scan.toml",
                r#"
                symbols = ["AAPL", "MSFT"]
                lookback_days = 45

                [filters]
                min_delta = 0.3
                min_open_interest = 100

                [technical_filters]
                bb_break_lower = true
                bb_tolerance = 0.02
                "#,
            )?;
            jail.set_env("OPTION_INSIGHT_RISK_FREE_RATE", "0.045");
            jail.set_env("OPTION_INSIGHT_VOLATILITY__WINDOW", "10");

            let config = ConfigLoader::load_from("scan.toml").expect("config loads");
            assert_eq!(config.symbols, vec!["AAPL", "MSFT"]);
            assert_eq!(config.lookback_days, 45);
            assert_eq!(config.filters.min_open_interest, 100);
            assert!(config.technical_filters.bb_break_lower);
            assert!((config.risk_free_rate - 0.045).abs() < 1e-12);
            assert_eq!(config.volatility.window, 10);
            assert_eq!(config.indicators.ema_slow, 26);
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::load_from("absent.toml").expect("defaults load");
            assert_eq!(config.lookback_days, 30);
            assert!(config.symbols.is_empty());
            Ok(())
        });
    }

    #[test]
    fn invalid_values_fail_validation() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "workers = 0")?;
            assert!(ConfigLoader::load_from("bad.toml").is_err());
            Ok(())
        });
    }
}
