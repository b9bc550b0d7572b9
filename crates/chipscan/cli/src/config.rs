use std::path::{Path, PathBuf};
use std::time::Duration;

use chipscan::{ClientConfig, DeviceEntry, DeviceFamily, DeviceRegistry, verify::DEFAULT_BASE_URL};
use eyre::{OptionExt, WrapErr};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// Prefix of environment variables overriding the configuration file
pub(crate) const ENV_PREFIX: &str = "CHIPSCAN_";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    /// API key for the verification service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) api_key: Option<String>,
    /// Reader to scan on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) reader: Option<String>,
    pub(crate) base_url: String,
    /// Request timeout in seconds, unset for none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) timeout_secs: Option<u64>,
    /// Extra AIDs tried after the built-in ones
    #[serde(default)]
    pub(crate) devices: Vec<DeviceConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct DeviceConfig {
    pub(crate) family: DeviceFamily,
    pub(crate) aid: String,
}

/// Values given on the command line, highest precedence
#[derive(Serialize, Debug, Default)]
pub(crate) struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) reader: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            reader: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
            devices: Vec::new(),
        }
    }
}

impl Config {
    pub(crate) fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new().with_base_url(&self.base_url);
        match self.timeout_secs {
            Some(secs) => config.with_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }

    /// Built-in registry followed by the configured devices
    pub(crate) fn registry(&self) -> eyre::Result<DeviceRegistry> {
        let extra = self
            .devices
            .iter()
            .map(|device| {
                let aid = chipscan::from_hex(&device.aid)
                    .wrap_err_with(|| format!("invalid AID for {} device", device.family))?;
                Ok(DeviceEntry::new(device.family, aid))
            })
            .collect::<eyre::Result<Vec<_>>>()?;
        Ok(DeviceRegistry::default().extended(extra)?)
    }

    pub(crate) fn api_key(&self) -> eyre::Result<&str> {
        self.api_key.as_deref().ok_or_eyre(format!(
            "no API key configured (set api_key in the config file, {ENV_PREFIX}API_KEY or --api-key)"
        ))
    }
}

/// Default configuration file, `~/.chipscan/chipscan.toml`
pub(crate) fn default_config_path() -> Option<PathBuf> {
    std::env::home_dir().map(|home| home.join(".chipscan").join("chipscan.toml"))
}

fn figment(path: Option<&Path>, overrides: &Overrides) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) {
        figment = figment.merge(Toml::file(path));
    }
    figment
        .merge(Env::prefixed(ENV_PREFIX))
        .merge(Serialized::defaults(overrides))
}

/// Merge defaults, the config file, the environment and the command line
pub(crate) fn load_config(path: Option<&Path>, overrides: &Overrides) -> eyre::Result<Config> {
    figment(path, overrides)
        .extract()
        .wrap_err("failed to load configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "chipscan.toml",
                r#"
                api_key = "from-file"
                reader = "File Reader"
                timeout_secs = 10

                [[devices]]
                family = "apex"
                aid = "A00000074700CC68E88C02"
                "#,
            )?;
            jail.set_env("CHIPSCAN_READER", "Env Reader");

            let overrides = Overrides {
                api_key: Some("from-cli".to_string()),
                ..Overrides::default()
            };
            let config = load_config(Some(Path::new("chipscan.toml")), &overrides)
                .map_err(|e| e.to_string())?;

            assert_eq!(config.api_key.as_deref(), Some("from-cli"));
            assert_eq!(config.reader.as_deref(), Some("Env Reader"));
            assert_eq!(config.base_url, DEFAULT_BASE_URL);
            assert_eq!(
                config.client_config().timeout,
                Some(Duration::from_secs(10))
            );

            let registry = config.registry().map_err(|e| e.to_string())?;
            assert_eq!(registry.len(), 4);
            assert_eq!(registry.entries()[3].family(), DeviceFamily::Apex);
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        Jail::expect_with(|_| {
            let config = load_config(Some(Path::new("absent.toml")), &Overrides::default())
                .map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            assert!(config.api_key().is_err());
            assert_eq!(config.client_config().timeout, None);
            Ok(())
        });
    }

    #[test]
    fn test_bad_device_aid() {
        let config = Config {
            devices: vec![DeviceConfig {
                family: DeviceFamily::Spark2,
                aid: "12G4".to_string(),
            }],
            ..Config::default()
        };
        assert!(config.registry().is_err());
    }
}
