use serde::Deserialize;
use std::sync::{Mutex, PoisonError};

use super::{
    ConfigContentProvider, ConfigError, ConfigSerializer, FileContentConfigProvider, Validate,
    YamlConfigSerializer,
};

/// Loads, validates and caches a config value; a missing source yields `TConfig::default()`.
pub struct ConfigManager<TConfigContentProvider, TConfig, TConfigSerializer = YamlConfigSerializer>
where
    TConfigContentProvider: ConfigContentProvider,
    TConfig: Clone + for<'de> Deserialize<'de> + Validate + Default,
    TConfigSerializer: ConfigSerializer<TConfig>,
{
    config_serializer: TConfigSerializer,
    config_content_provider: TConfigContentProvider,
    config: Mutex<Option<TConfig>>,
}

impl<TConfig> ConfigManager<FileContentConfigProvider, TConfig, YamlConfigSerializer>
where
    TConfig: Clone + for<'de> Deserialize<'de> + Validate + Default,
{
    pub fn from_yaml_file(file_path: &str) -> Self {
        Self::new(FileContentConfigProvider::new(file_path), YamlConfigSerializer)
    }
}

impl<TConfigContentProvider, TConfig, TConfigSerializer>
    ConfigManager<TConfigContentProvider, TConfig, TConfigSerializer>
where
    TConfigContentProvider: ConfigContentProvider,
    TConfig: Clone + for<'de> Deserialize<'de> + Validate + Default,
    TConfigSerializer: ConfigSerializer<TConfig>,
{
    pub fn new(
        config_content_provider: TConfigContentProvider,
        config_serializer: TConfigSerializer,
    ) -> Self {
        Self {
            config: Mutex::new(None),
            config_content_provider,
            config_serializer,
        }
    }

    pub fn get_config(&self) -> Result<TConfig, ConfigError> {
        let mut current = self.config.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(config) = current.as_ref() {
            return Ok(config.clone());
        }

        let Some(config_data) = self.config_content_provider.get_config_content()? else {
            return Ok(TConfig::default());
        };

        let config = self.config_serializer.deserialize(&config_data)?;
        config.validate().map_err(ConfigError::Invalid)?;

        *current = Some(config.clone());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Clone, Debug, Default, PartialEq, Deserialize)]
    struct Sample {
        port: u16,
    }

    impl Validate for Sample {
        fn validate(&self) -> Result<(), String> {
            if self.port == 0 {
                return Err("port must be non-zero".to_string());
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct InMemoryProvider {
        content: RefCell<Option<String>>,
    }

    impl ConfigContentProvider for InMemoryProvider {
        fn get_config_content(&self) -> Result<Option<String>, ConfigError> {
            Ok(self.content.borrow().clone())
        }
    }

    #[test]
    fn missing_content_falls_back_to_default() {
        let manager: ConfigManager<_, Sample> =
            ConfigManager::new(InMemoryProvider::default(), YamlConfigSerializer);
        assert_eq!(manager.get_config().unwrap(), Sample::default());
    }

    #[test]
    fn parses_and_caches_yaml() {
        let provider = InMemoryProvider::default();
        *provider.content.borrow_mut() = Some("port: 3001\n".to_string());
        let manager: ConfigManager<_, Sample> = ConfigManager::new(provider, YamlConfigSerializer);
        assert_eq!(manager.get_config().unwrap(), Sample { port: 3001 });
    }

    #[test]
    fn rejects_invalid_values() {
        let provider = InMemoryProvider::default();
        *provider.content.borrow_mut() = Some("port: 0\n".to_string());
        let manager: ConfigManager<_, Sample> = ConfigManager::new(provider, YamlConfigSerializer);
        assert!(matches!(manager.get_config(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn reports_malformed_yaml() {
        let provider = InMemoryProvider::default();
        *provider.content.borrow_mut() = Some("port: [not a number".to_string());
        let manager: ConfigManager<_, Sample> = ConfigManager::new(provider, YamlConfigSerializer);
        assert!(matches!(manager.get_config(), Err(ConfigError::Parse(_))));
    }
}
