use serde::Deserialize;

use super::ConfigError;

pub trait ConfigSerializer<TConfig> {
    fn deserialize(&self, content: &str) -> Result<TConfig, ConfigError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct YamlConfigSerializer;

impl<TConfig> ConfigSerializer<TConfig> for YamlConfigSerializer
where
    TConfig: for<'de> Deserialize<'de>,
{
    fn deserialize(&self, content: &str) -> Result<TConfig, ConfigError> {
        serde_yaml_ng::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
