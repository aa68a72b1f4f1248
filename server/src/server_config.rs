use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use common::config::Validate;
use common::games::side_stacker::Difficulty;
use serde::{Deserialize, Serialize};

use crate::room::RoomType;

/// Computer "thinking" pause for one mode, split by tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierDelays {
    pub standard_ms: u64,
    pub hard_ms: u64,
}

impl Default for TierDelays {
    fn default() -> Self {
        Self {
            standard_ms: 1000,
            hard_ms: 2000,
        }
    }
}

impl TierDelays {
    fn for_difficulty(&self, difficulty: Difficulty) -> u64 {
        match difficulty {
            Difficulty::Easy | Difficulty::Medium => self.standard_ms,
            Difficulty::Hard => self.hard_ms,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiDelays {
    pub head_to_head_ms: u64,
    pub versus_computer: TierDelays,
    pub exhibition: TierDelays,
}

impl Default for AiDelays {
    fn default() -> Self {
        Self {
            head_to_head_ms: 1000,
            versus_computer: TierDelays::default(),
            exhibition: TierDelays {
                standard_ms: 2000,
                hard_ms: 4000,
            },
        }
    }
}

impl AiDelays {
    /// The same delay everywhere; handy for tests.
    pub fn uniform(ms: u64) -> Self {
        let tier = TierDelays {
            standard_ms: ms,
            hard_ms: ms,
        };
        Self {
            head_to_head_ms: ms,
            versus_computer: tier,
            exhibition: tier,
        }
    }

    pub fn delay(&self, room_type: RoomType, difficulty: Difficulty) -> Duration {
        let ms = match room_type {
            RoomType::HeadToHead => self.head_to_head_ms,
            RoomType::VersusComputer => self.versus_computer.for_difficulty(difficulty),
            RoomType::Exhibition => self.exhibition.for_difficulty(difficulty),
        };
        Duration::from_millis(ms)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key, never the key itself.
    pub api_key_env: String,
    pub timeout_ms: u64,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_ms: 10_000,
            temperature: 0.7,
            max_output_tokens: 200,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub check_interval_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 300,
            idle_timeout_secs: 3600,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub static_dir: Option<PathBuf>,
    pub ai_delays: AiDelays,
    /// Replay steps wait `ai delay / replay_speedup`.
    pub replay_speedup: u32,
    pub advisory: AdvisoryConfig,
    pub cleanup: CleanupConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3001".to_string(),
            static_dir: None,
            ai_delays: AiDelays::default(),
            replay_speedup: 2,
            advisory: AdvisoryConfig::default(),
            cleanup: CleanupConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn ai_delay(&self, room_type: RoomType, difficulty: Difficulty) -> Duration {
        self.ai_delays.delay(room_type, difficulty)
    }

    pub fn replay_step_delay(&self, room_type: RoomType, difficulty: Difficulty) -> Duration {
        self.ai_delay(room_type, difficulty) / self.replay_speedup.max(1)
    }

    pub fn advisory_timeout(&self) -> Duration {
        Duration::from_millis(self.advisory.timeout_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup.check_interval_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.cleanup.idle_timeout_secs)
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), String> {
        self.listen_addr.parse::<SocketAddr>().map_err(|e| {
            format!("listen_addr '{}' is not a socket address: {}", self.listen_addr, e)
        })?;

        if self.replay_speedup == 0 {
            return Err("replay_speedup must be at least 1".to_string());
        }
        if self.advisory.timeout_ms == 0 {
            return Err("advisory.timeout_ms must be positive".to_string());
        }
        if self.advisory.endpoint.trim().is_empty() {
            return Err("advisory.endpoint must not be empty".to_string());
        }
        if self.cleanup.check_interval_secs == 0 {
            return Err("cleanup.check_interval_secs must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_delay_table() {
        let config = ServerConfig::default();
        let ms = |t, d| config.ai_delay(t, d).as_millis();
        assert_eq!(ms(RoomType::HeadToHead, Difficulty::Hard), 1000);
        assert_eq!(ms(RoomType::VersusComputer, Difficulty::Easy), 1000);
        assert_eq!(ms(RoomType::VersusComputer, Difficulty::Medium), 1000);
        assert_eq!(ms(RoomType::VersusComputer, Difficulty::Hard), 2000);
        assert_eq!(ms(RoomType::Exhibition, Difficulty::Medium), 2000);
        assert_eq!(ms(RoomType::Exhibition, Difficulty::Hard), 4000);
        assert_eq!(
            config
                .replay_step_delay(RoomType::Exhibition, Difficulty::Hard)
                .as_millis(),
            2000
        );
    }

    #[test]
    fn defaults_validate() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let config = ServerConfig {
            listen_addr: "not-an-address".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            replay_speedup: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.advisory.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.cleanup.check_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = "listen_addr: 127.0.0.1:4000\nai_delays:\n  exhibition:\n    hard_ms: 500\n";
        let config: ServerConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:4000");
        assert_eq!(config.ai_delays.exhibition.hard_ms, 500);
        assert_eq!(config.ai_delays.head_to_head_ms, 1000);
        assert_eq!(config.replay_speedup, 2);
        assert_eq!(config.advisory.api_key_env, "GEMINI_API_KEY");
    }
}
