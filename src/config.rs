use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::games::kalah::DEFAULT_MAX_STONES;
use crate::games::Validate;

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    Random,
    Greedy,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_stones_per_pit: u32,
    pub layout: Vec<i32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_stones_per_pit: DEFAULT_MAX_STONES,
            layout: vec![6, 6, 6, 6, 6, 6, 0, 6, 6, 6, 6, 6, 6, 0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: PathBuf::from("games.jsonl"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SimulateConfig {
    pub games: usize,
    pub player_one: Policy,
    pub player_two: Policy,
}

impl Default for SimulateConfig {
    fn default() -> Self {
        SimulateConfig {
            games: 100,
            player_one: Policy::Random,
            player_two: Policy::Greedy,
        }
    }
}

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub store: StoreConfig,
    pub simulate: SimulateConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("Config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

impl Validate for Config {
    type Error = ConfigError;

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_stones_per_pit == 0 {
            return Err(ConfigError::Validation("engine.max_stones_per_pit must be > 0".into()));
        }
        if self.simulate.games == 0 {
            return Err(ConfigError::Validation("simulate.games must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
            [engine]
            max_stones_per_pit = 4
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.max_stones_per_pit, 4);
        assert_eq!(config.engine.layout.len(), 14);
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.simulate.player_two, Policy::Greedy);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validation_rejects_zero_games() {
        let mut config = Config::default();
        config.simulate.games = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default(Path::new("nonexistent_mancala.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mancala.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[engine]\nlayout = [3, 3, 0, 3, 3, 0]\n\n[simulate]\nplayer_one = \"greedy\"").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.engine.layout, vec![3, 3, 0, 3, 3, 0]);
        assert_eq!(config.simulate.player_one, Policy::Greedy);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mancala.toml");
        std::fs::write(&path, "[engine]\nmax_stones_per_pit = 0\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Validation(_))));
    }
}
