use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const LOCAL_CONFIG_FILE: &str = ".smartkey-qa.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Command prefix used to reach the service; the method URI and payload are appended
    pub service_command: String,
    pub service_uri: String,

    /// Seconds to wait for one reply; 0 waits forever
    pub timeout_secs: u64,

    /// Worker count for scoring cases; 1 is sequential, 0 is one per CPU
    pub jobs: usize,

    /// Word-list file name inside each locale directory
    pub autoreplace_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_command: "luna-send -n 1".to_string(),
            service_uri: "palm://com.palm.smartKey".to_string(),
            timeout_secs: 30,
            jobs: 1,
            autoreplace_file: "text-edit-autoreplace".to_string(),
        }
    }
}

/// One config file as written; absent keys stay `None`
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    service_command: Option<String>,
    service_uri: Option<String>,
    timeout_secs: Option<u64>,
    jobs: Option<usize>,
    autoreplace_file: Option<String>,
}

/// Values given on the command line; `None` leaves the file/default value alone
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub service_command: Option<String>,
    pub service_uri: Option<String>,
    pub timeout_secs: Option<u64>,
    pub jobs: Option<usize>,
}

impl Config {
    /// Load configuration with priority: CLI args > local config > global config > defaults
    pub fn load(overrides: Overrides) -> Result<Self> {
        let mut config = Self::default();

        // Load global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global_config = Self::from_file(&global_path)?;
                config = config.merge(global_config);
            }
        }

        // Load local config (overrides global)
        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            let local_config = Self::from_file(&local_path)?;
            config = config.merge(local_config);
        }

        Ok(config.apply(overrides))
    }

    fn from_file(path: &Path) -> Result<ConfigFile> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Take every value the file sets, even one equal to the default
    fn merge(mut self, file: ConfigFile) -> Self {
        if let Some(command) = file.service_command {
            self.service_command = command;
        }
        if let Some(uri) = file.service_uri {
            self.service_uri = uri;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout_secs = secs;
        }
        if let Some(jobs) = file.jobs {
            self.jobs = jobs;
        }
        if let Some(name) = file.autoreplace_file {
            self.autoreplace_file = name;
        }
        self
    }

    fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(command) = overrides.service_command {
            self.service_command = command;
        }
        if let Some(uri) = overrides.service_uri {
            self.service_uri = uri;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout_secs = secs;
        }
        if let Some(jobs) = overrides.jobs {
            self.jobs = jobs;
        }
        self
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "smartkey-qa").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_command, "luna-send -n 1");
        assert_eq!(config.service_uri, "palm://com.palm.smartKey");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.jobs, 1);
    }

    #[test]
    fn test_merge_configs() {
        let base = Config::default();
        let file = ConfigFile {
            service_command: Some("novacom run file://usr/bin/luna-send -- -n 1".to_string()),
            jobs: Some(4),
            ..Default::default()
        };

        let merged = base.merge(file);
        assert_eq!(
            merged.service_command,
            "novacom run file://usr/bin/luna-send -- -n 1"
        );
        assert_eq!(merged.jobs, 4);
        assert_eq!(merged.timeout_secs, 30);
    }

    #[test]
    fn test_local_file_can_restore_defaults() {
        let dir = tempdir().unwrap();
        let global = dir.path().join("config.toml");
        let local = dir.path().join(LOCAL_CONFIG_FILE);
        fs::write(
            &global,
            "jobs = 4\ntimeout_secs = 5\nservice_uri = \"palm://com.example.spell\"\n",
        )
        .unwrap();
        fs::write(&local, "jobs = 1\ntimeout_secs = 30\n").unwrap();

        let config = Config::default()
            .merge(Config::from_file(&global).unwrap())
            .merge(Config::from_file(&local).unwrap());

        assert_eq!(config.jobs, 1);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.service_uri, "palm://com.example.spell");
    }

    #[test]
    fn test_cli_overrides_win() {
        let config = Config {
            timeout_secs: 5,
            ..Default::default()
        }
        .apply(Overrides {
            timeout_secs: Some(0),
            service_uri: Some("palm://com.example.spell".to_string()),
            ..Default::default()
        });

        assert_eq!(config.timeout_secs, 0);
        assert_eq!(config.service_uri, "palm://com.example.spell");
        assert_eq!(config.service_command, "luna-send -n 1");
    }

    #[test]
    fn test_partial_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "timeout_secs = 10\njobs = 0\n").unwrap();

        let config = Config::default().merge(Config::from_file(&path).unwrap());
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.jobs, 0);
        assert_eq!(config.autoreplace_file, "text-edit-autoreplace");
    }
}
