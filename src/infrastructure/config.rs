use crate::domain::{
    config::{ControllerConfig, F4tConfig, GlobalConfig, DEFAULT_PORT},
    error::{F4tError, F4tResult},
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration manager
pub struct ConfigManager {
    global_config_path: PathBuf,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> F4tResult<Self> {
        let global_config_path = Self::get_global_config_path()?;
        let project_config_path = Self::find_project_config_path();

        Ok(Self {
            global_config_path,
            project_config_path,
        })
    }

    /// Manager over explicit paths
    pub fn with_paths(global_config_path: PathBuf, project_config_path: Option<PathBuf>) -> Self {
        Self {
            global_config_path,
            project_config_path,
        }
    }

    /// Load configuration from files
    pub fn load_config(&self) -> F4tResult<F4tConfig> {
        let mut config = F4tConfig::default();

        if self.global_config_path.exists() {
            debug!("Loading global config {}", self.global_config_path.display());
            config = self.load_config_from_path(&self.global_config_path)?;
        }

        // Project controllers replace global entries of the same name
        if let Some(project_path) = &self.project_config_path {
            if project_path.exists() {
                debug!("Loading project config {}", project_path.display());
                let project_config = self.load_config_from_path(project_path)?;
                for controller in project_config.controllers {
                    config.controllers.retain(|c| c.name != controller.name);
                    config.controllers.push(controller);
                }
            }
        }

        Ok(config)
    }

    /// Get global configuration path
    fn get_global_config_path() -> F4tResult<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| F4tError::Config {
            message: "Could not determine home directory".to_string(),
        })?;

        Ok(home.join(".config").join("f4tcom").join("config.toml"))
    }

    /// Find project configuration path by walking up directory tree
    fn find_project_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut path = current_dir.as_path();

        loop {
            let config_path = path.join(".f4tcom").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            path = path.parent()?;
        }
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> F4tResult<F4tConfig> {
        let content = fs::read_to_string(path).map_err(|e| F4tError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| F4tError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Save configuration to specific path
    pub fn save_config_to_path(&self, path: &Path, config: &F4tConfig) -> F4tResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| F4tError::Config {
                message: format!("Failed to create config directory: {}", e),
            })?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| F4tError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| F4tError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })
    }

    /// Create default project configuration
    pub fn init_project_config(&self, path: &Path) -> F4tResult<PathBuf> {
        let config_file = path.join(".f4tcom").join("config.toml");

        if config_file.exists() {
            return Err(F4tError::Config {
                message: "Project configuration already exists".to_string(),
            });
        }

        let default_config = F4tConfig {
            global: GlobalConfig::default(),
            controllers: vec![ControllerConfig {
                name: "chamber1".to_string(),
                description: "Example F4T controller".to_string(),
                host: "192.168.0.101".to_string(),
                port: DEFAULT_PORT,
                timeout_ms: None,
            }],
        };

        self.save_config_to_path(&config_file, &default_config)?;

        Ok(config_file)
    }

    /// Get the global config path
    pub fn get_global_config_path_ref(&self) -> &PathBuf {
        &self.global_config_path
    }
}
