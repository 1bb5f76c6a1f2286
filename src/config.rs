use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

pub static CONFIG: OnceCell<Config> = OnceCell::new();

const CONFIG_FILENAME: &str = "config.toml";
const ENV_PREFIX: &str = "SITLY_";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub sitly: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const SITLY_LEVEL: &str = "info";

    fn ensure_valid(&mut self) {
        let str_original = self.sitly.clone();
        self.sitly = self.sitly.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.sitly.as_str()) {
            eprintln!(
                "Config error: sitly log level of '{}' is invalid - using default of '{}'",
                str_original,
                Self::SITLY_LEVEL
            );
            self.sitly = Self::SITLY_LEVEL.to_owned();
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            sitly: Self::SITLY_LEVEL.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    const HOST: &str = "127.0.0.1";
    const PORT: u16 = 8080;

    fn ensure_valid(&mut self) {
        self.host = self.host.trim().to_owned();
        if self.host.is_empty() {
            eprintln!(
                "Config error: server host is empty - using default of '{}'",
                Self::HOST
            );
            self.host = Self::HOST.to_owned();
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: Self::HOST.to_owned(),
            port: Self::PORT,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// Explicit database file. When absent the database lives in the app data directory.
    pub path: Option<String>,
    pub pool_size: u32,
}

impl DatabaseConfig {
    const POOL_SIZE: u32 = 8;

    pub fn resolve_path(&self, project_dirs: &ProjectDirs) -> PathBuf {
        match &self.path {
            Some(path) => PathBuf::from(path),
            None => project_dirs
                .data_local_dir()
                .join(crate::database::DB_FILENAME),
        }
    }

    fn ensure_valid(&mut self) {
        if self.pool_size == 0 {
            eprintln!(
                "Config error: database pool_size of 0 is invalid - using default of '{}'",
                Self::POOL_SIZE
            );
            self.pool_size = Self::POOL_SIZE;
        }

        if let Some(path) = &self.path {
            if path.trim().is_empty() {
                self.path = None;
            }
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: None,
            pool_size: Self::POOL_SIZE,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RatingsConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl RatingsConfig {
    const DEFAULT_PAGE_SIZE: u32 = 20;
    const MAX_PAGE_SIZE: u32 = 100;

    fn ensure_valid(&mut self) {
        if self.max_page_size == 0 {
            eprintln!(
                "Config error: ratings max_page_size of 0 is invalid - using default of '{}'",
                Self::MAX_PAGE_SIZE
            );
            self.max_page_size = Self::MAX_PAGE_SIZE;
        }

        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            let replacement = Self::DEFAULT_PAGE_SIZE.min(self.max_page_size);
            eprintln!(
                "Config error: ratings default_page_size of '{}' is invalid - using '{}'",
                self.default_page_size, replacement
            );
            self.default_page_size = replacement;
        }
    }
}

impl Default for RatingsConfig {
    fn default() -> Self {
        RatingsConfig {
            default_page_size: Self::DEFAULT_PAGE_SIZE,
            max_page_size: Self::MAX_PAGE_SIZE,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub ratings: RatingsConfig,
}

impl Config {
    /// Loads the configuration from `config.toml` in the app's data directory, layered
    /// over the defaults and under `SITLY_` environment variables.
    /// If the file is missing it is written with the defaults. If it fails to parse,
    /// defaults are used.
    pub fn load_config(project_dirs: &ProjectDirs) -> Self {
        let config_path = project_dirs.data_local_dir().join(CONFIG_FILENAME);

        if !config_path.exists() {
            Self::write_default(&config_path);
        }

        Self::from_figment(Self::figment(&config_path))
    }

    /// Initializes the global configuration. Later calls return the first value.
    pub fn init(project_dirs: &ProjectDirs) -> &'static Config {
        CONFIG.get_or_init(|| Self::load_config(project_dirs))
    }

    /// The global configuration, falling back to defaults if `init` never ran.
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::default)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn from_figment(figment: Figment) -> Self {
        let mut config = figment.extract().unwrap_or_else(|err| {
            eprintln!("Could not load configuration: {}. Using default configuration.", err);
            Config::default()
        });

        config.ensure_valid();

        config
    }

    fn write_default(config_path: &Path) {
        if let Some(parent) = config_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!(
                    "Failed to create configuration directory {}: {}",
                    parent.display(),
                    e
                );
            }
        }

        match toml::to_string_pretty(&Config::default()) {
            Ok(toml_string) => {
                if let Err(e) = fs::write(config_path, toml_string) {
                    eprintln!(
                        "Failed to write default config to {}: {}",
                        config_path.display(),
                        e
                    );
                }
            }
            Err(_) => eprintln!("Failed to serialize default config."),
        }
    }

    fn ensure_valid(&mut self) {
        self.logging.ensure_valid();
        self.server.ensure_valid();
        self.database.ensure_valid();
        self.ratings.ensure_valid();
    }
}
