use crate::error::ConfigurationError;
use crate::util;
use std::env;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Where lesson records are kept.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Mongodb,
    /// Nothing survives a restart. Meant for demos and tests.
    Memory,
}

fn default_mongodb_uri() -> String {
    env::var("MONGODB_URI").unwrap_or("mongodb://localhost:27017".to_string())
}

fn default_mongodb_db() -> String {
    env::var("MONGODB_DB_NAME").unwrap_or("lessonhub".to_string())
}

fn default_public_content() -> PathBuf {
    PathBuf::from(env::var("PUBLIC_CONTENT_PATH").unwrap_or("./public".to_string()))
}

fn default_storage() -> StorageKind {
    match env::var("LESSON_STORAGE").as_deref() {
        Ok("memory") => StorageKind::Memory,
        _ => StorageKind::Mongodb,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    file_path: PathBuf,

    #[serde(default = "default_storage")]
    pub storage: StorageKind,

    #[serde(default = "default_mongodb_uri")]
    pub mongodb_uri: String,
    #[serde(default = "default_mongodb_db")]
    pub mongodb_db: String,

    /// Directory with the client application served next to the landing page.
    #[serde(default = "default_public_content")]
    pub public_content: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file_path: config_dir().join("settings.yml"),
            storage: default_storage(),
            mongodb_uri: default_mongodb_uri(),
            mongodb_db: default_mongodb_db(),
            public_content: default_public_content(),
        }
    }
}

#[inline]
fn config_dir() -> PathBuf {
    PathBuf::from(env::var("CONFIG_DIR").unwrap_or("./config".to_string()))
}

impl Config {
    pub fn load() -> Result<Config, ConfigurationError> {
        let config_file = util::find_first_subpath(
            config_dir(),
            &["settings.yml", "settings.yaml"],
            Path::exists,
        )
        .ok_or_else(|| ConfigurationError::NotFound(config_dir()))?;

        let file = File::open(&config_file)?;
        let mut config: Config = serde_yaml::from_reader(BufReader::new(file))?;
        config.file_path = config_file;

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigurationError> {
        if let Some(dir) = self.file_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = File::create(&self.file_path)?;
        let mut out = BufWriter::new(file);
        serde_yaml::to_writer(&mut out, self)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: Config = serde_yaml::from_str("storage: memory\n").expect("valid yaml");
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.mongodb_uri, default_mongodb_uri());
        assert_eq!(config.public_content, default_public_content());
    }

    #[test]
    fn unknown_storage_is_rejected() {
        let result: Result<Config, _> = serde_yaml::from_str("storage: postgres\n");
        assert!(result.is_err());
    }

    #[test]
    fn storage_round_trips_through_yaml() {
        let yaml = serde_yaml::to_string(&Config::default()).expect("serializable");
        let config: Config = serde_yaml::from_str(&yaml).expect("valid yaml");
        assert_eq!(config.storage, default_storage());
        assert!(!yaml.contains("file_path"));
    }
}
