use derive_more::{Display, From};
use serde::Deserialize;
use serde_valid::yaml::FromYamlStr;
use serde_valid::Validate;

/// Environment variable that overrides `mongo.password` when loading from a file.
pub const PASSWORD_ENV: &str = "SHELTER_MONGO_PASSWORD";

// Config Type
#[derive(Debug, Clone)]
pub struct Config {
    // Connection parameters for the backing collection
    pub mongo: MongoConfig,
}

impl Config {
    pub fn from_file(file_path: &str) -> Result<Self, ConfigError> {
        let config_file_content = std::fs::read_to_string(file_path)?;
        let mut config = Self::from_yaml_str(&config_file_content)?;

        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            config.mongo.password = password;
        }

        if config.mongo.password.is_empty() {
            return Err(ConfigError::MissingPassword);
        }

        Ok(config)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let raw_config = RawConfig::from_yaml_str(s)?;

        if raw_config.mongo.server_selection_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidServerSelectionTimeout);
        }

        if let Some(key) = &raw_config.mongo.unique_index {
            if key.trim().is_empty() {
                return Err(ConfigError::EmptyUniqueIndex);
            }
        }

        Ok(Config { mongo: raw_config.mongo })
    }
}

#[derive(Debug, From, Display)]
pub enum ConfigError {
    #[display("Password not set: provide mongo.password or {}", PASSWORD_ENV)]
    #[from(ignore)]
    MissingPassword,

    #[display("Server selection timeout must be at least 1ms")]
    #[from(ignore)]
    InvalidServerSelectionTimeout,

    #[display("Unique index key must not be blank")]
    #[from(ignore)]
    EmptyUniqueIndex,

    #[display("Serde Error: {}", _0)]
    SerdeError(serde_valid::Error<serde_yaml::Error>),

    #[display("Error Reading Config File: {}", _0)]
    IoError(std::io::Error),
}

impl std::error::Error for ConfigError {}

// Intermediate Config Type as Deserialization Target
#[derive(Debug, Deserialize, Validate)]
pub struct RawConfig {
    #[validate]
    pub mongo: MongoConfig,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct MongoConfig {
    // The host the database server listens on
    #[validate(min_length = 1)]
    pub host: String,
    // The port the database server listens on
    #[validate(minimum = 1)]
    pub port: u16,
    // The logical database holding the collection
    #[validate(min_length = 1)]
    pub db_name: String,
    // The collection all operations target
    #[validate(min_length = 1)]
    pub collection_name: String,
    // The database the credentials are defined in
    #[validate(min_length = 1)]
    pub auth_db: String,
    #[validate(min_length = 1)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    // How long the driver waits for a suitable server before failing an operation
    #[serde(default)]
    pub server_selection_timeout_ms: Option<u64>,
    // Key to build a unique index on when the repository is created
    #[serde(default)]
    pub unique_index: Option<String>,
    // Name reported to the server in the connection handshake
    #[serde(default)]
    pub app_name: Option<String>,
}

pub fn get_sample_config() -> Config {
    Config::from_file("../../config.yaml.example").unwrap()
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use crate::config::{Config, ConfigError, PASSWORD_ENV};
    use crate::get_sample_config;

    const VALID: &str = r#"
mongo:
    host: 'localhost'
    port: 27017
    db_name: 'AAC'
    collection_name: 'animals'
    auth_db: 'admin'
    username: 'aacuser'
    password: 'secret'
"#;

    #[test]
    #[serial]
    fn test_config_parsing() {
        std::env::remove_var(PASSWORD_ENV);
        let config = get_sample_config();
        assert_eq!(config.mongo.collection_name, "animals");
        assert_eq!(config.mongo.unique_index.as_deref(), Some("animal_id"));
    }

    #[test]
    fn test_optional_fields_default_to_none() {
        let config = Config::from_yaml_str(VALID).unwrap();
        assert_eq!(config.mongo.port, 27017);
        assert_eq!(config.mongo.password, "secret");
        assert!(config.mongo.server_selection_timeout_ms.is_none());
        assert!(config.mongo.unique_index.is_none());
        assert!(config.mongo.app_name.is_none());
    }

    #[test]
    fn test_should_not_allow_empty_collection_name() {
        let config = VALID.replace("'animals'", "''");
        assert_eq!(
            if let ConfigError::SerdeError(err) = Config::from_yaml_str(&config).unwrap_err() {
                err.as_validation_errors().unwrap().to_string().contains("collection_name")
            } else {
                false
            },
            true
        );
    }

    #[test]
    fn test_should_not_allow_port_zero() {
        let config = VALID.replace("27017", "0");
        assert!(matches!(
            Config::from_yaml_str(&config).unwrap_err(),
            ConfigError::SerdeError(_)
        ));
    }

    #[test]
    fn test_should_not_allow_zero_timeout() {
        let config = format!("{}    server_selection_timeout_ms: 0\n", VALID);
        assert!(matches!(
            Config::from_yaml_str(&config).unwrap_err(),
            ConfigError::InvalidServerSelectionTimeout
        ));
    }

    #[test]
    fn test_should_not_allow_blank_unique_index() {
        let config = format!("{}    unique_index: ' '\n", VALID);
        assert!(matches!(
            Config::from_yaml_str(&config).unwrap_err(),
            ConfigError::EmptyUniqueIndex
        ));
    }

    #[test]
    #[serial]
    fn test_password_env_overrides_file() {
        let path = std::env::temp_dir().join("shelter-config-override.yaml");
        std::fs::write(&path, VALID.replace("'secret'", "''")).unwrap();

        std::env::remove_var(PASSWORD_ENV);
        assert!(matches!(
            Config::from_file(path.to_str().unwrap()).unwrap_err(),
            ConfigError::MissingPassword
        ));

        std::env::set_var(PASSWORD_ENV, "from-env");
        let config = Config::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.mongo.password, "from-env");

        std::env::remove_var(PASSWORD_ENV);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            Config::from_file("does-not-exist.yaml").unwrap_err(),
            ConfigError::IoError(_)
        ));
    }
}
