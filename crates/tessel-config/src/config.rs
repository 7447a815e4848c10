use std::{
    fs,
    path::PathBuf,
    sync::{LazyLock, RwLock},
};

use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};
use toml_edit::DocumentMut;
use tracing::info;

use crate::{
    annotations::annotate_toml_table,
    error::{ConfigError, Result},
    rename::RenameSettings,
    utils::xdg_config_home,
};

/// Query builder configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Config {
    /// Disambiguation of tables that appear more than once in a statement.
    #[serde(default)]
    pub rename: RenameSettings,
}

pub static CONFIG: LazyLock<RwLock<Option<Config>>> = LazyLock::new(|| RwLock::new(None));

pub static CONFIG_PATH: LazyLock<RwLock<PathBuf>> = LazyLock::new(|| {
    RwLock::new(match std::env::var("TESSEL_CONFIG") {
        Ok(path_str) => PathBuf::from(path_str),
        Err(_) => xdg_config_home().join("tessel").join("config.toml"),
    })
});

/// Loads the configuration file into the global slot.
pub fn init() -> Result<()> {
    let config = Config::new()?;
    let mut global_config = CONFIG.write().unwrap();
    *global_config = Some(config);
    Ok(())
}

/// Returns the active configuration.
///
/// Nothing is read from disk here: until [`init`] or [`set_config`] installs
/// a configuration, the defaults are returned.
pub fn get_config() -> Config {
    CONFIG
        .read()
        .unwrap()
        .clone()
        .unwrap_or_else(Config::default_config)
}

/// Replaces the global configuration, e.g. from an embedding application.
pub fn set_config(mut config: Config) -> Result<()> {
    config.resolve()?;
    let mut global_config = CONFIG.write().unwrap();
    *global_config = Some(config);
    Ok(())
}

impl Config {
    pub fn default_config() -> Self {
        let mut rename = RenameSettings::default();
        rename.auto = Some(true);
        rename.alias_template = Some(crate::rename::DEFAULT_ALIAS_TEMPLATE.to_string());

        Self { rename }
    }

    /// Loads the configuration from the configuration file.
    /// If the file does not exist the default configuration is used.
    pub fn new() -> Result<Self> {
        let config_path = CONFIG_PATH.read().unwrap().to_path_buf();
        Self::from_path(&config_path)
    }

    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default_config(),
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve()?;

        Ok(config)
    }

    pub fn resolve(&mut self) -> Result<()> {
        self.rename.resolve()
    }

    pub fn save(&self) -> Result<()> {
        let config_path = CONFIG_PATH.read().unwrap().to_path_buf();
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        let serialized = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serialized)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    pub fn to_annotated_document(&self) -> Result<DocumentMut> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut doc = toml_string.parse::<DocumentMut>()?;

        annotate_toml_table::<Config>(doc.as_table_mut(), true)?;

        if let Some(rename_table) = doc.get_mut("rename").and_then(|item| item.as_table_mut()) {
            annotate_toml_table::<RenameSettings>(rename_table, true)?;
        }

        Ok(doc)
    }
}

/// Writes the default configuration, annotated with the field docs, to the
/// configured path. Refuses to overwrite an existing file.
pub fn generate_default_config() -> Result<PathBuf> {
    let config_path = CONFIG_PATH.read().unwrap().to_path_buf();
    generate_default_config_at(&config_path)?;
    Ok(config_path)
}

pub fn generate_default_config_at(path: &std::path::Path) -> Result<()> {
    if path.exists() {
        return Err(ConfigError::ConfigAlreadyExists);
    }

    let annotated_doc = Config::default_config().to_annotated_document()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, annotated_doc.to_string())?;
    info!(
        "Default configuration file generated with documentation at: {}",
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default_config();

        assert!(config.rename.auto());
        assert_eq!(config.rename.alias_template(), "{table}_{n}");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::from_path(&dir.path().join("missing.toml")).unwrap();

        assert_eq!(config, Config::default_config());
    }

    #[test]
    fn test_partial_file_is_resolved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[rename]\nauto = false\n").unwrap();

        let config = Config::from_path(&path).unwrap();

        assert!(!config.rename.auto());
        assert_eq!(config.rename.alias_template.as_deref(), Some("{table}_{n}"));
    }

    #[test]
    fn test_empty_file_is_resolved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "").unwrap();

        let config = Config::from_path(&path).unwrap();

        assert_eq!(config, Config::default_config());
    }

    #[test]
    fn test_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[rename\nauto = ").unwrap();

        let result = Config::from_path(&path);
        assert!(matches!(result, Err(ConfigError::TomlDeError(_))));
    }

    #[test]
    fn test_invalid_template_in_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[rename]\nalias_template = \"{table}\"\n").unwrap();

        let result = Config::from_path(&path);
        assert!(matches!(
            result,
            Err(ConfigError::AliasTemplateWithoutCounter(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default_config();
        config.rename.alias_template = Some("x{n}".into());
        config.save_to(&path).unwrap();

        let reloaded = Config::from_path(&path).unwrap();
        assert_eq!(reloaded.rename.alias_for("person", 4), "x4");
    }

    #[test]
    fn test_generate_default_config_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        generate_default_config_at(&path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("# Rename tables that are declared more than once"));

        let result = generate_default_config_at(&path);
        assert!(matches!(result, Err(ConfigError::ConfigAlreadyExists)));
    }

    #[test]
    #[serial]
    fn test_get_config_does_not_read_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[rename]\nauto = false\n").unwrap();

        let saved_path = std::mem::replace(&mut *CONFIG_PATH.write().unwrap(), path);
        *CONFIG.write().unwrap() = None;

        assert_eq!(get_config(), Config::default_config());

        init().unwrap();
        assert!(!get_config().rename.auto());

        *CONFIG.write().unwrap() = None;
        *CONFIG_PATH.write().unwrap() = saved_path;
    }

    #[test]
    #[serial]
    fn test_set_config_validates() {
        let bad = Config {
            rename: RenameSettings {
                auto: Some(true),
                alias_template: Some("nope".into()),
            },
        };
        assert!(set_config(bad).is_err());

        let mut good = Config::default_config();
        good.rename.auto = Some(false);
        set_config(good.clone()).unwrap();
        assert_eq!(get_config(), good);

        set_config(Config::default_config()).unwrap();
    }
}
