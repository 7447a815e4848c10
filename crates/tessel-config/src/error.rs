use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(tessel_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(tessel_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Configuration file already exists")]
    #[diagnostic(
        code(tessel_config::already_exists),
        help("Remove the existing config file or point TESSEL_CONFIG somewhere else")
    )]
    ConfigAlreadyExists,

    #[error("Alias template `{0}` does not contain the `{{n}}` placeholder")]
    #[diagnostic(
        code(tessel_config::alias_template_missing_counter),
        help("Every generated alias must be unique, e.g. \"{{table}}_{{n}}\"")
    )]
    AliasTemplateWithoutCounter(String),

    #[error("Alias template `{template}` expands to `{expanded}`, which is not an SQL identifier")]
    #[diagnostic(
        code(tessel_config::invalid_alias_template),
        help("Use only letters, digits and underscores, and do not start with a digit")
    )]
    InvalidAliasTemplate { template: String, expanded: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(tessel_config::io))]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    #[diagnostic(code(tessel_config::toml))]
    Toml(#[from] toml_edit::TomlError),

    #[error("Encountered unexpected TOML item: {0}")]
    #[diagnostic(code(tessel_config::unexpected_toml_item))]
    UnexpectedTomlItem(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
