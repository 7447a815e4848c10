use std::sync::LazyLock;

use documented::{Documented, DocumentedFields};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

pub const DEFAULT_ALIAS_TEMPLATE: &str = "{table}_{n}";

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// How repeated tables inside one statement are disambiguated
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct RenameSettings {
    /// Rename tables that are declared more than once in FROM/JOIN.
    /// Default: true
    pub auto: Option<bool>,

    /// Template for generated aliases. `{table}` is replaced with the original
    /// table name and `{n}` with the 1-based occurrence number.
    /// Default: "{table}_{n}"
    pub alias_template: Option<String>,
}

impl RenameSettings {
    pub fn auto(&self) -> bool {
        self.auto.unwrap_or(true)
    }

    pub fn alias_template(&self) -> &str {
        self.alias_template
            .as_deref()
            .unwrap_or(DEFAULT_ALIAS_TEMPLATE)
    }

    /// Expands the alias template for the `n`-th declaration of `table`.
    pub fn alias_for(&self, table: &str, n: usize) -> String {
        self.alias_template()
            .replace("{table}", table)
            .replace("{n}", &n.to_string())
    }

    pub fn resolve(&mut self) -> Result<()> {
        self.auto.get_or_insert(true);
        let template = self
            .alias_template
            .get_or_insert_with(|| DEFAULT_ALIAS_TEMPLATE.to_string())
            .clone();

        if !template.contains("{n}") {
            return Err(ConfigError::AliasTemplateWithoutCounter(template));
        }

        let expanded = self.alias_for("t", 1);
        if !IDENTIFIER.is_match(&expanded) {
            return Err(ConfigError::InvalidAliasTemplate {
                template,
                expanded,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = RenameSettings::default();

        assert!(settings.auto());
        assert_eq!(settings.alias_template(), DEFAULT_ALIAS_TEMPLATE);
        assert_eq!(settings.alias_for("person", 2), "person_2");
    }

    #[test]
    fn test_resolve_fills_defaults() {
        let mut settings = RenameSettings::default();
        settings.resolve().unwrap();

        assert_eq!(settings.auto, Some(true));
        assert_eq!(settings.alias_template.as_deref(), Some("{table}_{n}"));
    }

    #[test]
    fn test_custom_template() {
        let mut settings = RenameSettings {
            auto: Some(false),
            alias_template: Some("r{n}_{table}".into()),
        };
        settings.resolve().unwrap();

        assert!(!settings.auto());
        assert_eq!(settings.alias_for("book", 3), "r3_book");
    }

    #[test]
    fn test_template_without_counter() {
        let mut settings = RenameSettings {
            auto: None,
            alias_template: Some("{table}_alias".into()),
        };

        let result = settings.resolve();
        assert!(matches!(
            result,
            Err(ConfigError::AliasTemplateWithoutCounter(_))
        ));
    }

    #[test]
    fn test_template_not_identifier() {
        let mut settings = RenameSettings {
            auto: None,
            alias_template: Some("{n}-{table}".into()),
        };

        let result = settings.resolve();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidAliasTemplate { .. })
        ));
    }
}
