use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path, str::FromStr};

use crate::{Error, InternalResult};

/// A calculation module: a named, ordered list of variable definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub name: String,
    #[serde(default)]
    pub variables: Vec<VariableDefinition>,
}

impl Configuration {
    pub fn new<S: Into<String>>(name: S, variables: Vec<VariableDefinition>) -> Self {
        Self {
            name: name.into(),
            variables,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub variable_name: String,
    /// Body of a zero-argument function; its `return` value is the result.
    pub calculation_operation: String,
    #[serde(default)]
    pub variable_type: VariableType,
}

impl VariableDefinition {
    pub fn new<N: Into<String>, O: Into<String>>(
        variable_name: N,
        calculation_operation: O,
        variable_type: VariableType,
    ) -> Self {
        Self {
            variable_name: variable_name.into(),
            calculation_operation: calculation_operation.into(),
            variable_type,
        }
    }
}

/// Declared result type of a variable.
///
/// Deserializes from an optional string; unknown names and `null` are
/// [`VariableType::Untyped`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
    Serialize,
    Deserialize,
)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum VariableType {
    Date,
    String,
    Number,
    Boolean,
    #[default]
    #[strum(serialize = "untyped")]
    Untyped,
}

impl From<Option<String>> for VariableType {
    fn from(name: Option<String>) -> Self {
        name.as_deref()
            .and_then(|name| VariableType::from_str(name).ok())
            .unwrap_or_default()
    }
}

impl From<VariableType> for Option<String> {
    fn from(variable_type: VariableType) -> Self {
        match variable_type {
            VariableType::Untyped => None,
            typed => Some(typed.to_string()),
        }
    }
}

/// Engine behaviour switches, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Reported as `name` in every result record.
    #[serde(default = "default_module_name")]
    pub module_name: String,

    /// Exposes `numeric`, `Math` and the global helpers to calculation bodies.
    #[serde(default = "default_true")]
    pub builtins: bool,

    /// Fails compilation when a variable name is defined twice instead of
    /// letting the last definition win.
    #[serde(default)]
    pub reject_duplicate_variables: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            module_name: default_module_name(),
            builtins: default_true(),
            reject_duplicate_variables: false,
        }
    }
}

impl EngineConfig {
    pub fn with_module_name<S: Into<String>>(mut self, module_name: S) -> Self {
        self.module_name = module_name.into();
        self
    }
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> InternalResult<T> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> InternalResult<T> {
    let config = serde_json::from_str(s)?;
    Ok(config)
}

fn default_module_name() -> String {
    "calculations".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    #[test]
    fn test_configuration_from_json() {
        let configuration: Configuration = from_str(
            r#"{
                "name": "retirement",
                "variables": [
                    {"variable_name": "a", "calculation_operation": "return 1;", "variable_type": "Number"},
                    {"variable_name": "b", "calculation_operation": "return 2;", "variable_type": "Currency"},
                    {"variable_name": "c", "calculation_operation": "return 3;", "variable_type": null},
                    {"variable_name": "d", "calculation_operation": "return 4;"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(configuration.name, "retirement");
        let types: Vec<_> = configuration
            .variables
            .iter()
            .map(|v| v.variable_type)
            .collect();
        assert_eq!(
            types,
            vec![
                VariableType::Number,
                VariableType::Untyped,
                VariableType::Untyped,
                VariableType::Untyped
            ]
        );
    }

    #[test]
    fn test_variable_type_round_trip_names() {
        for variable_type in VariableType::iter() {
            let json = serde_json::to_value(variable_type).unwrap();
            let back: VariableType = serde_json::from_value(json).unwrap();
            assert_eq!(back, variable_type);
        }
    }

    #[test]
    fn test_engine_config_defaults() {
        let config: EngineConfig = from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.module_name, "calculations");
        assert!(config.builtins);
        assert!(!config.reject_duplicate_variables);

        let config: EngineConfig =
            from_str(r#"{"module_name": "1", "reject_duplicate_variables": true}"#).unwrap();
        assert_eq!(config.module_name, "1");
        assert!(config.reject_duplicate_variables);
    }

    #[test]
    fn test_missing_file() {
        let result: InternalResult<Configuration> = from_file("/nonexistent/config.json");
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
