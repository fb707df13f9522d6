//! Provider over a parsed environment document

use std::path::Path;

use serde_json::{Map, Value};

use super::traits::{Provider, ProviderError, ProviderResult};

/// Provider backed by a JSON object of values
///
/// When an application name is set, values under `app:<name>` take
/// priority over top-level ones:
///
/// ```json
/// { "PORT": "8080", "app:billing": { "PORT": "9090" } }
/// ```
///
/// Non-string scalars are returned in their string form; `null` counts as
/// missing.
#[derive(Debug, Clone)]
pub struct ObjectProvider {
    name: String,
    values: Map<String, Value>,
    app_key: Option<String>,
}

impl ObjectProvider {
    pub fn new(values: Map<String, Value>, application_name: Option<&str>) -> Self {
        Self {
            name: "object".to_string(),
            values,
            app_key: application_name.map(|app| format!("app:{}", app)),
        }
    }

    /// Give this provider a descriptive name (e.g. the file it came from)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Load a `.json`, `.yaml` or `.yml` environment file
    pub fn from_file(path: impl AsRef<Path>, application_name: Option<&str>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
            path: display.clone(),
            source,
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let document: Value = if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| ProviderError::Parse {
                path: display.clone(),
                message: e.to_string(),
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| ProviderError::Parse {
                path: display.clone(),
                message: e.to_string(),
            })?
        };

        match document {
            Value::Object(values) => Ok(Self::new(values, application_name).with_name(display)),
            _ => Err(ProviderError::NotAnObject { path: display }),
        }
    }

    fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
        map.get(key).filter(|v| !v.is_null())
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Provider for ObjectProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<String> {
        let app_value = self
            .app_key
            .as_ref()
            .and_then(|app_key| self.values.get(app_key))
            .and_then(Value::as_object)
            .and_then(|app| Self::lookup(app, key));

        app_value
            .or_else(|| Self::lookup(&self.values, key))
            .map(as_text)
    }
}
