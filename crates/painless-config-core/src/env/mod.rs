//! Environment resolver
//!
//! Replaces `env://NAME?default=..&trueIf=..&type=..` values with lookups
//! against an injected provider. Parameters only apply when non-empty:
//!
//! 1. `NAME` is looked up on the provider
//! 2. `default` is used when the provider has no value
//! 3. `trueIf` turns the value into `value == trueIf`
//! 4. `type` coerces to `bool`/`boolean` or `int`/`integer`
//!
//! A variable that stays unset resolves to `null`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ResolveError, ResolveResult};
use crate::graph::{has_prefix_ignore_case, scan, Graph, GraphPath, Recognized, ScanMode};
use crate::logging::{default_logger, SharedLogger};
use crate::pipeline::Resolver;
use crate::provider::{Provider, SharedProvider};
use crate::{log_debug, log_error};

/// Scheme prefix for environment placeholders (case-insensitive)
pub const ENV_PREFIX: &str = "env://";

/// Parsed `env://` placeholder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvPlaceholder {
    /// Variable name, with its original casing
    pub name: String,
    pub default: Option<String>,
    pub true_if: Option<String>,
    pub value_type: Option<String>,
}

impl EnvPlaceholder {
    /// Parse a string value as an `env://` placeholder
    pub fn parse(value: &str) -> Recognized<EnvPlaceholder> {
        if !has_prefix_ignore_case(value, ENV_PREFIX) {
            return Recognized::NotPlaceholder;
        }

        let rest = &value[ENV_PREFIX.len()..];
        let rest = rest.split('#').next().unwrap_or_default();
        let (name_part, query) = match rest.split_once('?') {
            Some((name, query)) => (name, Some(query)),
            None => (rest, None),
        };
        // Host part only: no userinfo, no port
        let authority = name_part.split('/').next().unwrap_or_default();
        let host = authority.rsplit('@').next().unwrap_or_default();
        let name = host.split(':').next().unwrap_or_default();
        if name.is_empty() {
            return Recognized::Malformed("missing variable name".to_string());
        }

        let mut placeholder = EnvPlaceholder {
            name: name.to_string(),
            ..Default::default()
        };

        if let Some(query) = query {
            for (key, val) in url::form_urlencoded::parse(query.as_bytes()) {
                if val.is_empty() {
                    continue;
                }
                let slot = match key.as_ref() {
                    "default" => &mut placeholder.default,
                    "trueIf" => &mut placeholder.true_if,
                    "type" => &mut placeholder.value_type,
                    _ => continue,
                };
                if slot.is_none() {
                    *slot = Some(val.into_owned());
                }
            }
        }

        Recognized::Match(placeholder)
    }
}

/// Intermediate value while applying placeholder parameters
#[derive(Debug, Clone, PartialEq)]
enum EnvValue {
    Unset,
    Text(String),
    Flag(bool),
    Integer(i64),
}

impl EnvValue {
    fn into_json(self) -> Value {
        match self {
            EnvValue::Unset => Value::Null,
            EnvValue::Text(text) => Value::String(text),
            EnvValue::Flag(flag) => Value::Bool(flag),
            EnvValue::Integer(number) => Value::from(number),
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            EnvValue::Unset => None,
            EnvValue::Text(text) => Some(text.clone()),
            EnvValue::Flag(flag) => Some(flag.to_string()),
            EnvValue::Integer(number) => Some(number.to_string()),
        }
    }
}

/// Boolean coercion: unset, `false`, `0` and `False` are false
fn coerce_bool(value: &EnvValue) -> bool {
    match value {
        EnvValue::Unset => false,
        EnvValue::Flag(flag) => *flag,
        EnvValue::Integer(number) => *number != 0,
        EnvValue::Text(text) => !matches!(text.as_str(), "" | "false" | "0" | "False"),
    }
}

/// Base-10 prefix parse: leading whitespace, optional sign, then digits
///
/// Anything after the digits is ignored. Returns `None` when no digit
/// follows the sign or the number does not fit in an `i64`.
pub fn parse_integer_prefix(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits_end == 0 {
        return None;
    }
    let digits = &unsigned[..digits_end];
    if negative {
        format!("-{}", digits).parse().ok()
    } else {
        digits.parse().ok()
    }
}

/// Resolves `env://` placeholders against a provider
pub struct EnvironmentResolver {
    provider: SharedProvider,
    logger: SharedLogger,
}

impl EnvironmentResolver {
    pub fn new(provider: SharedProvider) -> Self {
        Self {
            provider,
            logger: default_logger("painless_config::env"),
        }
    }

    /// Set the logger
    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Resolve a single placeholder to its final JSON value
    pub fn resolve_placeholder(&self, path: &GraphPath, placeholder: &EnvPlaceholder) -> ResolveResult<Value> {
        let mut value = match self.provider.get(&placeholder.name) {
            Some(found) => EnvValue::Text(found),
            None => EnvValue::Unset,
        };

        if value == EnvValue::Unset {
            if let Some(default) = &placeholder.default {
                value = EnvValue::Text(default.clone());
            }
        }

        if let Some(expected) = &placeholder.true_if {
            value = EnvValue::Flag(value.as_text().as_deref() == Some(expected.as_str()));
        }

        if let Some(requested) = &placeholder.value_type {
            value = match requested.as_str() {
                "boolean" | "bool" => EnvValue::Flag(coerce_bool(&value)),
                "integer" | "int" => {
                    let text = value.as_text();
                    match text.as_deref().and_then(parse_integer_prefix) {
                        Some(number) => EnvValue::Integer(number),
                        None => {
                            return Err(ResolveError::InvalidInteger {
                                path: path.to_string(),
                                value: text,
                            })
                        }
                    }
                }
                _ => {
                    return Err(ResolveError::UnsupportedType {
                        path: path.to_string(),
                        requested: requested.clone(),
                    })
                }
            };
        }

        Ok(value.into_json())
    }

    /// Resolve every `env://` placeholder in the graph
    ///
    /// All placeholders are resolved before any is written back, so a
    /// failing placeholder leaves the graph untouched.
    pub fn resolve_environment_placeholders(&self, graph: &mut Graph) -> ResolveResult<()> {
        let entries = scan(graph, "env", ScanMode::Strict, EnvPlaceholder::parse)?;
        if entries.is_empty() {
            return Ok(());
        }
        log_debug!(
            self.logger,
            "Found {} env:// placeholders (provider: {})",
            entries.len(),
            self.provider.name()
        );

        let mut resolved = Vec::with_capacity(entries.len());
        for entry in &entries {
            match self.resolve_placeholder(&entry.path, &entry.descriptor) {
                Ok(value) => resolved.push((&entry.path, value)),
                Err(e) => {
                    log_error!(self.logger, "Failed to resolve env://{}: {}", entry.descriptor.name, e);
                    return Err(e);
                }
            }
        }

        for (path, value) in resolved {
            path.replace(graph, value);
        }
        Ok(())
    }
}

#[async_trait]
impl Resolver for EnvironmentResolver {
    fn name(&self) -> &str {
        "environment"
    }

    async fn resolve(&self, graph: &mut Graph) -> ResolveResult<()> {
        self.resolve_environment_placeholders(graph)
    }
}

impl std::fmt::Debug for EnvironmentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentResolver")
            .field("provider", &self.provider.name())
            .finish()
    }
}

/// Build an environment resolver over any provider
pub fn environment_resolver<P: Provider + 'static>(provider: P) -> EnvironmentResolver {
    EnvironmentResolver::new(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::provider::MemoryProvider;
    use serde_json::json;

    fn resolver(pairs: &[(&str, &str)]) -> EnvironmentResolver {
        environment_resolver(MemoryProvider::from_pairs(pairs.iter().copied()))
            .with_logger(Arc::new(NoOpLogger::new()))
    }

    fn parsed(value: &str) -> EnvPlaceholder {
        match EnvPlaceholder::parse(value) {
            Recognized::Match(placeholder) => placeholder,
            other => panic!("expected a placeholder, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_name_and_query() {
        let placeholder = parsed("env://Port?default=80&type=int");
        assert_eq!(placeholder.name, "Port");
        assert_eq!(placeholder.default.as_deref(), Some("80"));
        assert_eq!(placeholder.value_type.as_deref(), Some("int"));
        assert_eq!(placeholder.true_if, None);

        let placeholder = parsed("ENV://MixedCase?trueIf=yes%20please");
        assert_eq!(placeholder.name, "MixedCase");
        assert_eq!(placeholder.true_if.as_deref(), Some("yes please"));
    }

    #[test]
    fn test_parse_name_stops_at_port_and_userinfo() {
        assert_eq!(parsed("env://HOST:8080").name, "HOST");
        assert_eq!(parsed("env://user@Db_Host:5432/path?default=x").name, "Db_Host");
        assert_eq!(parsed("env://user@Db_Host:5432/path?default=x").default.as_deref(), Some("x"));
        assert!(matches!(EnvPlaceholder::parse("env://:8080"), Recognized::Malformed(_)));
    }

    #[test]
    fn test_port_suffix_resolves_host_variable() {
        let mut graph = json!({"a": "env://HOST:8080"});
        resolver(&[("HOST", "h")]).resolve_environment_placeholders(&mut graph).unwrap();
        assert_eq!(graph, json!({"a": "h"}));
    }

    #[test]
    fn test_true_if_then_type() {
        let mut graph = json!({
            "flag": "env://MODE?trueIf=on&type=bool",
            "count": "env://MODE?trueIf=on&type=int"
        });
        let resolver = resolver(&[("MODE", "on")]);
        let err = resolver.resolve_environment_placeholders(&mut graph).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidInteger { ref value, .. } if value.as_deref() == Some("true")));

        let mut graph = json!({
            "on": "env://MODE?trueIf=on&type=bool",
            "off": "env://MODE?trueIf=off&type=boolean"
        });
        resolver.resolve_environment_placeholders(&mut graph).unwrap();
        assert_eq!(graph, json!({"on": true, "off": false}));
    }

    #[test]
    fn test_parse_ignores_empty_parameters() {
        let placeholder = parsed("env://X?default=&type=");
        assert_eq!(placeholder.default, None);
        assert_eq!(placeholder.value_type, None);
    }

    #[test]
    fn test_parse_non_placeholders() {
        assert_eq!(EnvPlaceholder::parse("environment"), Recognized::NotPlaceholder);
        assert_eq!(EnvPlaceholder::parse("https://example.com"), Recognized::NotPlaceholder);
        assert!(matches!(EnvPlaceholder::parse("env://"), Recognized::Malformed(_)));
        assert!(matches!(EnvPlaceholder::parse("env://?default=1"), Recognized::Malformed(_)));
    }

    #[test]
    fn test_integer_prefix() {
        assert_eq!(parse_integer_prefix("42"), Some(42));
        assert_eq!(parse_integer_prefix("  -7px"), Some(-7));
        assert_eq!(parse_integer_prefix("+3.9"), Some(3));
        assert_eq!(parse_integer_prefix("abc"), None);
        assert_eq!(parse_integer_prefix("-"), None);
        assert_eq!(parse_integer_prefix(""), None);
    }

    #[test]
    fn test_scenario_value_and_default() {
        let mut graph = json!({"a": "env://FOO", "b": {"c": "env://BAR?default=5"}});
        resolver(&[("FOO", "hello")])
            .resolve_environment_placeholders(&mut graph)
            .unwrap();
        assert_eq!(graph, json!({"a": "hello", "b": {"c": "5"}}));
    }

    #[test]
    fn test_unset_without_default_is_null() {
        let mut graph = json!({"a": "env://MISSING", "list": ["env://FOO"]});
        resolver(&[("FOO", "x")])
            .resolve_environment_placeholders(&mut graph)
            .unwrap();
        assert_eq!(graph, json!({"a": null, "list": ["x"]}));
    }

    #[test]
    fn test_default_does_not_override_set_value() {
        let mut graph = json!({"a": "env://FOO?default=fallback"});
        resolver(&[("FOO", "")]).resolve_environment_placeholders(&mut graph).unwrap();
        assert_eq!(graph, json!({"a": ""}));
    }

    #[test]
    fn test_true_if() {
        let mut graph = json!({
            "on": "env://MODE?trueIf=production",
            "off": "env://MODE?trueIf=staging",
            "unset": "env://NOPE?trueIf=x"
        });
        resolver(&[("MODE", "production")])
            .resolve_environment_placeholders(&mut graph)
            .unwrap();
        assert_eq!(graph, json!({"on": true, "off": false, "unset": false}));
    }

    #[test]
    fn test_boolean_coercion() {
        let mut graph = json!({
            "a": "env://T?type=boolean",
            "b": "env://F?type=bool",
            "c": "env://ZERO?type=bool",
            "d": "env://CAPS?type=bool",
            "e": "env://UNSET?type=bool",
            "f": "env://UPPER?type=bool"
        });
        resolver(&[("T", "yes"), ("F", "false"), ("ZERO", "0"), ("CAPS", "False"), ("UPPER", "FALSE")])
            .resolve_environment_placeholders(&mut graph)
            .unwrap();
        assert_eq!(
            graph,
            json!({"a": true, "b": false, "c": false, "d": false, "e": false, "f": true})
        );
    }

    #[test]
    fn test_integer_coercion() {
        let mut graph = json!({"port": "env://PORT?type=integer", "workers": "env://W?type=int&default=4"});
        resolver(&[("PORT", "8080")])
            .resolve_environment_placeholders(&mut graph)
            .unwrap();
        assert_eq!(graph, json!({"port": 8080, "workers": 4}));
    }

    #[test]
    fn test_invalid_integer_fails_without_writing() {
        let mut graph = json!({"a": "env://FOO", "port": "env://PORT?type=int"});
        let err = resolver(&[("FOO", "x"), ("PORT", "eighty")])
            .resolve_environment_placeholders(&mut graph)
            .unwrap_err();
        match err {
            ResolveError::InvalidInteger { path, value } => {
                assert_eq!(path, "port");
                assert_eq!(value.as_deref(), Some("eighty"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(graph["a"], json!("env://FOO"));
    }

    #[test]
    fn test_unsupported_type_aborts() {
        let mut graph = json!({"a": "env://FOO?type=float"});
        let err = resolver(&[("FOO", "1.5")])
            .resolve_environment_placeholders(&mut graph)
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedType { ref requested, .. } if requested == "float"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_malformed_placeholder_is_error() {
        let mut graph = json!({"a": {"b": "env://"}});
        let err = resolver(&[]).resolve_environment_placeholders(&mut graph).unwrap_err();
        assert!(matches!(err, ResolveError::MalformedPlaceholder { ref path, .. } if path == "a.b"));
    }

    #[test]
    fn test_second_run_is_noop() {
        let mut graph = json!({"a": "env://FOO", "n": 3, "list": [true, null]});
        let resolver = resolver(&[("FOO", "hello")]);
        resolver.resolve_environment_placeholders(&mut graph).unwrap();
        let once = graph.clone();
        resolver.resolve_environment_placeholders(&mut graph).unwrap();
        assert_eq!(graph, once);
    }

    #[tokio::test]
    async fn test_resolver_trait() {
        let resolver = resolver(&[("FOO", "bar")]);
        let mut graph = json!({"a": "env://FOO"});
        assert_eq!(Resolver::name(&resolver), "environment");
        resolver.resolve(&mut graph).await.unwrap();
        assert_eq!(graph, json!({"a": "bar"}));
    }
}
