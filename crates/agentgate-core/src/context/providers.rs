//! Built-in context providers.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;

use super::gatherer::{ContextProvider, ProviderError};
use super::ContextOverlay;

/// Reads an organizational metadata catalog: a JSON document shaped like a
/// [`ContextOverlay`].
#[derive(Debug, Clone)]
pub struct CatalogFileProvider {
    path: PathBuf,
}

impl CatalogFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ContextProvider for CatalogFileProvider {
    fn name(&self) -> &str {
        "catalog"
    }

    async fn contribute(&self) -> Result<ContextOverlay, ProviderError> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ProviderError::Unavailable(format!("{}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| ProviderError::Malformed(format!("{}: {e}", self.path.display())))
    }
}

/// Prefix of the environment variables read by [`EnvOverridesProvider`].
pub const ENV_PREFIX: &str = "AGENTGATE_";

/// Threshold overrides from `AGENTGATE_*` environment variables.
///
/// Recognised: `MAX_COMPLEXITY`, `MAX_METHOD_LINES`, `MAX_CLASS_LINES`,
/// `MAX_IMPORTS`, `REQUIRE_DOCS`, `CLASS_SUFFIX`, and
/// `DEPRECATED_NAMESPACES` (comma-separated).
#[derive(Debug, Clone, Default)]
pub struct EnvOverridesProvider {
    vars: BTreeMap<String, String>,
}

impl EnvOverridesProvider {
    /// Snapshot the current process environment.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build from explicit `(name, value)` pairs; names keep their prefix.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            vars: vars
                .into_iter()
                .filter_map(|(k, v)| k.strip_prefix(ENV_PREFIX).map(|k| (k.to_string(), v)))
                .collect(),
        }
    }

    fn number<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, ProviderError> {
        match self.vars.get(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
                ProviderError::Malformed(format!("{ENV_PREFIX}{key}='{raw}' is not a number"))
            }),
        }
    }
}

#[async_trait]
impl ContextProvider for EnvOverridesProvider {
    fn name(&self) -> &str {
        "env"
    }

    async fn contribute(&self) -> Result<ContextOverlay, ProviderError> {
        let require_docs = match self.vars.get("REQUIRE_DOCS").map(|v| v.trim()) {
            None => None,
            Some("1") | Some("true") | Some("yes") => Some(true),
            Some("0") | Some("false") | Some("no") => Some(false),
            Some(other) => {
                return Err(ProviderError::Malformed(format!(
                    "{ENV_PREFIX}REQUIRE_DOCS='{other}' is not a boolean"
                )))
            }
        };
        let deprecated_namespaces = self
            .vars
            .get("DEPRECATED_NAMESPACES")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(ContextOverlay {
            max_complexity: self.number("MAX_COMPLEXITY")?,
            max_method_lines: self.number("MAX_METHOD_LINES")?,
            max_class_lines: self.number("MAX_CLASS_LINES")?,
            max_imports: self.number("MAX_IMPORTS")?,
            require_docs,
            class_suffix: self.vars.get("CLASS_SUFFIX").cloned(),
            deprecated_namespaces,
            ..Default::default()
        })
    }
}
