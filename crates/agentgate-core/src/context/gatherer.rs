//! Pluggable context providers and the gatherer that folds their overlays.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::{ContextOverlay, OrganizationalContext};

/// Failure of a single context provider. Never fatal to an assessment.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("malformed contribution: {0}")]
    Malformed(String),

    #[error("contribution rejected: {0}")]
    Rejected(String),

    #[error("task failed: {0}")]
    Join(String),
}

/// An external source of organizational metadata.
///
/// Implement this trait to plug in catalogs, environment overrides, or test
/// stubs.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Short name used in error reports.
    fn name(&self) -> &str;

    /// Fetch this provider's contribution.
    async fn contribute(&self) -> Result<ContextOverlay, ProviderError>;
}

/// Queries every registered provider and applies their overlays in
/// registration order.
#[derive(Clone, Default)]
pub struct ContextGatherer {
    providers: Vec<Arc<dyn ContextProvider>>,
}

impl ContextGatherer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: Arc<dyn ContextProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Enrich `base` with every provider's overlay.
    ///
    /// All providers are queried concurrently. A provider that fails, or whose
    /// overlay would produce an invalid context, is skipped and reported as
    /// `"provider <name>: <error>"` in the returned error list.
    pub async fn gather(
        &self,
        base: &OrganizationalContext,
    ) -> (OrganizationalContext, Vec<String>) {
        let mut join_set = JoinSet::new();
        for (idx, provider) in self.providers.iter().enumerate() {
            let provider = Arc::clone(provider);
            join_set.spawn(async move { (idx, provider.contribute().await) });
        }

        let mut results: Vec<Option<Result<ContextOverlay, ProviderError>>> =
            (0..self.providers.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, result)) => results[idx] = Some(result),
                Err(e) => warn!(error = %e, "context provider task failed"),
            }
        }

        let mut ctx = base.clone();
        let mut errors = Vec::new();
        for (provider, result) in self.providers.iter().zip(results) {
            let result = result.unwrap_or_else(|| {
                Err(ProviderError::Join("provider task did not complete".to_string()))
            });
            let outcome = result.and_then(|overlay| {
                let next = overlay.apply(&ctx);
                next.validate()
                    .map(|()| next)
                    .map_err(|e| ProviderError::Rejected(e.to_string()))
            });
            match outcome {
                Ok(next) => {
                    debug!(provider = provider.name(), "context overlay applied");
                    ctx = next;
                }
                Err(e) => {
                    warn!(
                        event = "context_provider_failed",
                        provider = provider.name(),
                        error = %e,
                        "skipping context provider"
                    );
                    errors.push(format!("provider {}: {e}", provider.name()));
                }
            }
        }
        (ctx, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, ContextOverlay);

    #[async_trait]
    impl ContextProvider for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        async fn contribute(&self) -> Result<ContextOverlay, ProviderError> {
            Ok(self.1.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl ContextProvider for Failing {
        fn name(&self) -> &str {
            "catalog"
        }

        async fn contribute(&self) -> Result<ContextOverlay, ProviderError> {
            Err(ProviderError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_no_providers_returns_base() {
        let base = OrganizationalContext::default();
        let (ctx, errors) = ContextGatherer::new().gather(&base).await;
        assert_eq!(ctx, base);
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn test_overlays_apply_in_registration_order() {
        let first = ContextOverlay {
            max_complexity: Some(6),
            ..Default::default()
        };
        let second = ContextOverlay {
            max_complexity: Some(8),
            ..Default::default()
        };
        let gatherer = ContextGatherer::new()
            .with_provider(Arc::new(Fixed("first", first)))
            .with_provider(Arc::new(Fixed("second", second)));
        let (ctx, errors) = gatherer.gather(&OrganizationalContext::default()).await;
        assert_eq!(ctx.max_complexity, 8);
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn test_failing_provider_is_skipped_and_recorded() {
        let overlay = ContextOverlay {
            require_docs: Some(false),
            ..Default::default()
        };
        let gatherer = ContextGatherer::new()
            .with_provider(Arc::new(Failing))
            .with_provider(Arc::new(Fixed("env", overlay)));
        let (ctx, errors) = gatherer.gather(&OrganizationalContext::default()).await;
        assert!(!ctx.require_docs);
        assert_eq!(errors, vec!["provider catalog: unavailable: connection refused"]);
    }

    #[tokio::test]
    async fn test_invalid_overlay_is_rejected() {
        let overlay = ContextOverlay {
            max_method_lines: Some(0),
            ..Default::default()
        };
        let gatherer = ContextGatherer::new().with_provider(Arc::new(Fixed("bad", overlay)));
        let base = OrganizationalContext::default();
        let (ctx, errors) = gatherer.gather(&base).await;
        assert_eq!(ctx, base);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("provider bad: contribution rejected"));
    }
}
