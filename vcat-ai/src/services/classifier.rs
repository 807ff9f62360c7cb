//! Classifier abstraction
//!
//! A [`Classifier`] turns one vendor into one [`Category`] or a
//! [`ClassificationError`]. Providers are tried in configured order by
//! [`FallbackClassifier`]. Model output is accepted only when, after
//! trimming, it is exactly one of the allowed labels.

use crate::error::ClassificationError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use vcat_common::Category;

/// Vendor category classifier
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &str;

    /// Classify one vendor
    async fn classify(
        &self,
        vendor_name: &str,
        description: &str,
    ) -> Result<Category, ClassificationError>;

    /// Check that the provider is reachable and the credentials are accepted
    ///
    /// Returns a short human-readable status line.
    async fn check_connection(&self) -> Result<String, ClassificationError> {
        Ok(format!("{} ready", self.name()))
    }

    /// True when classify() issues a remote call
    fn is_remote(&self) -> bool {
        true
    }

    /// Upper bound on provider calls one classify() may make
    fn max_attempts(&self) -> u32 {
        1
    }
}

/// Strict label matching: trim, then exact match or `InvalidCategory`
pub fn normalize_response(text: &str) -> Result<Category, ClassificationError> {
    Category::from_label(text).ok_or_else(|| {
        warn!(response = %text.trim(), "Model returned a label outside the allowed set");
        ClassificationError::InvalidCategory(text.trim().to_string())
    })
}

/// Map a non-success HTTP status to a classification error
pub(crate) fn status_error(provider: &str, status: u16, body: String) -> ClassificationError {
    match status {
        401 | 403 => ClassificationError::Auth {
            provider: provider.to_string(),
            status,
        },
        429 => ClassificationError::RateLimited {
            provider: provider.to_string(),
        },
        _ => ClassificationError::Api {
            provider: provider.to_string(),
            status,
            body,
        },
    }
}

/// Map a transport error to a classification error
pub(crate) fn transport_error(
    provider: &str,
    timeout: std::time::Duration,
    err: reqwest::Error,
) -> ClassificationError {
    if err.is_timeout() {
        ClassificationError::Timeout(timeout)
    } else if err.is_decode() {
        ClassificationError::MalformedResponse {
            provider: provider.to_string(),
            message: err.to_string(),
        }
    } else {
        ClassificationError::Network {
            provider: provider.to_string(),
            message: err.to_string(),
        }
    }
}

/// Tries each provider in order; the first success wins
///
/// With a call timeout set, a provider that does not answer in time counts
/// as failed and the next one is tried.
pub struct FallbackClassifier {
    providers: Vec<Arc<dyn Classifier>>,
    name: String,
    call_timeout: Option<Duration>,
}

impl FallbackClassifier {
    pub fn new(providers: Vec<Arc<dyn Classifier>>) -> Self {
        let name = providers
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join("+");
        Self {
            providers,
            name,
            call_timeout: None,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = Some(call_timeout);
        self
    }

    pub fn providers(&self) -> &[Arc<dyn Classifier>] {
        &self.providers
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl Classifier for FallbackClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(
        &self,
        vendor_name: &str,
        description: &str,
    ) -> Result<Category, ClassificationError> {
        let mut last_error =
            ClassificationError::NotConfigured("no classification provider available".into());

        for provider in &self.providers {
            let call = provider.classify(vendor_name, description);
            let outcome = match self.call_timeout {
                Some(limit) => tokio::time::timeout(limit, call)
                    .await
                    .unwrap_or(Err(ClassificationError::Timeout(limit))),
                None => call.await,
            };

            match outcome {
                Ok(category) => {
                    debug!(provider = provider.name(), vendor = %vendor_name, %category, "Classified");
                    return Ok(category);
                }
                Err(err) => {
                    debug!(provider = provider.name(), vendor = %vendor_name, error = %err, "Provider failed, trying next");
                    last_error = err;
                }
            }
        }

        Err(last_error)
    }

    async fn check_connection(&self) -> Result<String, ClassificationError> {
        if self.providers.is_empty() {
            return Err(ClassificationError::NotConfigured(
                "no classification provider available".into(),
            ));
        }
        let mut lines = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            match provider.check_connection().await {
                Ok(status) => lines.push(status),
                Err(err) => lines.push(format!("{} unavailable: {}", provider.name(), err)),
            }
        }
        Ok(lines.join("; "))
    }

    fn is_remote(&self) -> bool {
        self.providers.iter().any(|p| p.is_remote())
    }

    fn max_attempts(&self) -> u32 {
        self.providers
            .iter()
            .map(|p| p.max_attempts())
            .sum::<u32>()
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        name: &'static str,
        answer: Option<Category>,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(name: &'static str, answer: Option<Category>) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Classifier for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        async fn classify(&self, _: &str, _: &str) -> Result<Category, ClassificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.ok_or(ClassificationError::RateLimited {
                provider: self.name.to_string(),
            })
        }
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        assert_eq!(
            normalize_response("  Office Supplies\n").unwrap(),
            Category::OfficeSupplies
        );
    }

    #[test]
    fn test_normalize_rejects_near_misses() {
        for text in ["office supplies", "Office Supplies.", "SaaS", "Category: Marketing", ""] {
            assert!(
                matches!(normalize_response(text), Err(ClassificationError::InvalidCategory(_))),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(status_error("p", 401, String::new()), ClassificationError::Auth { status: 401, .. }));
        assert!(matches!(status_error("p", 403, String::new()), ClassificationError::Auth { .. }));
        assert!(matches!(status_error("p", 429, String::new()), ClassificationError::RateLimited { .. }));
        assert!(matches!(status_error("p", 500, "boom".into()), ClassificationError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_fallback_uses_first_success() {
        let failing = Fixed::new("a", None);
        let working = Fixed::new("b", Some(Category::Marketing));
        let unused = Fixed::new("c", Some(Category::Insurance));
        let providers: Vec<Arc<dyn Classifier>> = vec![failing.clone(), working.clone(), unused.clone()];
        let fallback = FallbackClassifier::new(providers);

        assert_eq!(fallback.name(), "a+b+c");
        assert_eq!(fallback.classify("Acme", "").await.unwrap(), Category::Marketing);
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(working.calls.load(Ordering::SeqCst), 1);
        assert_eq!(unused.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_returns_last_error() {
        let providers: Vec<Arc<dyn Classifier>> = vec![Fixed::new("a", None), Fixed::new("b", None)];
        let fallback = FallbackClassifier::new(providers);
        match fallback.classify("Acme", "").await {
            Err(ClassificationError::RateLimited { provider }) => assert_eq!(provider, "b"),
            other => panic!("unexpected {other:?}"),
        }
    }

    struct Hangs;

    #[async_trait]
    impl Classifier for Hangs {
        fn name(&self) -> &str {
            "hangs"
        }

        async fn classify(&self, _: &str, _: &str) -> Result<Category, ClassificationError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Category::Insurance)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_provider_times_out_and_next_is_tried() {
        let working = Fixed::new("b", Some(Category::Marketing));
        let providers: Vec<Arc<dyn Classifier>> = vec![Arc::new(Hangs), working.clone()];
        let fallback = FallbackClassifier::new(providers).with_call_timeout(Duration::from_secs(2));

        let start = tokio::time::Instant::now();
        assert_eq!(fallback.classify("Acme", "").await.unwrap(), Category::Marketing);
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(3));
        assert_eq!(working.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_max_attempts_counts_providers() {
        let providers: Vec<Arc<dyn Classifier>> =
            vec![Fixed::new("a", None), Fixed::new("b", None), Fixed::new("c", None)];
        assert_eq!(FallbackClassifier::new(providers).max_attempts(), 3);
        assert_eq!(FallbackClassifier::new(Vec::new()).max_attempts(), 1);
        assert_eq!(Fixed::new("a", None).max_attempts(), 1);
    }

    #[tokio::test]
    async fn test_empty_fallback_is_not_configured() {
        let fallback = FallbackClassifier::new(Vec::new());
        assert!(matches!(
            fallback.classify("Acme", "").await,
            Err(ClassificationError::NotConfigured(_))
        ));
        assert!(fallback.check_connection().await.is_err());
    }
}
