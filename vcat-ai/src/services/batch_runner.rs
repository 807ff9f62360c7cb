//! Batch runner
//!
//! Drives the classifier over every row of one upload, in file order, and
//! produces exactly one result per row. A failure on one row is logged and
//! recorded as `Uncategorized`; the remaining rows are still processed.

use crate::db::Store;
use crate::error::ClassificationError;
use crate::models::{NewVendorResult, VendorRow};
use crate::services::classifier::Classifier;
use crate::services::rate_limiter::RateLimiter;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use vcat_common::{AiCategory, Category};

/// Tunables for one runner
#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Minimum delay between successive remote calls
    pub call_interval: Duration,
    /// Upper bound for one provider call; a fallback chain gets this per provider
    pub call_timeout: Duration,
    /// Consult and fill the vendor category cache
    pub use_cache: bool,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            call_interval: Duration::from_millis(1000),
            call_timeout: Duration::from_secs(30),
            use_cache: true,
        }
    }
}

/// Counters for one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub total: usize,
    pub classified: usize,
    pub uncategorized: usize,
    pub cache_hits: usize,
}

/// Results of one batch, in row order
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub results: Vec<NewVendorResult>,
    pub stats: BatchStats,
}

/// Classifies uploads row by row
pub struct BatchRunner {
    classifier: Arc<dyn Classifier>,
    store: Store,
    rate_limiter: Arc<RateLimiter>,
    settings: BatchSettings,
}

impl BatchRunner {
    pub fn new(classifier: Arc<dyn Classifier>, store: Store, settings: BatchSettings) -> Self {
        Self {
            classifier,
            store,
            rate_limiter: Arc::new(RateLimiter::new(settings.call_interval)),
            settings,
        }
    }

    /// Same store, settings and rate limiter with a different classifier
    ///
    /// Batches still running on `self` and batches on the new runner draw
    /// from one limiter, so the call interval holds across a swap.
    pub fn with_classifier(&self, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            store: self.store.clone(),
            rate_limiter: Arc::clone(&self.rate_limiter),
            settings: self.settings.clone(),
        }
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Classify every row; never fails as a whole
    pub async fn run(&self, upload_id: i64, rows: &[VendorRow]) -> BatchOutcome {
        let mut stats = BatchStats {
            total: rows.len(),
            ..BatchStats::default()
        };
        let mut results = Vec::with_capacity(rows.len());

        info!(
            upload_id,
            rows = rows.len(),
            classifier = self.classifier.name(),
            "Starting classification batch"
        );

        for row in rows {
            let (ai_category, from_cache) = self.classify_row(upload_id, row).await;

            if from_cache {
                stats.cache_hits += 1;
            }
            if ai_category.is_uncategorized() {
                stats.uncategorized += 1;
            } else {
                stats.classified += 1;
            }

            results.push(NewVendorResult {
                upload_id,
                vendor_name: row.vendor_name.clone(),
                description: row.description.clone(),
                original_category: row.original_category.clone(),
                ai_category,
                from_cache,
            });
        }

        info!(
            upload_id,
            total = stats.total,
            classified = stats.classified,
            uncategorized = stats.uncategorized,
            cache_hits = stats.cache_hits,
            "Classification batch complete"
        );

        BatchOutcome { results, stats }
    }

    async fn classify_row(&self, upload_id: i64, row: &VendorRow) -> (AiCategory, bool) {
        if self.settings.use_cache {
            match self.store.lookup_cached(&row.vendor_name).await {
                Ok(Some(category)) => {
                    debug!(upload_id, vendor = %row.vendor_name, %category, "Cache hit");
                    return (category.into(), true);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(upload_id, vendor = %row.vendor_name, error = %err, "Cache lookup failed");
                }
            }
        }

        match self.classify_remote(row).await {
            Ok(category) => {
                if self.settings.use_cache {
                    self.remember(row, category).await;
                }
                (category.into(), false)
            }
            Err(err) => {
                warn!(
                    upload_id,
                    line = row.line,
                    vendor = %row.vendor_name,
                    error = %err,
                    "Classification failed, recording Uncategorized"
                );
                (AiCategory::Uncategorized, false)
            }
        }
    }

    async fn classify_remote(&self, row: &VendorRow) -> Result<Category, ClassificationError> {
        if self.classifier.is_remote() {
            self.rate_limiter.wait().await;
        }

        let call = self
            .classifier
            .classify(&row.vendor_name, row.description_text());

        let limit = self.settings.call_timeout * self.classifier.max_attempts();
        tokio::time::timeout(limit, call)
            .await
            .map_err(|_| ClassificationError::Timeout(limit))?
    }

    async fn remember(&self, row: &VendorRow, category: Category) {
        if let Err(err) = self
            .store
            .upsert_cached(&row.vendor_name, category, row.description.as_deref())
            .await
        {
            warn!(vendor = %row.vendor_name, error = %err, "Failed to update vendor cache");
        }
    }
}
