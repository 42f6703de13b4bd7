//! Interfaces of the collaborators that sit at either end of the pipeline.

use async_trait::async_trait;

use crate::error::{FetchError, SinkError};
use crate::products::{RawProduct, ScoredProduct};

/// Yields trending products for a category.
///
/// Implementations may return fewer than `limit` products. Items that fail to
/// parse are omitted rather than failing the whole fetch.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Short name used in logs, e.g. `"apify"`.
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns [`FetchError`] when the source is unreachable.
    async fn fetch_trending(
        &self,
        category: &str,
        limit: usize,
    ) -> Result<Vec<RawProduct>, FetchError>;
}

/// Accepts finished records, one call per product.
#[async_trait]
pub trait ProductSink: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SinkError`] if the record could not be persisted. Callers
    /// log and count these; they never abort a run.
    async fn emit(&self, product: &ScoredProduct) -> Result<(), SinkError>;
}
