use async_trait::async_trait;
use trendhunt_core::{FetchError, ProductSource, RawProduct};

use crate::apify::ApifyClient;
use crate::normalize::normalize_item;
use crate::types::TrendSearchInput;

/// [`ProductSource`] backed by an Apify scraper actor.
///
/// Each fetch starts a fresh actor run for the category and normalizes its
/// dataset. Items that fail to normalize are logged and skipped.
#[derive(Debug, Clone)]
pub struct ApifyProductSource {
    client: ApifyClient,
    actor_id: String,
}

impl ApifyProductSource {
    #[must_use]
    pub fn new(client: ApifyClient, actor_id: impl Into<String>) -> Self {
        Self {
            client,
            actor_id: actor_id.into(),
        }
    }
}

#[async_trait]
impl ProductSource for ApifyProductSource {
    fn name(&self) -> &'static str {
        "apify"
    }

    async fn fetch_trending(
        &self,
        category: &str,
        limit: usize,
    ) -> Result<Vec<RawProduct>, FetchError> {
        let input = TrendSearchInput::for_category(category, limit);
        let items = self.client.run_actor(&self.actor_id, &input, limit).await?;

        let total = items.len();
        let products: Vec<RawProduct> = items
            .iter()
            .filter_map(|item| match normalize_item(item, category) {
                Ok(product) => Some(product),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unparseable dataset item");
                    None
                }
            })
            .take(limit)
            .collect();

        tracing::info!(
            actor_id = %self.actor_id,
            category,
            items = total,
            products = products.len(),
            "normalized actor dataset"
        );
        Ok(products)
    }
}
