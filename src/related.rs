//! Related-content fetch boundary.
//!
//! The only asynchronous step in the pipeline. The content API client
//! lives outside the crate; the orchestrator talks to it through
//! [`RelatedContentFetcher`], fans the detail-component fetches out as
//! tasks, and joins them before injection. Timeouts and fetch errors
//! never fail the page: they downgrade to the skeleton/client-fallback
//! path.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::model::{RelatedBlog, RelatedProduct};

/// Boxed future returned by fetcher implementations.
pub type RelatedFuture<'a, T> =
    Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// Collaborator that resolves related items for a detail record.
pub trait RelatedContentFetcher: Send + Sync {
    fn related_products(&self, product_id: &str) -> RelatedFuture<'_, Vec<RelatedProduct>>;
    fn related_blogs(&self, blog_id: &str) -> RelatedFuture<'_, Vec<RelatedBlog>>;
}

/// Fetch related products under a deadline. `None` means the panel
/// falls back to the skeleton path.
pub async fn fetch_related_products(
    fetcher: Arc<dyn RelatedContentFetcher>,
    product_id: String,
    timeout: Duration,
) -> Option<Vec<RelatedProduct>> {
    match tokio::time::timeout(timeout, fetcher.related_products(&product_id)).await {
        Ok(Ok(products)) => Some(products),
        Ok(Err(e)) => {
            warn!("render"; "related products fetch failed for {product_id}: {e}");
            None
        }
        Err(_) => {
            warn!("render"; "related products fetch timed out for {product_id}");
            None
        }
    }
}

/// Fetch related blogs under a deadline. `None` means skeleton.
pub async fn fetch_related_blogs(
    fetcher: Arc<dyn RelatedContentFetcher>,
    blog_id: String,
    timeout: Duration,
) -> Option<Vec<RelatedBlog>> {
    match tokio::time::timeout(timeout, fetcher.related_blogs(&blog_id)).await {
        Ok(Ok(blogs)) => Some(blogs),
        Ok(Err(e)) => {
            warn!("render"; "related blogs fetch failed for {blog_id}: {e}");
            None
        }
        Err(_) => {
            warn!("render"; "related blogs fetch timed out for {blog_id}");
            None
        }
    }
}
