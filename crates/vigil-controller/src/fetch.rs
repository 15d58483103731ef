//! Resource fetching

use async_trait::async_trait;
use vigil_types::ResourceKey;

use crate::error::FetchError;

/// Source of the current state of a resource.
///
/// `Ok(None)` means the resource no longer exists. Implementations may
/// suspend; the observer does not suspend anywhere else.
#[async_trait]
pub trait ResourceFetcher<R>: Send + Sync {
    async fn fetch(&self, key: &ResourceKey) -> Result<Option<R>, FetchError>;
}
