use async_trait::async_trait;
use formline_core::AppResult;
use formline_domain::QueryParams;

/// Port over the host's URL query string.
#[async_trait]
pub trait QueryNavigator: Send + Sync {
    /// Returns the current query parameters.
    async fn current_query(&self) -> AppResult<QueryParams>;

    /// Replaces the current navigation entry without adding history.
    async fn replace_query(&self, params: QueryParams) -> AppResult<()>;

    /// Navigates to a new entry, adding history.
    async fn push_query(&self, params: QueryParams) -> AppResult<()>;
}
