use std::sync::Arc;

use formline_core::{AppError, AppResult};
use formline_domain::{PAGE_SIZE_OPTIONS, PaginationView};
use tracing::debug;

use crate::search_ports::QueryNavigator;

/// Page navigation backed by the URL query.
///
/// Page and size changes add a navigation history entry, unlike search
/// updates which replace the current one.
#[derive(Clone)]
pub struct PaginationControl {
    navigator: Arc<dyn QueryNavigator>,
}

impl PaginationControl {
    /// Creates a control over the given navigator.
    #[must_use]
    pub fn new(navigator: Arc<dyn QueryNavigator>) -> Self {
        Self { navigator }
    }

    /// Reads the current pagination state.
    pub async fn view(&self, total_pages: u32) -> AppResult<PaginationView> {
        let params = self.navigator.current_query().await?;
        Ok(PaginationView::from_query(&params, total_pages))
    }

    /// Navigates to `page`, which must lie in `1..=total_pages`.
    pub async fn go_to_page(&self, total_pages: u32, page: u32) -> AppResult<PaginationView> {
        if page == 0 || page > total_pages {
            return Err(AppError::Validation(format!(
                "page {page} is outside 1..={total_pages}"
            )));
        }

        let view = self.view(total_pages).await?;
        let params = view.page_query(page);
        debug!(page, total_pages, "navigating to page");
        self.navigator.push_query(params.clone()).await?;
        Ok(PaginationView::from_query(&params, total_pages))
    }

    /// Navigates one page forward. Returns `None` on the last page.
    pub async fn next_page(&self, total_pages: u32) -> AppResult<Option<PaginationView>> {
        let view = self.view(total_pages).await?;
        if !view.has_next() {
            return Ok(None);
        }

        self.go_to_page(total_pages, view.current_page() + 1)
            .await
            .map(Some)
    }

    /// Navigates one page back. Returns `None` on the first page.
    pub async fn previous_page(&self, total_pages: u32) -> AppResult<Option<PaginationView>> {
        let view = self.view(total_pages).await?;
        if !view.has_previous() {
            return Ok(None);
        }

        self.go_to_page(total_pages, view.current_page() - 1)
            .await
            .map(Some)
    }

    /// Selects a page size from the offered options.
    pub async fn select_page_size(
        &self,
        total_pages: u32,
        size: u32,
    ) -> AppResult<PaginationView> {
        if !PAGE_SIZE_OPTIONS.contains(&size) {
            return Err(AppError::Validation(format!(
                "page size {size} is not one of {PAGE_SIZE_OPTIONS:?}"
            )));
        }

        let view = self.view(total_pages).await?;
        let params = view.size_query(size);
        debug!(size, "page size selected");
        self.navigator.push_query(params.clone()).await?;
        Ok(PaginationView::from_query(&params, total_pages))
    }
}
