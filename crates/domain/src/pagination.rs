use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::query::QueryParams;

/// Query parameter carrying the current page.
pub const PAGE_PARAM: &str = "page";

/// Query parameter carrying the page size.
pub const SIZE_PARAM: &str = "size";

/// Page sizes offered by the size picker.
pub const PAGE_SIZE_OPTIONS: [u32; 5] = [5, 10, 15, 20, 25];

/// Text rendered for an elided page range.
pub const ELLIPSIS: &str = "...";

/// One entry of a pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageItem {
    /// A navigable page number.
    Page(u32),
    /// A gap between page numbers.
    Ellipsis,
}

impl PageItem {
    /// Returns the page number, if this item is one.
    #[must_use]
    pub fn page(&self) -> Option<u32> {
        match self {
            Self::Page(page) => Some(*page),
            Self::Ellipsis => None,
        }
    }
}

impl Display for PageItem {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Page(page) => write!(formatter, "{page}"),
            Self::Ellipsis => formatter.write_str(ELLIPSIS),
        }
    }
}

/// Computes which page numbers and gaps a pagination control shows.
///
/// Up to seven pages are listed in full. Beyond that the window keeps the
/// first and last pages and elides around the current one. `current_page` is
/// not clamped; callers pass values in `1..=total_pages`.
#[must_use]
pub fn generate_page_window(current_page: u32, total_pages: u32) -> Vec<PageItem> {
    if total_pages <= 7 {
        return (1..=total_pages).map(PageItem::Page).collect();
    }

    if current_page <= 3 {
        return vec![
            PageItem::Page(1),
            PageItem::Page(2),
            PageItem::Page(3),
            PageItem::Ellipsis,
            PageItem::Page(total_pages - 1),
            PageItem::Page(total_pages),
        ];
    }

    if current_page >= total_pages - 2 {
        return vec![
            PageItem::Page(1),
            PageItem::Page(2),
            PageItem::Ellipsis,
            PageItem::Page(total_pages - 2),
            PageItem::Page(total_pages - 1),
            PageItem::Page(total_pages),
        ];
    }

    vec![
        PageItem::Page(1),
        PageItem::Ellipsis,
        PageItem::Page(current_page - 1),
        PageItem::Page(current_page),
        PageItem::Page(current_page + 1),
        PageItem::Ellipsis,
        PageItem::Page(total_pages),
    ]
}

/// Visual position of an item inside the rendered window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageItemPosition {
    /// Leftmost item.
    First,
    /// Rightmost item.
    Last,
    /// The only item.
    Single,
    /// An ellipsis.
    Middle,
    /// Any other page number.
    Inner,
}

/// Returns the position of the item at `index` in a window of `len` items.
#[must_use]
pub fn page_item_position(item: PageItem, index: usize, len: usize) -> PageItemPosition {
    if item == PageItem::Ellipsis {
        return PageItemPosition::Middle;
    }
    if len == 1 {
        return PageItemPosition::Single;
    }
    if index + 1 == len {
        return PageItemPosition::Last;
    }
    if index == 0 {
        return PageItemPosition::First;
    }

    PageItemPosition::Inner
}

/// Pagination state derived from the current query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationView {
    current_page: u32,
    page_size: Option<u32>,
    total_pages: u32,
    params: QueryParams,
}

impl PaginationView {
    /// Reads `page` and `size` from the query.
    ///
    /// A missing, unparsable or zero page falls back to page 1. A missing or
    /// unparsable size leaves the size unselected.
    #[must_use]
    pub fn from_query(params: &QueryParams, total_pages: u32) -> Self {
        let current_page = params
            .get(PAGE_PARAM)
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|page| *page > 0)
            .unwrap_or(1);
        let page_size = params
            .get(SIZE_PARAM)
            .and_then(|value| value.parse::<u32>().ok());

        Self {
            current_page,
            page_size,
            total_pages,
            params: params.clone(),
        }
    }

    /// Returns the current page.
    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Returns the selected page size.
    #[must_use]
    pub fn page_size(&self) -> Option<u32> {
        self.page_size
    }

    /// Returns the total page count.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Returns the pagination window for the current page.
    #[must_use]
    pub fn window(&self) -> Vec<PageItem> {
        generate_page_window(self.current_page, self.total_pages)
    }

    /// Returns the window with each item's position and active flag.
    #[must_use]
    pub fn items(&self) -> Vec<(PageItem, PageItemPosition, bool)> {
        let window = self.window();
        let len = window.len();
        window
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                (
                    item,
                    page_item_position(item, index, len),
                    item.page() == Some(self.current_page),
                )
            })
            .collect()
    }

    /// Returns whether a previous page exists.
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    /// Returns whether a next page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Returns the query that navigates to `page`, keeping other parameters.
    #[must_use]
    pub fn page_query(&self, page: u32) -> QueryParams {
        let mut params = self.params.clone();
        params.set(PAGE_PARAM, page.to_string());
        params
    }

    /// Returns the query that selects `size`, keeping other parameters.
    #[must_use]
    pub fn size_query(&self, size: u32) -> QueryParams {
        let mut params = self.params.clone();
        params.set(SIZE_PARAM, size.to_string());
        params
    }
}
