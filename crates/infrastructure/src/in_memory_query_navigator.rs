use async_trait::async_trait;
use formline_application::QueryNavigator;
use formline_core::{AppError, AppResult};
use formline_domain::QueryParams;
use tokio::sync::RwLock;
use url::Url;

#[derive(Debug)]
struct NavigationHistory {
    entries: Vec<Url>,
    replace_count: usize,
}

impl NavigationHistory {
    fn current(&self) -> AppResult<&Url> {
        self.entries
            .last()
            .ok_or_else(|| AppError::Internal("navigation history is empty".to_owned()))
    }
}

/// In-memory navigation history over a single URL.
///
/// Stands in for a browser location: replacing rewrites the last entry,
/// pushing appends a new one.
#[derive(Debug)]
pub struct InMemoryQueryNavigator {
    history: RwLock<NavigationHistory>,
}

impl InMemoryQueryNavigator {
    /// Creates a navigator positioned at `start_url`.
    pub fn new(start_url: &str) -> AppResult<Self> {
        let url = Url::parse(start_url).map_err(|error| {
            AppError::Configuration(format!("invalid start url '{start_url}': {error}"))
        })?;

        Ok(Self {
            history: RwLock::new(NavigationHistory {
                entries: vec![url],
                replace_count: 0,
            }),
        })
    }

    /// Returns the current URL.
    pub async fn current_url(&self) -> AppResult<String> {
        let history = self.history.read().await;
        Ok(history.current()?.to_string())
    }

    /// Returns how many entries the history holds.
    pub async fn history_len(&self) -> usize {
        self.history.read().await.entries.len()
    }

    /// Returns how many times the current entry was replaced.
    pub async fn replace_count(&self) -> usize {
        self.history.read().await.replace_count
    }
}

fn with_query(url: &Url, params: &QueryParams) -> Url {
    let mut next = url.clone();
    if params.is_empty() {
        next.set_query(None);
    } else {
        next.set_query(Some(&params.to_query_string()));
    }
    next
}

#[async_trait]
impl QueryNavigator for InMemoryQueryNavigator {
    async fn current_query(&self) -> AppResult<QueryParams> {
        let history = self.history.read().await;
        let query = history.current()?.query().unwrap_or_default();
        Ok(QueryParams::parse(query))
    }

    async fn replace_query(&self, params: QueryParams) -> AppResult<()> {
        let mut history = self.history.write().await;
        let next = with_query(history.current()?, &params);
        if let Some(last) = history.entries.last_mut() {
            *last = next;
        }
        history.replace_count += 1;
        Ok(())
    }

    async fn push_query(&self, params: QueryParams) -> AppResult<()> {
        let mut history = self.history.write().await;
        let next = with_query(history.current()?, &params);
        history.entries.push(next);
        Ok(())
    }
}
