use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use formline_core::AppResult;
use formline_domain::ParamRegistry;
use tracing::{debug, warn};

use crate::delayed_task::DelayedTask;
use crate::search_ports::QueryNavigator;


/// Quiet period before a search value is written to the query string.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Debounced synchronization of search inputs into the URL query.
///
/// Only the last value set within the debounce window is written; earlier
/// ones are dropped. Clones share the pending update.
#[derive(Clone)]
pub struct SearchSync {
    registry: Arc<ParamRegistry>,
    navigator: Arc<dyn QueryNavigator>,
    delay: Duration,
    pending: Arc<Mutex<Option<DelayedTask>>>,
}

impl SearchSync {
    /// Creates a search sync with the default debounce window.
    #[must_use]
    pub fn new(registry: Arc<ParamRegistry>, navigator: Arc<dyn QueryNavigator>) -> Self {
        Self {
            registry,
            navigator,
            delay: DEFAULT_SEARCH_DEBOUNCE,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Overrides the debounce window.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the parameter registry.
    #[must_use]
    pub fn registry(&self) -> &ParamRegistry {
        &self.registry
    }

    /// Schedules `value` to be written under the parameter of `logical_key`.
    ///
    /// Any update still waiting in the window is superseded. An empty value
    /// deletes the parameter. The write replaces the current navigation entry.
    pub fn set_search(&self, logical_key: &str, value: impl Into<String>) -> AppResult<()> {
        let param_name = self.registry.resolve(logical_key)?.to_owned();
        let value = value.into();
        let navigator = Arc::clone(&self.navigator);

        let task = DelayedTask::spawn(self.delay, async move {
            if let Err(error) = write_search_value(navigator.as_ref(), &param_name, &value).await
            {
                warn!(param = %param_name, error = %error, "failed to sync search value");
            }
        });

        let superseded = self.lock_pending().replace(task);
        if superseded.is_some_and(|previous| !previous.is_finished()) {
            debug!(search_key = %logical_key, "superseded pending search update");
        }
        Ok(())
    }

    /// Drops a pending update. Returns whether one was still waiting.
    pub fn cancel(&self) -> bool {
        self.lock_pending()
            .take()
            .is_some_and(|task| !task.is_finished())
    }

    /// Returns whether an update is waiting for its window to elapse.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.lock_pending()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Returns the current value of a search parameter.
    pub async fn search_value(&self, logical_key: &str) -> AppResult<Option<String>> {
        let param_name = self.registry.resolve(logical_key)?;
        let params = self.navigator.current_query().await?;
        Ok(params.get(param_name).map(str::to_owned))
    }

    /// Immediately adds or removes a flag-style parameter.
    ///
    /// When opening, the parameter is set to `value` or, without one, to its
    /// own name. Parameters of `clear_keys` are removed in both cases.
    pub async fn set_presence(
        &self,
        logical_key: &str,
        open: bool,
        value: Option<&str>,
        clear_keys: &[&str],
    ) -> AppResult<()> {
        let param_name = self.registry.resolve(logical_key)?;
        let cleared = clear_keys
            .iter()
            .map(|key| self.registry.resolve(key))
            .collect::<AppResult<Vec<_>>>()?;

        let mut params = self.navigator.current_query().await?;
        if open {
            let value = value.filter(|value| !value.is_empty()).unwrap_or(param_name);
            params.set(param_name, value);
        } else {
            params.delete(param_name);
        }
        for name in cleared {
            params.delete(name);
        }

        debug!(param = %param_name, open, "search parameter presence changed");
        self.navigator.replace_query(params).await
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<DelayedTask>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn write_search_value(
    navigator: &dyn QueryNavigator,
    param_name: &str,
    value: &str,
) -> AppResult<()> {
    let mut params = navigator.current_query().await?;
    params.set_or_delete(param_name, value);
    debug!(param = %param_name, cleared = value.is_empty(), "search value synced");
    navigator.replace_query(params).await
}
