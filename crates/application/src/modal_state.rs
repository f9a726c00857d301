use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use formline_domain::FormAction;
use tracing::debug;

use crate::form_ports::AutoClose;

/// Builds the container key for an entity form, e.g. `products-create`.
#[must_use]
pub fn modal_key(entity: &str, action: FormAction) -> String {
    format!("{entity}-{}", action.as_str())
}

/// Open/closed flags for the dismissible containers of one subtree.
///
/// Each subtree root owns one instance and passes clones down explicitly.
/// Clones share the same flags.
#[derive(Debug, Clone, Default)]
pub struct ModalState {
    open: Arc<Mutex<HashMap<String, bool>>>,
}

impl ModalState {
    /// Creates a provider with every container closed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the container is open. Unknown keys are closed.
    #[must_use]
    pub fn is_open(&self, key: &str) -> bool {
        self.lock().get(key).copied().unwrap_or(false)
    }

    /// Opens or closes a container.
    pub fn set_open(&self, key: &str, open: bool) {
        debug!(modal = %key, open, "modal visibility changed");
        self.lock().insert(key.to_owned(), open);
    }

    /// Returns a collaborator that closes `key` when invoked.
    #[must_use]
    pub fn auto_close(&self, key: impl Into<String>) -> AutoClose {
        let state = self.clone();
        let key = key.into();
        Arc::new(move || state.set_open(key.as_str(), false))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, bool>> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use formline_domain::FormAction;

    use super::{ModalState, modal_key};

    #[test]
    fn unknown_keys_are_closed() {
        assert!(!ModalState::new().is_open("products-create"));
    }

    #[test]
    fn clones_share_flags() {
        let modals = ModalState::new();
        let child = modals.clone();
        child.set_open("products-create", true);
        assert!(modals.is_open("products-create"));
    }

    #[test]
    fn auto_close_closes_only_its_key() {
        let modals = ModalState::new();
        let key = modal_key("products", FormAction::Update);
        assert_eq!(key, "products-update");

        modals.set_open(&key, true);
        modals.set_open("orders-create", true);
        let close = modals.auto_close(key.clone());
        close();

        assert!(!modals.is_open(&key));
        assert!(modals.is_open("orders-create"));
    }
}
