use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter};

use formline_core::{AppError, AppResult, NonEmptyString};
use url::form_urlencoded;

/// Ordered query-string pairs with URL search-parameter semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a query string, with or without the leading `?`.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            pairs: form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    /// Returns the first value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(stored_key, _)| stored_key == key)
            .map(|(_, value)| value.as_str())
    }

    /// Sets `key` to `value`, replacing the first occurrence in place and
    /// dropping any later duplicates. Appends when the key is absent.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .pairs
            .iter()
            .position(|(stored_key, _)| stored_key == key)
        {
            Some(index) => {
                self.pairs[index].1 = value;
                let mut position = 0;
                self.pairs.retain(|(stored_key, _)| {
                    let keep = position <= index || stored_key != key;
                    position += 1;
                    keep
                });
            }
            None => self.pairs.push((key.to_owned(), value)),
        }
    }

    /// Appends a pair without touching existing values.
    pub fn append(&mut self, key: &str, value: impl Into<String>) {
        self.pairs.push((key.to_owned(), value.into()));
    }

    /// Removes every pair stored under `key`.
    pub fn delete(&mut self, key: &str) {
        self.pairs.retain(|(stored_key, _)| stored_key != key);
    }

    /// Sets `key` when `value` is non-empty and deletes it otherwise.
    pub fn set_or_delete(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            self.delete(key);
        } else {
            self.set(key, value);
        }
    }

    /// Returns whether any pair is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns whether no pairs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Serializes pairs as an `application/x-www-form-urlencoded` string.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }

    /// Builds `path?query`, or just `path` when no pairs are stored.
    #[must_use]
    pub fn href(&self, path: &str) -> String {
        if self.pairs.is_empty() {
            path.to_owned()
        } else {
            format!("{path}?{}", self.to_query_string())
        }
    }
}

impl Display for QueryParams {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.to_query_string())
    }
}

/// Logical search keys mapped to canonical query-parameter names.
///
/// Loaded once at startup and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamRegistry {
    entries: BTreeMap<String, NonEmptyString>,
}

impl ParamRegistry {
    /// Creates a validated registry.
    ///
    /// Logical keys and canonical names must be non-empty and unique.
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> AppResult<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut registry = BTreeMap::new();
        let mut seen_names = HashSet::new();
        for (logical_key, param_name) in entries {
            let logical_key = NonEmptyString::new(logical_key).map_err(|_| {
                AppError::Configuration("search parameter keys must not be empty".to_owned())
            })?;
            let param_name = NonEmptyString::new(param_name).map_err(|_| {
                AppError::Configuration(format!(
                    "search key '{}' maps to an empty parameter name",
                    logical_key.as_str()
                ))
            })?;

            if !seen_names.insert(param_name.clone()) {
                return Err(AppError::Configuration(format!(
                    "parameter name '{}' is mapped more than once",
                    param_name.as_str()
                )));
            }

            let logical_key = String::from(logical_key);
            if registry.contains_key(&logical_key) {
                return Err(AppError::Configuration(format!(
                    "search key '{logical_key}' is declared more than once"
                )));
            }
            registry.insert(logical_key, param_name);
        }

        Ok(Self { entries: registry })
    }

    /// Resolves a logical key to its query-parameter name.
    pub fn resolve(&self, logical_key: &str) -> AppResult<&str> {
        self.entries
            .get(logical_key)
            .map(NonEmptyString::as_str)
            .ok_or_else(|| {
                AppError::Configuration(format!("unknown search key '{logical_key}'"))
            })
    }

    /// Verifies that every key a caller intends to use is registered.
    ///
    /// Run once at startup so lookups never fail while handling input.
    pub fn validate_keys<'a>(
        &self,
        logical_keys: impl IntoIterator<Item = &'a str>,
    ) -> AppResult<()> {
        let missing: Vec<&str> = logical_keys
            .into_iter()
            .filter(|key| !self.entries.contains_key(*key))
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        Err(AppError::Configuration(format!(
            "unknown search keys: {}",
            missing.join(", ")
        )))
    }

    /// Iterates `(logical key, parameter name)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, name)| (key.as_str(), name.as_str()))
    }

    /// Returns the number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no key is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
