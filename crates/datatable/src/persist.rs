use contracts::shared::list::{FilterMap, SortState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::pagination::DEFAULT_PAGE_SIZE;

/// Состояние списка, которое переживает переключение вкладок и перезагрузку
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedTableState {
    #[serde(default)]
    pub filters: FilterMap,
    #[serde(default)]
    pub sort: SortState,
    #[serde(default = "default_page")]
    pub current_page: usize,
    #[serde(default = "default_page_size")]
    pub items_per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for PersistedTableState {
    fn default() -> Self {
        Self {
            filters: FilterMap::new(),
            sort: SortState::none(),
            current_page: default_page(),
            items_per_page: default_page_size(),
        }
    }
}

/// TableStateStore keeps list states in memory, keyed by form key,
/// so they persist when switching between tabs
#[derive(Clone, Debug, Default)]
pub struct TableStateStore {
    states: HashMap<String, Value>,
}

impl TableStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, form_key: &str) -> Option<PersistedTableState> {
        let value = self.states.get(form_key)?;
        match serde_json::from_value(value.clone()) {
            Ok(state) => Some(state),
            Err(e) => {
                log::warn!("table state `{}` is unreadable: {}", form_key, e);
                None
            }
        }
    }

    pub fn set(&mut self, form_key: impl Into<String>, state: &PersistedTableState) {
        match serde_json::to_value(state) {
            Ok(value) => {
                self.states.insert(form_key.into(), value);
            }
            Err(e) => log::warn!("failed to serialize table state: {}", e),
        }
    }

    pub fn remove(&mut self, form_key: &str) {
        self.states.remove(form_key);
    }

    pub fn clear_all(&mut self) {
        self.states.clear();
    }
}

#[cfg(target_arch = "wasm32")]
fn storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

/// Read a saved state from browser local storage (always `None` off the browser)
pub fn load_from_local_storage(storage_key: &str) -> Option<PersistedTableState> {
    #[cfg(target_arch = "wasm32")]
    {
        let raw = storage()?.get_item(storage_key).ok().flatten()?;
        serde_json::from_str::<PersistedTableState>(&raw).ok()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = storage_key;
        None
    }
}

/// Save a state to browser local storage; failures are ignored
pub fn save_to_local_storage(storage_key: &str, state: &PersistedTableState) {
    #[cfg(target_arch = "wasm32")]
    {
        let Some(storage) = storage() else { return };
        let Ok(raw) = serde_json::to_string(state) else { return };
        let _ = storage.set_item(storage_key, &raw);
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (storage_key, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::shared::list::FilterValue;

    fn sample() -> PersistedTableState {
        let mut filters = FilterMap::new();
        filters.insert("status".to_string(), FilterValue::select("pending"));
        PersistedTableState {
            filters,
            sort: SortState::desc("created_at"),
            current_page: 4,
            items_per_page: 50,
        }
    }

    #[test]
    fn test_store_roundtrip_per_form() {
        let mut store = TableStateStore::new();
        store.set("admin_users_list", &sample());
        assert_eq!(store.get("admin_users_list"), Some(sample()));
        assert_eq!(store.get("admin_posts_list"), None);

        store.remove("admin_users_list");
        assert_eq!(store.get("admin_users_list"), None);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let state: PersistedTableState = serde_json::from_str(r#"{"sort":{"key":"title","direction":"asc"}}"#).unwrap();
        assert_eq!(state.current_page, 1);
        assert_eq!(state.items_per_page, DEFAULT_PAGE_SIZE);
        assert_eq!(state.sort, SortState::asc("title"));
        assert!(state.filters.is_empty());
    }

    #[test]
    fn test_local_storage_is_noop_natively() {
        save_to_local_storage("k", &sample());
        assert_eq!(load_from_local_storage("k"), None);
    }
}
