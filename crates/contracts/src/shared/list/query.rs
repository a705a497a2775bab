use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::filter::{active_filters, FilterMap};

/// Направление сортировки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Активная сортировка: поле и направление задаются только вместе
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "SortWire", into = "SortWire")]
pub struct SortState {
    active: Option<(String, SortDirection)>,
}

/// JSON-форма `{ key, direction }`; половинчатое состояние читается как "без сортировки"
#[derive(Serialize, Deserialize)]
struct SortWire {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    direction: Option<SortDirection>,
}

impl From<SortWire> for SortState {
    fn from(wire: SortWire) -> Self {
        match (wire.key, wire.direction) {
            (Some(key), Some(direction)) => SortState::new(key, direction),
            _ => SortState::none(),
        }
    }
}

impl From<SortState> for SortWire {
    fn from(state: SortState) -> Self {
        let (key, direction) = match state.active {
            Some((key, direction)) => (Some(key), Some(direction)),
            None => (None, None),
        };
        SortWire { key, direction }
    }
}

impl SortState {
    pub fn none() -> Self {
        Self { active: None }
    }

    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            active: Some((key.into(), direction)),
        }
    }

    pub fn asc(key: impl Into<String>) -> Self {
        Self::new(key, SortDirection::Asc)
    }

    pub fn desc(key: impl Into<String>) -> Self {
        Self::new(key, SortDirection::Desc)
    }

    pub fn key(&self) -> Option<&str> {
        self.active.as_ref().map(|(key, _)| key.as_str())
    }

    pub fn direction(&self) -> Option<SortDirection> {
        self.active.as_ref().map(|(_, direction)| *direction)
    }

    pub fn is_sorted(&self) -> bool {
        self.active.is_some()
    }

    /// Три состояния: новое поле → asc, asc → desc, desc → без сортировки
    pub fn toggled(&self, column_id: &str) -> SortState {
        match &self.active {
            Some((key, SortDirection::Asc)) if key == column_id => {
                SortState::new(column_id, SortDirection::Desc)
            }
            Some((key, SortDirection::Desc)) if key == column_id => SortState::none(),
            _ => SortState::new(column_id, SortDirection::Asc),
        }
    }
}

/// Запрос страницы списка к серверу
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    pub filters: FilterMap,
    pub sort: SortState,
    /// Номер страницы, начиная с 1
    pub page: usize,
    pub items_per_page: usize,
}

impl ListQuery {
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.items_per_page)
    }

    /// Плоские параметры запроса: пагинация, сортировка и активные фильтры
    pub fn to_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("page".to_string(), self.page.to_string());
        params.insert("page_size".to_string(), self.items_per_page.to_string());
        params.insert("limit".to_string(), self.items_per_page.to_string());
        params.insert("offset".to_string(), self.offset().to_string());

        if let (Some(key), Some(direction)) = (self.sort.key(), self.sort.direction()) {
            params.insert("sort_by".to_string(), key.to_string());
            params.insert(
                "sort_desc".to_string(),
                (direction == SortDirection::Desc).to_string(),
            );
        }

        for (id, value) in active_filters(&self.filters) {
            params.insert(id.clone(), value.to_param());
        }
        params
    }
}
