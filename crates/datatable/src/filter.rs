//! Хранилище фильтров и проверка строки против активных фильтров

use contracts::shared::list::{active_filters, FilterMap, FilterValue};
use std::collections::HashMap;
use std::rc::Rc;

use crate::column::{find_column, ColumnDef};

/// Пользовательский предикат фильтра: строка + текущее значение фильтра
pub type FilterPredicate<T> = Rc<dyn Fn(&T, &FilterValue) -> bool>;

/// Предикаты по id фильтра. Зарегистрированный предикат заменяет
/// стандартную проверку по колонке для фильтра любого вида.
pub type CustomFilters<T> = HashMap<String, FilterPredicate<T>>;

/// Именованные значения фильтров
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterStore {
    values: FilterMap,
}

impl FilterStore {
    pub fn new(initial: FilterMap) -> Self {
        Self { values: initial }
    }

    /// Частичное обновление: остальные фильтры не трогаются
    pub fn set(&mut self, id: impl Into<String>, value: FilterValue) {
        self.values.insert(id.into(), value);
    }

    pub fn remove(&mut self, id: &str) -> Option<FilterValue> {
        self.values.remove(id)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn get(&self, id: &str) -> Option<&FilterValue> {
        self.values.get(id)
    }

    pub fn values(&self) -> &FilterMap {
        &self.values
    }

    pub fn has_active(&self) -> bool {
        active_filters(&self.values).next().is_some()
    }
}

/// Строка проходит, только если удовлетворяет всем активным фильтрам (AND).
/// Фильтр без колонки и без предиката ни на что не влияет.
pub fn row_matches<T>(
    row: &T,
    columns: &[ColumnDef<T>],
    custom: &CustomFilters<T>,
    filters: &FilterMap,
) -> bool {
    active_filters(filters).all(|(id, value)| {
        if let Some(predicate) = custom.get(id) {
            return predicate(row, value);
        }
        match find_column(columns, id) {
            Some(column) => value.matches(&column.value(row)),
            None => true,
        }
    })
}
