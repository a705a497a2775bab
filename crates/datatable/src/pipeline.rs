//! Производные данные встроенного режима: фильтр → сортировка → страница.
//!
//! Все функции чистые: одинаковый вход даёт одинаковый выход.

use contracts::shared::list::{FilterMap, SortState};
use std::ops::Range;

use crate::column::ColumnDef;
use crate::filter::{row_matches, CustomFilters};
use crate::sort::sort_rows;

/// Вход конвейера
pub struct DerivationInput<'a, T> {
    pub rows: &'a [T],
    pub columns: &'a [ColumnDef<T>],
    pub custom: &'a CustomFilters<T>,
    pub filters: &'a FilterMap,
    pub sort: &'a SortState,
    pub page: usize,
    pub items_per_page: usize,
}

/// Результат конвейера
#[derive(Debug)]
pub struct Derived<'a, T> {
    /// Отфильтрованные строки в исходном порядке (до сортировки и страницы)
    pub filtered: Vec<&'a T>,
    /// Отфильтрованные и отсортированные строки
    pub ordered: Vec<&'a T>,
    /// Диапазон текущей страницы в `ordered`
    pub page_range: Range<usize>,
}

impl<'a, T> Derived<'a, T> {
    pub fn total_items(&self) -> usize {
        self.filtered.len()
    }

    pub fn visible(&self) -> &[&'a T] {
        &self.ordered[self.page_range.clone()]
    }
}

/// Шаг 1: фильтрация (AND по активным фильтрам)
pub fn filter_stage<'a, T>(
    rows: &'a [T],
    columns: &[ColumnDef<T>],
    custom: &CustomFilters<T>,
    filters: &FilterMap,
) -> Vec<&'a T> {
    rows.iter()
        .filter(|row| row_matches(*row, columns, custom, filters))
        .collect()
}

/// Шаг 2: стабильная сортировка
pub fn sort_stage<'a, T>(rows: &[&'a T], columns: &[ColumnDef<T>], sort: &SortState) -> Vec<&'a T> {
    let mut ordered = rows.to_vec();
    sort_rows(&mut ordered, columns, sort);
    ordered
}

/// Шаг 3: диапазон страницы `[(page-1)*n, page*n)`, обрезанный по длине
pub fn page_stage(len: usize, page: usize, items_per_page: usize) -> Range<usize> {
    let start = page.saturating_sub(1).saturating_mul(items_per_page);
    let end = start.saturating_add(items_per_page);
    start.min(len)..end.min(len)
}

pub fn derive<'a, T>(input: &DerivationInput<'a, T>) -> Derived<'a, T> {
    let filtered = filter_stage(input.rows, input.columns, input.custom, input.filters);
    let ordered = sort_stage(&filtered, input.columns, input.sort);
    let page_range = page_stage(ordered.len(), input.page, input.items_per_page);
    Derived {
        filtered,
        ordered,
        page_range,
    }
}
