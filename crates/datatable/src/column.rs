//! Описание колонок таблицы

use contracts::shared::list::CellValue;
use std::fmt;
use std::rc::Rc;

/// Чистая функция чтения значения ячейки из строки
pub type Accessor<T> = Rc<dyn Fn(&T) -> CellValue>;

/// Колонка таблицы: идентификатор, accessor и признак сортируемости
pub struct ColumnDef<T> {
    pub id: String,
    pub accessor: Accessor<T>,
    pub sortable: bool,
    /// Подсказка для слоя отрисовки, движком не читается
    pub render_hint: Option<serde_json::Value>,
}

impl<T> ColumnDef<T> {
    pub fn new<F>(id: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T) -> CellValue + 'static,
    {
        Self {
            id: id.into(),
            accessor: Rc::new(accessor),
            sortable: true,
            render_hint: None,
        }
    }

    pub fn not_sortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn with_render_hint(mut self, hint: serde_json::Value) -> Self {
        self.render_hint = Some(hint);
        self
    }

    pub fn value(&self, row: &T) -> CellValue {
        (self.accessor)(row)
    }
}

impl<T> Clone for ColumnDef<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            accessor: Rc::clone(&self.accessor),
            sortable: self.sortable,
            render_hint: self.render_hint.clone(),
        }
    }
}

impl<T> fmt::Debug for ColumnDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("id", &self.id)
            .field("sortable", &self.sortable)
            .field("render_hint", &self.render_hint)
            .finish_non_exhaustive()
    }
}

/// Поиск колонки по id
pub fn find_column<'a, T>(columns: &'a [ColumnDef<T>], id: &str) -> Option<&'a ColumnDef<T>> {
    columns.iter().find(|c| c.id == id)
}

/// Первый повторяющийся id, если есть
pub fn duplicate_column_id<T>(columns: &[ColumnDef<T>]) -> Option<&str> {
    let mut seen = std::collections::HashSet::new();
    columns
        .iter()
        .map(|c| c.id.as_str())
        .find(|id| !seen.insert(*id))
}
