//! Начальная конфигурация таблицы

use contracts::shared::list::{FilterMap, FilterValue, SortState};
use std::rc::Rc;
use thiserror::Error;

use crate::column::ColumnDef;
use crate::fetch::{Fetcher, LeptosSpawner, Spawner};
use crate::filter::{CustomFilters, FilterPredicate};
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::selection::{positional_key, RowKey, RowKeyFn, SelectionPolicy};

/// Ошибка конфигурации: ошибка программиста, обнаруживается при создании движка
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("duplicate column id `{0}`")]
    DuplicateColumn(String),
    #[error("items per page must be greater than zero")]
    ZeroPageSize,
}

/// Режим работы, фиксируется при создании
pub enum DataMode<T> {
    /// Фильтрация, сортировка и страницы считаются на клиенте
    Embedded { rows: Vec<T> },
    /// Движок хранит намерение, данные грузит `fetcher`
    Remote {
        fetcher: Rc<dyn Fetcher<T>>,
        spawner: Rc<dyn Spawner>,
        /// Ожидаемое общее количество до первого ответа
        total_hint: usize,
    },
}

impl<T> DataMode<T> {
    pub fn is_remote(&self) -> bool {
        matches!(self, DataMode::Remote { .. })
    }
}

pub struct TableConfig<T> {
    pub(crate) mode: DataMode<T>,
    pub(crate) columns: Vec<ColumnDef<T>>,
    pub(crate) custom_filters: CustomFilters<T>,
    pub(crate) row_key: RowKeyFn<T>,
    pub(crate) filters: FilterMap,
    pub(crate) sort: SortState,
    pub(crate) page: usize,
    pub(crate) items_per_page: usize,
    pub(crate) selection_policy: SelectionPolicy,
}

impl<T: 'static> TableConfig<T> {
    fn with_mode(mode: DataMode<T>) -> Self {
        Self {
            mode,
            columns: Vec::new(),
            custom_filters: CustomFilters::new(),
            row_key: positional_key(),
            filters: FilterMap::new(),
            sort: SortState::none(),
            page: 1,
            items_per_page: DEFAULT_PAGE_SIZE,
            selection_policy: SelectionPolicy::default(),
        }
    }

    /// Встроенный режим над набором строк в памяти
    pub fn embedded(rows: Vec<T>) -> Self {
        Self::with_mode(DataMode::Embedded { rows })
    }

    /// Удалённый режим; задачи запускаются на исполнителе Leptos
    pub fn remote(fetcher: impl Fetcher<T> + 'static) -> Self {
        Self::with_mode(DataMode::Remote {
            fetcher: Rc::new(fetcher),
            spawner: Rc::new(LeptosSpawner),
            total_hint: 0,
        })
    }

    /// Свой исполнитель задач (тесты, другой runtime). Во встроенном режиме игнорируется.
    pub fn spawner(mut self, spawner: impl Spawner + 'static) -> Self {
        if let DataMode::Remote { spawner: slot, .. } = &mut self.mode {
            *slot = Rc::new(spawner);
        }
        self
    }

    /// Подсказка общего количества до первой загрузки (удалённый режим)
    pub fn total_hint(mut self, total: usize) -> Self {
        if let DataMode::Remote { total_hint, .. } = &mut self.mode {
            *total_hint = total;
        }
        self
    }

    pub fn column(mut self, column: ColumnDef<T>) -> Self {
        self.columns.push(column);
        self
    }

    pub fn columns(mut self, columns: impl IntoIterator<Item = ColumnDef<T>>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Предикат для фильтра `id`, заменяет проверку по колонке
    pub fn custom_filter<F>(mut self, id: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T, &FilterValue) -> bool + 'static,
    {
        let predicate: FilterPredicate<T> = Rc::new(predicate);
        self.custom_filters.insert(id.into(), predicate);
        self
    }

    pub fn row_key<F>(mut self, key: F) -> Self
    where
        F: Fn(&T, usize) -> RowKey + 'static,
    {
        self.row_key = Rc::new(key);
        self
    }

    pub fn filter(mut self, id: impl Into<String>, value: FilterValue) -> Self {
        self.filters.insert(id.into(), value);
        self
    }

    pub fn sort(mut self, sort: SortState) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn items_per_page(mut self, items_per_page: usize) -> Self {
        self.items_per_page = items_per_page;
        self
    }

    pub fn selection_policy(mut self, policy: SelectionPolicy) -> Self {
        self.selection_policy = policy;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.items_per_page == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if let Some(id) = crate::column::duplicate_column_id(&self.columns) {
            return Err(ConfigError::DuplicateColumn(id.to_string()));
        }
        Ok(())
    }
}
