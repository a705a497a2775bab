//! Движок таблицы: хранит фильтры, сортировку, страницы и выбор,
//! решает, пересчитать данные локально или запросить их у сервера.
//!
//! Однопоточный: дескриптор построен на `Rc` и не является `Send`.
//! Единственная точка ожидания: загрузка страницы в удалённом режиме.

use contracts::shared::list::{FilterMap, FilterValue, ListQuery, SortState};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use crate::column::ColumnDef;
use crate::config::{ConfigError, DataMode, TableConfig};
use crate::fetch::{FetchResult, Fetcher, Spawner};
use crate::filter::{CustomFilters, FilterStore};
use crate::pagination::PaginationState;
use crate::persist::PersistedTableState;
use crate::pipeline::{derive, filter_stage, page_stage, DerivationInput};
use crate::selection::{RowKey, RowKeyFn, SelectionPolicy, SelectionSet};
use crate::sort::{toggle_sort, SortToggle};

/// Снимок состояния для слоя отрисовки
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot<T> {
    pub visible_rows: Vec<T>,
    /// Ключи видимых строк, в том же порядке
    pub visible_keys: Vec<RowKey>,
    pub filters: FilterMap,
    pub sort: SortState,
    pub pagination: PaginationState,
    pub selection: HashSet<RowKey>,
    pub is_loading: bool,
}

impl<T> TableSnapshot<T> {
    pub fn is_selected(&self, key: &RowKey) -> bool {
        self.selection.contains(key)
    }

    pub fn all_visible_selected(&self) -> bool {
        !self.visible_keys.is_empty() && self.visible_keys.iter().all(|k| self.selection.contains(k))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

type Observer<T> = Rc<dyn Fn(&TableSnapshot<T>)>;
type SelectionListener = Rc<dyn Fn(&HashSet<RowKey>)>;

enum Source<T> {
    Embedded,
    Remote {
        fetcher: Rc<dyn Fetcher<T>>,
        spawner: Rc<dyn Spawner>,
    },
}

struct EngineState<T> {
    /// Встроенный режим: весь набор; удалённый: строки текущей страницы
    rows: Vec<T>,
    filters: FilterStore,
    sort: SortState,
    pagination: PaginationState,
    selection: SelectionSet,
    is_loading: bool,
    /// Номер последнего запроса; ответы на более ранние отбрасываются
    generation: u64,
    /// Удалённый режим: страница из конфигурации до первого запроса
    initial_page: Option<usize>,
    visible: Vec<T>,
    visible_keys: Vec<RowKey>,
}

struct Inner<T> {
    source: Source<T>,
    columns: Vec<ColumnDef<T>>,
    custom_filters: CustomFilters<T>,
    row_key: RowKeyFn<T>,
    selection_policy: SelectionPolicy,
    state: RefCell<EngineState<T>>,
    observers: RefCell<Vec<(SubscriptionId, Observer<T>)>>,
    selection_listeners: RefCell<Vec<SelectionListener>>,
    next_subscription: Cell<usize>,
}

/// Дескриптор движка; клоны разделяют одно состояние
pub struct TableEngine<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for TableEngine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Что сделать после применения ответа сервера
enum ResponseOutcome {
    Ignore,
    Publish { selection_changed: bool },
    /// Запрошенной страницы больше нет
    Renavigate,
}

impl<T: Clone + 'static> TableEngine<T> {
    pub fn new(config: TableConfig<T>) -> Result<Self, ConfigError> {
        config.validate()?;

        let TableConfig {
            mode,
            columns,
            custom_filters,
            row_key,
            filters,
            sort,
            page,
            items_per_page,
            selection_policy,
        } = config;

        let mut pagination = PaginationState::new(1, items_per_page);
        let (source, rows) = match mode {
            DataMode::Embedded { rows } => (Source::Embedded, rows),
            DataMode::Remote {
                fetcher,
                spawner,
                total_hint,
            } => {
                pagination.set_total_items(total_hint);
                (Source::Remote { fetcher, spawner }, Vec::new())
            }
        };

        let engine = Self {
            inner: Rc::new(Inner {
                source,
                columns,
                custom_filters,
                row_key,
                selection_policy,
                state: RefCell::new(EngineState {
                    rows,
                    filters: FilterStore::new(filters),
                    sort,
                    pagination,
                    selection: SelectionSet::default(),
                    is_loading: false,
                    generation: 0,
                    initial_page: None,
                    visible: Vec::new(),
                    visible_keys: Vec::new(),
                }),
                observers: RefCell::new(Vec::new()),
                selection_listeners: RefCell::new(Vec::new()),
                next_subscription: Cell::new(0),
            }),
        };

        {
            let mut st = engine.inner.state.borrow_mut();
            if engine.is_remote() {
                // уходит в первый запрос как есть, лишнюю страницу исправит ответ
                st.pagination.go_to(page);
                st.initial_page = Some(page.max(1));
            } else {
                engine.recompute(&mut st);
                st.pagination.go_to(page);
                engine.recompute(&mut st);
            }
        }
        Ok(engine)
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.inner.source, Source::Remote { .. })
    }

    pub fn columns(&self) -> &[ColumnDef<T>] {
        &self.inner.columns
    }

    // ---- подписки ----

    pub fn snapshot(&self) -> TableSnapshot<T> {
        let st = self.inner.state.borrow();
        TableSnapshot {
            visible_rows: st.visible.clone(),
            visible_keys: st.visible_keys.clone(),
            filters: st.filters.values().clone(),
            sort: st.sort.clone(),
            pagination: st.pagination,
            selection: st.selection.keys().clone(),
            is_loading: st.is_loading,
        }
    }

    /// Наблюдатель получает снимок после каждой мутации
    pub fn subscribe(&self, observer: impl Fn(&TableSnapshot<T>) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_subscription.get());
        self.inner.next_subscription.set(id.0 + 1);
        self.inner
            .observers
            .borrow_mut()
            .push((id, Rc::new(observer)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.observers.borrow_mut().retain(|(sid, _)| *sid != id);
    }

    #[cfg(test)]
    pub(crate) fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// Односторонняя передача выбора владельцу (например, родительскому экрану)
    pub fn on_selection_change(&self, listener: impl Fn(&HashSet<RowKey>) + 'static) {
        self.inner
            .selection_listeners
            .borrow_mut()
            .push(Rc::new(listener));
    }

    // ---- фильтры ----

    pub fn set_filter(&self, id: impl Into<String>, value: FilterValue) {
        let id = id.into();
        log::debug!("table: set filter `{}` = {:?}", id, value);
        self.mutate_filters(|filters| filters.set(id, value));
    }

    pub fn remove_filter(&self, id: &str) {
        self.mutate_filters(|filters| {
            filters.remove(id);
        });
    }

    pub fn clear_filters(&self) {
        log::debug!("table: clear filters");
        self.mutate_filters(FilterStore::clear);
    }

    fn mutate_filters(&self, update: impl FnOnce(&mut FilterStore)) {
        {
            let mut st = self.inner.state.borrow_mut();
            update(&mut st.filters);
            st.pagination.reset_page();
            if !self.is_remote() {
                self.recompute(&mut st);
            }
        }
        self.dispatch(1);
    }

    // ---- сортировка ----

    pub fn toggle_sort(&self, column_id: &str) {
        let next = {
            let st = self.inner.state.borrow();
            toggle_sort(&st.sort, &self.inner.columns, column_id)
        };
        match next {
            SortToggle::Changed(sort) => self.set_sort(sort),
            SortToggle::Ignored => {
                log::debug!("table: column `{}` is not sortable", column_id);
            }
        }
    }

    pub fn set_sort(&self, sort: SortState) {
        let page = {
            let mut st = self.inner.state.borrow_mut();
            st.sort = sort;
            if !self.is_remote() {
                self.recompute(&mut st);
            }
            st.pagination.current_page
        };
        self.dispatch(page);
    }

    // ---- страницы ----

    /// Встроенный режим: номер прижимается к допустимому диапазону.
    /// Удалённый: запрошенная страница уходит на сервер как есть.
    pub fn go_to_page(&self, page: usize) {
        let page = page.max(1);
        if !self.is_remote() {
            let mut st = self.inner.state.borrow_mut();
            st.pagination.go_to(page);
            self.recompute(&mut st);
        }
        self.dispatch(page);
    }

    pub fn next_page(&self) {
        let (page, has_next) = {
            let st = self.inner.state.borrow();
            (st.pagination.current_page, st.pagination.has_next)
        };
        if has_next {
            self.go_to_page(page + 1);
        }
    }

    pub fn previous_page(&self) {
        let page = self.inner.state.borrow().pagination.current_page;
        if page > 1 {
            self.go_to_page(page - 1);
        }
    }

    pub fn set_items_per_page(&self, items_per_page: usize) {
        if items_per_page == 0 {
            log::warn!("table: ignoring zero page size");
            return;
        }
        {
            let mut st = self.inner.state.borrow_mut();
            st.pagination.set_items_per_page(items_per_page);
            if !self.is_remote() {
                self.recompute(&mut st);
            }
        }
        self.dispatch(1);
    }

    /// Удалённый режим: перезапросить текущую страницу. Встроенный: переопубликовать.
    pub fn refresh(&self) {
        let page = {
            let mut st = self.inner.state.borrow_mut();
            let current = st.pagination.current_page;
            st.initial_page.take().unwrap_or(current)
        };
        self.dispatch(page);
    }

    // ---- данные ----

    /// Новый набор строк встроенного режима (перезагрузка списка владельцем)
    pub fn set_rows(&self, rows: Vec<T>) {
        if self.is_remote() {
            log::warn!("table: set_rows ignored in remote mode, use refresh()");
            return;
        }
        let selection_changed = {
            let mut st = self.inner.state.borrow_mut();
            st.rows = rows;
            let present = self.recompute_collecting_keys(&mut st);
            st.selection.apply_policy(self.inner.selection_policy, &present)
        };
        self.publish(selection_changed);
    }

    /// Отфильтрованные строки в исходном порядке (удалённый режим: текущая страница)
    pub fn filtered_rows(&self) -> Vec<T> {
        let st = self.inner.state.borrow();
        if self.is_remote() {
            return st.rows.clone();
        }
        filter_stage(
            &st.rows,
            &self.inner.columns,
            &self.inner.custom_filters,
            st.filters.values(),
        )
        .into_iter()
        .cloned()
        .collect()
    }

    pub fn filtered_count(&self) -> usize {
        self.inner.state.borrow().pagination.total_items
    }

    // ---- выбор ----

    pub fn toggle_row(&self, key: impl Into<RowKey>) {
        self.inner.state.borrow_mut().selection.toggle(key.into());
        self.publish(true);
    }

    /// Переключить строку по индексу в видимом срезе
    pub fn toggle_row_at(&self, visible_index: usize) {
        let key = self
            .inner
            .state
            .borrow()
            .visible_keys
            .get(visible_index)
            .cloned();
        match key {
            Some(key) => self.toggle_row(key),
            None => log::debug!("table: no visible row at {}", visible_index),
        }
    }

    /// Выбрать или снять все строки текущей страницы
    pub fn toggle_all(&self) {
        {
            let mut st = self.inner.state.borrow_mut();
            let visible = st.visible_keys.clone();
            st.selection.toggle_all(&visible);
        }
        self.publish(true);
    }

    pub fn clear_selection(&self) {
        self.inner.state.borrow_mut().selection.clear();
        self.publish(true);
    }

    /// Загруженные строки, ключ которых выбран
    pub fn selected_rows(&self) -> Vec<T> {
        let st = self.inner.state.borrow();
        if self.is_remote() {
            return st
                .visible
                .iter()
                .zip(&st.visible_keys)
                .filter(|(_, key)| st.selection.contains(key))
                .map(|(row, _)| row.clone())
                .collect();
        }
        self.derived_keyed(&st)
            .into_iter()
            .filter(|(key, _)| st.selection.contains(key))
            .map(|(_, row)| row.clone())
            .collect()
    }

    // ---- сохранение состояния ----

    pub fn export_state(&self) -> PersistedTableState {
        let st = self.inner.state.borrow();
        PersistedTableState {
            filters: st.filters.values().clone(),
            sort: st.sort.clone(),
            current_page: st.pagination.current_page,
            items_per_page: st.pagination.items_per_page,
        }
    }

    /// Восстановить фильтры, сортировку и страницу (удалённый режим перезапрашивает данные)
    pub fn restore_state(&self, state: PersistedTableState) {
        let page = state.current_page.max(1);
        {
            let mut st = self.inner.state.borrow_mut();
            st.filters = FilterStore::new(state.filters);
            st.sort = state.sort;
            st.pagination.set_items_per_page(state.items_per_page.max(1));
            if !self.is_remote() {
                self.recompute(&mut st);
                st.pagination.go_to(page);
                self.recompute(&mut st);
            }
        }
        self.dispatch(page);
    }

    // ---- диспетчер режимов ----

    /// Встроенный режим: данные уже пересчитаны, публикуем.
    /// Удалённый: запрос страницы, публикация после ответа.
    fn dispatch(&self, page: usize) {
        match &self.inner.source {
            Source::Embedded => self.publish(false),
            Source::Remote { fetcher, spawner } => {
                self.start_fetch(Rc::clone(fetcher), Rc::clone(spawner), page)
            }
        }
    }

    fn start_fetch(&self, fetcher: Rc<dyn Fetcher<T>>, spawner: Rc<dyn Spawner>, page: usize) {
        let (query, generation) = {
            let mut st = self.inner.state.borrow_mut();
            st.initial_page = None;
            st.generation += 1;
            st.is_loading = true;
            let query = ListQuery {
                filters: st.filters.values().clone(),
                sort: st.sort.clone(),
                page,
                items_per_page: st.pagination.items_per_page,
            };
            (query, st.generation)
        };
        log::debug!("table: fetching page {} (request #{})", page, generation);
        self.publish(false);

        let future = fetcher.fetch(query);
        let weak: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        spawner.spawn(Box::pin(async move {
            let result = future.await;
            // движок мог быть удалён вместе с владельцем
            if let Some(inner) = weak.upgrade() {
                TableEngine { inner }.apply_response(generation, page, result);
            }
        }));
    }

    fn apply_response(&self, generation: u64, requested_page: usize, result: FetchResult<T>) {
        let outcome = {
            let mut st = self.inner.state.borrow_mut();
            if generation != st.generation {
                log::debug!(
                    "table: discarding stale response #{} (latest #{})",
                    generation,
                    st.generation
                );
                ResponseOutcome::Ignore
            } else {
                match result {
                    Err(err) => {
                        log::error!("table: failed to load page {}: {}", requested_page, err);
                        st.is_loading = false;
                        ResponseOutcome::Publish {
                            selection_changed: false,
                        }
                    }
                    Ok(response) => {
                        let last_page = response.total_pages.max(1);
                        if requested_page > last_page {
                            log::debug!(
                                "table: page {} no longer exists ({} pages), going to page 1",
                                requested_page,
                                response.total_pages
                            );
                            st.pagination.total_items = response.total;
                            st.pagination.total_pages = response.total_pages;
                            st.pagination.reset_page();
                            ResponseOutcome::Renavigate
                        } else {
                            st.pagination.apply_response(&response, requested_page);
                            st.rows = response.data;
                            st.is_loading = false;
                            self.recompute(&mut st);
                            let present: HashSet<RowKey> = st.visible_keys.iter().cloned().collect();
                            let selection_changed = st
                                .selection
                                .apply_policy(self.inner.selection_policy, &present);
                            ResponseOutcome::Publish { selection_changed }
                        }
                    }
                }
            }
        };

        match outcome {
            ResponseOutcome::Ignore => {}
            ResponseOutcome::Publish { selection_changed } => self.publish(selection_changed),
            ResponseOutcome::Renavigate => self.dispatch(1),
        }
    }

    // ---- производные данные ----

    /// Пересчитать видимый срез. Встроенный режим прогоняет конвейер
    /// и прижимает страницу к новому количеству строк.
    fn recompute(&self, st: &mut EngineState<T>) {
        self.run_recompute(st, false);
    }

    /// То же, что `recompute`, плюс ключи всех строк производного набора
    fn recompute_collecting_keys(&self, st: &mut EngineState<T>) -> HashSet<RowKey> {
        self.run_recompute(st, true)
    }

    fn run_recompute(&self, st: &mut EngineState<T>, collect_all: bool) -> HashSet<RowKey> {
        let key_fn = &self.inner.row_key;
        if self.is_remote() {
            let offset = st.pagination.offset();
            st.visible_keys = st
                .rows
                .iter()
                .enumerate()
                .map(|(i, row)| key_fn(row, offset + i))
                .collect();
            st.visible = st.rows.clone();
            return st.visible_keys.iter().cloned().collect();
        }

        let derived = derive(&self.pipeline_input(st));
        let mut pagination = st.pagination;
        pagination.set_total_items(derived.total_items());
        let range = page_stage(
            derived.ordered.len(),
            pagination.current_page,
            pagination.items_per_page,
        );
        let page = &derived.ordered[range.clone()];
        let visible: Vec<T> = page.iter().map(|r| (*r).clone()).collect();
        let keys: Vec<RowKey> = page
            .iter()
            .enumerate()
            .map(|(i, row)| key_fn(*row, range.start + i))
            .collect();
        let all_keys: HashSet<RowKey> = if collect_all {
            derived
                .ordered
                .iter()
                .enumerate()
                .map(|(i, row)| key_fn(*row, i))
                .collect()
        } else {
            HashSet::new()
        };

        st.pagination = pagination;
        st.visible = visible;
        st.visible_keys = keys;
        all_keys
    }

    fn pipeline_input<'a>(&'a self, st: &'a EngineState<T>) -> DerivationInput<'a, T> {
        DerivationInput {
            rows: &st.rows,
            columns: &self.inner.columns,
            custom: &self.inner.custom_filters,
            filters: st.filters.values(),
            sort: &st.sort,
            page: st.pagination.current_page,
            items_per_page: st.pagination.items_per_page,
        }
    }

    /// Строки встроенного набора в производном порядке вместе с ключами
    fn derived_keyed<'a>(&'a self, st: &'a EngineState<T>) -> Vec<(RowKey, &'a T)> {
        derive(&self.pipeline_input(st))
            .ordered
            .into_iter()
            .enumerate()
            .map(|(i, row)| ((self.inner.row_key)(row, i), row))
            .collect()
    }

    /// Разослать снимок. Заимствования сняты до вызова наблюдателей,
    /// так что наблюдатель может снова обратиться к движку.
    fn publish(&self, selection_changed: bool) {
        let snapshot = self.snapshot();
        let observers: Vec<Observer<T>> = self
            .inner
            .observers
            .borrow()
            .iter()
            .map(|(_, o)| Rc::clone(o))
            .collect();
        for observer in observers {
            observer(&snapshot);
        }

        if selection_changed {
            let listeners: Vec<SelectionListener> =
                self.inner.selection_listeners.borrow().clone();
            for listener in listeners {
                listener(&snapshot.selection);
            }
        }
    }
}
