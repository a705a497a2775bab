//! Привязка движка к Leptos: движок в контексте, снимок в сигнале.

use contracts::shared::list::{FilterValue, SortState};
use leptos::prelude::*;

use crate::engine::{TableEngine, TableSnapshot};
use crate::persist::{load_from_local_storage, save_to_local_storage, PersistedTableState};
use crate::selection::RowKey;

/// Контекст таблицы: дескриптор движка и реактивный снимок
pub struct TableContext<T: 'static> {
    pub engine: StoredValue<TableEngine<T>, LocalStorage>,
    pub snapshot: RwSignal<TableSnapshot<T>, LocalStorage>,
}

impl<T: 'static> Clone for TableContext<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> Copy for TableContext<T> {}

impl<T: Clone + 'static> TableContext<T> {
    pub fn engine(&self) -> TableEngine<T> {
        self.engine.get_value()
    }

    pub fn set_filter(&self, id: impl Into<String>, value: FilterValue) {
        self.engine().set_filter(id, value);
    }

    pub fn clear_filters(&self) {
        self.engine().clear_filters();
    }

    pub fn toggle_sort(&self, column_id: &str) {
        self.engine().toggle_sort(column_id);
    }

    pub fn set_sort(&self, sort: SortState) {
        self.engine().set_sort(sort);
    }

    pub fn go_to_page(&self, page: usize) {
        self.engine().go_to_page(page);
    }

    pub fn set_items_per_page(&self, items_per_page: usize) {
        self.engine().set_items_per_page(items_per_page);
    }

    pub fn toggle_row(&self, key: impl Into<RowKey>) {
        self.engine().toggle_row(key);
    }

    pub fn toggle_all(&self) {
        self.engine().toggle_all();
    }

    pub fn clear_selection(&self) {
        self.engine().clear_selection();
    }

    pub fn refresh(&self) {
        self.engine().refresh();
    }
}

/// Кладёт движок в контекст; сигнал снимка обновляется после каждой мутации
pub fn provide_table<T: Clone + 'static>(engine: TableEngine<T>) -> TableContext<T> {
    let snapshot = RwSignal::new_local(engine.snapshot());
    let subscription = engine.subscribe(move |s| {
        // владелец мог быть уничтожен раньше движка
        let _ = snapshot.try_set(s.clone());
    });

    let stored = StoredValue::new_local(engine);
    on_cleanup(move || {
        stored.try_with_value(|engine| engine.unsubscribe(subscription));
    });

    let context = TableContext {
        engine: stored,
        snapshot,
    };
    provide_context(context);
    context
}

/// То же, что `provide_table`, но состояние списка восстанавливается
/// из localStorage и сохраняется туда после каждой мутации
pub fn provide_persisted_table<T: Clone + 'static>(
    engine: TableEngine<T>,
    storage_key: &str,
) -> TableContext<T> {
    if let Some(saved) = load_from_local_storage(storage_key) {
        log::debug!("table: restoring `{}` from local storage", storage_key);
        engine.restore_state(saved);
    }

    let key = storage_key.to_string();
    let subscription = engine.subscribe(move |s| {
        let state = PersistedTableState {
            filters: s.filters.clone(),
            sort: s.sort.clone(),
            current_page: s.pagination.current_page,
            items_per_page: s.pagination.items_per_page,
        };
        save_to_local_storage(&key, &state);
    });

    let context = provide_table(engine);
    let stored = context.engine;
    on_cleanup(move || {
        stored.try_with_value(|engine| engine.unsubscribe(subscription));
    });
    context
}

/// Hook to use the table context.
pub fn use_table<T: Clone + 'static>() -> TableContext<T> {
    use_context::<TableContext<T>>()
        .expect("TableContext not found. Wrap the list with provide_table.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnDef;
    use crate::config::TableConfig;
    use contracts::shared::list::CellValue;

    #[derive(Debug, Clone, PartialEq)]
    struct Role {
        id: i64,
        name: &'static str,
    }

    fn engine() -> TableEngine<Role> {
        let roles = vec![
            Role { id: 1, name: "admin" },
            Role { id: 2, name: "moderator" },
            Role { id: 3, name: "support" },
        ];
        TableEngine::new(
            TableConfig::embedded(roles)
                .column(ColumnDef::new("name", |r: &Role| CellValue::from(r.name)))
                .row_key(|r: &Role, _| RowKey::from(r.id))
                .items_per_page(2),
        )
        .unwrap()
    }

    #[test]
    fn test_context_tracks_engine() {
        let owner = Owner::new();
        owner.with(|| {
            provide_table(engine());

            let ctx = use_table::<Role>();
            assert_eq!(ctx.snapshot.get_untracked().visible_rows.len(), 2);

            ctx.set_filter("name", FilterValue::search("mod"));
            let snap = ctx.snapshot.get_untracked();
            assert_eq!(snap.pagination.total_items, 1);
            assert_eq!(snap.visible_rows[0].name, "moderator");

            ctx.toggle_row(2i64);
            assert!(ctx.snapshot.get_untracked().is_selected(&RowKey::from(2i64)));

            ctx.clear_filters();
            ctx.go_to_page(2);
            assert_eq!(ctx.snapshot.get_untracked().visible_rows[0].id, 3);
        });
    }

    #[test]
    fn test_persisted_table_falls_back_to_defaults() {
        let owner = Owner::new();
        owner.with(|| {
            let ctx = provide_persisted_table(engine(), "admin_roles_list");
            ctx.toggle_sort("name");
            let snap = ctx.snapshot.get_untracked();
            assert_eq!(snap.sort, SortState::asc("name"));
            assert_eq!(snap.pagination.current_page, 1);
        });
    }

    #[test]
    fn test_owner_cleanup_unsubscribes_from_engine() {
        let engine = engine();
        let owner = Owner::new();
        owner.with(|| {
            provide_persisted_table(engine.clone(), "admin_roles_list");
        });
        assert_eq!(engine.observer_count(), 2);

        owner.cleanup();
        assert_eq!(engine.observer_count(), 0);
        engine.go_to_page(2);
    }

    #[test]
    #[should_panic(expected = "TableContext not found")]
    fn test_use_table_outside_provider_panics() {
        let owner = Owner::new();
        owner.with(|| {
            use_table::<Role>();
        });
    }
}
