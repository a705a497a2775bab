//! Состояние таблиц и списков админки: фильтры, сортировка, страницы и выбор
//! поверх набора строк в памяти или поверх серверной загрузки.

pub mod column;
pub mod config;
pub mod context;
pub mod engine;
pub mod fetch;
pub mod filter;
pub mod http;
pub mod list;
pub mod pagination;
pub mod persist;
pub mod pipeline;
pub mod selection;
pub mod sort;

pub use column::ColumnDef;
pub use config::{ConfigError, DataMode, TableConfig};
pub use context::{provide_persisted_table, provide_table, use_table, TableContext};
pub use engine::{SubscriptionId, TableEngine, TableSnapshot};
pub use fetch::{FetchError, FetchFuture, FetchResult, Fetcher, LeptosSpawner, LocalTask, Spawner};
pub use http::HttpFetcher;
pub use list::{ListEngine, ListSnapshot};
pub use pagination::{PaginationState, DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS};
pub use persist::{PersistedTableState, TableStateStore};
pub use selection::{RowKey, SelectionPolicy};

pub use contracts::shared::list::{
    CellValue, DateRange, FilterKind, FilterMap, FilterValue, ListQuery, PagedResponse,
    SortDirection, SortState,
};

/// Логи в консоль браузера и паники с трассировкой.
/// Вызывается один раз при старте приложения.
pub fn init_logging() {
    // initializes logging using the `log` crate
    _ = console_log::init_with_level(log::Level::Debug);
    console_error_panic_hook::set_once();
}
