//! Контракты списков: значения ячеек, фильтры, сортировка, страницы

pub mod filter;
pub mod query;
pub mod response;
pub mod value;

pub use filter::{active_filters, DateRange, FilterKind, FilterMap, FilterValue, ALL_SENTINEL};
pub use query::{ListQuery, SortDirection, SortState};
pub use response::{total_pages, PagedResponse};
pub use value::CellValue;
